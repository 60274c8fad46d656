//! Map surface that logs what it would transmit.
//!
//! Stands in for the host platform's map packets when running from the
//! console.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, info};

use tilecast_core::{MapSurface, MapTile, TilecastError};

/// Surface that records counters and emits a `tracing` event per update.
#[derive(Debug)]
pub struct LogSurface {
    client: String,
    clears: AtomicU64,
    batches: AtomicU64,
    tiles: AtomicU64,
}

impl LogSurface {
    pub fn new(client: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            clears: AtomicU64::new(0),
            batches: AtomicU64::new(0),
            tiles: AtomicU64::new(0),
        }
    }

    /// Number of clears received.
    pub fn clears(&self) -> u64 {
        self.clears.load(Ordering::Relaxed)
    }

    /// Number of tile batches received.
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Total tiles received.
    pub fn tiles(&self) -> u64 {
        self.tiles.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MapSurface for LogSurface {
    async fn clear(&self) -> Result<(), TilecastError> {
        self.clears.fetch_add(1, Ordering::Relaxed);
        info!(client = %self.client, "map cleared");
        Ok(())
    }

    async fn send_tiles(&self, tiles: Vec<MapTile>) -> Result<(), TilecastError> {
        let batch = self.batches.fetch_add(1, Ordering::Relaxed) + 1;
        self.tiles.fetch_add(tiles.len() as u64, Ordering::Relaxed);

        let bounds = tiles.iter().fold(None, |acc: Option<(i32, i32, i32, i32)>, t| {
            Some(match acc {
                None => (t.tile_x, t.tile_z, t.tile_x, t.tile_z),
                Some((x0, z0, x1, z1)) => (
                    x0.min(t.tile_x),
                    z0.min(t.tile_z),
                    x1.max(t.tile_x),
                    z1.max(t.tile_z),
                ),
            })
        });
        debug!(client = %self.client, batch, tiles = tiles.len(), ?bounds, "tile batch");
        Ok(())
    }
}
