//! The per-client map surface tiles are transmitted to.
//!
//! The wire format belongs to the host platform; tilecast only needs a
//! "clear" operation and batched tile delivery.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::display::tile::MapTile;
use crate::error::TilecastError;

// ── MapSurface ───────────────────────────────────────────────────

/// Output side of a session.
#[async_trait]
pub trait MapSurface: Send + Sync {
    /// Remove everything currently drawn on the client's map.
    async fn clear(&self) -> Result<(), TilecastError>;

    /// Deliver one batch of changed tiles.
    async fn send_tiles(&self, tiles: Vec<MapTile>) -> Result<(), TilecastError>;
}

// ── ChannelSurface ───────────────────────────────────────────────

/// Message forwarded by [`ChannelSurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceUpdate {
    Clear,
    Tiles(Vec<MapTile>),
}

/// Surface that forwards every operation over a bounded tokio channel.
///
/// Lets a host own the receiving end and encode updates however its
/// protocol requires.
#[derive(Debug, Clone)]
pub struct ChannelSurface {
    tx: mpsc::Sender<SurfaceUpdate>,
}

impl ChannelSurface {
    /// Create a surface and the receiver its updates arrive on.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SurfaceUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MapSurface for ChannelSurface {
    async fn clear(&self) -> Result<(), TilecastError> {
        self.tx.send(SurfaceUpdate::Clear).await?;
        Ok(())
    }

    async fn send_tiles(&self, tiles: Vec<MapTile>) -> Result<(), TilecastError> {
        self.tx.send(SurfaceUpdate::Tiles(tiles)).await?;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
