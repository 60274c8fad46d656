//! Frame → tile batch rendering.
//!
//! Walks every tile of the outer grid once per frame:
//!
//! - **Inner tiles** are drawn at full resolution (display pixels, border,
//!   black fallback) and handed to the [`ChangeCache`]; only changed tiles
//!   make it into the batch.
//! - **Padding tiles** are constant black. Each is sent once as a 1×1 image
//!   and then skipped until [`reset`](TileRenderer::reset).

use crate::display::cache::ChangeCache;
use crate::display::grid::TileGrid;
use crate::display::tile::{
    BORDER_COLOR, MapTile, PADDING_COLOR, PIXELS_PER_UNIT, TILE_IMAGE_PIXELS, TILE_IMAGE_SIZE,
    TILE_WORLD_UNITS, TileImage,
};
use crate::error::TilecastError;

// ── TileRenderer ─────────────────────────────────────────────────

/// Stateful renderer for one fixed display placement.
///
/// Owns the grid geometry, the change cache for inner tiles and the
/// sent-flags for padding tiles. It is driven by a single sampler and has
/// no internal locking.
#[derive(Debug)]
pub struct TileRenderer {
    grid: TileGrid,
    cache: ChangeCache,
    padding_sent: Vec<bool>,
    scratch: Vec<u32>,
}

impl TileRenderer {
    /// Build a renderer for a `native_width × native_height` display centred
    /// on `(anchor_x, anchor_z)` at `scale` world units per pixel.
    pub fn new(
        anchor_x: f64,
        anchor_z: f64,
        scale: u32,
        native_width: u32,
        native_height: u32,
    ) -> Result<Self, TilecastError> {
        let grid = TileGrid::new(anchor_x, anchor_z, scale, native_width, native_height)?;
        Ok(Self::from_grid(grid))
    }

    /// Build a renderer around an existing grid.
    pub fn from_grid(grid: TileGrid) -> Self {
        Self {
            cache: ChangeCache::new(grid.inner_tile_count()),
            padding_sent: vec![false; grid.outer_tile_count()],
            scratch: vec![0; TILE_IMAGE_PIXELS],
            grid,
        }
    }

    /// Render `frame` (RGBA, `native_width * native_height` pixels) and
    /// return the tiles that need transmitting.
    ///
    /// Returns `Ok(None)` when nothing changed since the last call.
    pub fn render(&mut self, frame: &[u32]) -> Result<Option<Vec<MapTile>>, TilecastError> {
        let expected = self.grid.pixel_count();
        if frame.len() != expected {
            return Err(TilecastError::FrameSizeMismatch {
                expected,
                actual: frame.len(),
            });
        }

        let inner = self.grid.inner();
        let outer = self.grid.outer();
        let mut batch = Vec::new();

        for (tile_x, tile_z) in outer.iter() {
            if let Some(inner_index) = inner.index_of(tile_x, tile_z) {
                fill_tile(&self.grid, frame, tile_x, tile_z, &mut self.scratch);
                if self.cache.changed(inner_index, &self.scratch) {
                    batch.push(MapTile {
                        tile_x,
                        tile_z,
                        image: TileImage::full(&self.scratch),
                    });
                }
            } else if let Some(outer_index) = outer.index_of(tile_x, tile_z) {
                let sent = &mut self.padding_sent[outer_index];
                if !*sent {
                    *sent = true;
                    batch.push(MapTile {
                        tile_x,
                        tile_z,
                        image: TileImage::solid(PADDING_COLOR),
                    });
                }
            }
        }

        Ok((!batch.is_empty()).then_some(batch))
    }

    /// Forget everything sent so far; the next render re-emits the whole
    /// outer grid. Geometry is kept.
    pub fn reset(&mut self) {
        self.cache.reset();
        self.padding_sent.fill(false);
    }

    /// Placement this renderer draws.
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Change cache for inner tiles.
    pub fn cache(&self) -> &ChangeCache {
        &self.cache
    }
}

// ── Tile extraction ──────────────────────────────────────────────

/// Draw the full-resolution image of tile `(tile_x, tile_z)` into `dest`.
///
/// Image pixel `(px, py)` shows world position
/// `(tile_x * 32 + px / 2, tile_z * 32 + py / 2)`:
///
/// - inside the display → frame pixel (nearest neighbour, `scale × scale`)
/// - inside the border only → [`BORDER_COLOR`]
/// - elsewhere → [`PADDING_COLOR`]
///
/// `dest` must hold [`TILE_IMAGE_PIXELS`] pixels.
pub fn fill_tile(grid: &TileGrid, frame: &[u32], tile_x: i32, tile_z: i32, dest: &mut [u32]) {
    let origin_x = tile_x * TILE_WORLD_UNITS;
    let origin_z = tile_z * TILE_WORLD_UNITS;
    let display = grid.display_rect();
    let border = grid.border_rect();

    for (py, row) in dest.chunks_exact_mut(TILE_IMAGE_SIZE).enumerate() {
        let world_z = origin_z + py as i32 / PIXELS_PER_UNIT;

        if !border.contains_z(world_z) {
            row.fill(PADDING_COLOR);
            continue;
        }
        let z_in_display = display.contains_z(world_z);

        for (px, out) in row.iter_mut().enumerate() {
            let world_x = origin_x + px as i32 / PIXELS_PER_UNIT;

            *out = if z_in_display && display.contains_x(world_x) {
                grid.source_index(world_x, world_z)
                    .and_then(|i| frame.get(i).copied())
                    .unwrap_or(PADDING_COLOR)
            } else if border.contains_x(world_x) {
                BORDER_COLOR
            } else {
                PADDING_COLOR
            };
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
