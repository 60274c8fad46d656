//! # display: frame to map-tile pipeline
//!
//! ```text
//! RGB frame ──► color::to_rgba ──► TileRenderer::render ──► Vec<MapTile>
//!                                      │
//!                                      ├── TileGrid     (placement, zones)
//!                                      └── ChangeCache  (skip unchanged tiles)
//! ```
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | `tile`     | Tile constants, `TileImage`, `MapTile`               |
//! | `color`    | 24-bit RGB → 32-bit RGBA                             |
//! | `grid`     | Integer geometry: display, border, inner/outer grid  |
//! | `cache`    | Per-tile baseline cache                              |
//! | `renderer` | Stateful renderer producing changed-tile batches     |

pub mod cache;
pub mod color;
pub mod grid;
pub mod renderer;
pub mod tile;

// ── Re-exports ───────────────────────────────────────────────────

pub use cache::ChangeCache;
pub use color::{to_rgba, to_rgba_into};
pub use grid::{TileGrid, TileRect, WorldRect, Zone, ceil_div, floor_div};
pub use renderer::{TileRenderer, fill_tile};
pub use tile::{MapTile, TileImage};
