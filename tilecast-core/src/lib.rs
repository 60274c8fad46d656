//! # tilecast-core
//!
//! Streams an emulator's pixel raster onto a tile-based map surface,
//! resending only the tiles whose content changed.
//!
//! This crate contains:
//! - **Relay**: `FrameRelay`, the last-write-wins hand-off between the backend
//!   thread and the sampler
//! - **Display**: tile geometry (`TileGrid`), the per-tile `ChangeCache` and
//!   the `TileRenderer` that turns a frame into a changed-tile batch
//! - **Backend**: the `EmulatorBackend` trait, `BackendKind` variants, buttons
//!   and a synthetic `TestPatternBackend`
//! - **Surface**: the async `MapSurface` output trait and `ChannelSurface`
//! - **Input**: `ButtonPresser`, debounced press-and-release taps
//! - **Session**: `Session`, which owns one pipeline end to end
//! - **Error**: `TilecastError`, a typed `thiserror`-based error hierarchy

pub mod backend;
pub mod display;
pub mod error;
pub mod input;
pub mod relay;
pub mod session;
pub mod surface;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use backend::{BackendKind, Button, ButtonSet, EmulatorBackend, TestPatternBackend};
pub use display::{ChangeCache, MapTile, TileGrid, TileImage, TileRenderer, Zone};
pub use error::TilecastError;
pub use input::ButtonPresser;
pub use relay::FrameRelay;
pub use session::{Session, SessionConfig, SessionStatsSnapshot};
pub use surface::{ChannelSurface, MapSurface, SurfaceUpdate};
