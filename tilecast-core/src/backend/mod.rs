//! Emulation backends.
//!
//! A backend runs on its own thread at the pace of the emulated system and
//! pushes every completed frame into a [`FrameRelay`](crate::relay::FrameRelay).
//! The session only ever starts, stops and sizes it; input reaches it as
//! abstract [`Button`] presses.

pub mod kind;
pub mod pattern;

pub use kind::{BackendKind, Button, ButtonSet};
pub use pattern::TestPatternBackend;

use crate::error::TilecastError;

// ── EmulatorBackend ──────────────────────────────────────────────

/// Capability interface every backend variant implements.
///
/// Methods take `&self` so a backend can be shared between the session
/// (lifecycle) and the input path (buttons).
pub trait EmulatorBackend: Send + Sync {
    /// Native display width in pixels.
    fn native_width(&self) -> u32;

    /// Native display height in pixels.
    fn native_height(&self) -> u32;

    /// Begin producing frames on the backend's own thread.
    ///
    /// Missing resources and thread spawn failures are reported here.
    fn start(&self) -> Result<(), TilecastError>;

    /// Stop producing frames and wait for the backend thread to exit.
    fn stop(&self);

    /// Press a button. Buttons the system lacks are ignored.
    fn press(&self, button: Button);

    /// Release a button. Buttons the system lacks are ignored.
    fn release(&self, button: Button);

    fn is_running(&self) -> bool;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}
