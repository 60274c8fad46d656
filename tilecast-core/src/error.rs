//! Domain-specific error types for the tilecast pipeline.
//!
//! All fallible operations return `Result<T, TilecastError>`.
//! Per-tile cache lookups never fail; only configuration, lifecycle and
//! transport problems are surfaced as errors.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for tilecast.
#[derive(Debug, Error)]
pub enum TilecastError {
    // ── Configuration Errors ─────────────────────────────────────
    /// The world-units-per-pixel scale must be at least 1.
    #[error("invalid scale: {0} (must be >= 1)")]
    InvalidScale(u32),

    /// The sampling rate must be at least 1 Hz.
    #[error("invalid render rate: {0} Hz (must be >= 1)")]
    InvalidRenderRate(u32),

    /// A native resolution with a zero side was supplied.
    #[error("invalid native resolution: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The scaled display or its padding does not fit in `i32` world
    /// coordinates at this anchor.
    #[error("display at ({anchor_x}, {anchor_z}) with scale {scale} exceeds world coordinates")]
    GridOutOfRange {
        anchor_x: f64,
        anchor_z: f64,
        scale: u32,
    },

    /// The outer tile grid would exceed the renderer's tile limit.
    #[error("tile grid of {tiles} tiles exceeds the limit of {max}")]
    GridTooLarge { tiles: u64, max: u64 },

    /// The relay and the backend disagree about the native resolution.
    #[error("dimension mismatch: backend is {backend:?}, relay is {relay:?}")]
    DimensionMismatch {
        backend: (u32, u32),
        relay: (u32, u32),
    },

    // ── Frame Errors ─────────────────────────────────────────────
    /// A frame did not contain exactly `width * height` pixels.
    #[error("frame size mismatch: expected {expected} pixels, got {actual}")]
    FrameSizeMismatch { expected: usize, actual: usize },

    // ── Lifecycle Errors ─────────────────────────────────────────
    /// `start` was called on a session or backend that is already running.
    #[error("already running")]
    AlreadyRunning,

    /// The emulation backend could not be started.
    #[error("backend error: {0}")]
    Backend(String),

    /// A surface call exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // ── Transport Errors ─────────────────────────────────────────
    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    /// The map surface rejected a clear or a tile batch.
    #[error("surface error: {0}")]
    Surface(String),

    /// The I/O layer reported an error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// ── Convenient From implementations ──────────────────────────────

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for TilecastError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        TilecastError::ChannelClosed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = TilecastError::InvalidScale(0);
        assert!(e.to_string().contains("scale"));

        let e = TilecastError::FrameSizeMismatch {
            expected: 23040,
            actual: 100,
        };
        assert!(e.to_string().contains("23040"));
        assert!(e.to_string().contains("100"));
    }

    #[test]
    fn timeout_display() {
        let e = TilecastError::Timeout(Duration::from_millis(250));
        assert_eq!(e.to_string(), "timeout after 250ms");
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "bios missing");
        let e: TilecastError = io_err.into();
        assert!(matches!(e, TilecastError::Io(_)));
    }

    #[tokio::test]
    async fn from_send_error() {
        let (tx, rx) = tokio::sync::mpsc::channel::<u8>(1);
        drop(rx);
        let e: TilecastError = tx.send(1).await.unwrap_err().into();
        assert!(matches!(e, TilecastError::ChannelClosed));
    }
}
