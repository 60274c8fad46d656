//! Synthetic backend that draws an animated test pattern.
//!
//! Stands in for an emulator core: it runs on a dedicated thread at the
//! real-time pace of its [`BackendKind`], scrolls diagonal bands across the
//! screen and moves a cursor square with the D-pad. Frames go straight into
//! the shared [`FrameRelay`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::backend::EmulatorBackend;
use crate::backend::kind::{BackendKind, Button, ButtonSet};
use crate::error::TilecastError;
use crate::relay::FrameRelay;

// ── Palette ──────────────────────────────────────────────────────

const BAND_DARK: u32 = 0x000F_380F;
const BAND_LIGHT: u32 = 0x0030_6230;
const CURSOR: u32 = 0x009B_BC0F;
const CURSOR_ACTIVE: u32 = 0x00E0_F8D0;

/// Cursor side length in pixels.
const CURSOR_SIZE: u32 = 8;

/// Width of one diagonal band in pixels.
const BAND_WIDTH: u32 = 8;

// ── Pattern ──────────────────────────────────────────────────────

/// Deterministic pattern state advanced once per emulated frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    width: u32,
    height: u32,
    frame: u64,
    cursor_x: u32,
    cursor_y: u32,
    active: bool,
}

impl Pattern {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: 0,
            cursor_x: width.saturating_sub(CURSOR_SIZE) / 2,
            cursor_y: height.saturating_sub(CURSOR_SIZE) / 2,
            active: false,
        }
    }

    /// Advance one frame, applying the held buttons.
    pub(crate) fn step(&mut self, held: ButtonSet) {
        self.frame = self.frame.wrapping_add(1);

        let max_x = self.width.saturating_sub(CURSOR_SIZE);
        let max_y = self.height.saturating_sub(CURSOR_SIZE);
        if held.contains(ButtonSet::LEFT) {
            self.cursor_x = self.cursor_x.saturating_sub(1);
        }
        if held.contains(ButtonSet::RIGHT) {
            self.cursor_x = (self.cursor_x + 1).min(max_x);
        }
        if held.contains(ButtonSet::UP) {
            self.cursor_y = self.cursor_y.saturating_sub(1);
        }
        if held.contains(ButtonSet::DOWN) {
            self.cursor_y = (self.cursor_y + 1).min(max_y);
        }
        self.active = held.intersects(ButtonSet::A | ButtonSet::B);
    }

    /// Draw the current state as 24-bit RGB into `out`.
    pub(crate) fn draw(&self, out: &mut [u32]) {
        let shift = (self.frame % (2 * BAND_WIDTH) as u64) as u32;
        let cursor = if self.active { CURSOR_ACTIVE } else { CURSOR };

        for (y, row) in out.chunks_exact_mut(self.width as usize).enumerate() {
            let y = y as u32;
            let in_cursor_rows = y >= self.cursor_y && y < self.cursor_y + CURSOR_SIZE;
            for (x, px) in row.iter_mut().enumerate() {
                let x = x as u32;
                *px = if in_cursor_rows && x >= self.cursor_x && x < self.cursor_x + CURSOR_SIZE {
                    cursor
                } else if ((x + y + shift) / BAND_WIDTH) % 2 == 0 {
                    BAND_DARK
                } else {
                    BAND_LIGHT
                };
            }
        }
    }

    pub(crate) fn cursor(&self) -> (u32, u32) {
        (self.cursor_x, self.cursor_y)
    }
}

// ── TestPatternBackend ───────────────────────────────────────────

/// Backend producing [`Pattern`] frames on its own thread.
pub struct TestPatternBackend {
    kind: BackendKind,
    relay: Arc<FrameRelay>,
    held: Arc<AtomicU16>,
    running: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl TestPatternBackend {
    /// Create a backend of `kind` that submits into `relay`.
    ///
    /// The relay must be sized for the kind's native resolution.
    pub fn new(kind: BackendKind, relay: Arc<FrameRelay>) -> Result<Self, TilecastError> {
        if (relay.width(), relay.height()) != (kind.width(), kind.height()) {
            return Err(TilecastError::DimensionMismatch {
                backend: (kind.width(), kind.height()),
                relay: (relay.width(), relay.height()),
            });
        }
        Ok(Self {
            kind,
            relay,
            held: Arc::new(AtomicU16::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        })
    }

    /// The system this backend imitates.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Buttons currently held.
    pub fn held(&self) -> ButtonSet {
        ButtonSet::from_bits_truncate(self.held.load(Ordering::Acquire))
    }

    fn run_loop(kind: BackendKind, relay: Arc<FrameRelay>, held: Arc<AtomicU16>, running: Arc<AtomicBool>) {
        let mut pattern = Pattern::new(kind.width(), kind.height());
        let mut frame = vec![0u32; relay.pixel_count()];
        let interval = kind.frame_interval();
        let mut deadline = Instant::now();

        while running.load(Ordering::Acquire) {
            pattern.step(ButtonSet::from_bits_truncate(held.load(Ordering::Acquire)));
            pattern.draw(&mut frame);
            relay.submit(&frame);

            // Pace to real time; if we fell behind, resynchronise instead of
            // bursting to catch up.
            deadline += interval;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }
        debug!(backend = kind.name(), "pattern loop exited");
    }
}

impl EmulatorBackend for TestPatternBackend {
    fn native_width(&self) -> u32 {
        self.kind.width()
    }

    fn native_height(&self) -> u32 {
        self.kind.height()
    }

    fn start(&self) -> Result<(), TilecastError> {
        let mut slot = self.thread.lock();
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(TilecastError::AlreadyRunning);
        }

        let kind = self.kind;
        let relay = Arc::clone(&self.relay);
        let held = Arc::clone(&self.held);
        let running = Arc::clone(&self.running);
        let spawned = thread::Builder::new()
            .name(format!("tilecast-{}", kind.name()))
            .spawn(move || Self::run_loop(kind, relay, held, running));

        match spawned {
            Ok(handle) => {
                *slot = Some(handle);
                info!(backend = kind.name(), "test pattern backend started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(TilecastError::Io(e))
            }
        }
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!(backend = self.kind.name(), "pattern thread panicked");
            }
            info!(backend = self.kind.name(), "test pattern backend stopped");
        }
        self.held.store(0, Ordering::Release);
    }

    fn press(&self, button: Button) {
        if self.kind.supports(button) {
            self.held.fetch_or(ButtonSet::from(button).bits(), Ordering::AcqRel);
        }
    }

    fn release(&self, button: Button) {
        if self.kind.supports(button) {
            self.held.fetch_and(!ButtonSet::from(button).bits(), Ordering::AcqRel);
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn name(&self) -> &str {
        self.kind.name()
    }
}

impl Drop for TestPatternBackend {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn backend(kind: BackendKind) -> (Arc<FrameRelay>, TestPatternBackend) {
        let relay = Arc::new(FrameRelay::new(kind.width(), kind.height()).unwrap());
        let backend = TestPatternBackend::new(kind, Arc::clone(&relay)).unwrap();
        (relay, backend)
    }

    #[test]
    fn rejects_mismatched_relay() {
        let relay = Arc::new(FrameRelay::new(240, 160).unwrap());
        let result = TestPatternBackend::new(BackendKind::GameBoy, relay);
        assert!(matches!(result, Err(TilecastError::DimensionMismatch { .. })));
    }

    #[test]
    fn pattern_is_deterministic() {
        let mut a = Pattern::new(160, 144);
        let mut b = Pattern::new(160, 144);
        let mut fa = vec![0; 160 * 144];
        let mut fb = vec![0; 160 * 144];
        for _ in 0..5 {
            a.step(ButtonSet::RIGHT);
            b.step(ButtonSet::RIGHT);
        }
        a.draw(&mut fa);
        b.draw(&mut fb);
        assert_eq!(fa, fb);
        assert!(fa.iter().all(|&p| p <= 0x00FF_FFFF));
    }

    #[test]
    fn pattern_animates() {
        let mut p = Pattern::new(160, 144);
        let mut f0 = vec![0; 160 * 144];
        let mut f1 = vec![0; 160 * 144];
        p.draw(&mut f0);
        p.step(ButtonSet::empty());
        p.draw(&mut f1);
        assert_ne!(f0, f1);
    }

    #[test]
    fn dpad_moves_cursor_within_bounds() {
        let mut p = Pattern::new(160, 144);
        let (x0, y0) = p.cursor();
        p.step(ButtonSet::RIGHT | ButtonSet::DOWN);
        assert_eq!(p.cursor(), (x0 + 1, y0 + 1));

        for _ in 0..500 {
            p.step(ButtonSet::LEFT | ButtonSet::UP);
        }
        assert_eq!(p.cursor(), (0, 0));
        for _ in 0..500 {
            p.step(ButtonSet::RIGHT | ButtonSet::DOWN);
        }
        assert_eq!(p.cursor(), (160 - CURSOR_SIZE, 144 - CURSOR_SIZE));
    }

    #[test]
    fn unsupported_buttons_are_ignored() {
        let (_relay, gb) = backend(BackendKind::GameBoy);
        gb.press(Button::L);
        assert!(gb.held().is_empty());
        gb.press(Button::A);
        assert_eq!(gb.held(), ButtonSet::A);
        gb.release(Button::A);
        assert!(gb.held().is_empty());
    }

    #[test]
    fn produces_frames_until_stopped() {
        let (relay, gba) = backend(BackendKind::GameBoyAdvance);
        assert!(!gba.is_running());
        gba.start().unwrap();
        assert!(gba.is_running());
        assert!(matches!(gba.start(), Err(TilecastError::AlreadyRunning)));

        thread::sleep(Duration::from_millis(100));
        gba.stop();
        assert!(!gba.is_running());

        let produced = relay.sequence();
        assert!(produced > 0);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(relay.sequence(), produced);
    }
}
