//! Debounced button taps.
//!
//! Hosts usually see discrete "move" or "use" events rather than key-down /
//! key-up pairs. [`ButtonPresser`] turns each event into a press followed by
//! a release after a fixed hold duration, and drops repeat taps of a button
//! that is still held.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::backend::{Button, ButtonSet, EmulatorBackend};

/// Default time a tapped button stays pressed.
pub const DEFAULT_HOLD: Duration = Duration::from_millis(200);

// ── ButtonPresser ────────────────────────────────────────────────

/// Press-and-release helper bound to one backend.
///
/// Releases are scheduled on the tokio runtime, so [`tap`](Self::tap) must
/// be called from within one.
#[derive(Clone)]
pub struct ButtonPresser {
    backend: Arc<dyn EmulatorBackend>,
    hold: Duration,
    held: Arc<Mutex<ButtonSet>>,
}

impl ButtonPresser {
    pub fn new(backend: Arc<dyn EmulatorBackend>, hold: Duration) -> Self {
        Self {
            backend,
            hold,
            held: Arc::new(Mutex::new(ButtonSet::empty())),
        }
    }

    /// Press `button` and release it after the hold duration.
    ///
    /// Returns `false` if the button is still held from an earlier tap and
    /// this tap was ignored.
    pub fn tap(&self, button: Button) -> bool {
        let bit = ButtonSet::from(button);
        {
            let mut held = self.held.lock();
            if held.contains(bit) {
                trace!(?button, "tap ignored, still held");
                return false;
            }
            held.insert(bit);
        }

        self.backend.press(button);

        let backend = Arc::clone(&self.backend);
        let held = Arc::clone(&self.held);
        let hold = self.hold;
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            backend.release(button);
            held.lock().remove(bit);
        });
        true
    }

    /// Buttons currently held by pending taps.
    pub fn held(&self) -> ButtonSet {
        *self.held.lock()
    }

    /// Configured hold duration.
    pub fn hold(&self) -> Duration {
        self.hold
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TilecastError;

    /// Records every press and release.
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(bool, Button)>>,
    }

    impl EmulatorBackend for Recorder {
        fn native_width(&self) -> u32 {
            160
        }
        fn native_height(&self) -> u32 {
            144
        }
        fn start(&self) -> Result<(), TilecastError> {
            Ok(())
        }
        fn stop(&self) {}
        fn press(&self, button: Button) {
            self.events.lock().push((true, button));
        }
        fn release(&self, button: Button) {
            self.events.lock().push((false, button));
        }
        fn is_running(&self) -> bool {
            true
        }
        fn name(&self) -> &str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn tap_presses_then_releases() {
        let backend = Arc::new(Recorder::default());
        let presser = ButtonPresser::new(backend.clone(), Duration::from_millis(20));

        assert!(presser.tap(Button::A));
        assert_eq!(*backend.events.lock(), vec![(true, Button::A)]);
        assert_eq!(presser.held(), ButtonSet::A);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            *backend.events.lock(),
            vec![(true, Button::A), (false, Button::A)]
        );
        assert!(presser.held().is_empty());
    }

    #[tokio::test]
    async fn repeat_tap_while_held_is_debounced() {
        let backend = Arc::new(Recorder::default());
        let presser = ButtonPresser::new(backend.clone(), Duration::from_millis(50));

        assert!(presser.tap(Button::Up));
        assert!(!presser.tap(Button::Up));
        assert!(presser.tap(Button::Left));
        assert_eq!(backend.events.lock().len(), 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(presser.tap(Button::Up));
    }
}
