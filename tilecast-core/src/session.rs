//! Per-client streaming session.
//!
//! Ties one backend, one [`FrameRelay`] and one [`MapSurface`] together:
//!
//! 1. The backend thread submits frames into the relay at its own pace.
//! 2. A sampler task wakes every `1000 / render_fps` ms, takes the latest
//!    frame, converts it to RGBA and renders it with a [`TileRenderer`].
//! 3. Changed tiles are sent to the surface.
//!
//! The renderer and its change cache live inside the sampler task and are
//! never shared. Every surface call is bounded by `surface_timeout`; a
//! batch that times out counts as a failed tick. Cancellation uses a
//! `CancellationToken`; `stop` waits a bounded time for the sampler before
//! aborting it, and only then stops the backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::backend::EmulatorBackend;
use crate::display::color::to_rgba_into;
use crate::display::renderer::TileRenderer;
use crate::error::TilecastError;
use crate::relay::FrameRelay;
use crate::surface::MapSurface;

/// How long `stop` waits for an aborted sampler to unwind.
const ABORT_GRACE: Duration = Duration::from_secs(1);

// ── SessionConfig ────────────────────────────────────────────────

/// Placement and pacing of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// World X the display is centred on.
    pub anchor_x: f64,
    /// World Z the display is centred on.
    pub anchor_z: f64,
    /// World units per source pixel (>= 1).
    pub scale: u32,
    /// Sampler rate in Hz (>= 1).
    pub render_fps: u32,
    /// How long `stop` waits for an in-flight tick before aborting it.
    pub stop_timeout: Duration,
    /// Deadline for one surface call (`clear` or a tile batch).
    pub surface_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            anchor_x: 0.0,
            anchor_z: 0.0,
            scale: 4,
            render_fps: 20,
            stop_timeout: Duration::from_millis(500),
            surface_timeout: Duration::from_secs(1),
        }
    }
}

impl SessionConfig {
    /// Reject a zero scale or render rate.
    pub fn validate(&self) -> Result<(), TilecastError> {
        if self.scale == 0 {
            return Err(TilecastError::InvalidScale(self.scale));
        }
        if self.render_fps == 0 {
            return Err(TilecastError::InvalidRenderRate(self.render_fps));
        }
        Ok(())
    }

    /// Sampler period, `1000 / render_fps` ms, never below 1 ms.
    pub fn tick_period(&self) -> Duration {
        let ms = 1000 / u64::from(self.render_fps.max(1));
        Duration::from_millis(ms.max(1))
    }
}

// ── SessionStats ─────────────────────────────────────────────────

/// Counters updated by the sampler task.
#[derive(Debug, Default)]
struct SessionStats {
    ticks: AtomicU64,
    frames_rendered: AtomicU64,
    batches_sent: AtomicU64,
    tiles_sent: AtomicU64,
    tick_errors: AtomicU64,
}

impl SessionStats {
    fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            tiles_sent: self.tiles_sent.load(Ordering::Relaxed),
            tick_errors: self.tick_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a session's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatsSnapshot {
    /// Sampler wake-ups.
    pub ticks: u64,
    /// New frames pulled from the relay and rendered.
    pub frames_rendered: u64,
    /// Non-empty batches delivered to the surface.
    pub batches_sent: u64,
    /// Tiles delivered to the surface.
    pub tiles_sent: u64,
    /// Ticks that failed and were skipped.
    pub tick_errors: u64,
}

// ── Session ──────────────────────────────────────────────────────

/// One client's producer/consumer pair and its lifecycle.
pub struct Session {
    client: String,
    config: SessionConfig,
    backend: Arc<dyn EmulatorBackend>,
    relay: Arc<FrameRelay>,
    surface: Arc<dyn MapSurface>,
    stats: Arc<SessionStats>,
    reset_requested: Arc<AtomicBool>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Session {
    /// Assemble a session. Nothing runs until [`start`](Self::start).
    ///
    /// The relay must match the backend's native resolution.
    pub fn new(
        client: impl Into<String>,
        backend: Arc<dyn EmulatorBackend>,
        relay: Arc<FrameRelay>,
        surface: Arc<dyn MapSurface>,
        config: SessionConfig,
    ) -> Result<Self, TilecastError> {
        config.validate()?;
        let backend_dims = (backend.native_width(), backend.native_height());
        let relay_dims = (relay.width(), relay.height());
        if backend_dims != relay_dims {
            return Err(TilecastError::DimensionMismatch {
                backend: backend_dims,
                relay: relay_dims,
            });
        }

        Ok(Self {
            client: client.into(),
            config,
            backend,
            relay,
            surface,
            stats: Arc::new(SessionStats::default()),
            reset_requested: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            task: None,
        })
    }

    /// Clear the surface, start the backend and begin sampling.
    ///
    /// A failure to clear the surface, including one that exceeds
    /// `surface_timeout`, is logged and ignored. A backend
    /// failure is returned and leaves the session stopped.
    pub async fn start(&mut self) -> Result<(), TilecastError> {
        if self.task.is_some() {
            return Err(TilecastError::AlreadyRunning);
        }

        let renderer = TileRenderer::new(
            self.config.anchor_x,
            self.config.anchor_z,
            self.config.scale,
            self.backend.native_width(),
            self.backend.native_height(),
        )?;

        let deadline = self.config.surface_timeout;
        let cleared = tokio::time::timeout(deadline, self.surface.clear())
            .await
            .unwrap_or(Err(TilecastError::Timeout(deadline)));
        match cleared {
            Ok(()) => debug!(client = %self.client, "map surface cleared"),
            Err(e) => warn!(client = %self.client, "failed to clear map surface: {e}"),
        }

        if let Err(e) = self.backend.start() {
            error!(client = %self.client, backend = self.backend.name(), "backend failed to start: {e}");
            return Err(e);
        }

        let grid = renderer.grid();
        info!(
            client = %self.client,
            backend = self.backend.name(),
            fps = self.config.render_fps,
            scale = self.config.scale,
            display_start = ?grid.display_start(),
            tiles = grid.outer_tile_count(),
            "session started"
        );

        self.reset_requested.store(false, Ordering::Release);
        self.cancel = CancellationToken::new();

        let pixel_count = self.relay.pixel_count();
        let sampler = Sampler {
            client: self.client.clone(),
            relay: Arc::clone(&self.relay),
            renderer,
            surface: Arc::clone(&self.surface),
            stats: Arc::clone(&self.stats),
            reset_requested: Arc::clone(&self.reset_requested),
            cancel: self.cancel.clone(),
            read_buf: vec![0; pixel_count],
            rgba_buf: vec![0; pixel_count],
            last_seen: None,
            surface_timeout: self.config.surface_timeout,
        };
        self.task = Some(tokio::spawn(sampler.run(self.config.tick_period())));
        Ok(())
    }

    /// Stop sampling, then stop the backend.
    ///
    /// Waits up to `stop_timeout` for an in-flight tick and aborts the
    /// sampler if it has not finished. Once this returns no more tiles are
    /// sent. Calling `stop` on a stopped session does nothing.
    pub async fn stop(&mut self) {
        let Some(mut task) = self.task.take() else {
            return;
        };
        self.cancel.cancel();

        match tokio::time::timeout(self.config.stop_timeout, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(client = %self.client, "sampler ended abnormally: {e}"),
            Err(_) => {
                warn!(
                    client = %self.client,
                    "sampler did not stop within {:?}; aborting",
                    self.config.stop_timeout
                );
                task.abort();
                // The backend is only stopped once the sampler is gone.
                if tokio::time::timeout(ABORT_GRACE, &mut task).await.is_err() {
                    warn!(client = %self.client, "sampler still unwinding after abort");
                }
            }
        }

        let backend = Arc::clone(&self.backend);
        if let Err(e) = tokio::task::spawn_blocking(move || backend.stop()).await {
            warn!(client = %self.client, "backend stop panicked: {e}");
        }

        info!(client = %self.client, "session stopped");
    }

    /// Ask the sampler to forget everything it has sent and redraw the
    /// whole grid on its next tick.
    ///
    /// Use after the client's map was cleared by someone else.
    pub fn request_reset(&self) {
        self.reset_requested.store(true, Ordering::Release);
    }

    /// Whether the sampler task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Current counters.
    pub fn stats(&self) -> SessionStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn EmulatorBackend> {
        &self.backend
    }

    pub fn relay(&self) -> &Arc<FrameRelay> {
        &self.relay
    }
}

/// Dropping a running session cancels the sampler and stops the backend
/// without waiting. `backend.stop()` may join a thread, so inside a tokio
/// runtime it is handed to the blocking pool; prefer [`Session::stop`].
impl Drop for Session {
    fn drop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.cancel.cancel();
        task.abort();

        let backend = Arc::clone(&self.backend);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || backend.stop());
            }
            Err(_) => backend.stop(),
        }
    }
}

// ── Sampler ──────────────────────────────────────────────────────

/// State owned by the periodic sampling task.
struct Sampler {
    client: String,
    relay: Arc<FrameRelay>,
    renderer: TileRenderer,
    surface: Arc<dyn MapSurface>,
    stats: Arc<SessionStats>,
    reset_requested: Arc<AtomicBool>,
    cancel: CancellationToken,
    read_buf: Vec<u32>,
    rgba_buf: Vec<u32>,
    last_seen: Option<u64>,
    surface_timeout: Duration,
}

impl Sampler {
    async fn run(mut self, period: Duration) {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            self.stats.ticks.fetch_add(1, Ordering::Relaxed);
            if let Err(e) = self.tick().await {
                self.stats.tick_errors.fetch_add(1, Ordering::Relaxed);
                warn!(client = %self.client, "render tick failed: {e}");
            }
        }

        debug!(client = %self.client, "sampler stopped");
    }

    async fn tick(&mut self) -> Result<(), TilecastError> {
        if self.reset_requested.swap(false, Ordering::AcqRel) {
            debug!(client = %self.client, "renderer reset requested");
            self.force_full_redraw();
        }

        let Some(seq) = self.relay.latest(&mut self.read_buf, self.last_seen) else {
            return Ok(());
        };
        self.last_seen = Some(seq);

        to_rgba_into(&self.read_buf, &mut self.rgba_buf);
        let batch = self.renderer.render(&self.rgba_buf)?;
        self.stats.frames_rendered.fetch_add(1, Ordering::Relaxed);

        let Some(batch) = batch else {
            return Ok(());
        };
        let count = batch.len();

        let deadline = self.surface_timeout;
        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(()),
            result = tokio::time::timeout(deadline, self.surface.send_tiles(batch)) => {
                result.unwrap_or(Err(TilecastError::Timeout(deadline)))
            }
        };

        if let Err(e) = sent {
            // The cache already holds this batch as transmitted; start over
            // so the surface cannot drift from what we believe it shows.
            self.force_full_redraw();
            return Err(e);
        }

        self.stats.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.stats.tiles_sent.fetch_add(count as u64, Ordering::Relaxed);
        trace!(client = %self.client, seq, tiles = count, "batch sent");
        Ok(())
    }

    fn force_full_redraw(&mut self) {
        self.renderer.reset();
        self.last_seen = None;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Button;

    struct FixedBackend {
        width: u32,
        height: u32,
    }

    impl EmulatorBackend for FixedBackend {
        fn native_width(&self) -> u32 {
            self.width
        }
        fn native_height(&self) -> u32 {
            self.height
        }
        fn start(&self) -> Result<(), TilecastError> {
            Ok(())
        }
        fn stop(&self) {}
        fn press(&self, _button: Button) {}
        fn release(&self, _button: Button) {}
        fn is_running(&self) -> bool {
            false
        }
        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn tick_period_from_rate() {
        let mut cfg = SessionConfig::default();
        assert_eq!(cfg.tick_period(), Duration::from_millis(50));
        cfg.render_fps = 3;
        assert_eq!(cfg.tick_period(), Duration::from_millis(333));
        cfg.render_fps = 5000;
        assert_eq!(cfg.tick_period(), Duration::from_millis(1));
    }

    #[test]
    fn validate_rejects_zero() {
        let cfg = SessionConfig {
            scale: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(TilecastError::InvalidScale(0))));

        let cfg = SessionConfig {
            render_fps: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(TilecastError::InvalidRenderRate(0))
        ));
    }

    #[test]
    fn new_rejects_mismatched_relay() {
        let backend = Arc::new(FixedBackend {
            width: 160,
            height: 144,
        });
        let relay = Arc::new(FrameRelay::new(240, 160).unwrap());
        let (surface, _rx) = crate::surface::ChannelSurface::new(1);
        let result = Session::new(
            "p1",
            backend,
            relay,
            Arc::new(surface),
            SessionConfig::default(),
        );
        assert!(matches!(
            result,
            Err(TilecastError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn new_session_is_idle() {
        let backend = Arc::new(FixedBackend {
            width: 160,
            height: 144,
        });
        let relay = Arc::new(FrameRelay::new(160, 144).unwrap());
        let (surface, _rx) = crate::surface::ChannelSurface::new(1);
        let session = Session::new(
            "p1",
            backend,
            relay,
            Arc::new(surface),
            SessionConfig::default(),
        )
        .unwrap();
        assert!(!session.is_running());
        assert_eq!(session.client(), "p1");
        assert_eq!(session.stats(), SessionStatsSnapshot::default());
    }
}
