//! Configuration for the tilecast host.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tilecast_core::{BackendKind, SessionConfig};

/// Largest accepted scale; beyond this one source pixel covers several tiles.
const MAX_SCALE: u32 = 16;
/// Sampler rates above the emulated refresh rate only resend the same frame.
const MAX_RENDER_FPS: u32 = 60;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Where and how large the display is drawn.
    pub display: DisplayConfig,
    /// Which backend feeds each session.
    pub backend: BackendConfig,
    /// Button tap handling.
    pub input: InputConfig,
    /// Session lifecycle tuning.
    pub session: SessionTuning,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Display placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// World X the display is centred on.
    pub anchor_x: f64,
    /// World Z the display is centred on.
    pub anchor_z: f64,
    /// World units per source pixel.
    pub scale: u32,
    /// Sampler rate in Hz.
    pub render_fps: u32,
}

/// Backend selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// System to emulate: "gb" or "gba".
    pub kind: BackendKind,
    /// Optional image path. A recognised extension overrides `kind`.
    pub image: String,
}

/// Input settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// How long a tapped button stays pressed, in milliseconds.
    pub hold_ms: u64,
}

/// Session lifecycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTuning {
    /// How long a stop waits for an in-flight tick, in milliseconds.
    pub stop_timeout_ms: u64,
    /// Deadline for one map-surface call, in milliseconds.
    pub surface_timeout_ms: u64,
    /// Maximum concurrent sessions (0 = unlimited).
    pub max_sessions: usize,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DisplayConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            anchor_x: session.anchor_x,
            anchor_z: session.anchor_z,
            scale: session.scale,
            render_fps: session.render_fps,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            hold_ms: tilecast_core::input::DEFAULT_HOLD.as_millis() as u64,
        }
    }
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            stop_timeout_ms: 500,
            surface_timeout_ms: 1000,
            max_sessions: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl HostConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The default configuration as TOML text.
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&Self::default())
    }

    /// Write the default configuration to a file (for bootstrapping).
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = Self::default_toml().map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Session settings with every value clamped into its valid range.
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            anchor_x: self.display.anchor_x,
            anchor_z: self.display.anchor_z,
            scale: self.display.scale.clamp(1, MAX_SCALE),
            render_fps: self.display.render_fps.clamp(1, MAX_RENDER_FPS),
            stop_timeout: Duration::from_millis(self.session.stop_timeout_ms.max(1)),
            surface_timeout: Duration::from_millis(self.session.surface_timeout_ms.max(1)),
        }
    }

    /// Backend kind, taking the image extension into account.
    pub fn backend_kind(&self) -> BackendKind {
        if self.backend.image.is_empty() {
            return self.backend.kind;
        }
        BackendKind::detect(Path::new(&self.backend.image)).unwrap_or_else(|| {
            tracing::warn!(
                "unrecognised image {}; using {}",
                self.backend.image,
                self.backend.kind.name()
            );
            self.backend.kind
        })
    }

    /// Tap hold duration.
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.input.hold_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let text = HostConfig::default_toml().unwrap();
        assert!(text.contains("[display]"));
        assert!(text.contains("render_fps"));
        assert!(text.contains("kind = \"gb\""));
        assert!(text.contains("surface_timeout_ms = 1000"));
    }

    #[test]
    fn roundtrip_config() {
        let text = toml::to_string_pretty(&HostConfig::default()).unwrap();
        let parsed = HostConfig::parse(&text).unwrap();
        assert_eq!(parsed, HostConfig::default());
        assert_eq!(parsed.input.hold_ms, 200);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = HostConfig::parse(
            r#"
            [display]
            anchor_x = -512.0
            scale = 2

            [backend]
            kind = "gba"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.display.anchor_x, -512.0);
        assert_eq!(cfg.display.scale, 2);
        assert_eq!(cfg.display.render_fps, 20);
        assert_eq!(cfg.backend_kind(), BackendKind::GameBoyAdvance);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn to_session_config_clamps() {
        let mut cfg = HostConfig::default();
        cfg.display.scale = 0;
        cfg.display.render_fps = 500;
        cfg.session.stop_timeout_ms = 0;
        cfg.session.surface_timeout_ms = 0;
        let session = cfg.to_session_config();
        assert_eq!(session.scale, 1);
        assert_eq!(session.render_fps, 60);
        assert_eq!(session.stop_timeout, Duration::from_millis(1));
        assert_eq!(session.surface_timeout, Duration::from_millis(1));
        assert!(session.validate().is_ok());
    }

    #[test]
    fn image_extension_selects_kind() {
        let mut cfg = HostConfig::default();
        cfg.backend.image = "roms/Pokemon Emerald.GBA".into();
        assert_eq!(cfg.backend_kind(), BackendKind::GameBoyAdvance);

        cfg.backend.image = "notes.txt".into();
        assert_eq!(cfg.backend_kind(), BackendKind::GameBoy);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let cfg = HostConfig::load(Path::new("/nonexistent/tilecast-host.toml"));
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn load_invalid_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("tilecast-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[display]\nscale = \"huge\"\n").unwrap();
        let cfg = HostConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn write_default_then_load() {
        let path = std::env::temp_dir().join(format!("tilecast-gen-{}.toml", std::process::id()));
        HostConfig::write_default(&path).unwrap();
        let cfg = HostConfig::load(&path);
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg, HostConfig::default());
    }
}
