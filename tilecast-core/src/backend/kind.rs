//! Backend variants and their buttons.

use std::path::Path;
use std::time::Duration;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ── Button ───────────────────────────────────────────────────────

/// Abstract controller button shared by all backends.
///
/// Handheld backends use `Up` through `Start`; `L` and `R` are the shoulder
/// buttons of the advance variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Select,
    Start,
    L,
    R,
}

impl Button {
    /// Every button, in declaration order.
    pub const ALL: [Button; 10] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::L,
        Button::R,
    ];
}

// ── ButtonSet ────────────────────────────────────────────────────

bitflags! {
    /// A set of currently held buttons.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonSet: u16 {
        const UP     = 1 << 0;
        const DOWN   = 1 << 1;
        const LEFT   = 1 << 2;
        const RIGHT  = 1 << 3;
        const A      = 1 << 4;
        const B      = 1 << 5;
        const SELECT = 1 << 6;
        const START  = 1 << 7;
        const L      = 1 << 8;
        const R      = 1 << 9;
    }
}

impl From<Button> for ButtonSet {
    fn from(button: Button) -> Self {
        match button {
            Button::Up => ButtonSet::UP,
            Button::Down => ButtonSet::DOWN,
            Button::Left => ButtonSet::LEFT,
            Button::Right => ButtonSet::RIGHT,
            Button::A => ButtonSet::A,
            Button::B => ButtonSet::B,
            Button::Select => ButtonSet::SELECT,
            Button::Start => ButtonSet::START,
            Button::L => ButtonSet::L,
            Button::R => ButtonSet::R,
        }
    }
}

// ── BackendKind ──────────────────────────────────────────────────

/// The emulated systems tilecast knows how to size for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum BackendKind {
    /// 160×144 handheld.
    #[default]
    #[serde(rename = "gb")]
    GameBoy,
    /// 240×160 handheld with shoulder buttons.
    #[serde(rename = "gba")]
    GameBoyAdvance,
}

impl BackendKind {
    /// Native display width in pixels.
    pub const fn width(self) -> u32 {
        match self {
            BackendKind::GameBoy => 160,
            BackendKind::GameBoyAdvance => 240,
        }
    }

    /// Native display height in pixels.
    pub const fn height(self) -> u32 {
        match self {
            BackendKind::GameBoy => 144,
            BackendKind::GameBoyAdvance => 160,
        }
    }

    /// Real-time duration of one emulated frame (~59.73 Hz for both).
    pub const fn frame_interval(self) -> Duration {
        match self {
            BackendKind::GameBoy | BackendKind::GameBoyAdvance => Duration::from_nanos(16_742_706),
        }
    }

    /// Whether this system has `button`. Unsupported buttons are ignored
    /// by backends of this kind.
    pub const fn supports(self, button: Button) -> bool {
        match self {
            BackendKind::GameBoy => !matches!(button, Button::L | Button::R),
            BackendKind::GameBoyAdvance => true,
        }
    }

    /// Short display name.
    pub const fn name(self) -> &'static str {
        match self {
            BackendKind::GameBoy => "gb",
            BackendKind::GameBoyAdvance => "gba",
        }
    }

    /// Guess the kind from an image file's extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "gb" | "gbc" => Some(BackendKind::GameBoy),
            "gba" | "agb" => Some(BackendKind::GameBoyAdvance),
            _ => None,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
