//! Tile types and the fixed constants of the map surface.
//!
//! A map tile covers [`TILE_WORLD_UNITS`] world units per side and is drawn
//! at [`PIXELS_PER_UNIT`] image pixels per world unit; the client stretches
//! whatever image it receives over the tile's area.

// ── Constants ────────────────────────────────────────────────────

/// World units covered by one tile side (fixed by the host surface).
pub const TILE_WORLD_UNITS: i32 = 32;

/// Image pixels per world unit.
pub const PIXELS_PER_UNIT: i32 = 2;

/// Image pixels per tile side.
pub const TILE_IMAGE_SIZE: usize = (TILE_WORLD_UNITS * PIXELS_PER_UNIT) as usize;

/// Pixels in one full-resolution tile image.
pub const TILE_IMAGE_PIXELS: usize = TILE_IMAGE_SIZE * TILE_IMAGE_SIZE;

/// Width of the frame drawn around the display, in world units.
pub const BORDER_UNITS: i32 = 5;

/// Tiles of constant padding around the display + border on every side.
pub const PADDING_TILES: i32 = 8;

/// Dark gray frame colour (RGBA).
pub const BORDER_COLOR: u32 = 0x2A2A_2AFF;

/// Opaque black (RGBA), used for padding and anything outside the border.
pub const PADDING_COLOR: u32 = 0x0000_00FF;

// ── TileImage ────────────────────────────────────────────────────

/// An RGBA image destined for one map tile.
///
/// Pixels are `0xRRGGBBAA`, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// `width * height` RGBA pixels.
    pub pixels: Vec<u32>,
}

impl TileImage {
    /// Full-resolution tile image copied from `pixels`.
    pub fn full(pixels: &[u32]) -> Self {
        debug_assert_eq!(pixels.len(), TILE_IMAGE_PIXELS);
        Self {
            width: TILE_IMAGE_SIZE as u32,
            height: TILE_IMAGE_SIZE as u32,
            pixels: pixels.to_vec(),
        }
    }

    /// A 1×1 image the client stretches over the whole tile.
    pub fn solid(color: u32) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
        }
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y * self.width + x) as usize]
    }
}

// ── MapTile ──────────────────────────────────────────────────────

/// One tile to transmit: absolute grid coordinates plus its image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapTile {
    pub tile_x: i32,
    pub tile_z: i32,
    pub image: TileImage,
}

// ── Tests ────────────────────────────────────────────────────────
