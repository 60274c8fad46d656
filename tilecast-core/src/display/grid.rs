//! Tile grid geometry.
//!
//! Places a `native_width × native_height` display, magnified by an integer
//! `scale`, centred on an anchor in world coordinates, and derives:
//!
//! ```text
//!   outer grid  ┌──────────────────────────────┐  PADDING_TILES tiles of black
//!               │  inner grid ┌──────────────┐ │  tile-aligned cover of the border
//!               │             │ border       │ │  BORDER_UNITS wide, gray
//!               │             │  ┌────────┐  │ │
//!               │             │  │display │  │ │  frame pixels
//!               │             │  └────────┘  │ │
//!               │             └──────────────┘ │
//!               └──────────────────────────────┘
//! ```
//!
//! All arithmetic is integer. Tile coordinates come from flooring division
//! so negative world positions land in the enclosing tile, and the inner
//! grid's exclusive upper bound uses [`ceil_div`].

use crate::display::tile::{BORDER_UNITS, PADDING_TILES, TILE_WORLD_UNITS};
use crate::error::TilecastError;

/// Largest outer grid a renderer will track, in tiles.
pub const MAX_GRID_TILES: u64 = 1 << 22;

// ── Integer helpers ──────────────────────────────────────────────

/// Division rounding toward negative infinity.
#[inline]
pub fn floor_div(a: i32, b: i32) -> i32 {
    let q = a / b;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Division rounding toward positive infinity, `-floor_div(-a, b)`.
#[inline]
pub fn ceil_div(a: i32, b: i32) -> i32 {
    -floor_div(-a, b)
}

/// Round half up, so `-2.5` becomes `-2` and `2.5` becomes `3`.
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

// ── Zone ─────────────────────────────────────────────────────────

/// What a world position shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Inside the display rectangle: a frame pixel.
    Display,
    /// Inside the border rectangle but not the display: border colour.
    Border,
    /// Everything else: padding colour.
    Padding,
}

// ── WorldRect ────────────────────────────────────────────────────

/// Half-open rectangle in world units: `[min_x, max_x) × [min_z, max_z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldRect {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl WorldRect {
    #[inline]
    pub fn contains_x(&self, x: i32) -> bool {
        x >= self.min_x && x < self.max_x
    }

    #[inline]
    pub fn contains_z(&self, z: i32) -> bool {
        z >= self.min_z && z < self.max_z
    }

    #[inline]
    pub fn contains(&self, x: i32, z: i32) -> bool {
        self.contains_x(x) && self.contains_z(z)
    }

    fn checked_grow(self, by: i32) -> Option<Self> {
        Some(Self {
            min_x: self.min_x.checked_sub(by)?,
            min_z: self.min_z.checked_sub(by)?,
            max_x: self.max_x.checked_add(by)?,
            max_z: self.max_z.checked_add(by)?,
        })
    }
}

// ── TileRect ─────────────────────────────────────────────────────

/// Half-open rectangle of tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl TileRect {
    /// Tiles per row.
    pub fn width(&self) -> usize {
        (self.max_x - self.min_x) as usize
    }

    /// Tiles per column.
    pub fn height(&self) -> usize {
        (self.max_z - self.min_z) as usize
    }

    /// Total tile count.
    pub fn count(&self) -> usize {
        self.width() * self.height()
    }

    pub fn contains(&self, tile_x: i32, tile_z: i32) -> bool {
        tile_x >= self.min_x && tile_x < self.max_x && tile_z >= self.min_z && tile_z < self.max_z
    }

    /// Row-major index of a tile inside this rectangle.
    pub fn index_of(&self, tile_x: i32, tile_z: i32) -> Option<usize> {
        if !self.contains(tile_x, tile_z) {
            return None;
        }
        let col = (tile_x - self.min_x) as usize;
        let row = (tile_z - self.min_z) as usize;
        Some(row * self.width() + col)
    }

    /// Iterate tile coordinates row by row.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + use<> {
        let (min_x, max_x) = (self.min_x, self.max_x);
        (self.min_z..self.max_z).flat_map(move |z| (min_x..max_x).map(move |x| (x, z)))
    }

    fn checked_grow(self, by: i32) -> Option<Self> {
        Some(Self {
            min_x: self.min_x.checked_sub(by)?,
            min_z: self.min_z.checked_sub(by)?,
            max_x: self.max_x.checked_add(by)?,
            max_z: self.max_z.checked_add(by)?,
        })
    }

    /// Whether every tile's world origin plus one tile fits in `i32`.
    fn world_addressable(&self) -> bool {
        self.min_x.checked_mul(TILE_WORLD_UNITS).is_some()
            && self.min_z.checked_mul(TILE_WORLD_UNITS).is_some()
            && self.max_x.checked_mul(TILE_WORLD_UNITS).is_some()
            && self.max_z.checked_mul(TILE_WORLD_UNITS).is_some()
    }
}

// ── TileGrid ─────────────────────────────────────────────────────

/// Immutable placement of the display on the tile grid.
///
/// Built once from `(anchor, scale, native resolution)`. Anything that
/// changes those inputs needs a new grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    scale: i32,
    native_width: u32,
    native_height: u32,
    display: WorldRect,
    border: WorldRect,
    inner: TileRect,
    outer: TileRect,
}

impl TileGrid {
    /// Centre a `native_width × native_height` display at `(anchor_x, anchor_z)`.
    pub fn new(
        anchor_x: f64,
        anchor_z: f64,
        scale: u32,
        native_width: u32,
        native_height: u32,
    ) -> Result<Self, TilecastError> {
        if scale == 0 {
            return Err(TilecastError::InvalidScale(scale));
        }
        if native_width == 0 || native_height == 0 {
            return Err(TilecastError::InvalidDimensions {
                width: native_width,
                height: native_height,
            });
        }

        let scale_i = i32::try_from(scale).map_err(|_| TilecastError::InvalidScale(scale))?;
        let too_wide = || TilecastError::InvalidDimensions {
            width: native_width,
            height: native_height,
        };
        let width_i = i32::try_from(native_width).map_err(|_| too_wide())?;
        let height_i = i32::try_from(native_height).map_err(|_| too_wide())?;
        let extent_x = width_i
            .checked_mul(scale_i)
            .ok_or(TilecastError::InvalidScale(scale))?;
        let extent_z = height_i
            .checked_mul(scale_i)
            .ok_or(TilecastError::InvalidScale(scale))?;

        let out_of_range = || TilecastError::GridOutOfRange {
            anchor_x,
            anchor_z,
            scale,
        };

        let start_x = round_half_up(anchor_x)
            .checked_sub(extent_x / 2)
            .ok_or_else(out_of_range)?;
        let start_z = round_half_up(anchor_z)
            .checked_sub(extent_z / 2)
            .ok_or_else(out_of_range)?;

        let display = WorldRect {
            min_x: start_x,
            min_z: start_z,
            max_x: start_x.checked_add(extent_x).ok_or_else(out_of_range)?,
            max_z: start_z.checked_add(extent_z).ok_or_else(out_of_range)?,
        };
        let border = display.checked_grow(BORDER_UNITS).ok_or_else(out_of_range)?;

        let inner = TileRect {
            min_x: floor_div(border.min_x, TILE_WORLD_UNITS),
            min_z: floor_div(border.min_z, TILE_WORLD_UNITS),
            max_x: ceil_div(border.max_x, TILE_WORLD_UNITS),
            max_z: ceil_div(border.max_z, TILE_WORLD_UNITS),
        };
        let outer = inner
            .checked_grow(PADDING_TILES)
            .filter(TileRect::world_addressable)
            .ok_or_else(out_of_range)?;

        let tiles = outer.width() as u64 * outer.height() as u64;
        if tiles > MAX_GRID_TILES {
            return Err(TilecastError::GridTooLarge {
                tiles,
                max: MAX_GRID_TILES,
            });
        }

        Ok(Self {
            scale: scale_i,
            native_width,
            native_height,
            display,
            border,
            inner,
            outer,
        })
    }

    /// Classify a world position.
    pub fn zone_at(&self, world_x: i32, world_z: i32) -> Zone {
        if self.display.contains(world_x, world_z) {
            Zone::Display
        } else if self.border.contains(world_x, world_z) {
            Zone::Border
        } else {
            Zone::Padding
        }
    }

    /// Frame index of the source pixel shown at a display world position.
    ///
    /// Returns `None` outside the display rectangle.
    pub fn source_index(&self, world_x: i32, world_z: i32) -> Option<usize> {
        if !self.display.contains(world_x, world_z) {
            return None;
        }
        let sx = ((world_x - self.display.min_x) / self.scale) as usize;
        let sz = ((world_z - self.display.min_z) / self.scale) as usize;
        Some(sz * self.native_width as usize + sx)
    }

    /// Top-left world position of the display.
    pub fn display_start(&self) -> (i32, i32) {
        (self.display.min_x, self.display.min_z)
    }

    /// Display rectangle in world units.
    pub fn display_rect(&self) -> WorldRect {
        self.display
    }

    /// Display + border rectangle in world units.
    pub fn border_rect(&self) -> WorldRect {
        self.border
    }

    /// Tiles that cover the display and border.
    pub fn inner(&self) -> TileRect {
        self.inner
    }

    /// Inner grid plus padding.
    pub fn outer(&self) -> TileRect {
        self.outer
    }

    pub fn inner_tile_count(&self) -> usize {
        self.inner.count()
    }

    pub fn outer_tile_count(&self) -> usize {
        self.outer.count()
    }

    /// Tiles in the outer grid that are not part of the inner grid.
    pub fn padding_tile_count(&self) -> usize {
        self.outer.count() - self.inner.count()
    }

    /// World units per source pixel.
    pub fn scale(&self) -> u32 {
        self.scale as u32
    }

    pub fn native_width(&self) -> u32 {
        self.native_width
    }

    pub fn native_height(&self) -> u32 {
        self.native_height
    }

    /// Expected frame length in pixels.
    pub fn pixel_count(&self) -> usize {
        self.native_width as usize * self.native_height as usize
    }
}

// ── Tests ────────────────────────────────────────────────────────
