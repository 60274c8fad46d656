//! RGB → RGBA conversion for backend frames.
//!
//! Backends emit 24-bit `0x00RRGGBB`; the map surface wants `0xRRGGBBAA`
//! with a fully opaque alpha byte.

/// Convert one 24-bit RGB pixel to opaque RGBA.
#[inline]
pub const fn to_rgba(rgb: u32) -> u32 {
    (rgb << 8) | 0xFF
}

/// Convert `src` into `dest`, pixel by pixel.
///
/// Converts `min(src.len(), dest.len())` pixels.
pub fn to_rgba_into(src: &[u32], dest: &mut [u32]) {
    for (d, &s) in dest.iter_mut().zip(src) {
        *d = to_rgba(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_opaque_alpha() {
        assert_eq!(to_rgba(0x00FF_0000), 0xFF00_00FF);
        assert_eq!(to_rgba(0x0012_3456), 0x1234_56FF);
        assert_eq!(to_rgba(0), 0x0000_00FF);
    }

    #[test]
    fn converts_slices() {
        let src = [0x00FF_FFFF, 0x0000_00FF];
        let mut dest = [0u32; 2];
        to_rgba_into(&src, &mut dest);
        assert_eq!(dest, [0xFFFF_FFFF, 0x0000_FFFF]);
    }
}
