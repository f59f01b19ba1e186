//! Premultiplied-alpha conversions
//!
//! Backends hand back straight coverage; textures want premultiplied pixels.
//! The rounding and short-circuit rules here are shared by every backend so
//! text looks identical no matter who rasterized it.

use crate::backend::Coverage;
use glint_core::DataFormat;

/// 8-bit alpha to RGBA4444: the top four bits replicated into every channel
pub fn alpha_to_premul_4444(v: u8) -> u16 {
    let mut v = ((v as u16) >> 4) & 0x0F;
    v |= v << 4;
    v |= v << 8;
    v
}

/// 8-bit alpha to RGBA8888: the value replicated into every channel
pub fn alpha_to_premul_8888(v: u8) -> u32 {
    let mut v = v as u32;
    v |= v << 8;
    v |= v << 16;
    v
}

/// Straight `0xAARRGGBB` to premultiplied `0xAARRGGBB`
pub fn rgba_to_premul_8888(v: u32) -> u32 {
    let a = (v >> 24) & 0xFF;
    if a == 0xFF {
        return v;
    }
    if a == 0 {
        return 0;
    }
    let r = (v >> 16) & 0xFF;
    let g = (v >> 8) & 0xFF;
    let b = v & 0xFF;
    let r = (r * a + 127) / 255;
    let g = (g * a + 127) / 255;
    let b = (b * a + 127) / 255;
    (a << 24) | (r << 16) | (g << 8) | b
}

/// Convert backend coverage into upload-ready texture bytes.
///
/// Color coverage is only representable as [`DataFormat::Rgba8888`]; asking
/// for another format with color input drops the color and keeps alpha.
pub fn convert_coverage(coverage: &Coverage, format: DataFormat) -> Vec<u8> {
    match (coverage, format) {
        (Coverage::Alpha(px), DataFormat::R8Unorm) => px.clone(),
        (Coverage::Alpha(px), DataFormat::Rgba4444) => px
            .iter()
            .flat_map(|&a| alpha_to_premul_4444(a).to_le_bytes())
            .collect(),
        (Coverage::Alpha(px), DataFormat::Rgba8888) => px
            .iter()
            .flat_map(|&a| alpha_to_premul_8888(a).to_le_bytes())
            .collect(),
        (Coverage::Rgba(px), DataFormat::Rgba8888) => px
            .iter()
            .flat_map(|&c| {
                let p = rgba_to_premul_8888(c);
                // Texture memory order is R, G, B, A
                [(p >> 16) as u8, (p >> 8) as u8, p as u8, (p >> 24) as u8]
            })
            .collect(),
        (Coverage::Rgba(px), format) => {
            let alpha = Coverage::Alpha(px.iter().map(|&c| (c >> 24) as u8).collect());
            convert_coverage(&alpha, format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_premul(v: u32) -> u32 {
        let a = v >> 24;
        let ch = |shift: u32| (((v >> shift) & 0xFF) * a + 127) / 255;
        (a << 24) | (ch(16) << 16) | (ch(8) << 8) | ch(0)
    }

    #[test]
    fn test_rgba_opaque_passthrough() {
        assert_eq!(rgba_to_premul_8888(0xFF11_2233), 0xFF11_2233);
        assert_eq!(rgba_to_premul_8888(0xFFFF_FFFF), 0xFFFF_FFFF);
    }

    #[test]
    fn test_rgba_transparent_is_zero() {
        assert_eq!(rgba_to_premul_8888(0x0011_2233), 0);
        assert_eq!(rgba_to_premul_8888(0x00FF_FFFF), 0);
    }

    #[test]
    fn test_rgba_known_values() {
        // (c * 128 + 127) / 255 for 0x80, 0x40, 0x20
        assert_eq!(rgba_to_premul_8888(0x8080_4020), 0x8040_2010);
        assert_eq!(rgba_to_premul_8888(0x80FF_FFFF), 0x8080_8080);
        assert_eq!(rgba_to_premul_8888(0x01FF_FFFF), 0x0101_0101);
        assert_eq!(rgba_to_premul_8888(0xFE01_0203), 0xFE01_0203);

        for v in [0x8080_4020u32, 0x7F12_3456, 0x3300_FF80, 0xC0AB_CDEF, 0x0A0A_0A0A] {
            assert_eq!(rgba_to_premul_8888(v), reference_premul(v), "{:08x}", v);
        }
    }

    #[test]
    fn test_alpha_to_4444() {
        assert_eq!(alpha_to_premul_4444(0xFF), 0xFFFF);
        assert_eq!(alpha_to_premul_4444(0x0F), 0x0000);
        assert_eq!(alpha_to_premul_4444(0x80), 0x8888);
        assert_eq!(alpha_to_premul_4444(0x00), 0x0000);
    }

    #[test]
    fn test_alpha_to_8888() {
        assert_eq!(alpha_to_premul_8888(0xFF), 0xFFFF_FFFF);
        assert_eq!(alpha_to_premul_8888(0x80), 0x8080_8080);
        assert_eq!(alpha_to_premul_8888(0x00), 0);
    }

    #[test]
    fn test_convert_coverage_sizes() {
        let alpha = Coverage::Alpha(vec![0x00, 0x80, 0xFF]);
        assert_eq!(convert_coverage(&alpha, DataFormat::R8Unorm), vec![0x00, 0x80, 0xFF]);
        assert_eq!(convert_coverage(&alpha, DataFormat::Rgba4444).len(), 6);
        assert_eq!(
            convert_coverage(&alpha, DataFormat::Rgba8888),
            vec![0, 0, 0, 0, 0x80, 0x80, 0x80, 0x80, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_convert_color_coverage() {
        let color = Coverage::Rgba(vec![0xFF11_2233, 0x8080_4020]);
        assert_eq!(
            convert_coverage(&color, DataFormat::Rgba8888),
            vec![0x11, 0x22, 0x33, 0xFF, 0x40, 0x20, 0x10, 0x80]
        );
        assert_eq!(convert_coverage(&color, DataFormat::R8Unorm), vec![0xFF, 0x80]);
    }
}
