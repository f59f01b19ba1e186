//! Platform raster backends
//!
//! A [`RasterBackend`] is the only part of the text stack that touches a font
//! library. It resolves fonts, measures strings and rasterizes whole strings
//! into CPU bitmaps. Caching, color conversion, wrapping and GPU upload are
//! shared code in [`TextDrawer`](crate::TextDrawer).

mod swash;

pub use self::swash::SwashBackend;

use crate::config::TextConfig;
use crate::font::FontKey;
use crate::Result;
use glint_core::Align;

/// Backend-side face identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceId(pub u32);

/// Unscaled string metrics in backend pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
    /// Extra inter-line spacing; zero on most backends
    pub leading: f32,
}

/// Pixel coverage produced by a backend
#[derive(Debug, Clone, PartialEq)]
pub enum Coverage {
    /// One byte of coverage per pixel, for single-color text
    Alpha(Vec<u8>),
    /// Straight (non-premultiplied) color per pixel, packed `0xAARRGGBB`
    Rgba(Vec<u32>),
}

impl Coverage {
    pub fn pixel_count(&self) -> usize {
        match self {
            Coverage::Alpha(p) => p.len(),
            Coverage::Rgba(p) => p.len(),
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Coverage::Rgba(_))
    }
}

/// A rasterized string
///
/// `width`/`height` describe the logical text box; `bm_width`/`bm_height`
/// describe the backing bitmap, which may be padded.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBitmap {
    pub width: u32,
    pub height: u32,
    pub bm_width: u32,
    pub bm_height: u32,
    pub coverage: Coverage,
}

impl RasterBitmap {
    /// Zero-size bitmap, used when there is nothing to draw
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            bm_width: 0,
            bm_height: 0,
            coverage: Coverage::Alpha(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bm_width == 0 || self.bm_height == 0
    }

    /// Backing bitmap covers the text box and holds exactly one value per pixel
    pub fn is_well_formed(&self) -> bool {
        self.bm_width >= self.width
            && self.bm_height >= self.height
            && self.coverage.pixel_count() == (self.bm_width as usize) * (self.bm_height as usize)
    }
}

/// Font resolution, measurement and rasterization for one platform
pub trait RasterBackend: Send {
    /// False while the backend is still loading its font set
    fn is_ready(&self) -> bool {
        true
    }

    /// Resolve a font for the given DPI scale. Text is rasterized at
    /// `key.size / dpi_scale` pixels.
    fn load_font(&mut self, key: &FontKey, dpi_scale: f32) -> Result<FaceId>;

    /// Measure a string in backend pixels. Unknown faces measure as zero.
    fn measure(&mut self, face: FaceId, text: &str) -> TextMetrics;

    /// Rasterize a string. Multi-line text is justified inside the bitmap
    /// according to the horizontal bits of `align`. With `full_color` the
    /// backend returns [`Coverage::Rgba`] and keeps glyph colors (emoji);
    /// otherwise it returns an alpha mask.
    fn rasterize(
        &mut self,
        face: FaceId,
        text: &str,
        align: Align,
        full_color: bool,
    ) -> Result<RasterBitmap>;

    /// Whether `rasterize(.., full_color = true)` can produce colored glyphs
    fn supports_color_emoji(&self) -> bool;

    /// Drop every resolved face. Faces must be loaded again before use.
    fn clear_fonts(&mut self);
}

/// Pick the backend for the current platform
pub fn create_backend(config: &TextConfig) -> Box<dyn RasterBackend> {
    tracing::debug!("Creating swash raster backend");
    Box::new(SwashBackend::new(config.bitmap_padding))
}

/// Round `value` up to a multiple of `padding` (no-op for padding <= 1)
pub(crate) fn pad_to(value: u32, padding: u32) -> u32 {
    if padding <= 1 {
        return value;
    }
    value.div_ceil(padding) * padding
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_to() {
        assert_eq!(pad_to(0, 4), 0);
        assert_eq!(pad_to(1, 4), 4);
        assert_eq!(pad_to(8, 4), 8);
        assert_eq!(pad_to(9, 4), 12);
        assert_eq!(pad_to(9, 1), 9);
    }

    #[test]
    fn test_well_formed() {
        let bitmap = RasterBitmap {
            width: 3,
            height: 2,
            bm_width: 4,
            bm_height: 4,
            coverage: Coverage::Alpha(vec![0; 16]),
        };
        assert!(bitmap.is_well_formed());
        assert!(!bitmap.is_empty());

        let short = RasterBitmap {
            coverage: Coverage::Alpha(vec![0; 15]),
            ..bitmap.clone()
        };
        assert!(!short.is_well_formed());

        let undersized = RasterBitmap {
            width: 5,
            ..bitmap
        };
        assert!(!undersized.is_well_formed());
        assert!(RasterBitmap::empty().is_empty());
    }
}
