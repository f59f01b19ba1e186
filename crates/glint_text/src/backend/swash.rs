//! System raster backend: fontdb discovery, rustybuzz shaping, swash rendering
//!
//! Whole strings are rasterized into one bitmap. Each line is shaped
//! separately, glyphs are rendered with swash and blitted at their pen
//! positions. Alpha-mask mode keeps only coverage; full-color mode keeps
//! color glyph pixels (emoji) and draws outline glyphs in white so the draw
//! tint still applies.
//!
//! Emoji the selected face has no glyph for are taken from the system emoji
//! font, resolved on first use.

use super::{pad_to, Coverage, FaceId, RasterBackend, RasterBitmap, TextMetrics};
use crate::emoji::{contains_emoji, is_emoji};
use crate::font::FontKey;
use crate::system_fonts::{global_system_fonts, FontFace, GenericFont, SystemFonts};
use crate::{Result, TextError};
use glint_core::Align;
use std::sync::{Arc, OnceLock};
use swash::scale::image::Content;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;

/// Smallest DPI scale honored when sizing fonts
const MIN_DPI_SCALE: f32 = 0.1;

struct LoadedFace {
    face: Arc<FontFace>,
    /// Rasterization size in pixels (requested size divided by DPI scale)
    px_size: f32,
}

/// Face a shaped glyph is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GlyphSource {
    Primary,
    Emoji,
}

/// One shaped glyph, positioned relative to the line origin
#[derive(Debug, Clone, Copy)]
struct LineGlyph {
    glyph_id: u16,
    source: GlyphSource,
    x: f32,
    y: f32,
}

struct ShapedLine {
    glyphs: Vec<LineGlyph>,
    advance: f32,
}

/// Vertical metrics in pixels
#[derive(Debug, Clone, Copy)]
struct LineMetrics {
    ascent: f32,
    line_height: f32,
}

/// Raster backend built on the shared system font database
pub struct SwashBackend {
    fonts: Arc<SystemFonts>,
    faces: Vec<LoadedFace>,
    /// Color emoji fallback (None = no emoji font installed)
    emoji: OnceLock<Option<Arc<FontFace>>>,
    scale_context: ScaleContext,
    padding: u32,
}

impl SwashBackend {
    /// Backend over the process-wide system font database
    pub fn new(padding: u32) -> Self {
        Self::with_fonts(global_system_fonts(), padding)
    }

    /// Backend over a specific font database (bundled fonts, tests)
    pub fn with_fonts(fonts: Arc<SystemFonts>, padding: u32) -> Self {
        Self {
            fonts,
            faces: Vec::new(),
            emoji: OnceLock::new(),
            scale_context: ScaleContext::new(),
            padding,
        }
    }

    fn line_metrics(face: &LoadedFace) -> Option<LineMetrics> {
        let font = swash::FontRef::from_index(face.face.data(), face.face.face_index() as usize)?;
        let metrics = font.metrics(&[]).scale(face.px_size);
        Some(LineMetrics {
            ascent: metrics.ascent,
            line_height: (metrics.ascent + metrics.descent + metrics.leading).ceil(),
        })
    }

    fn emoji_face(&self) -> Option<Arc<FontFace>> {
        self.emoji
            .get_or_init(|| match self.fonts.resolve_generic(GenericFont::Emoji, 400, false) {
                Ok(face) if swash::FontRef::from_index(face.data(), face.face_index() as usize).is_some() => {
                    tracing::debug!("Using {} for emoji", face.family_name());
                    Some(face)
                }
                Ok(face) => {
                    tracing::warn!("swash cannot read emoji font {}", face.family_name());
                    None
                }
                Err(e) => {
                    tracing::debug!("No emoji font available: {}", e);
                    None
                }
            })
            .clone()
    }

    fn shape_line(face: &LoadedFace, emoji: Option<&FontFace>, line: &str) -> ShapedLine {
        let Some(rb_face) =
            rustybuzz::Face::from_slice(face.face.data(), face.face.face_index())
        else {
            return ShapedLine {
                glyphs: Vec::new(),
                advance: 0.0,
            };
        };
        // Only parsed when the line has emoji the primary face may lack
        let emoji_face = emoji
            .filter(|_| contains_emoji(line))
            .and_then(|e| ttf_parser::Face::parse(e.data(), e.face_index()).ok());

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(line);
        let output = rustybuzz::shape(&rb_face, &[], buffer);
        let scale = face.px_size / rb_face.units_per_em() as f32;

        let mut pen = 0.0f32;
        let mut glyphs = Vec::with_capacity(output.len());
        for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
            // Glyph 0 is .notdef: the primary face has nothing for this char
            let fallback = (info.glyph_id == 0)
                .then(|| line.get(info.cluster as usize..)?.chars().next())
                .flatten()
                .filter(|&c| is_emoji(c))
                .and_then(|c| {
                    let emoji_face = emoji_face.as_ref()?;
                    let gid = emoji_face.glyph_index(c)?;
                    let advance = emoji_face.glyph_hor_advance(gid)?;
                    Some((gid, advance as f32 * face.px_size / emoji_face.units_per_em() as f32))
                });

            match fallback {
                Some((gid, advance)) => {
                    glyphs.push(LineGlyph {
                        glyph_id: gid.0,
                        source: GlyphSource::Emoji,
                        x: pen,
                        y: 0.0,
                    });
                    pen += advance;
                }
                None => {
                    glyphs.push(LineGlyph {
                        glyph_id: info.glyph_id as u16,
                        source: GlyphSource::Primary,
                        x: pen + pos.x_offset as f32 * scale,
                        y: -(pos.y_offset as f32) * scale,
                    });
                    pen += pos.x_advance as f32 * scale;
                }
            }
        }

        ShapedLine {
            glyphs,
            advance: pen,
        }
    }

    fn face(&self, face: FaceId) -> Option<&LoadedFace> {
        self.faces.get(face.0 as usize)
    }
}

/// Destination pixels for one rasterized string
enum Canvas {
    Alpha(Vec<u8>),
    Rgba(Vec<u32>),
}

impl Canvas {
    fn put_coverage(&mut self, idx: usize, alpha: u8) {
        match self {
            Canvas::Alpha(px) => px[idx] = px[idx].max(alpha),
            Canvas::Rgba(px) => {
                if alpha as u32 > px[idx] >> 24 {
                    px[idx] = ((alpha as u32) << 24) | 0x00FF_FFFF;
                }
            }
        }
    }

    fn put_color(&mut self, idx: usize, rgba: &[u8]) {
        let [r, g, b, a] = [rgba[0], rgba[1], rgba[2], rgba[3]];
        match self {
            Canvas::Alpha(px) => px[idx] = px[idx].max(a),
            Canvas::Rgba(px) => {
                if a as u32 > px[idx] >> 24 {
                    px[idx] = u32::from_be_bytes([a, r, g, b]);
                }
            }
        }
    }

    fn into_coverage(self) -> Coverage {
        match self {
            Canvas::Alpha(px) => Coverage::Alpha(px),
            Canvas::Rgba(px) => Coverage::Rgba(px),
        }
    }

    /// Copy a rendered glyph with its origin at (`origin_x`, `origin_y`)
    fn blit(&mut self, image: &swash::scale::image::Image, origin_x: f32, origin_y: f32, width: u32, height: u32) {
        let left = origin_x.round() as i32 + image.placement.left;
        let top = origin_y.round() as i32 - image.placement.top;
        let gw = image.placement.width as i32;
        let gh = image.placement.height as i32;

        for gy in 0..gh {
            let y = top + gy;
            if y < 0 || y >= height as i32 {
                continue;
            }
            for gx in 0..gw {
                let x = left + gx;
                if x < 0 || x >= width as i32 {
                    continue;
                }
                let dst = y as usize * width as usize + x as usize;
                let src = (gy * gw + gx) as usize;
                match image.content {
                    Content::Mask => self.put_coverage(dst, image.data[src]),
                    Content::Color => self.put_color(dst, &image.data[src * 4..src * 4 + 4]),
                    Content::SubpixelMask => {
                        // Average the three coverage channels
                        let px = &image.data[src * 4..src * 4 + 3];
                        let avg = (px[0] as u16 + px[1] as u16 + px[2] as u16) / 3;
                        self.put_coverage(dst, avg as u8);
                    }
                }
            }
        }
    }
}

impl RasterBackend for SwashBackend {
    fn load_font(&mut self, key: &FontKey, dpi_scale: f32) -> Result<FaceId> {
        let face = self
            .fonts
            .resolve(&key.name, key.flags.weight(), key.flags.italic())?;

        if swash::FontRef::from_index(face.data(), face.face_index() as usize).is_none() {
            return Err(TextError::InvalidFontData(format!(
                "swash cannot read {}",
                face.family_name()
            )));
        }

        let px_size = key.size as f32 / dpi_scale.max(MIN_DPI_SCALE);
        tracing::debug!(
            "Loaded face {} for {} at {:.1}px",
            face.family_name(),
            key.name,
            px_size
        );

        let id = FaceId(self.faces.len() as u32);
        self.faces.push(LoadedFace { face, px_size });
        Ok(id)
    }

    fn measure(&mut self, face: FaceId, text: &str) -> TextMetrics {
        let emoji = self.emoji_face();
        let Some(face) = self.face(face) else {
            return TextMetrics::default();
        };
        let Some(metrics) = Self::line_metrics(face) else {
            return TextMetrics::default();
        };

        let mut width = 0.0f32;
        let mut lines = 0;
        for line in text.split('\n') {
            width = width.max(Self::shape_line(face, emoji.as_deref(), line).advance);
            lines += 1;
        }

        TextMetrics {
            width: width.ceil(),
            height: metrics.line_height * lines as f32,
            leading: 0.0,
        }
    }

    fn rasterize(
        &mut self,
        face: FaceId,
        text: &str,
        align: Align,
        full_color: bool,
    ) -> Result<RasterBitmap> {
        let emoji = self.emoji_face();
        let loaded = self
            .faces
            .get(face.0 as usize)
            .ok_or_else(|| TextError::Rasterization(format!("unknown face {:?}", face)))?;
        let metrics = Self::line_metrics(loaded)
            .ok_or_else(|| TextError::InvalidFontData(loaded.face.family_name().to_string()))?;

        let lines: Vec<ShapedLine> = text
            .split('\n')
            .map(|line| Self::shape_line(loaded, emoji.as_deref(), line))
            .collect();
        let width = lines.iter().map(|l| l.advance).fold(0.0f32, f32::max).ceil() as u32;
        let height = (metrics.line_height * lines.len() as f32).ceil() as u32;
        if width == 0 || height == 0 {
            return Ok(RasterBitmap::empty());
        }

        let bm_width = pad_to(width, self.padding);
        let bm_height = pad_to(height, self.padding);
        let pixel_count = bm_width as usize * bm_height as usize;
        let mut canvas = if full_color {
            Canvas::Rgba(vec![0; pixel_count])
        } else {
            Canvas::Alpha(vec![0; pixel_count])
        };

        // Glyph origins in bitmap space, justified per line
        let horizontal = align.horizontal();
        let mut placed: Vec<(LineGlyph, f32, f32)> = Vec::new();
        for (line_index, line) in lines.iter().enumerate() {
            let line_x = if horizontal.contains(Align::HCENTER) {
                ((width as f32 - line.advance) / 2.0).floor()
            } else if horizontal.contains(Align::RIGHT) {
                width as f32 - line.advance
            } else {
                0.0
            };
            let baseline = line_index as f32 * metrics.line_height + metrics.ascent;
            placed.extend(
                line.glyphs
                    .iter()
                    .map(|g| (*g, line_x + g.x, baseline + g.y)),
            );
        }

        let sources: &[Source] = if full_color {
            &[
                Source::ColorOutline(0),
                Source::ColorBitmap(StrikeWith::BestFit),
                Source::Outline,
            ]
        } else {
            &[Source::Outline, Source::Bitmap(StrikeWith::BestFit)]
        };
        let mut render = Render::new(sources);
        render.format(Format::Alpha);

        // One scaler per face; the scale context hands out one at a time
        for (source, font_face) in [
            (GlyphSource::Primary, Some(&loaded.face)),
            (GlyphSource::Emoji, emoji.as_ref()),
        ] {
            let Some(font_face) = font_face else {
                continue;
            };
            if !placed.iter().any(|(g, _, _)| g.source == source) {
                continue;
            }
            let font = swash::FontRef::from_index(font_face.data(), font_face.face_index() as usize)
                .ok_or_else(|| TextError::InvalidFontData(font_face.family_name().to_string()))?;
            let mut scaler = self
                .scale_context
                .builder(font)
                .size(loaded.px_size)
                .hint(true)
                .build();

            for (glyph, x, y) in placed.iter().filter(|(g, _, _)| g.source == source) {
                if let Some(image) = render.render(&mut scaler, glyph.glyph_id) {
                    canvas.blit(&image, *x, *y, bm_width, bm_height);
                }
            }
        }

        Ok(RasterBitmap {
            width,
            height,
            bm_width,
            bm_height,
            coverage: canvas.into_coverage(),
        })
    }

    fn supports_color_emoji(&self) -> bool {
        self.emoji_face().is_some()
    }

    fn clear_fonts(&mut self) {
        self.faces.clear();
        self.emoji.take();
        self.fonts.clear_faces();
    }
}
