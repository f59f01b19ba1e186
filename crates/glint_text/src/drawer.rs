//! Cached text drawing
//!
//! [`TextDrawer`] owns the raster backend, the font registry and both string
//! caches. Strings are measured and rasterized whole; each rasterized string
//! lives in its own texture until it goes unused for `eviction_age` frames.
//!
//! The drawer never owns the GPU. Every call that may create or release a
//! texture takes the embedder's [`DrawContext`].

use crate::backend::{create_backend, FaceId, RasterBackend, RasterBitmap};
use crate::cache::{CacheKey, FrameCache, MeasureEntry, StringEntry};
use crate::config::TextConfig;
use crate::emoji::contains_emoji;
use crate::font::{FontFlags, FontHandle, FontKey};
use crate::premul::convert_coverage;
use crate::registry::FontHandleRegistry;
use crate::wrap::{MeasureWidth, WordWrapper};
use crate::Result;
use glint_core::{Align, Color, DataFormat, DrawBuffer, DrawContext, Point, Rect, TextureDesc};

/// Debug label for string textures
const TEXTURE_TAG: &str = "TextDrawer";

/// A string rasterized to CPU memory in a texture-ready format
#[derive(Debug, Clone, PartialEq)]
pub struct TextBitmap {
    /// Logical text box
    pub width: u32,
    pub height: u32,
    /// Backing bitmap (padded)
    pub bm_width: u32,
    pub bm_height: u32,
    pub format: DataFormat,
    /// `bm_width * bm_height * format.bytes_per_pixel()` bytes, premultiplied
    pub data: Vec<u8>,
}

/// Pick the upload format for a new string texture.
///
/// Color strings need RGBA8888. Alpha-mask strings use the smallest format
/// the context can sample: R8, then RGBA4444, then RGBA8888.
pub fn select_format(draw: &dyn DrawContext, full_color: bool) -> DataFormat {
    if full_color {
        DataFormat::Rgba8888
    } else if draw.supports_format(DataFormat::R8Unorm) {
        DataFormat::R8Unorm
    } else if draw.supports_format(DataFormat::Rgba4444) {
        DataFormat::Rgba4444
    } else {
        DataFormat::Rgba8888
    }
}

/// Measures, rasterizes and caches strings for one rendering context
pub struct TextDrawer {
    backend: Box<dyn RasterBackend>,
    config: TextConfig,
    registry: FontHandleRegistry,
    /// Rasterized strings, each owning a texture
    cache: FrameCache<StringEntry>,
    /// Measured strings, in backend pixels
    size_cache: FrameCache<MeasureEntry>,
    current_font: Option<FontHandle>,
    /// Cache-key discriminant of the current font (0 before any font is set)
    font_hash: u32,
    frame_count: u32,
    font_scale_x: f32,
    font_scale_y: f32,
    dpi_scale: f32,
    display_dpi_scale: f32,
    ignore_global_dpi: bool,
}

impl TextDrawer {
    pub fn new(backend: Box<dyn RasterBackend>, config: TextConfig) -> Self {
        Self {
            backend,
            config,
            registry: FontHandleRegistry::new(),
            cache: FrameCache::new(),
            size_cache: FrameCache::new(),
            current_font: None,
            font_hash: 0,
            frame_count: 0,
            font_scale_x: 1.0,
            font_scale_y: 1.0,
            dpi_scale: 1.0,
            display_dpi_scale: 1.0,
            ignore_global_dpi: false,
        }
    }

    /// Drawer over the platform backend chosen by [`create_backend`]
    pub fn with_config(config: TextConfig) -> Self {
        let backend = create_backend(&config);
        Self::new(backend, config)
    }

    pub fn config(&self) -> &TextConfig {
        &self.config
    }

    /// False while the backend is still loading fonts
    pub fn is_ready(&self) -> bool {
        self.backend.is_ready()
    }

    // ========== Fonts ==========

    /// Resolve a font and make it current.
    ///
    /// The returned handle can be passed to [`set_font_handle`](Self::set_font_handle)
    /// later. On failure the current font is unchanged.
    pub fn set_font(&mut self, name: &str, size: u32, flags: FontFlags) -> Result<FontHandle> {
        let key = FontKey::new(name, size, flags);
        let handle = self
            .registry
            .resolve(key, self.dpi_scale, self.backend.as_mut())?;
        self.select(handle);
        Ok(handle)
    }

    /// [`set_font`](Self::set_font), falling back to the configured default
    /// font when the request cannot be satisfied
    pub fn set_font_or_default(
        &mut self,
        name: &str,
        size: u32,
        flags: FontFlags,
    ) -> Option<FontHandle> {
        if let Ok(handle) = self.set_font(name, size, flags) {
            return Some(handle);
        }

        let default_font = self.config.default_font.clone();
        let default_size = self.config.default_font_size;
        self.set_font(&default_font, size, flags)
            .or_else(|_| self.set_font(&default_font, default_size, FontFlags::empty()))
            .ok()
    }

    /// Reselect a previously resolved font. Returns false for handles this
    /// drawer never issued.
    pub fn set_font_handle(&mut self, handle: FontHandle) -> bool {
        if self.registry.get(handle).is_none() {
            tracing::warn!("Unknown font handle {}", handle.get());
            return false;
        }
        self.select(handle);
        true
    }

    fn select(&mut self, handle: FontHandle) {
        if let Some(font) = self.registry.get(handle) {
            self.font_hash = font.hash;
            self.current_font = Some(handle);
        }
    }

    pub fn current_font(&self) -> Option<FontHandle> {
        self.current_font
    }

    pub fn font_hash(&self) -> u32 {
        self.font_hash
    }

    fn current_face(&self) -> Option<FaceId> {
        self.current_font
            .and_then(|handle| self.registry.get(handle))
            .and_then(|font| font.face)
    }

    // ========== Scale ==========

    pub fn set_font_scale(&mut self, x: f32, y: f32) {
        self.font_scale_x = x;
        self.font_scale_y = y;
    }

    /// Display DPI scale reported by the embedder. Takes effect on the next
    /// [`once_per_frame`](Self::once_per_frame).
    pub fn set_display_dpi_scale(&mut self, scale: f32) {
        self.display_dpi_scale = scale;
    }

    /// Pin the DPI scale, ignoring the display value from now on.
    ///
    /// Cached strings keep the dimensions they were rasterized with; call
    /// this before drawing or follow it with [`clear_cache`](Self::clear_cache).
    pub fn set_forced_dpi_scale(&mut self, dpi: f32) {
        self.ignore_global_dpi = true;
        if dpi != self.dpi_scale {
            self.dpi_scale = dpi;
            self.reload_fonts();
        }
    }

    /// DPI scale text should be rasterized for. Never above 1.0 unless forced.
    pub fn calculate_dpi_scale(&self) -> f32 {
        if self.ignore_global_dpi {
            return self.dpi_scale;
        }
        self.display_dpi_scale.min(1.0)
    }

    pub fn dpi_scale(&self) -> f32 {
        self.dpi_scale
    }

    fn reload_fonts(&mut self) {
        self.backend.clear_fonts();
        self.registry.reload(self.dpi_scale, self.backend.as_mut());
    }

    // ========== Measurement ==========

    /// Size of a single string in the current font, scaled
    pub fn measure_string(&mut self, text: &str) -> (f32, f32) {
        let key = CacheKey::measure(self.font_hash, text);
        let frame = self.frame_count;

        let (width, height) = if let Some(entry) = self.size_cache.get_mut(&key) {
            entry.last_used_frame = frame;
            (entry.width, entry.height)
        } else {
            let Some(face) = self.current_face() else {
                return (0.0, 0.0);
            };
            let metrics = self.backend.measure(face, text);
            self.size_cache.insert(
                key,
                MeasureEntry {
                    width: metrics.width,
                    height: metrics.height,
                    leading: metrics.leading,
                    last_used_frame: frame,
                },
            );
            (metrics.width, metrics.height)
        };

        (
            width * self.font_scale_x * self.dpi_scale,
            height * self.font_scale_y * self.dpi_scale,
        )
    }

    /// Size of possibly multi-line text laid out inside `bounds`.
    ///
    /// Wraps to `bounds.width` first when `align` asks for it. Width is the
    /// widest line, height the sum of line heights.
    pub fn measure_string_rect(&mut self, text: &str, bounds: Rect, align: Align) -> (f32, f32) {
        let to_measure = self.wrap_for(text, bounds, align);

        let mut width = 0.0f32;
        let mut height = 0.0f32;
        for line in to_measure.split('\n') {
            let (w, h) = self.measure_string(line);
            width = width.max(w);
            height += h;
        }
        (width, height)
    }

    // ========== Wrapping ==========

    /// Insert line breaks so `text` fits `max_width` (scaled units)
    pub fn wrap_string(&mut self, text: &str, max_width: f32, flags: Align) -> String {
        TextDrawerWordWrapper::new(self).wrap(text, max_width, flags)
    }

    fn wrap_for(&mut self, text: &str, bounds: Rect, align: Align) -> String {
        if align.wants_wrap() {
            self.wrap_string(text, bounds.width, align.wrap_flags())
        } else {
            text.to_owned()
        }
    }

    // ========== Drawing ==========

    /// Draw a string with its alignment anchor at `pos`.
    ///
    /// Rasterizes and uploads on first use; later calls reuse the texture.
    /// Failures draw nothing.
    pub fn draw_string(
        &mut self,
        draw: &mut dyn DrawContext,
        target: &mut DrawBuffer,
        text: &str,
        pos: Point,
        color: Color,
        align: Align,
    ) {
        if text.is_empty() {
            return;
        }

        let full_color = self.backend.supports_color_emoji() && contains_emoji(text);
        let key = CacheKey::new(self.font_hash, text, full_color);
        let frame = self.frame_count;

        // Geometry queued so far belongs to whatever texture is bound now
        target.flush(draw);

        let entry = if let Some(entry) = self.cache.get_mut(&key) {
            entry.last_used_frame = frame;
            entry.clone()
        } else {
            let Some(entry) = self.create_entry(draw, text, align, full_color) else {
                return;
            };
            tracing::debug!(
                "Cached string {:?} ({}x{} {:?})",
                text,
                entry.bm_width,
                entry.bm_height,
                entry.format
            );
            self.cache.insert(key, entry.clone());
            entry
        };

        let Some(texture) = entry.texture else {
            return;
        };

        draw.bind_texture(0, texture);
        let w = entry.bm_width as f32 * self.font_scale_x * self.dpi_scale;
        let h = entry.bm_height as f32 * self.font_scale_y * self.dpi_scale;
        let (x, y) = DrawBuffer::do_align(align, pos.x, pos.y, w, h);
        target.draw_tex_rect(Rect::new(x, y, w, h), [0.0, 0.0, 1.0, 1.0], color);
        target.flush(draw);
    }

    /// Draw a string aligned inside `bounds`, wrapping to its width when
    /// `align` asks for it
    pub fn draw_string_rect(
        &mut self,
        draw: &mut dyn DrawContext,
        target: &mut DrawBuffer,
        text: &str,
        bounds: Rect,
        color: Color,
        align: Align,
    ) {
        let center = bounds.center();
        let x = if align.contains(Align::HCENTER) {
            center.x
        } else if align.contains(Align::RIGHT) {
            bounds.x2()
        } else {
            bounds.x
        };
        let y = if align.contains(Align::VCENTER) {
            center.y
        } else if align.contains(Align::BOTTOM) {
            bounds.y2()
        } else {
            bounds.y
        };

        let to_draw = self.wrap_for(text, bounds, align);
        self.draw_string(draw, target, &to_draw, Point::new(x, y), color, align);
    }

    /// Rasterize a string to CPU memory without touching the GPU.
    ///
    /// Returns `None` when there is nothing to draw or the backend failed.
    pub fn draw_string_bitmap(
        &mut self,
        text: &str,
        align: Align,
        full_color: bool,
        format: DataFormat,
    ) -> Option<TextBitmap> {
        let bitmap = self.rasterize(text, align, full_color)?;
        Some(TextBitmap {
            width: bitmap.width,
            height: bitmap.height,
            bm_width: bitmap.bm_width,
            bm_height: bitmap.bm_height,
            format,
            data: convert_coverage(&bitmap.coverage, format),
        })
    }

    /// [`draw_string_bitmap`](Self::draw_string_bitmap), wrapping to
    /// `bounds.width` first when `align` asks for it
    pub fn draw_string_bitmap_rect(
        &mut self,
        text: &str,
        bounds: Rect,
        align: Align,
        full_color: bool,
        format: DataFormat,
    ) -> Option<TextBitmap> {
        let to_draw = self.wrap_for(text, bounds, align);
        self.draw_string_bitmap(&to_draw, align, full_color, format)
    }

    /// Rasterize with the current font. `None` for empty or unusable output.
    fn rasterize(&mut self, text: &str, align: Align, full_color: bool) -> Option<RasterBitmap> {
        let face = self.current_face()?;
        let bitmap = match self.backend.rasterize(face, text, align, full_color) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                tracing::warn!("Failed to rasterize {:?}: {}", text, e);
                return None;
            }
        };

        if bitmap.is_empty() {
            return None;
        }
        if !bitmap.is_well_formed() {
            tracing::warn!(
                "Backend returned a malformed {}x{} bitmap for {:?}",
                bitmap.bm_width,
                bitmap.bm_height,
                text
            );
            return None;
        }
        Some(bitmap)
    }

    /// Build the cache entry for a miss. `None` means the upload failed and
    /// nothing should be cached.
    fn create_entry(
        &mut self,
        draw: &mut dyn DrawContext,
        text: &str,
        align: Align,
        full_color: bool,
    ) -> Option<StringEntry> {
        let format = select_format(draw, full_color);
        let frame = self.frame_count;

        let Some(bitmap) = self.rasterize(text, align, full_color) else {
            // Remember the failure so it isn't retried every frame
            return Some(StringEntry {
                texture: None,
                width: 0,
                height: 0,
                bm_width: 0,
                bm_height: 0,
                format,
                last_used_frame: frame,
            });
        };

        let data = convert_coverage(&bitmap.coverage, format);
        let desc = TextureDesc {
            width: bitmap.bm_width,
            height: bitmap.bm_height,
            format,
            data: &data,
            tag: TEXTURE_TAG,
        };
        let Some(texture) = draw.create_texture(&desc) else {
            tracing::warn!(
                "Failed to create {}x{} {:?} texture for {:?}",
                bitmap.bm_width,
                bitmap.bm_height,
                format,
                text
            );
            return None;
        };

        Some(StringEntry {
            texture: Some(texture),
            width: bitmap.width,
            height: bitmap.height,
            bm_width: bitmap.bm_width,
            bm_height: bitmap.bm_height,
            format,
            last_used_frame: frame,
        })
    }

    // ========== Housekeeping ==========

    /// Advance the frame counter, react to DPI changes and evict idle
    /// strings. Call once per frame, after the last draw of the frame.
    pub fn once_per_frame(&mut self, draw: &mut dyn DrawContext) {
        self.frame_count = self.frame_count.wrapping_add(1);

        let dpi_scale = self.calculate_dpi_scale();
        if dpi_scale != self.dpi_scale {
            tracing::debug!("DPI scale changed {} -> {}, dropping text caches", self.dpi_scale, dpi_scale);
            self.dpi_scale = dpi_scale;
            self.clear_cache(draw);
            self.reload_fonts();
        }

        if self.frame_count % self.config.sweep_interval.max(1) == 0 {
            self.sweep(draw);
        }
    }

    fn sweep(&mut self, draw: &mut dyn DrawContext) {
        let frame = self.frame_count;
        let max_age = self.config.eviction_age;

        let strings = self.cache.evict_stale(frame, max_age, |key, entry| {
            if let Some(texture) = entry.texture.take() {
                draw.release_texture(texture);
            }
            tracing::trace!("Evicted string {:?}", key.text);
        });
        let measures = self.size_cache.evict_stale(frame, max_age, |_, _| {});

        if strings + measures > 0 {
            tracing::debug!(
                "Frame {}: evicted {} strings and {} measurements",
                frame,
                strings,
                measures
            );
        }
    }

    /// Release every string texture and forget every measurement
    pub fn clear_cache(&mut self, draw: &mut dyn DrawContext) {
        self.cache.clear_with(|entry| {
            if let Some(texture) = entry.texture.take() {
                draw.release_texture(texture);
            }
        });
        self.size_cache.clear_with(|_| {});
    }

    // ========== Introspection ==========

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Number of cached rasterized strings
    pub fn get_string_cache_size(&self) -> usize {
        self.cache.len()
    }

    /// Number of cached measurements
    pub fn get_measure_cache_size(&self) -> usize {
        self.size_cache.len()
    }

    /// Bytes held by the backing bitmaps of all cached strings
    pub fn get_cache_data_size(&self) -> usize {
        self.cache.values().map(StringEntry::data_size).sum()
    }

    /// Cached entry for `text` in the current font, if any
    pub fn cached_string(&self, text: &str, full_color: bool) -> Option<&StringEntry> {
        self.cache.get(&CacheKey::new(self.font_hash, text, full_color))
    }
}

/// Word-wrap measurement through a drawer's measure cache
pub struct TextDrawerWordWrapper<'d> {
    drawer: &'d mut TextDrawer,
}

impl<'d> TextDrawerWordWrapper<'d> {
    pub fn new(drawer: &'d mut TextDrawer) -> Self {
        Self { drawer }
    }

    pub fn wrap(self, text: &str, max_width: f32, flags: Align) -> String {
        WordWrapper::new(text, max_width, flags, self).wrapped()
    }
}

impl MeasureWidth for TextDrawerWordWrapper<'_> {
    fn measure_width(&mut self, text: &str) -> f32 {
        self.drawer.measure_string(text).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::{TextureId, Vertex};

    struct Formats(&'static [DataFormat]);

    impl DrawContext for Formats {
        fn supports_format(&self, format: DataFormat) -> bool {
            self.0.contains(&format)
        }
        fn create_texture(&mut self, _desc: &TextureDesc<'_>) -> Option<TextureId> {
            None
        }
        fn release_texture(&mut self, _texture: TextureId) {}
        fn bind_texture(&mut self, _slot: u32, _texture: TextureId) {}
        fn submit(&mut self, _vertices: &[Vertex]) {}
    }

    #[test]
    fn test_select_format() {
        let all = Formats(&[DataFormat::R8Unorm, DataFormat::Rgba4444, DataFormat::Rgba8888]);
        assert_eq!(select_format(&all, false), DataFormat::R8Unorm);
        assert_eq!(select_format(&all, true), DataFormat::Rgba8888);

        let no_r8 = Formats(&[DataFormat::Rgba4444, DataFormat::Rgba8888]);
        assert_eq!(select_format(&no_r8, false), DataFormat::Rgba4444);

        let only_8888 = Formats(&[DataFormat::Rgba8888]);
        assert_eq!(select_format(&only_8888, false), DataFormat::Rgba8888);
    }
}
