//! Draw-call abstraction consumed by the text drawer
//!
//! The text drawer never owns a GPU context. It creates and releases textures
//! through [`DrawContext`] and batches textured quads into a [`DrawBuffer`],
//! which hands finished vertices back to the context on flush.

use crate::align::Align;
use crate::color::Color;
use crate::geometry::Rect;
use bytemuck::{Pod, Zeroable};

/// Opaque texture handle issued by a [`DrawContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Pixel formats the text drawer can upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// Single 8-bit channel, used for alpha-mask text
    R8Unorm,
    /// 16-bit packed, 4 bits per channel, premultiplied
    Rgba4444,
    /// 32-bit, 8 bits per channel, premultiplied
    Rgba8888,
}

impl DataFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            DataFormat::R8Unorm => 1,
            DataFormat::Rgba4444 => 2,
            DataFormat::Rgba8888 => 4,
        }
    }
}

/// Parameters for a texture upload
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub width: u32,
    pub height: u32,
    pub format: DataFormat,
    /// Tightly packed rows of `width * format.bytes_per_pixel()` bytes
    pub data: &'a [u8],
    /// Debug label
    pub tag: &'static str,
}

/// One vertex of a textured quad
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    /// Packed `0xAABBGGRR`
    pub color: u32,
}

/// Texture and draw-call operations supplied by the embedding renderer
pub trait DrawContext {
    /// Whether textures of this format can be created and sampled
    fn supports_format(&self, format: DataFormat) -> bool;

    /// Create a texture from initial data. `None` means the upload failed.
    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Option<TextureId>;

    /// Release a texture previously returned by `create_texture`
    fn release_texture(&mut self, texture: TextureId);

    /// Bind a texture for subsequent submitted geometry
    fn bind_texture(&mut self, slot: u32, texture: TextureId);

    /// Submit triangles (six vertices per quad) using the bound texture
    fn submit(&mut self, vertices: &[Vertex]);
}

/// CPU-side batch of textured quads
#[derive(Debug, Default)]
pub struct DrawBuffer {
    vertices: Vec<Vertex>,
}

impl DrawBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any pending geometry and start a new batch
    pub fn begin(&mut self) {
        self.vertices.clear();
    }

    /// Number of vertices waiting for the next flush
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Queue a textured rectangle. `uv` is `[u1, v1, u2, v2]`.
    pub fn draw_tex_rect(&mut self, rect: Rect, uv: [f32; 4], color: Color) {
        let color = color.to_rgba8();
        let (x1, y1, x2, y2) = (rect.x, rect.y, rect.x2(), rect.y2());
        let [u1, v1, u2, v2] = uv;
        let v = |x, y, u, v| Vertex {
            position: [x, y],
            uv: [u, v],
            color,
        };
        self.vertices.extend_from_slice(&[
            v(x1, y1, u1, v1),
            v(x2, y1, u2, v1),
            v(x2, y2, u2, v2),
            v(x1, y1, u1, v1),
            v(x2, y2, u2, v2),
            v(x1, y2, u1, v2),
        ]);
    }

    /// Hand pending vertices to the draw context
    pub fn flush(&mut self, draw: &mut dyn DrawContext) {
        if self.vertices.is_empty() {
            return;
        }
        draw.submit(&self.vertices);
        self.vertices.clear();
    }

    /// Offset a box anchored at `(x, y)` so that the anchor lands where
    /// `align` says. Returns the new top-left corner.
    pub fn do_align(align: Align, x: f32, y: f32, w: f32, h: f32) -> (f32, f32) {
        let mut x = x;
        let mut y = y;
        if align.contains(Align::HCENTER) {
            x -= w / 2.0;
        }
        if align.contains(Align::RIGHT) {
            x -= w;
        }
        if align.contains(Align::VCENTER) {
            y -= h / 2.0;
        }
        if align.contains(Align::BOTTOM) {
            y -= h;
        }
        (x, y)
    }
}
