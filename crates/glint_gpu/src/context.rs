//! wgpu-backed draw context
//!
//! Textures live in a slot map; a [`TextureId`] is the slot key in its FFI
//! form. Submitted vertices accumulate in one list, split into batches at
//! every texture change. The embedder uploads the list once per frame with
//! [`WgpuDrawContext::create_vertex_buffer`] and issues one draw per batch.

use crate::texture::{texture_format, GpuTexture};
use glint_core::{DataFormat, DrawContext, TextureDesc, TextureId, Vertex};
use slotmap::{new_key_type, Key, KeyData, SlotMap};
use std::ops::Range;
use std::sync::Arc;
use wgpu::util::DeviceExt;

new_key_type! {
    struct TextureKey;
}

fn to_id(key: TextureKey) -> TextureId {
    TextureId(key.data().as_ffi())
}

fn to_key(id: TextureId) -> TextureKey {
    TextureKey::from(KeyData::from_ffi(id.0))
}

/// Vertex layout matching [`Vertex`]
pub fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        // position: vec2<f32>
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        },
        // uv: vec2<f32>
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 8,
            shader_location: 1,
        },
        // color: packed rgba8
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Unorm8x4,
            offset: 16,
            shader_location: 2,
        },
    ];

    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// A run of vertices drawn with one texture
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub texture: TextureId,
    pub vertices: Range<u32>,
}

/// Vertex list split into per-texture batches
#[derive(Debug, Default)]
struct QuadBatcher {
    bound: Option<TextureId>,
    vertices: Vec<Vertex>,
    batches: Vec<DrawBatch>,
}

impl QuadBatcher {
    fn bind(&mut self, texture: TextureId) {
        self.bound = Some(texture);
    }

    fn submit(&mut self, vertices: &[Vertex]) {
        if vertices.is_empty() {
            return;
        }
        let Some(texture) = self.bound else {
            tracing::warn!("Dropping {} vertices submitted with no texture bound", vertices.len());
            return;
        };

        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        let end = self.vertices.len() as u32;

        match self.batches.last_mut() {
            Some(last) if last.texture == texture && last.vertices.end == start => {
                last.vertices.end = end;
            }
            _ => self.batches.push(DrawBatch {
                texture,
                vertices: start..end,
            }),
        }
    }

    fn reset(&mut self) {
        self.bound = None;
        self.vertices.clear();
        self.batches.clear();
    }
}

/// [`DrawContext`] over a wgpu device
pub struct WgpuDrawContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    textures: SlotMap<TextureKey, GpuTexture>,
    batcher: QuadBatcher,
}

impl WgpuDrawContext {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self {
            device,
            queue,
            textures: SlotMap::with_key(),
            batcher: QuadBatcher::default(),
        }
    }

    /// Texture view for a live texture
    pub fn texture_view(&self, texture: TextureId) -> Option<&wgpu::TextureView> {
        self.textures.get(to_key(texture)).map(GpuTexture::view)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Bytes of texel data across live textures
    pub fn texture_memory(&self) -> usize {
        self.textures.values().map(GpuTexture::data_size).sum()
    }

    /// Vertices submitted since the last [`begin_frame`](Self::begin_frame)
    pub fn vertices(&self) -> &[Vertex] {
        &self.batcher.vertices
    }

    /// Batches submitted since the last [`begin_frame`](Self::begin_frame).
    /// Batches whose texture has since been released have no view and should
    /// be skipped.
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batcher.batches
    }

    /// Upload this frame's vertices. `None` when nothing was submitted.
    pub fn create_vertex_buffer(&self) -> Option<wgpu::Buffer> {
        if self.batcher.vertices.is_empty() {
            return None;
        }
        Some(
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Glint Text Vertices"),
                    contents: bytemuck::cast_slice(&self.batcher.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
        )
    }

    /// Drop last frame's geometry
    pub fn begin_frame(&mut self) {
        self.batcher.reset();
    }
}

impl DrawContext for WgpuDrawContext {
    fn supports_format(&self, format: DataFormat) -> bool {
        texture_format(format).is_some()
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Option<TextureId> {
        match GpuTexture::from_desc(&self.device, &self.queue, desc) {
            Ok(texture) => {
                let id = to_id(self.textures.insert(texture));
                tracing::trace!("Created {} texture {:?} ({}x{})", desc.tag, id, desc.width, desc.height);
                Some(id)
            }
            Err(e) => {
                tracing::warn!("Failed to create {} texture: {}", desc.tag, e);
                None
            }
        }
    }

    fn release_texture(&mut self, texture: TextureId) {
        match self.textures.remove(to_key(texture)) {
            Some(gpu) => gpu.destroy(),
            None => tracing::warn!("Released unknown texture {:?}", texture),
        }
    }

    fn bind_texture(&mut self, _slot: u32, texture: TextureId) {
        self.batcher.bind(texture);
    }

    fn submit(&mut self, vertices: &[Vertex]) {
        self.batcher.submit(vertices);
    }
}
