//! Glint GPU draw context
//!
//! A wgpu implementation of [`glint_core::DrawContext`]. Text bitmaps become
//! sampled textures and submitted quads accumulate into per-texture batches
//! that the embedder replays inside its own render pass.

pub mod context;
pub mod texture;

pub use context::{vertex_buffer_layout, DrawBatch, WgpuDrawContext};
pub use texture::{texture_format, GpuTexture};

use glint_core::DataFormat;
use thiserror::Error;

/// GPU upload errors
#[derive(Error, Debug, PartialEq)]
pub enum GpuError {
    #[error("Texture format {0:?} is not supported")]
    UnsupportedFormat(DataFormat),

    #[error("Invalid texture size {width}x{height} (max {max})")]
    InvalidSize { width: u32, height: u32, max: u32 },

    #[error("Texture data is {actual} bytes, expected {expected}")]
    DataLength { expected: usize, actual: usize },
}
