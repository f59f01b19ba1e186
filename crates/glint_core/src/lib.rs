//! Glint core types
//!
//! Shared primitives for the Glint text stack:
//!
//! - **Geometry**: points, sizes and rectangles used for bounds and quads
//! - **Color**: linear RGBA tint applied to text quads
//! - **Alignment**: anchor and wrap flags understood by every draw call
//! - **Draw calls**: the texture/quad interface the embedding renderer implements

pub mod align;
pub mod color;
pub mod draw;
pub mod geometry;

pub use align::Align;
pub use color::Color;
pub use draw::{DataFormat, DrawBuffer, DrawContext, TextureDesc, TextureId, Vertex};
pub use geometry::{Point, Rect};
