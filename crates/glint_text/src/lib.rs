//! Cached text drawing for Glint
//!
//! This crate provides:
//! - Font key to handle resolution with stable cache hashes
//! - A measure cache and a texture-backed raster cache keyed by font, text and color mode
//! - Once-per-frame eviction of idle entries
//! - Word wrapping on Unicode break opportunities
//! - Premultiplied-alpha conversion for alpha-mask and color bitmaps
//! - A system raster backend (fontdb discovery, rustybuzz shaping, swash rasterization)
//!
//! # Example
//!
//! ```ignore
//! use glint_core::{Align, Color, DrawBuffer, Point};
//! use glint_text::{FontFlags, TextConfig, TextDrawer};
//!
//! let mut drawer = TextDrawer::with_config(TextConfig::default());
//! let font = drawer.set_font_or_default("Inter", 16, FontFlags::empty());
//! let mut buffer = DrawBuffer::new();
//!
//! // Each frame
//! drawer.draw_string(&mut gpu, &mut buffer, "Hello", Point::new(10.0, 10.0), Color::WHITE, Align::TOP_LEFT);
//! drawer.once_per_frame(&mut gpu);
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod drawer;
pub mod emoji;
pub mod font;
pub mod premul;
pub mod registry;
pub mod system_fonts;
pub mod wrap;

pub use backend::{create_backend, Coverage, FaceId, RasterBackend, RasterBitmap, SwashBackend, TextMetrics};
pub use cache::{CacheKey, MeasureEntry, StringEntry};
pub use config::TextConfig;
pub use drawer::{select_format, TextBitmap, TextDrawer, TextDrawerWordWrapper};
pub use emoji::{contains_emoji, is_emoji};
pub use font::{FontFlags, FontHandle, FontKey};
pub use premul::{alpha_to_premul_4444, alpha_to_premul_8888, rgba_to_premul_8888};
pub use registry::FontHandleRegistry;
pub use system_fonts::{global_system_fonts, FontFace, GenericFont, SystemFonts};
pub use wrap::{wrap_text, MeasureWidth, WordWrapper};

use thiserror::Error;

/// Text rendering errors
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Invalid font data: {0}")]
    InvalidFontData(String),

    #[error("Rasterization failed: {0}")]
    Rasterization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TextError>;
