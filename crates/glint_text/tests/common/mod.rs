//! Test doubles: a deterministic raster backend and a counting draw context

#![allow(dead_code)]

use glint_core::{Align, DataFormat, DrawContext, TextureDesc, TextureId, Vertex};
use glint_text::{
    Coverage, FaceId, FontKey, RasterBackend, RasterBitmap, Result, TextConfig, TextDrawer,
    TextError, TextMetrics,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Text the mock backend refuses to rasterize
pub const BROKEN: &str = "broken";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Backend call counters, shared with the test after the backend is boxed
#[derive(Debug, Default)]
pub struct Calls {
    pub loads: AtomicUsize,
    pub measures: AtomicUsize,
    pub rasterizes: AtomicUsize,
    pub clears: AtomicUsize,
}

impl Calls {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
    pub fn measures(&self) -> usize {
        self.measures.load(Ordering::SeqCst)
    }
    pub fn rasterizes(&self) -> usize {
        self.rasterizes.load(Ordering::SeqCst)
    }
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

/// Monospace backend: every char is `px / 2` wide, every line `px` tall,
/// where `px = size / dpi_scale`. Families named "Missing" don't exist and
/// "Bitmap" only loads at a DPI scale of 1.0.
pub struct MockBackend {
    calls: Arc<Calls>,
    faces: Vec<f32>,
    color_emoji: bool,
}

impl MockBackend {
    pub fn new(color_emoji: bool) -> (Self, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        (
            Self {
                calls: Arc::clone(&calls),
                faces: Vec::new(),
                color_emoji,
            },
            calls,
        )
    }

    fn box_size(&self, face: FaceId, text: &str) -> Option<(f32, f32)> {
        let px = *self.faces.get(face.0 as usize)?;
        let mut width = 0usize;
        let mut lines = 0usize;
        for line in text.split('\n') {
            width = width.max(line.chars().count());
            lines += 1;
        }
        Some((width as f32 * px / 2.0, lines as f32 * px))
    }
}

impl RasterBackend for MockBackend {
    fn load_font(&mut self, key: &FontKey, dpi_scale: f32) -> Result<FaceId> {
        self.calls.loads.fetch_add(1, Ordering::SeqCst);
        if key.name == "Missing" || (key.name == "Bitmap" && dpi_scale != 1.0) {
            return Err(TextError::FontNotFound(key.name.clone()));
        }
        self.faces.push(key.size as f32 / dpi_scale);
        Ok(FaceId(self.faces.len() as u32 - 1))
    }

    fn measure(&mut self, face: FaceId, text: &str) -> TextMetrics {
        self.calls.measures.fetch_add(1, Ordering::SeqCst);
        let (width, height) = self.box_size(face, text).unwrap_or((0.0, 0.0));
        TextMetrics {
            width,
            height,
            leading: 0.0,
        }
    }

    fn rasterize(
        &mut self,
        face: FaceId,
        text: &str,
        _align: Align,
        full_color: bool,
    ) -> Result<RasterBitmap> {
        self.calls.rasterizes.fetch_add(1, Ordering::SeqCst);
        if text == BROKEN {
            return Err(TextError::Rasterization("mock failure".into()));
        }
        let (w, h) = self
            .box_size(face, text)
            .ok_or_else(|| TextError::Rasterization("unknown face".into()))?;
        let width = w.ceil() as u32;
        let height = h.ceil() as u32;
        if width == 0 || height == 0 {
            return Ok(RasterBitmap::empty());
        }

        let bm_width = width.div_ceil(4) * 4;
        let bm_height = height.div_ceil(4) * 4;
        let n = (bm_width * bm_height) as usize;
        let coverage = if full_color {
            Coverage::Rgba(vec![0x80FF_0000; n])
        } else {
            Coverage::Alpha(vec![0xFF; n])
        };
        Ok(RasterBitmap {
            width,
            height,
            bm_width,
            bm_height,
            coverage,
        })
    }

    fn supports_color_emoji(&self) -> bool {
        self.color_emoji
    }

    fn clear_fonts(&mut self) {
        self.calls.clears.fetch_add(1, Ordering::SeqCst);
        self.faces.clear();
    }
}

/// Draw context that records every texture and vertex
pub struct CountingDrawContext {
    pub formats: Vec<DataFormat>,
    pub fail_uploads: bool,
    next_id: u64,
    pub created: Vec<TextureId>,
    pub released: Vec<TextureId>,
    pub uploads: Vec<(u32, u32, DataFormat, Vec<u8>)>,
    pub bound: Option<TextureId>,
    pub vertices: Vec<Vertex>,
}

impl CountingDrawContext {
    pub fn new() -> Self {
        Self::with_formats(&[DataFormat::R8Unorm, DataFormat::Rgba4444, DataFormat::Rgba8888])
    }

    pub fn with_formats(formats: &[DataFormat]) -> Self {
        Self {
            formats: formats.to_vec(),
            fail_uploads: false,
            next_id: 1,
            created: Vec::new(),
            released: Vec::new(),
            uploads: Vec::new(),
            bound: None,
            vertices: Vec::new(),
        }
    }

    /// Textures created and not yet released
    pub fn live(&self) -> usize {
        self.created.len() - self.released.len()
    }
}

impl DrawContext for CountingDrawContext {
    fn supports_format(&self, format: DataFormat) -> bool {
        self.formats.contains(&format)
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Option<TextureId> {
        if self.fail_uploads {
            return None;
        }
        assert_eq!(
            desc.data.len(),
            desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel()
        );
        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.created.push(id);
        self.uploads
            .push((desc.width, desc.height, desc.format, desc.data.to_vec()));
        Some(id)
    }

    fn release_texture(&mut self, texture: TextureId) {
        assert!(self.created.contains(&texture), "released unknown {:?}", texture);
        assert!(!self.released.contains(&texture), "double release of {:?}", texture);
        self.released.push(texture);
    }

    fn bind_texture(&mut self, _slot: u32, texture: TextureId) {
        assert!(!self.released.contains(&texture), "bound released {:?}", texture);
        self.bound = Some(texture);
    }

    fn submit(&mut self, vertices: &[Vertex]) {
        assert!(self.bound.is_some(), "submit without a bound texture");
        self.vertices.extend_from_slice(vertices);
    }
}

/// Drawer over a mock backend with "Inter" 16 selected
pub fn drawer(color_emoji: bool) -> (TextDrawer, Arc<Calls>) {
    init_tracing();
    let (backend, calls) = MockBackend::new(color_emoji);
    let mut drawer = TextDrawer::new(Box::new(backend), TextConfig::default());
    drawer
        .set_font("Inter", 16, glint_text::FontFlags::empty())
        .expect("mock resolves Inter");
    (drawer, calls)
}
