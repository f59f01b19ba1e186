//! Font handle registry
//!
//! Maps [`FontKey`]s to stable [`FontHandle`]s. The first request for a key
//! asks the raster backend to resolve the font; later requests are a hash
//! lookup. Failed lookups are remembered so a missing family is only
//! reported once.

use crate::backend::{FaceId, RasterBackend};
use crate::font::{FontHandle, FontKey};
use crate::{Result, TextError};
use rustc_hash::FxHashMap;

/// A font the backend managed to resolve
#[derive(Debug, Clone)]
pub struct RegisteredFont {
    pub key: FontKey,
    /// Cache-key discriminant, see [`FontKey::content_hash`]
    pub hash: u32,
    /// Backend-side face; `None` after a reload the backend could not satisfy
    pub face: Option<FaceId>,
}

/// Registry of resolved fonts for one text drawer
#[derive(Debug, Default)]
pub struct FontHandleRegistry {
    /// Resolved fonts, indexed by `FontHandle::index`
    fonts: Vec<RegisteredFont>,
    /// Key lookup (Some = resolved, None = backend could not satisfy it)
    handles: FxHashMap<FontKey, Option<FontHandle>>,
}

impl FontHandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a key, asking the backend on first use
    pub fn resolve(
        &mut self,
        key: FontKey,
        dpi_scale: f32,
        backend: &mut dyn RasterBackend,
    ) -> Result<FontHandle> {
        if let Some(cached) = self.handles.get(&key) {
            return cached.ok_or_else(|| {
                TextError::FontNotFound(format!(
                    "{} (size={}, flags={:?}) not found (cached)",
                    key.name, key.size, key.flags
                ))
            });
        }

        match backend.load_font(&key, dpi_scale) {
            Ok(face) => {
                let handle = FontHandle::from_index(self.fonts.len());
                let hash = key.content_hash();
                tracing::debug!(
                    "Registered font {} size={} flags={:?} as handle {} (hash {:08x})",
                    key.name,
                    key.size,
                    key.flags,
                    handle.get(),
                    hash
                );
                self.fonts.push(RegisteredFont {
                    key: key.clone(),
                    hash,
                    face: Some(face),
                });
                self.handles.insert(key, Some(handle));
                Ok(handle)
            }
            Err(e) => {
                tracing::warn!(
                    "Font {} (size={}, flags={:?}) could not be resolved: {}",
                    key.name,
                    key.size,
                    key.flags,
                    e
                );
                self.handles.insert(key, None);
                Err(e)
            }
        }
    }

    /// Look up a handle previously returned by this registry
    pub fn get(&self, handle: FontHandle) -> Option<&RegisteredFont> {
        self.fonts.get(handle.index())
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Re-resolve every registered font after the backend dropped its faces
    /// (DPI change). Handles and hashes stay valid. A font that fails to
    /// reload loses its face, since the old id may now name another font.
    pub fn reload(&mut self, dpi_scale: f32, backend: &mut dyn RasterBackend) {
        for font in &mut self.fonts {
            font.face = match backend.load_font(&font.key, dpi_scale) {
                Ok(face) => Some(face),
                Err(e) => {
                    tracing::warn!("Failed to reload font {}: {}", font.key.name, e);
                    None
                }
            };
        }
    }
}
