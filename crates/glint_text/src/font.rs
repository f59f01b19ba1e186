//! Font descriptors and handles
//!
//! A [`FontKey`] names a font the way callers ask for it (family, pixel size,
//! style flags). The registry turns each distinct key into a [`FontHandle`]
//! and a 32-bit content hash that discriminates cache entries.

use bitflags::bitflags;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroU32;

bitflags! {
    /// Style flags requested alongside a family name
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontFlags: u32 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
    }
}

impl FontFlags {
    /// CSS-style weight for font matching
    pub fn weight(self) -> u16 {
        if self.contains(FontFlags::BOLD) {
            700
        } else {
            400
        }
    }

    pub fn italic(self) -> bool {
        self.contains(FontFlags::ITALIC)
    }
}

/// Requested font: family name, pixel size and style
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub name: String,
    pub size: u32,
    pub flags: FontFlags,
}

impl FontKey {
    pub fn new(name: impl Into<String>, size: u32, flags: FontFlags) -> Self {
        Self {
            name: name.into(),
            size,
            flags,
        }
    }

    /// Cache-key discriminant derived from the full key.
    ///
    /// FxHasher is unseeded, so the value is stable for the process lifetime
    /// (and across runs).
    pub fn content_hash(&self) -> u32 {
        let mut hasher = FxHasher::default();
        self.name.hash(&mut hasher);
        self.size.hash(&mut hasher);
        self.flags.bits().hash(&mut hasher);
        let h = hasher.finish();
        (h ^ (h >> 32)) as u32
    }
}

/// Opaque, non-zero font handle issued by a [`FontHandleRegistry`](crate::registry::FontHandleRegistry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontHandle(NonZeroU32);

impl FontHandle {
    pub(crate) fn from_index(index: usize) -> Self {
        // Index 0 becomes handle 1; the registry never holds u32::MAX fonts.
        let raw = u32::try_from(index + 1).unwrap_or(u32::MAX);
        Self(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MIN))
    }

    pub(crate) fn index(self) -> usize {
        self.0.get() as usize - 1
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}
