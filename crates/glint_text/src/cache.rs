//! Frame-stamped caches for measured and rasterized strings
//!
//! Entries remember the frame they were last touched on. Once per frame the
//! drawer sweeps both caches and drops entries that have sat idle longer than
//! the eviction age.

use glint_core::{DataFormat, TextureId};
use rustc_hash::FxHashMap;

/// Identity of a cached string.
///
/// Ordered by font hash, then text, then color mode. The color mode is part
/// of the key so the same string drawn as an alpha mask and in full color
/// gets two independent textures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub font_hash: u32,
    pub text: String,
    pub full_color: bool,
}

impl CacheKey {
    pub fn new(font_hash: u32, text: &str, full_color: bool) -> Self {
        Self {
            font_hash,
            text: text.to_owned(),
            full_color,
        }
    }

    /// Key for the measure cache, which never depends on color mode
    pub fn measure(font_hash: u32, text: &str) -> Self {
        Self::new(font_hash, text, false)
    }
}

/// Something that remembers when it was last used
pub trait FrameStamped {
    fn last_used_frame(&self) -> u32;
}

/// A rasterized string
#[derive(Debug, Clone, PartialEq)]
pub struct StringEntry {
    /// Owned GPU texture. `None` for strings that rasterized to nothing.
    pub texture: Option<TextureId>,
    pub width: u32,
    pub height: u32,
    pub bm_width: u32,
    pub bm_height: u32,
    pub format: DataFormat,
    pub last_used_frame: u32,
}

impl StringEntry {
    /// Bytes held by the backing bitmap
    pub fn data_size(&self) -> usize {
        self.bm_width as usize * self.bm_height as usize * self.format.bytes_per_pixel()
    }
}

impl FrameStamped for StringEntry {
    fn last_used_frame(&self) -> u32 {
        self.last_used_frame
    }
}

/// Cached string metrics, in backend pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureEntry {
    pub width: f32,
    pub height: f32,
    pub leading: f32,
    pub last_used_frame: u32,
}

impl FrameStamped for MeasureEntry {
    fn last_used_frame(&self) -> u32 {
        self.last_used_frame
    }
}

/// Map from [`CacheKey`] to frame-stamped entries
#[derive(Debug)]
pub struct FrameCache<V> {
    entries: FxHashMap<CacheKey, V>,
}

impl<V> Default for FrameCache<V> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }
}

impl<V: FrameStamped> FrameCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &CacheKey) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: CacheKey, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn contains_key(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove entries idle for more than `max_age` frames.
    ///
    /// `on_evict` runs on every stale entry before any of them leaves the map.
    /// Returns the number of evicted entries.
    pub fn evict_stale(
        &mut self,
        frame: u32,
        max_age: u32,
        mut on_evict: impl FnMut(&CacheKey, &mut V),
    ) -> usize {
        let is_stale = |v: &V| frame.wrapping_sub(v.last_used_frame()) > max_age;

        let mut evicted = 0;
        for (key, value) in self.entries.iter_mut() {
            if is_stale(value) {
                on_evict(key, value);
                evicted += 1;
            }
        }
        if evicted > 0 {
            self.entries.retain(|_, v| !is_stale(v));
        }
        evicted
    }

    /// Remove every entry, running `on_evict` on each first
    pub fn clear_with(&mut self, mut on_evict: impl FnMut(&mut V)) {
        for value in self.entries.values_mut() {
            on_evict(value);
        }
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure(frame: u32) -> MeasureEntry {
        MeasureEntry {
            width: 10.0,
            height: 5.0,
            leading: 0.0,
            last_used_frame: frame,
        }
    }

    #[test]
    fn test_key_order() {
        let a = CacheKey::new(1, "zzz", false);
        let b = CacheKey::new(2, "aaa", false);
        let c = CacheKey::new(2, "bbb", false);
        let d = CacheKey::new(2, "bbb", true);
        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
    }

    #[test]
    fn test_color_mode_is_part_of_identity() {
        assert_ne!(CacheKey::new(7, "hi", false), CacheKey::new(7, "hi", true));
        assert_eq!(CacheKey::measure(7, "hi"), CacheKey::new(7, "hi", false));
    }

    #[test]
    fn test_evict_stale() {
        let mut cache = FrameCache::new();
        cache.insert(CacheKey::measure(1, "old"), measure(0));
        cache.insert(CacheKey::measure(1, "edge"), measure(10));
        cache.insert(CacheKey::measure(1, "fresh"), measure(95));

        let mut seen = Vec::new();
        let evicted = cache.evict_stale(110, 100, |key, _| seen.push(key.text.clone()));

        assert_eq!(evicted, 1);
        assert_eq!(seen, vec!["old".to_string()]);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains_key(&CacheKey::measure(1, "edge")));
    }

    #[test]
    fn test_clear_with_visits_everything() {
        let mut cache = FrameCache::new();
        cache.insert(CacheKey::measure(1, "a"), measure(0));
        cache.insert(CacheKey::measure(1, "b"), measure(0));

        let mut visited = 0;
        cache.clear_with(|_| visited += 1);
        assert_eq!(visited, 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_string_entry_data_size() {
        let entry = StringEntry {
            texture: None,
            width: 10,
            height: 10,
            bm_width: 12,
            bm_height: 12,
            format: DataFormat::Rgba4444,
            last_used_frame: 0,
        };
        assert_eq!(entry.data_size(), 12 * 12 * 2);
    }
}
