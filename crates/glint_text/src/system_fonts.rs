//! System font database
//!
//! Wraps a fontdb database shared by every backend in the process. Scanning
//! the system font directories is slow, so it happens on first use rather
//! than at construction: the database sits behind a mutex together with a
//! `loaded` flag, and every lookup goes through `load_if_needed` under the
//! lock.

use crate::{Result, TextError};
use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// Generic font category for fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenericFont {
    #[default]
    SansSerif,
    Serif,
    Monospace,
    /// Color emoji font
    Emoji,
}

impl GenericFont {
    /// Recognize CSS-style generic family names
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sans-serif" | "sans" | "system-ui" | "system" => Some(GenericFont::SansSerif),
            "serif" => Some(GenericFont::Serif),
            "monospace" | "mono" => Some(GenericFont::Monospace),
            "emoji" => Some(GenericFont::Emoji),
            _ => None,
        }
    }

    fn family(self) -> Option<Family<'static>> {
        match self {
            GenericFont::SansSerif => Some(Family::SansSerif),
            GenericFont::Serif => Some(Family::Serif),
            GenericFont::Monospace => Some(Family::Monospace),
            GenericFont::Emoji => None,
        }
    }

    /// Installed families tried when fontdb's own generic mapping misses.
    /// fontdb maps the generics to Windows/macOS names ("Arial", "Times New
    /// Roman", ...) which most Linux hosts lack.
    fn fallback_families(self) -> &'static [&'static str] {
        match self {
            GenericFont::SansSerif => &[
                "DejaVu Sans",
                "Liberation Sans",
                "Noto Sans",
                "Helvetica",
                "Arial",
                "Cantarell",
                "Ubuntu",
                "Roboto",
            ],
            GenericFont::Serif => &[
                "DejaVu Serif",
                "Liberation Serif",
                "Noto Serif",
                "Times New Roman",
                "Times",
            ],
            GenericFont::Monospace => &[
                "DejaVu Sans Mono",
                "Liberation Mono",
                "Noto Sans Mono",
                "Courier New",
                "Menlo",
            ],
            GenericFont::Emoji => &[
                "Noto Color Emoji",
                "Apple Color Emoji",
                "Segoe UI Emoji",
                "Twemoji",
                "JoyPixels",
                "Emoji One",
            ],
        }
    }
}

/// Raw font file data plus the face index inside it
#[derive(Debug, Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    family: String,
}

impl FontFace {
    /// Validate font data and read its family name
    pub fn from_data_with_index(data: Vec<u8>, index: u32) -> Result<Self> {
        let family = {
            let face = ttf_parser::Face::parse(&data, index)
                .map_err(|e| TextError::InvalidFontData(e.to_string()))?;
            face.names()
                .into_iter()
                .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
                .find_map(|name| name.to_string())
                .unwrap_or_default()
        };

        Ok(Self {
            data: Arc::new(data),
            index,
            family,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn face_index(&self) -> u32 {
        self.index
    }

    pub fn family_name(&self) -> &str {
        &self.family
    }
}

struct FontDbState {
    db: Database,
    loaded: bool,
    /// Cached faces (Some = found, None = not found)
    faces: FxHashMap<String, Option<Arc<FontFace>>>,
}

impl FontDbState {
    // Call under lock.
    fn load_if_needed(&mut self) {
        if self.loaded {
            return;
        }
        self.db.load_system_fonts();
        self.loaded = true;
        tracing::debug!("Loaded {} system font faces", self.db.len());
    }

    fn query(&self, family: Family<'_>, weight: u16, italic: bool) -> Option<fontdb::ID> {
        let families = [family];
        let query = |style| Query {
            families: &families,
            weight: Weight(weight),
            style,
            stretch: Stretch::Normal,
        };

        let style = if italic { Style::Italic } else { Style::Normal };
        self.db.query(&query(style)).or_else(|| {
            // Try with Oblique if Italic wasn't found
            if italic {
                self.db.query(&query(Style::Oblique))
            } else {
                None
            }
        })
    }

    fn query_generic(&self, generic: GenericFont, weight: u16, italic: bool) -> Option<fontdb::ID> {
        let named = generic
            .family()
            .into_iter()
            .chain(generic.fallback_families().iter().map(|&name| Family::Name(name)))
            .find_map(|family| self.query(family, weight, italic));
        if named.is_some() || generic == GenericFont::Emoji {
            return named;
        }

        // Any installed text face beats rendering nothing
        let any = self.db.faces().next().map(|face| face.id);
        if any.is_some() {
            tracing::debug!("No {:?} family installed, using first available face", generic);
        }
        any
    }

    fn load_face(&mut self, cache_key: String, id: Option<fontdb::ID>) -> Option<Arc<FontFace>> {
        let face = id
            .and_then(|id| self.db.with_face_data(id, |data, index| (data.to_vec(), index)))
            .and_then(|(data, index)| match FontFace::from_data_with_index(data, index) {
                Ok(face) => Some(Arc::new(face)),
                Err(e) => {
                    tracing::warn!("Failed to parse font face {}: {}", cache_key, e);
                    None
                }
            });
        self.faces.insert(cache_key, face.clone());
        face
    }
}

/// Process-wide font discovery shared by raster backends
pub struct SystemFonts {
    state: Mutex<FontDbState>,
}

static SYSTEM_FONTS: OnceLock<Arc<SystemFonts>> = OnceLock::new();

/// The shared system font database. Fonts are scanned on first lookup.
pub fn global_system_fonts() -> Arc<SystemFonts> {
    SYSTEM_FONTS
        .get_or_init(|| Arc::new(SystemFonts::new()))
        .clone()
}

impl SystemFonts {
    /// Empty database; system fonts are scanned on first lookup
    pub fn new() -> Self {
        Self::from_database(Database::new(), false)
    }

    /// Database that only knows the given font files (no system scan)
    pub fn from_font_data(fonts: Vec<Vec<u8>>) -> Self {
        let mut db = Database::new();
        for data in fonts {
            db.load_font_source(Source::Binary(Arc::new(data)));
        }
        Self::from_database(db, true)
    }

    fn from_database(db: Database, loaded: bool) -> Self {
        Self {
            state: Mutex::new(FontDbState {
                db,
                loaded,
                faces: FxHashMap::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FontDbState> {
        // The state stays consistent across a panic in a lookup
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add font data; returns the number of faces it contained
    pub fn load_font_data(&self, data: Vec<u8>) -> usize {
        let mut state = self.lock();
        let ids = state.db.load_font_source(Source::Binary(Arc::new(data)));
        // New faces may satisfy families that failed before
        state.faces.retain(|_, face| face.is_some());
        ids.len()
    }

    /// Resolve a family by name, falling back to sans-serif with the same style.
    ///
    /// CSS generic names ("serif", "monospace", ...) map to generic families.
    pub fn resolve(&self, name: &str, weight: u16, italic: bool) -> Result<Arc<FontFace>> {
        if let Some(generic) = GenericFont::from_name(name) {
            let face = self.resolve_generic(generic, weight, italic);
            if face.is_ok() || generic == GenericFont::SansSerif {
                return face;
            }
        } else {
            let mut state = self.lock();
            state.load_if_needed();

            let cache_key = format!("{}:w{}:{}", name, weight, style_tag(italic));
            match state.faces.get(&cache_key) {
                Some(Some(face)) => return Ok(Arc::clone(face)),
                Some(None) => {}
                None => {
                    let id = state.query(Family::Name(name), weight, italic);
                    if let Some(face) = state.load_face(cache_key, id) {
                        return Ok(face);
                    }
                    tracing::warn!(
                        "Font '{}' (weight={}, italic={}) not found, falling back to sans-serif",
                        name,
                        weight,
                        italic
                    );
                }
            }
        }

        self.resolve_generic(GenericFont::SansSerif, weight, italic)
            .map_err(|_| {
                TextError::FontNotFound(format!(
                    "{} (weight={}, italic={}), no sans-serif fallback",
                    name, weight, italic
                ))
            })
    }

    /// Resolve a generic family without falling back to another category.
    ///
    /// Text categories end at the first face in the database when none of
    /// their usual families are installed; emoji never does.
    pub fn resolve_generic(&self, generic: GenericFont, weight: u16, italic: bool) -> Result<Arc<FontFace>> {
        let mut state = self.lock();
        state.load_if_needed();

        let cache_key = format!("__generic_{:?}:w{}:{}", generic, weight, style_tag(italic));
        let face = match state.faces.get(&cache_key) {
            Some(cached) => cached.clone(),
            None => {
                let id = state.query_generic(generic, weight, italic);
                state.load_face(cache_key, id)
            }
        };
        face.ok_or_else(|| {
            TextError::FontNotFound(format!(
                "generic {:?} (weight={}, italic={})",
                generic, weight, italic
            ))
        })
    }

    /// Drop cached faces (font files are re-read on next lookup)
    pub fn clear_faces(&self) {
        self.lock().faces.clear();
    }
}

impl Default for SystemFonts {
    fn default() -> Self {
        Self::new()
    }
}

fn style_tag(italic: bool) -> &'static str {
    if italic {
        "i"
    } else {
        "n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_names() {
        assert_eq!(GenericFont::from_name("Sans-Serif"), Some(GenericFont::SansSerif));
        assert_eq!(GenericFont::from_name("monospace"), Some(GenericFont::Monospace));
        assert_eq!(GenericFont::from_name("serif"), Some(GenericFont::Serif));
        assert_eq!(GenericFont::from_name("Inter"), None);
    }

    #[test]
    fn test_invalid_font_data() {
        assert!(matches!(
            FontFace::from_data_with_index(vec![0, 1, 2, 3], 0),
            Err(TextError::InvalidFontData(_))
        ));
    }

    /// Bytes of one installed face whose family fontdb does not treat as
    /// a default generic
    fn non_default_system_face() -> Vec<u8> {
        let mut db = Database::new();
        db.load_system_fonts();
        let id = db
            .faces()
            .find(|face| {
                !face
                    .families
                    .iter()
                    .any(|(name, _)| ["Arial", "Times New Roman", "Courier New"].contains(&name.as_str()))
            })
            .map(|face| face.id)
            .expect("at least one installed font");
        db.with_face_data(id, |data, _| data.to_vec()).expect("font data")
    }

    #[test]
    fn test_generic_names_with_emoji() {
        assert_eq!(GenericFont::from_name("Sans-Serif"), Some(GenericFont::SansSerif));
        assert_eq!(GenericFont::from_name("monospace"), Some(GenericFont::Monospace));
        assert_eq!(GenericFont::from_name("serif"), Some(GenericFont::Serif));
        assert_eq!(GenericFont::from_name("emoji"), Some(GenericFont::Emoji));
        assert_eq!(GenericFont::from_name("Inter"), None);
    }

    #[test]
    fn test_invalid_font_data_repeat() {
        assert!(matches!(
            FontFace::from_data_with_index(vec![0, 1, 2, 3], 0),
            Err(TextError::InvalidFontData(_))
        ));
    }

    #[test]
    fn test_empty_database_reports_missing() {
        let fonts = SystemFonts::from_font_data(Vec::new());
        assert!(matches!(
            fonts.resolve("Inter", 400, false),
            Err(TextError::FontNotFound(_))
        ));
        // Cached negative lookup answers the same way
        assert!(fonts.resolve("Inter", 400, false).is_err());
        assert!(fonts.resolve("sans-serif", 400, false).is_err());
    }

    #[test]
    fn test_generic_resolves_without_default_family() {
        let fonts = SystemFonts::from_font_data(vec![non_default_system_face()]);

        let sans = fonts.resolve("sans-serif", 400, false).unwrap();
        assert!(!sans.family_name().is_empty());
        assert_eq!(fonts.resolve("monospace", 400, false).unwrap().family_name(), sans.family_name());
        assert_eq!(fonts.resolve("Inter", 400, false).unwrap().family_name(), sans.family_name());
        assert_eq!(fonts.resolve("Inter", 700, true).unwrap().family_name(), sans.family_name());
    }

    #[test]
    fn test_emoji_never_falls_back_to_text_face() {
        let fonts = SystemFonts::from_font_data(vec![non_default_system_face()]);
        assert!(fonts.resolve_generic(GenericFont::Emoji, 400, false).is_err());
        // A named lookup of the category still lands on sans-serif
        assert!(fonts.resolve("emoji", 400, false).is_ok());
    }

    #[test]
    fn test_added_font_satisfies_earlier_miss() {
        let fonts = SystemFonts::from_font_data(Vec::new());
        assert!(fonts.resolve("sans-serif", 400, false).is_err());

        assert!(fonts.load_font_data(non_default_system_face()) >= 1);
        assert!(fonts.resolve("sans-serif", 400, false).is_ok());
    }

    #[test]
    fn test_system_sans_serif_resolves() {
        let fonts = SystemFonts::new();
        let face = fonts.resolve("sans-serif", 400, false).unwrap();
        assert!(!face.data().is_empty());
    }
}
