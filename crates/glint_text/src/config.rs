//! Text drawer configuration (`glint.toml`, `[text]` table or standalone)

use crate::{Result, TextError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables for the text drawer and its backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TextConfig {
    /// Frames an entry may sit unused before a sweep evicts it
    #[serde(default = "default_eviction_age")]
    pub eviction_age: u32,
    /// Sweep the caches every this many frames
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u32,
    /// Family used when a requested font cannot be resolved
    #[serde(default = "default_font")]
    pub default_font: String,
    /// Pixel size used with `default_font`
    #[serde(default = "default_font_size")]
    pub default_font_size: u32,
    /// Bitmaps are padded to a multiple of this many pixels
    #[serde(default = "default_bitmap_padding")]
    pub bitmap_padding: u32,
}

fn default_eviction_age() -> u32 {
    100
}

// Prime, so sweeps don't line up with other periodic work
fn default_sweep_interval() -> u32 {
    23
}

fn default_font() -> String {
    "sans-serif".to_string()
}

fn default_font_size() -> u32 {
    16
}

fn default_bitmap_padding() -> u32 {
    4
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            eviction_age: default_eviction_age(),
            sweep_interval: default_sweep_interval(),
            default_font: default_font(),
            default_font_size: default_font_size(),
            bitmap_padding: default_bitmap_padding(),
        }
    }
}

impl TextConfig {
    /// Parse a TOML document. Accepts either a `[text]` table or the fields
    /// at the top level.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut table: toml::Table =
            toml::from_str(content).map_err(|e| TextError::Config(e.to_string()))?;

        let section = match table.remove("text") {
            Some(text) => text,
            None => toml::Value::Table(table),
        };
        let config: TextConfig = section
            .try_into()
            .map_err(|e: toml::de::Error| TextError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TextError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.sweep_interval == 0 {
            return Err(TextError::Config("sweep_interval must be at least 1".into()));
        }
        if self.default_font_size == 0 {
            return Err(TextError::Config("default_font_size must be at least 1".into()));
        }
        Ok(())
    }
}
