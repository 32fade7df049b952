//! Configuration system
//!
//! Engine-level settings for the sprite layer, loadable from TOML or RON files.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// On-disk encodings a settings file may use, picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format of `path`, from its extension
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Settings that can be read from and written to TOML or RON files
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read settings from `path`
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;

        match format {
            ConfigFormat::Toml => toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Read settings from `path`, falling back to defaults when that fails
    fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load_from_file(path).unwrap_or_else(|e| {
            log::warn!("Using default settings, {} could not be read: {}", path.display(), e);
            Self::default()
        })
    }

    /// Write settings to `path` in the format its extension names
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };
        std::fs::write(path, text)?;
        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }
}

/// Settings file errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file's contents do not describe the settings
    #[error("malformed settings: {0}")]
    Parse(String),

    /// The settings could not be encoded
    #[error("could not encode settings: {0}")]
    Serialize(String),

    /// The extension is neither `.toml` nor `.ron`
    #[error("unsupported settings format: {0}")]
    UnsupportedFormat(String),
}

/// Settings shared by every sprite, group and tile sheet created through a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteSettings {
    /// Directories searched, in order, when resolving asset paths
    pub search_paths: Vec<String>,
    /// Offset given to every newly created sprite
    pub default_sprite_offset: [f32; 2],
    /// Whether newly created sprite groups cull cells against the camera frustum
    pub frustum_cull: bool,
    /// Initial capacity handed to each tile sheet's batch
    pub initial_batch_capacity: u32,
}

impl Default for SpriteSettings {
    fn default() -> Self {
        Self {
            search_paths: vec![String::new(), "res/".to_string(), "assets/".to_string()],
            default_sprite_offset: [0.0, 0.0],
            frustum_cull: true,
            initial_batch_capacity: 0,
        }
    }
}

impl Config for SpriteSettings {}
