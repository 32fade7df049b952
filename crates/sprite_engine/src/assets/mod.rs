//! Asset management system
//!
//! Configuration text and texture metadata reach the sprite layer through an
//! [`AssetSource`], so loaders work the same against the file system and against
//! in-memory fixtures.

pub mod parse;
pub mod properties;

pub use parse::ParseError;
pub use properties::{Properties, PropertiesError, PropertiesParser, Property, PropertyType};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Dimensions of a texture file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
}

/// Source of configuration text and texture metadata
pub trait AssetSource {
    /// Read a text file
    fn read_text(&self, path: &str) -> Result<String, AssetError>;

    /// Probe the dimensions of a texture file
    fn texture_info(&self, path: &str) -> Result<TextureInfo, AssetError>;
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// File system asset source honouring a list of search directories
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    search_paths: Vec<PathBuf>,
}

impl FileAssetSource {
    /// Create a source searching the given directories in order
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve a relative path against the search directories
    pub fn resolve(&self, path: &str) -> Result<PathBuf, AssetError> {
        let direct = Path::new(path);
        if direct.is_absolute() {
            return if direct.exists() {
                Ok(direct.to_path_buf())
            } else {
                Err(AssetError::NotFound(path.to_string()))
            };
        }

        self.search_paths
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

impl AssetSource for FileAssetSource {
    fn read_text(&self, path: &str) -> Result<String, AssetError> {
        let resolved = self.resolve(path)?;
        log::trace!("Reading {:?}", resolved);
        Ok(std::fs::read_to_string(resolved)?)
    }

    fn texture_info(&self, path: &str) -> Result<TextureInfo, AssetError> {
        let resolved = self.resolve(path)?;
        let (width, height) = image::image_dimensions(&resolved)
            .map_err(|e| AssetError::InvalidData(format!("{}: {}", resolved.display(), e)))?;
        Ok(TextureInfo { width, height })
    }
}

/// In-memory asset source
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetSource {
    texts: HashMap<String, String>,
    textures: HashMap<String, TextureInfo>,
}

impl MemoryAssetSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a text file
    pub fn add_text(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.texts.insert(path.into(), contents.into());
    }

    /// Register a texture with its dimensions
    pub fn add_texture(&mut self, path: impl Into<String>, width: u32, height: u32) {
        self.textures.insert(path.into(), TextureInfo { width, height });
    }

    /// Builder form of [`Self::add_text`]
    #[must_use]
    pub fn with_text(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.add_text(path, contents);
        self
    }

    /// Builder form of [`Self::add_texture`]
    #[must_use]
    pub fn with_texture(mut self, path: impl Into<String>, width: u32, height: u32) -> Self {
        self.add_texture(path, width, height);
        self
    }
}

impl AssetSource for MemoryAssetSource {
    fn read_text(&self, path: &str) -> Result<String, AssetError> {
        self.texts
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    fn texture_info(&self, path: &str) -> Result<TextureInfo, AssetError> {
        self.textures
            .get(path)
            .copied()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_source_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        let res = dir.path().join("res");
        std::fs::create_dir_all(&res).unwrap();
        std::fs::write(res.join("hero.sprite"), "sprite hero\n{\n}\n").unwrap();

        let image = image::RgbaImage::new(24, 8);
        image.save(res.join("hero.png")).unwrap();

        let source = FileAssetSource::new([dir.path().to_path_buf(), res.clone()]);
        assert!(source.read_text("hero.sprite").unwrap().starts_with("sprite hero"));
        assert_eq!(
            source.texture_info("res/hero.png").unwrap(),
            TextureInfo { width: 24, height: 8 }
        );
        assert!(matches!(source.read_text("missing.sprite"), Err(AssetError::NotFound(_))));
    }

    #[test]
    fn test_memory_source() {
        let source = MemoryAssetSource::new()
            .with_text("a.sheet", "tilesheet a\n{\n}\n")
            .with_texture("a.png", 64, 32);
        assert!(source.read_text("a.sheet").is_ok());
        assert_eq!(source.texture_info("a.png").unwrap().width, 64);
        assert!(source.texture_info("b.png").is_err());
    }
}
