//! Off-screen render targets
//!
//! A render target wraps the texture it renders into. Targets are shared through
//! [`Rc`] and tracked by a [`RenderTargets`] registry that only holds weak
//! references, so a target disappears from lookup once its last holder drops it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use thiserror::Error;

use super::Texture;
use crate::assets::ParseError;

/// Render target creation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderTargetError {
    /// Width or height was zero
    #[error("Render target '{id}' has invalid size {width}x{height}")]
    InvalidSize {
        /// Target id
        id: String,
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// The pixel format string was not recognized
    #[error("Render target format: {0}")]
    InvalidFormat(#[from] ParseError),

    /// Another live target already uses this id
    #[error("Render target '{0}' already exists")]
    DuplicateId(String),
}

/// Pixel format of a render target texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    /// 8-bit RGB
    Rgb,
    /// 8-bit RGBA
    #[default]
    Rgba,
    /// 8-bit alpha only
    Alpha,
}

impl FromStr for TextureFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RGB" => Ok(Self::Rgb),
            "RGBA" => Ok(Self::Rgba),
            "ALPHA" => Ok(Self::Alpha),
            _ => Err(ParseError::UnknownKeyword { kind: "texture format", value: s.to_string() }),
        }
    }
}

/// A texture that can be rendered into
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    id: String,
    texture: Texture,
    format: TextureFormat,
}

impl RenderTarget {
    /// Target id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Backing texture
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.texture.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.texture.height
    }

    /// Pixel format
    pub fn format(&self) -> TextureFormat {
        self.format
    }
}

/// Registry of live render targets
#[derive(Debug, Default)]
pub struct RenderTargets {
    targets: RefCell<Vec<Weak<RenderTarget>>>,
}

impl RenderTargets {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a target with a fresh texture of the given size
    pub fn create(
        &self,
        id: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Result<Rc<RenderTarget>, RenderTargetError> {
        if width == 0 || height == 0 {
            log::error!("Render target '{}' requires a non-zero size ({}x{})", id, width, height);
            return Err(RenderTargetError::InvalidSize { id: id.to_string(), width, height });
        }
        self.create_from_texture(id, Texture::new("", width, height, false), format)
    }

    /// Create a target rendering into an existing texture
    pub fn create_from_texture(
        &self,
        id: &str,
        texture: Texture,
        format: TextureFormat,
    ) -> Result<Rc<RenderTarget>, RenderTargetError> {
        if texture.width == 0 || texture.height == 0 {
            return Err(RenderTargetError::InvalidSize {
                id: id.to_string(),
                width: texture.width,
                height: texture.height,
            });
        }
        if self.get(id).is_some() {
            log::error!("Render target '{}' already exists", id);
            return Err(RenderTargetError::DuplicateId(id.to_string()));
        }

        let target = Rc::new(RenderTarget { id: id.to_string(), texture, format });
        self.targets.borrow_mut().push(Rc::downgrade(&target));
        log::debug!("Created render target '{}' ({}x{})", id, target.width(), target.height());
        Ok(target)
    }

    /// Find a live target by id
    pub fn get(&self, id: &str) -> Option<Rc<RenderTarget>> {
        self.prune();
        self.targets
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .find(|target| target.id == id)
    }

    /// Number of live targets
    pub fn len(&self) -> usize {
        self.prune();
        self.targets.borrow().len()
    }

    /// True when no target is alive
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self) {
        self.targets.borrow_mut().retain(|t| t.strong_count() > 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_lookup() {
        let targets = RenderTargets::new();
        let target = targets.create("minimap", 256, 128, TextureFormat::Rgba).unwrap();
        assert_eq!(target.width(), 256);
        assert_eq!(target.height(), 128);

        let found = targets.get("minimap").unwrap();
        assert!(Rc::ptr_eq(&target, &found));
        assert!(targets.get("other").is_none());
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let targets = RenderTargets::new();
        assert!(matches!(
            targets.create("bad", 0, 64, TextureFormat::Rgb),
            Err(RenderTargetError::InvalidSize { .. })
        ));
        assert!(targets.is_empty());
    }

    #[test]
    fn test_dropped_target_leaves_lookup() {
        let targets = RenderTargets::new();
        let target = targets.create("shadow", 64, 64, TextureFormat::Alpha).unwrap();
        assert_eq!(targets.len(), 1);
        assert!(targets.create("shadow", 64, 64, TextureFormat::Alpha).is_err());

        drop(target);
        assert!(targets.get("shadow").is_none());
        assert!(targets.create("shadow", 32, 32, TextureFormat::Alpha).is_ok());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("RGB".parse::<TextureFormat>(), Ok(TextureFormat::Rgb));
        assert!("BGR".parse::<TextureFormat>().is_err());
    }
}
