//! Texture and sampler descriptions
//!
//! The sprite layer never touches GPU memory; a texture here is the metadata the batch
//! primitive needs (source path, dimensions, sampling state).

use std::str::FromStr;

use crate::assets::ParseError;

/// Texture coordinate wrap mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureWrap {
    /// Tile the texture
    #[default]
    Repeat,
    /// Clamp to the edge texel
    Clamp,
}

impl FromStr for TextureWrap {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REPEAT" => Ok(Self::Repeat),
            "CLAMP" => Ok(Self::Clamp),
            _ => Err(ParseError::UnknownKeyword { kind: "texture wrap mode", value: s.to_string() }),
        }
    }
}

/// Texture minification / magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
    /// Nearest texel of the nearest mip level
    NearestMipmapNearest,
    /// Bilinear within the nearest mip level
    LinearMipmapNearest,
    /// Nearest texel, blended between mip levels
    NearestMipmapLinear,
    /// Trilinear
    LinearMipmapLinear,
}

impl FromStr for TextureFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEAREST" => Ok(Self::Nearest),
            "LINEAR" => Ok(Self::Linear),
            "NEAREST_MIPMAP_NEAREST" => Ok(Self::NearestMipmapNearest),
            "LINEAR_MIPMAP_NEAREST" => Ok(Self::LinearMipmapNearest),
            "NEAREST_MIPMAP_LINEAR" => Ok(Self::NearestMipmapLinear),
            "LINEAR_MIPMAP_LINEAR" => Ok(Self::LinearMipmapLinear),
            _ => Err(ParseError::UnknownKeyword { kind: "texture filter mode", value: s.to_string() }),
        }
    }
}

/// Parse an optional mode string, falling back to `default` when absent or invalid
///
/// An unsupported value is logged; an absent or empty one is not.
pub fn parse_mode_or<T>(value: Option<&str>, default: T) -> T
where
    T: FromStr<Err = ParseError>,
{
    match value.filter(|v| !v.is_empty()) {
        None => default,
        Some(text) => text.parse().unwrap_or_else(|e: ParseError| {
            log::error!("{}", e);
            default
        }),
    }
}

/// Sampling state attached to a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    /// Wrap mode along S
    pub wrap_s: TextureWrap,
    /// Wrap mode along T
    pub wrap_t: TextureWrap,
    /// Minification filter
    pub min_filter: TextureFilter,
    /// Magnification filter
    pub mag_filter: TextureFilter,
}

impl Sampler {
    /// Default sampling state for a texture with or without mipmaps
    pub const fn for_mipmap(mipmap: bool) -> Self {
        Self {
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
            min_filter: if mipmap { TextureFilter::NearestMipmapLinear } else { TextureFilter::Linear },
            mag_filter: TextureFilter::Linear,
        }
    }
}

/// Texture metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Source path
    pub path: String,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Whether mipmaps are generated
    pub mipmap: bool,
    /// Sampling state
    pub sampler: Sampler,
}

impl Texture {
    /// Describe a texture
    pub fn new(path: impl Into<String>, width: u32, height: u32, mipmap: bool) -> Self {
        Self {
            path: path.into(),
            width,
            height,
            mipmap,
            sampler: Sampler::for_mipmap(mipmap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parsing() {
        assert_eq!("LINEAR_MIPMAP_LINEAR".parse::<TextureFilter>(), Ok(TextureFilter::LinearMipmapLinear));
        assert!("BICUBIC".parse::<TextureFilter>().is_err());
        assert_eq!("CLAMP".parse::<TextureWrap>(), Ok(TextureWrap::Clamp));
    }

    #[test]
    fn test_mode_fallbacks() {
        assert_eq!(parse_mode_or(None, TextureWrap::Repeat), TextureWrap::Repeat);
        assert_eq!(parse_mode_or(Some(""), TextureFilter::Linear), TextureFilter::Linear);
        assert_eq!(parse_mode_or(Some("MIRROR"), TextureWrap::Clamp), TextureWrap::Clamp);
        assert_eq!(parse_mode_or(Some("NEAREST"), TextureFilter::Linear), TextureFilter::Nearest);
    }

    #[test]
    fn test_default_sampler() {
        assert_eq!(Sampler::for_mipmap(true).min_filter, TextureFilter::NearestMipmapLinear);
        assert_eq!(Sampler::for_mipmap(false).min_filter, TextureFilter::Linear);
    }
}
