//! Sprite mirroring flags

use bitflags::bitflags;

use crate::assets::ParseError;

bitflags! {
    /// Axes a sprite is mirrored along
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flip: u8 {
        /// Mirror horizontally
        const HORZ = 0b01;
        /// Mirror vertically
        const VERT = 0b10;
    }
}

impl Flip {
    /// No mirroring
    pub const NONE: Self = Self::empty();
}

/// Parse a flip string such as `"HORZ"`, `"VERT"` or `"VERT|HORZ"`
///
/// Empty text means [`Flip::NONE`]. Otherwise the text holds one or two `|`
/// separated tokens, each containing `HORZ` or `VERT`.
pub fn parse_flip(value: &str) -> Result<Flip, ParseError> {
    if value.is_empty() {
        return Ok(Flip::NONE);
    }

    let tokens: Vec<&str> = value.split('|').collect();
    if tokens.len() > 2 {
        return Err(ParseError::InvalidFlip(value.to_string()));
    }

    tokens.into_iter().try_fold(Flip::NONE, |flip, token| {
        if token.contains("HORZ") {
            Ok(flip | Flip::HORZ)
        } else if token.contains("VERT") {
            Ok(flip | Flip::VERT)
        } else {
            Err(ParseError::InvalidFlip(value.to_string()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_axis() {
        assert_eq!(parse_flip("HORZ"), Ok(Flip::HORZ));
        assert_eq!(parse_flip("VERT"), Ok(Flip::VERT));
    }

    #[test]
    fn test_both_axes_any_order() {
        assert_eq!(parse_flip("HORZ|VERT"), Ok(Flip::HORZ | Flip::VERT));
        assert_eq!(parse_flip("VERT|HORZ"), Ok(Flip::HORZ | Flip::VERT));
        assert_eq!(parse_flip("FLIP_HORZ | FLIP_VERT"), Ok(Flip::all()));
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(parse_flip(""), Ok(Flip::NONE));
        assert!(Flip::NONE.is_empty());
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(parse_flip("DIAGONAL"), Err(ParseError::InvalidFlip("DIAGONAL".to_string())));
        assert!(parse_flip("HORZ|").is_err());
        assert!(parse_flip("HORZ|VERT|HORZ").is_err());
    }
}
