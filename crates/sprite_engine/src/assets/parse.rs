//! Typed parsers for string-encoded configuration values
//!
//! Positional text vectors such as `"W,H"` or `"X,Y,W,H"` are decoded here into
//! strongly typed values, with a specific error for every way the text can be wrong.

use thiserror::Error;

/// Errors raised while decoding string-encoded values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The value had the wrong number of components
    #[error("expected {expected} comma separated values in '{value}'")]
    ComponentCount {
        /// Number of components required
        expected: usize,
        /// Offending text
        value: String,
    },

    /// A component was not an unsigned integer
    #[error("'{component}' in '{value}' is not an unsigned integer")]
    NotUnsigned {
        /// Offending component
        component: String,
        /// Full text
        value: String,
    },

    /// Flip text contained something other than HORZ/VERT tokens
    #[error("could not parse '{0}' to a flip value")]
    InvalidFlip(String),

    /// A `TS` tile reference was malformed
    #[error("invalid tile sheet reference '{0}'")]
    InvalidTileReference(String),

    /// An enumerated keyword was not recognized
    #[error("unsupported {kind} '{value}'")]
    UnknownKeyword {
        /// Which enumeration was being parsed
        kind: &'static str,
        /// Offending text
        value: String,
    },
}

/// Parse `"A,B"` into two unsigned integers
pub fn parse_unsigned_pair(value: &str) -> Result<(u32, u32), ParseError> {
    let [a, b] = parse_unsigned::<2>(value)?;
    Ok((a, b))
}

/// Parse `"A,B,C,D"` into four unsigned integers
pub fn parse_unsigned_quad(value: &str) -> Result<(u32, u32, u32, u32), ParseError> {
    let [a, b, c, d] = parse_unsigned::<4>(value)?;
    Ok((a, b, c, d))
}

fn parse_unsigned<const N: usize>(value: &str) -> Result<[u32; N], ParseError> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(ParseError::ComponentCount { expected: N, value: value.to_string() });
    }

    let mut out = [0u32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|_| ParseError::NotUnsigned {
            component: part.to_string(),
            value: value.to_string(),
        })?;
    }
    Ok(out)
}
