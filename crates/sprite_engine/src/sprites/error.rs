//! Configuration loading errors

use thiserror::Error;

use crate::assets::{AssetError, ParseError, PropertiesError};

/// Errors raised while building tile sheets, sprites and sprite groups from
/// configuration
#[derive(Error, Debug)]
pub enum LoadError {
    /// The properties object carried the wrong namespace tag
    #[error("Properties object must have namespace equal to '{expected}' (found '{found}')")]
    WrongNamespace {
        /// Namespace the loader accepts
        expected: &'static str,
        /// Namespace found
        found: String,
    },

    /// The file held no definition at all
    #[error("No {0} definition found")]
    MissingDefinition(&'static str),

    /// The block has no id
    #[error("{0} is missing required id")]
    MissingId(&'static str),

    /// A required field is absent or empty
    #[error("'{owner}' is missing required field '{field}'")]
    MissingField {
        /// Id of the object being loaded
        owner: String,
        /// Field name
        field: &'static str,
    },

    /// A field is present but could not be interpreted
    #[error("'{owner}' has invalid '{field}': {message}")]
    InvalidField {
        /// Id of the object being loaded
        owner: String,
        /// Field name
        field: &'static str,
        /// What was wrong
        message: String,
    },

    /// A string-encoded value failed to parse
    #[error("'{owner}': {source}")]
    Parse {
        /// Id of the object being loaded
        owner: String,
        /// Underlying parse failure
        #[source]
        source: ParseError,
    },

    /// Exactly one of the two shader paths was given
    #[error("Tile sheet '{0}': both fragment and vertex shaders need to be specified if one of them is")]
    ShaderPair(String),

    /// A strip declared no frames
    #[error("Strip '{0}' must have one or more frames")]
    EmptyStrip(String),

    /// A frame has no offset
    #[error("Frame {frame} of strip '{strip}' is missing its offset")]
    MissingFrameOffset {
        /// Strip id
        strip: String,
        /// Frame index within the strip
        frame: usize,
    },

    /// A frame resolved to a zero size
    #[error("Frame {frame} of strip '{strip}' has zero size")]
    ZeroSizeFrame {
        /// Strip id
        strip: String,
        /// Frame index within the strip
        frame: usize,
    },

    /// Cells reference child sprites but the group has no sprite pool
    #[error("Sprite group '{0}' assigns children but has no 'sprites' block")]
    MissingSpritePool(String),

    /// Two pool sprites share a name
    #[error("Sprite group '{group}' defines sprite '{name}' more than once")]
    DuplicateSprite {
        /// Group id
        group: String,
        /// Duplicated name
        name: String,
    },

    /// A cell references a name missing from the pool
    #[error("Sprite group '{group}' references unknown sprite '{name}'")]
    UnresolvedChild {
        /// Group id
        group: String,
        /// Unresolved name
        name: String,
    },

    /// A cell assignment fell outside the grid
    #[error("Sprite group '{group}' has no cell at ({x}, {y})")]
    CellOutOfRange {
        /// Group id
        group: String,
        /// Column
        x: u32,
        /// Row
        y: u32,
    },

    /// A required tile sheet failed to load
    #[error("'{owner}' could not load required tilesheet: {source}")]
    TileSheet {
        /// Id of the object that needed the sheet
        owner: String,
        /// Why the sheet failed
        #[source]
        source: Box<LoadError>,
    },

    /// A pool entry of a sprite group failed to load
    #[error("Sprite group '{group}' could not load children: {source}")]
    Child {
        /// Group id
        group: String,
        /// Why the child failed
        #[source]
        source: Box<LoadError>,
    },

    /// The configuration text could not be read
    #[error("Properties error: {0}")]
    Properties(#[from] PropertiesError),

    /// A referenced asset could not be read
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

impl LoadError {
    /// Log the error and hand it back for propagation
    pub(crate) fn logged(self) -> Self {
        log::error!("{}", self);
        self
    }
}
