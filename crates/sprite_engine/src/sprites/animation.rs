//! Animatable sprite properties
//!
//! An animation system drives sprites by reading a property into an
//! [`AnimationValue`], producing a target value and writing it back with a blend
//! weight in `[0, 1]`.

use std::str::FromStr;

use crate::assets::ParseError;

/// Properties a sprite or sprite group exposes to animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationProperty {
    /// Width and height
    Size,
    /// Width only
    SizeWidth,
    /// Height only
    SizeHeight,
    /// Local X and Y offset
    Offset,
    /// Local X offset
    OffsetX,
    /// Local Y offset
    OffsetY,
    /// Strip index and frame index into the tile sheet
    FrameIndex,
    /// Explicit source rectangle
    FrameSpecific,
    /// RGBA tint
    Tint,
    /// Horizontal and vertical gap between group cells
    Gap,
    /// Horizontal gap between group cells
    GapHorz,
    /// Vertical gap between group cells
    GapVert,
}

impl AnimationProperty {
    /// Number of float components the property carries
    pub const fn component_count(self) -> usize {
        match self {
            Self::SizeWidth | Self::SizeHeight | Self::OffsetX | Self::OffsetY => 1,
            Self::GapHorz | Self::GapVert => 1,
            Self::Size | Self::Offset | Self::FrameIndex | Self::Gap => 2,
            Self::Tint | Self::FrameSpecific => 4,
        }
    }

    /// True for the properties only sprite groups support
    pub const fn is_group_property(self) -> bool {
        matches!(self, Self::Gap | Self::GapHorz | Self::GapVert)
    }
}

impl FromStr for AnimationProperty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANIMATE_SIZE" => Ok(Self::Size),
            "ANIMATE_SIZE_WIDTH" => Ok(Self::SizeWidth),
            "ANIMATE_SIZE_HEIGHT" => Ok(Self::SizeHeight),
            "ANIMATE_OFFSET" => Ok(Self::Offset),
            "ANIMATE_OFFSET_X" => Ok(Self::OffsetX),
            "ANIMATE_OFFSET_Y" => Ok(Self::OffsetY),
            "ANIMATE_FRAME_INDEX" => Ok(Self::FrameIndex),
            "ANIMATE_FRAME_SPECIFIC" => Ok(Self::FrameSpecific),
            "ANIMATE_TINT" => Ok(Self::Tint),
            "ANIMATE_GAP" => Ok(Self::Gap),
            "ANIMATE_GAP_HORZ" => Ok(Self::GapHorz),
            "ANIMATE_GAP_VERT" => Ok(Self::GapVert),
            _ => Err(ParseError::UnknownKeyword { kind: "animation property", value: s.to_string() }),
        }
    }
}

/// Float buffer exchanged with the animation system
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnimationValue {
    values: Vec<f32>,
}

impl AnimationValue {
    /// A zeroed value with `count` components
    pub fn new(count: usize) -> Self {
        Self { values: vec![0.0; count] }
    }

    /// A value holding the given components
    pub fn from_floats(values: &[f32]) -> Self {
        Self { values: values.to_vec() }
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the value has no components
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Component at `index`; missing components read as zero
    pub fn float(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or_default()
    }

    /// Set the component at `index`, growing the buffer if needed
    pub fn set_float(&mut self, index: usize, value: f32) {
        if index >= self.values.len() {
            self.values.resize(index + 1, 0.0);
        }
        self.values[index] = value;
    }

    /// All components
    pub fn floats(&self) -> &[f32] {
        &self.values
    }

    /// Copy `values` into the buffer starting at `index`
    pub fn set_floats(&mut self, index: usize, values: &[f32]) {
        for (offset, value) in values.iter().enumerate() {
            self.set_float(index + offset, *value);
        }
    }
}

/// A named animation clip requested by a sprite definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationClip {
    /// Clip id
    pub id: String,
    /// Path to the animation definition
    pub path: String,
}
