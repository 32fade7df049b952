//! Sprites: textured quads bound to a tile sheet
//!
//! A sprite shows either its default tile or an explicit frame. Writing
//! [`AnimationProperty::FrameIndex`] or [`AnimationProperty::FrameSpecific`] switches
//! to the explicit frame; an out-of-range frame index falls back to the default tile.

use std::rc::Rc;

use super::{
    parse_flip, share, AnimationClip, AnimationProperty, AnimationValue, Drawable, Flip, LoadError,
    ResourceCatalog, SharedDrawable, TileSheet,
};
use crate::assets::{ParseError, Properties, PropertyType};
use crate::foundation::math::{lerp, planar_angle, Rect, Vec2, Vec3, Vec4};
use crate::render::{Camera, SpriteQuad, SpriteRenderer};
use crate::scene::{NodeCloneContext, NodeId, Scene};

/// Rotation pivot of a lone sprite: its center
const CENTER: Vec2 = Vec2::new(0.5, 0.5);

/// A `TS` reference to a tile sheet frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileRef {
    /// `TS <stripIndex>,<frameIndex>`
    Index {
        /// Strip index
        strip: u32,
        /// Frame index
        frame: u32,
    },
    /// `TS <stripId>,<frameIndex>`
    Id {
        /// Strip id
        strip: String,
        /// Frame index
        frame: u32,
    },
}

impl TileRef {
    /// Look the referenced frame up in `sheet`
    pub fn resolve(&self, sheet: &TileSheet) -> Option<Rect> {
        match self {
            Self::Index { strip, frame } => sheet.try_strip_frame(*strip as usize, *frame as usize),
            Self::Id { strip, frame } => {
                let index = sheet.strip_index(strip)?;
                sheet.try_strip_frame(index, *frame as usize)
            }
        }
    }
}

/// Parse `"TS <strip>,<frame>"` where strip is an index or a strip id
pub fn parse_tile_reference(value: &str) -> Result<TileRef, ParseError> {
    let invalid = || ParseError::InvalidTileReference(value.to_string());

    let body = value.strip_prefix("TS ").ok_or_else(invalid)?;
    let (strip, frame) = body.split_once(',').ok_or_else(invalid)?;
    let strip = strip.trim();
    let frame: u32 = frame.trim().parse().map_err(|_| invalid())?;
    if strip.is_empty() {
        return Err(invalid());
    }

    Ok(match strip.parse::<u32>() {
        Ok(index) => TileRef::Index { strip: index, frame },
        Err(_) => TileRef::Id { strip: strip.to_string(), frame },
    })
}

/// The three encodings of a sprite's `defaultTile`
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultTile {
    /// `width, height` at the texture origin
    Size(Vec2),
    /// `x, y, width, height`
    Rect(Rect),
    /// A frame of the sprite's tile sheet
    Frame(TileRef),
}

/// Interpret the `defaultTile` field of a sprite definition
fn parse_default_tile(properties: &Properties) -> Result<Option<DefaultTile>, ParseError> {
    let Some(value) = properties.get_string("defaultTile") else {
        return Ok(None);
    };

    if value.starts_with("TS ") {
        return parse_tile_reference(value).map(|r| Some(DefaultTile::Frame(r)));
    }

    let tile = match properties.property_type("defaultTile") {
        PropertyType::Vector4 => properties
            .get_vector4("defaultTile")
            .map(|v| DefaultTile::Rect(Rect::new(v.x, v.y, v.z, v.w))),
        PropertyType::Vector2 => properties.get_vector2("defaultTile").map(DefaultTile::Size),
        _ => None,
    };
    tile.map(Some).ok_or_else(|| ParseError::InvalidTileReference(value.to_string()))
}

/// Where and how a sprite sits in the world for one draw
pub(crate) struct Placement<'s> {
    /// Anchor position including the sprite's local offset
    pub position: Vec3,
    /// Node scale on X and Y
    pub scale: Vec2,
    /// Rotation about Z
    pub angle: f32,
    /// Active camera, only when drawing relative to a node
    pub camera: Option<&'s Camera>,
}

/// Negate flipped size axes and move the anchor so the quad keeps its footprint
pub(crate) fn apply_flip(flip: Flip, position: &mut Vec3, size: &mut Vec2) {
    if flip.contains(Flip::HORZ) {
        position.x += size.x;
        size.x = -size.x;
    }
    if flip.contains(Flip::VERT) {
        position.y += size.y;
        size.y = -size.y;
    }
}

/// A drawable quad bound to a tile sheet
#[derive(Debug, Clone)]
pub struct Sprite {
    id: String,
    tile_sheet: Rc<TileSheet>,
    node: Option<NodeId>,
    width: f32,
    height: f32,
    x: f32,
    y: f32,
    tint: Vec4,
    flip: Flip,
    default_tile: Rect,
    default_tile_in_use: bool,
    frame: Rect,
    strip_index: usize,
    strip_frame: usize,
    animations: Vec<AnimationClip>,
}

impl Sprite {
    /// Create a sprite covering the whole texture of `tile_sheet`
    pub fn create(id: &str, tile_sheet: &Rc<TileSheet>) -> Self {
        let texture = tile_sheet.texture();
        let default_tile = Rect::from_size(texture.width as f32, texture.height as f32);
        Self {
            id: id.to_string(),
            tile_sheet: Rc::clone(tile_sheet),
            node: None,
            width: default_tile.width,
            height: default_tile.height,
            x: 0.0,
            y: 0.0,
            tint: Vec4::new(1.0, 1.0, 1.0, 1.0),
            flip: Flip::NONE,
            default_tile,
            default_tile_in_use: true,
            frame: default_tile,
            strip_index: 0,
            strip_frame: 0,
            animations: Vec::new(),
        }
    }

    /// Load a sprite from a properties URL
    pub fn create_from_url(url: &str, catalog: &ResourceCatalog) -> Result<Self, LoadError> {
        catalog.load_sprite(url)
    }

    /// Build a sprite from a `sprite` properties block
    pub fn from_properties(properties: &Properties, catalog: &ResourceCatalog) -> Result<Self, LoadError> {
        if properties.namespace() != "sprite" {
            return Err(LoadError::WrongNamespace {
                expected: "sprite",
                found: properties.namespace().to_string(),
            }
            .logged());
        }

        let id = properties.id();
        let tile_sheet = load_required_tile_sheet(properties, id, catalog)?;

        let mut sprite = catalog.create_sprite(id, &tile_sheet);
        sprite.load_properties(properties, "Sprite")?;
        Ok(sprite)
    }

    /// Apply the fields shared by sprite and sprite group definitions
    pub(crate) fn load_properties(&mut self, properties: &Properties, class_name: &str) -> Result<(), LoadError> {
        let owner = properties.id().to_string();

        if properties.exists("tint") {
            let tint = match properties.property_type("tint") {
                PropertyType::Vector3 => properties.get_vector3("tint").map(|v| Vec4::new(v.x, v.y, v.z, 1.0)),
                PropertyType::Vector4 => properties.get_vector4("tint"),
                _ => properties.get_color("tint"),
            };
            let tint = tint.ok_or_else(|| {
                LoadError::InvalidField {
                    owner: owner.clone(),
                    field: "tint",
                    message: "expected a vector3, vector4 or color".to_string(),
                }
                .logged()
            })?;
            self.set_tint(tint);
        }

        let default_tile = parse_default_tile(properties).map_err(|source| {
            log::error!(
                "Default tile needs to be either x,y,width,height or just width,height or a tile sheet \
                 reference (TS *) with a stripIndex, frameIndex or stripId, frameIndex for {}.",
                class_name
            );
            LoadError::Parse { owner: owner.clone(), source }
        })?;
        if let Some(default_tile) = default_tile {
            let rect = match default_tile {
                DefaultTile::Size(size) => Rect::from_size(size.x, size.y),
                DefaultTile::Rect(rect) => rect,
                DefaultTile::Frame(reference) => reference.resolve(&self.tile_sheet).ok_or_else(|| {
                    LoadError::InvalidField {
                        owner: owner.clone(),
                        field: "defaultTile",
                        message: format!("{:?} is not a frame of tile sheet '{}'", reference, self.tile_sheet.id()),
                    }
                    .logged()
                })?,
            };
            self.set_default_tile(rect);
        }

        if let Some(size) = properties.get_vector2("size") {
            self.set_size(size.x, size.y);
        }

        if let Some(offset) = properties.get_vector2("worldOffset") {
            self.set_offset(offset.x, offset.y);
        }

        if let Some(value) = properties.get_string("flip") {
            let flip = parse_flip(value).map_err(|source| {
                log::error!("Could not parse '{}' to FLIP value.", value);
                LoadError::Parse { owner: owner.clone(), source }
            })?;
            self.set_flip(flip);
        }

        properties.rewind();
        while let Some(animation) = properties.next_namespace() {
            if animation.namespace() != "animation" {
                continue;
            }
            if animation.id().is_empty() {
                log::error!("Animation ID is required for {} animations.", class_name);
                return Err(LoadError::MissingId("Animation"));
            }
            let path = animation.get_non_empty("path").ok_or_else(|| {
                log::error!("Animation path is required for {} animations.", class_name);
                LoadError::MissingField { owner: animation.id().to_string(), field: "path" }
            })?;
            self.animations.push(AnimationClip { id: animation.id().to_string(), path: path.to_string() });
        }

        Ok(())
    }

    /// Identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The tile sheet this sprite draws from
    pub fn tile_sheet(&self) -> &Rc<TileSheet> {
        &self.tile_sheet
    }

    /// Node this sprite is attached to
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Set the node back-reference; normally done by [`Scene::set_drawable`]
    pub fn set_node(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    /// Mirroring flags
    pub fn flip(&self) -> Flip {
        self.flip
    }

    /// Set mirroring flags
    pub fn set_flip(&mut self, flip: Flip) {
        self.flip = flip & (Flip::HORZ | Flip::VERT);
    }

    /// Default tile rectangle
    pub fn default_tile(&self) -> Rect {
        self.default_tile
    }

    /// Set the default tile; also the current frame while the default tile is shown
    pub fn set_default_tile(&mut self, tile: Rect) {
        self.default_tile = tile;
        if self.default_tile_in_use {
            self.frame = tile;
        }
    }

    /// True while the default tile is shown instead of an explicit frame
    pub fn default_tile_in_use(&self) -> bool {
        self.default_tile_in_use
    }

    /// The explicit animation frame
    pub fn frame(&self) -> Rect {
        self.frame
    }

    /// Strip and frame index last selected through [`AnimationProperty::FrameIndex`]
    pub fn strip_position(&self) -> (usize, usize) {
        (self.strip_index, self.strip_frame)
    }

    /// The rectangle drawn: the default tile or the explicit frame
    pub fn current_frame(&self) -> Rect {
        if self.default_tile_in_use {
            self.default_tile
        } else {
            self.frame
        }
    }

    /// Size in world units
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Width in world units
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Height in world units
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Set the size
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Set the width
    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    /// Set the height
    pub fn set_height(&mut self, height: f32) {
        self.height = height;
    }

    /// Local offset from the node position
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Set the local offset
    pub fn set_offset(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// Set the local X offset
    pub fn set_offset_x(&mut self, x: f32) {
        self.x = x;
    }

    /// Set the local Y offset
    pub fn set_offset_y(&mut self, y: f32) {
        self.y = y;
    }

    /// RGBA tint
    pub fn tint(&self) -> Vec4 {
        self.tint
    }

    /// Set the RGBA tint
    pub fn set_tint(&mut self, tint: Vec4) {
        self.tint = tint;
    }

    /// Animation clips requested by the sprite's definition
    pub fn animations(&self) -> &[AnimationClip] {
        &self.animations
    }

    /// Copy for a cloned scene; the node reference resolves through `context`
    ///
    /// A node outside the cloned set leaves the copy without a node.
    pub fn clone_with(&self, context: &NodeCloneContext) -> Self {
        let mut copy = self.clone();
        copy.node = self.node.and_then(|n| context.find_cloned_node(n));
        copy
    }

    /// Copy every setting except id, tile sheet and node from `other`
    pub(crate) fn copy_settings_from(&mut self, other: &Sprite) {
        self.width = other.width;
        self.height = other.height;
        self.x = other.x;
        self.y = other.y;
        self.tint = other.tint;
        self.flip = other.flip;
        self.default_tile = other.default_tile;
        self.default_tile_in_use = other.default_tile_in_use;
        self.frame = other.frame;
        self.strip_index = other.strip_index;
        self.strip_frame = other.strip_frame;
        self.animations = other.animations.clone();
    }

    /// Resolve world position, rotation and scale for a draw
    pub(crate) fn placement<'s>(&self, scene: &'s Scene) -> Placement<'s> {
        let mut placement = Placement {
            position: Vec3::zeros(),
            scale: Vec2::new(1.0, 1.0),
            angle: 0.0,
            camera: None,
        };

        if let Some((id, node)) = self.node.and_then(|id| scene.node(id).map(|n| (id, n))) {
            placement.position = scene.translation_world(id);
            placement.angle = planar_angle(&node.rotation);
            placement.scale = Vec2::new(node.scale.x, node.scale.y);
            placement.camera = scene.active_camera();
        }

        placement.position.x += self.x;
        placement.position.y += self.y;
        placement
    }

    pub(crate) fn property_count(property: AnimationProperty) -> Option<usize> {
        (!property.is_group_property()).then(|| property.component_count())
    }

    pub(crate) fn property_value(&self, property: AnimationProperty) -> Option<AnimationValue> {
        let floats = match property {
            AnimationProperty::Size => vec![self.width, self.height],
            AnimationProperty::SizeWidth => vec![self.width],
            AnimationProperty::SizeHeight => vec![self.height],
            AnimationProperty::Offset => vec![self.x, self.y],
            AnimationProperty::OffsetX => vec![self.x],
            AnimationProperty::OffsetY => vec![self.y],
            AnimationProperty::FrameIndex => vec![self.strip_index as f32, self.strip_frame as f32],
            AnimationProperty::FrameSpecific => self.frame.to_array().to_vec(),
            AnimationProperty::Tint => self.tint.as_slice().to_vec(),
            AnimationProperty::Gap | AnimationProperty::GapHorz | AnimationProperty::GapVert => return None,
        };
        Some(AnimationValue::from_floats(&floats))
    }

    pub(crate) fn set_property_value(&mut self, property: AnimationProperty, value: &AnimationValue, t: f32) {
        debug_assert!((0.0..=1.0).contains(&t));
        match property {
            AnimationProperty::Size => {
                self.set_size(lerp(self.width, value.float(0), t), lerp(self.height, value.float(1), t));
            }
            AnimationProperty::SizeWidth => self.set_width(lerp(self.width, value.float(0), t)),
            AnimationProperty::SizeHeight => self.set_height(lerp(self.height, value.float(0), t)),
            AnimationProperty::Offset => {
                self.set_offset(lerp(self.x, value.float(0), t), lerp(self.y, value.float(1), t));
            }
            AnimationProperty::OffsetX => self.set_offset_x(lerp(self.x, value.float(0), t)),
            AnimationProperty::OffsetY => self.set_offset_y(lerp(self.y, value.float(0), t)),
            AnimationProperty::FrameIndex => self.blend_frame_index(value, t),
            AnimationProperty::FrameSpecific => {
                self.default_tile_in_use = false;
                let target = Rect::new(value.float(0), value.float(1), value.float(2), value.float(3));
                self.frame = self.frame.lerp(&target, t);
            }
            AnimationProperty::Tint => {
                let target = Vec4::new(value.float(0), value.float(1), value.float(2), value.float(3));
                self.tint = self.tint.zip_map(&target, |from, to| lerp(from, to, t));
            }
            AnimationProperty::Gap | AnimationProperty::GapHorz | AnimationProperty::GapVert => {}
        }
    }

    fn blend_frame_index(&mut self, value: &AnimationValue, t: f32) {
        self.default_tile_in_use = true;

        let (strip, frame) = (value.float(0), value.float(1));
        if strip < 0.0 || frame < 0.0 {
            log::trace!("Sprite '{}' frame index ({}, {}) is negative", self.id, strip, frame);
            return;
        }

        let strip = strip.floor() as usize;
        if strip >= self.tile_sheet.strip_count() {
            log::trace!("Sprite '{}' strip {} out of range", self.id, strip);
            return;
        }
        self.strip_index = strip;

        let frame = frame.floor() as usize;
        let Some(target) = self.tile_sheet.try_strip_frame(strip, frame) else {
            log::trace!("Sprite '{}' frame {} of strip {} out of range", self.id, frame, strip);
            return;
        };
        self.strip_frame = frame;
        self.default_tile_in_use = false;
        self.frame = self.frame.lerp(&target, t);
    }
}

impl Drawable for Sprite {
    fn sprite(&self) -> &Sprite {
        self
    }

    fn sprite_mut(&mut self) -> &mut Sprite {
        self
    }

    fn draw(&self, scene: &Scene, renderer: &mut dyn SpriteRenderer, isolate: bool) -> usize {
        let batch = self.tile_sheet.batch_id();
        let placement = self.placement(scene);

        let mut position = placement.position;
        let mut size = Vec2::new(self.width * placement.scale.x, self.height * placement.scale.y);
        apply_flip(self.flip, &mut position, &mut size);

        if isolate {
            if let Some(camera) = placement.camera {
                renderer.set_projection(batch, &camera.view_projection());
            }
            renderer.start(batch);
        }

        renderer.draw(
            batch,
            &SpriteQuad {
                position,
                source: self.current_frame(),
                size,
                tint: self.tint,
                rotation_point: CENTER,
                angle: placement.angle,
            },
        );

        if isolate {
            renderer.finish(batch);
        }
        1
    }

    fn animation_property_component_count(&self, property: AnimationProperty) -> Option<usize> {
        Self::property_count(property)
    }

    fn animation_property_value(&self, property: AnimationProperty) -> Option<AnimationValue> {
        self.property_value(property)
    }

    fn set_animation_property_value(&mut self, property: AnimationProperty, value: &AnimationValue, blend_weight: f32) {
        self.set_property_value(property, value, blend_weight);
    }

    fn clone_drawable(&self, context: &mut NodeCloneContext) -> SharedDrawable {
        share(self.clone_with(context))
    }
}

/// Load the tile sheet named by a definition's `tilesheet` field
pub(crate) fn load_required_tile_sheet(
    properties: &Properties,
    owner: &str,
    catalog: &ResourceCatalog,
) -> Result<Rc<TileSheet>, LoadError> {
    let path = properties.get_non_empty("tilesheet").ok_or_else(|| {
        LoadError::MissingField { owner: owner.to_string(), field: "tilesheet" }.logged()
    })?;

    catalog.load_tile_sheet(path).map_err(|source| {
        log::error!("'{}' could not load required tilesheet.", owner);
        LoadError::TileSheet { owner: owner.to_string(), source: Box::new(source) }
    })
}
