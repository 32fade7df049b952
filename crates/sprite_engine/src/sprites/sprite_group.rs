//! Sprite groups: fixed-size grids of sprite cells drawn as one rigid unit
//!
//! Every cell is in one of three states. DEFAULT cells draw the group's own tile,
//! TRANSPARENT cells draw nothing and CHILD cells draw a shared child sprite at the
//! cell's position and size. Only non-default cells are stored, keyed by their linear
//! index so the draw loop can walk them with a single cursor.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use super::sprite::{apply_flip, load_required_tile_sheet};
use super::{
    share, AnimationProperty, AnimationValue, Drawable, LoadError, ResourceCatalog, SharedDrawable, Sprite,
    TileSheet,
};
use crate::assets::{parse::parse_unsigned_pair, parse::parse_unsigned_quad, Properties};
use crate::foundation::math::{lerp, Vec2, Vec3};
use crate::render::{BatchId, SpriteQuad, SpriteRenderer, AABB};
use crate::scene::{NodeCloneContext, Scene};

/// State of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    /// Draws the group's own tile
    Default,
    /// Draws nothing
    Transparent,
    /// Draws a child sprite
    Child,
}

/// What a cell draws
#[derive(Clone)]
pub enum CellSprite {
    /// The group itself, for DEFAULT cells
    Group,
    /// The child sprite of a CHILD cell
    Child(SharedDrawable),
}

impl std::fmt::Debug for CellSprite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group => f.write_str("Group"),
            Self::Child(child) => match child.try_borrow() {
                Ok(child) => write!(f, "Child({:?})", child.id()),
                Err(_) => f.write_str("Child(<borrowed>)"),
            },
        }
    }
}

/// A grid of sprite cells sharing one default sprite
pub struct SpriteGroup {
    sprite: Sprite,
    group_width: u32,
    group_height: u32,
    horz_gap: f32,
    vert_gap: f32,
    frustum_cull: bool,
    /// Linear cell index to occupant; `None` marks a transparent cell
    children: BTreeMap<u32, Option<SharedDrawable>>,
    registry: Option<SpriteGroups>,
}

impl SpriteGroup {
    /// Create a `width` x `height` group whose default sprite covers `tile_sheet`'s texture
    ///
    /// Both dimensions must be non-zero.
    pub fn create(id: &str, width: u32, height: u32, tile_sheet: &Rc<TileSheet>) -> Self {
        Self::with_sprite(Sprite::create(id, tile_sheet), width, height)
    }

    /// Create a group using a copy of `sprite`'s settings as its default
    pub fn create_from(id: &str, width: u32, height: u32, sprite: &Sprite) -> Self {
        let mut group = Self::create(id, width, height, sprite.tile_sheet());
        group.sprite.copy_settings_from(sprite);
        group
    }

    /// Load a group from a properties URL, sharing an already loaded one
    pub fn create_from_url(url: &str, catalog: &ResourceCatalog) -> Result<Rc<RefCell<Self>>, LoadError> {
        catalog.load_sprite_group(url)
    }

    pub(crate) fn with_sprite(sprite: Sprite, width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0, "sprite group dimensions must be non-zero");
        Self {
            sprite,
            group_width: width.max(1),
            group_height: height.max(1),
            horz_gap: 0.0,
            vert_gap: 0.0,
            frustum_cull: true,
            children: BTreeMap::new(),
            registry: None,
        }
    }

    /// Build a group from a `spritegroup` properties block
    ///
    /// The returned group is not registered; [`ResourceCatalog`] registers the groups
    /// it loads.
    pub fn from_properties(properties: &Properties, catalog: &ResourceCatalog) -> Result<Self, LoadError> {
        if properties.namespace() != "spritegroup" {
            return Err(LoadError::WrongNamespace {
                expected: "spritegroup",
                found: properties.namespace().to_string(),
            }
            .logged());
        }

        let id = properties.id();
        if id.is_empty() {
            return Err(LoadError::MissingId("SpriteGroup").logged());
        }

        let size = properties
            .get_string("groupSize")
            .ok_or_else(|| LoadError::MissingField { owner: id.to_string(), field: "groupSize" }.logged())?;
        let (width, height) = parse_unsigned_pair(size).map_err(|source| {
            log::error!("Error attempting to parse property 'groupSize' as a two-dimensional unsigned int vector.");
            LoadError::Parse { owner: id.to_string(), source }
        })?;
        if width == 0 || height == 0 {
            return Err(LoadError::InvalidField {
                owner: id.to_string(),
                field: "groupSize",
                message: format!("{}x{} has no cells", width, height),
            }
            .logged());
        }

        let tile_sheet = load_required_tile_sheet(properties, id, catalog)?;
        let mut group = Self::with_sprite(catalog.create_sprite(id, &tile_sheet), width, height);
        group.frustum_cull = catalog.settings().frustum_cull;

        if let Some(gap) = properties.get_vector2("gap") {
            group.set_gap(gap.x, gap.y);
        }

        group.sprite.load_properties(properties, "SpriteGroup")?;

        group.parse_group(properties, catalog).map_err(|e| {
            log::error!("SpriteGroup '{}' could not load children.", id);
            e
        })?;

        log::debug!("Loaded sprite group '{}' ({}x{}, {} cells set)", id, width, height, group.children.len());
        Ok(group)
    }

    /// Assign cells from the `sprites`, `child`, `transparent` and `section` blocks
    fn parse_group(&mut self, properties: &Properties, catalog: &ResourceCatalog) -> Result<(), LoadError> {
        let group = self.sprite.id().to_string();

        let mut pool_properties = None;
        let mut has_children = false;
        properties.rewind();
        while let Some(block) = properties.next_namespace() {
            match block.namespace() {
                "sprites" => pool_properties = Some(block),
                "child" => has_children = true,
                "section" if block.get_string("type") == Some("child") => has_children = true,
                _ => {}
            }
        }

        if has_children && pool_properties.is_none() {
            log::error!("Children exist, but no children exist to be assigned.");
            return Err(LoadError::MissingSpritePool(group));
        }

        let pool = match pool_properties {
            Some(pool_properties) => load_pool(&group, pool_properties, catalog)?,
            None => HashMap::new(),
        };
        let resolve = |name: &str| {
            pool.get(name).ok_or_else(|| {
                LoadError::UnresolvedChild { group: group.clone(), name: name.to_string() }.logged()
            })
        };
        let out_of_range = |x: u32, y: u32| LoadError::CellOutOfRange { group: group.clone(), x, y }.logged();

        properties.rewind();
        while let Some(block) = properties.next_namespace() {
            match block.namespace() {
                "child" => {
                    if block.id().is_empty() {
                        return Err(LoadError::MissingId("Child").logged());
                    }
                    let (x, y) = cell_position(block, &group)?;
                    let child = resolve(block.id())?;
                    if !self.set_sprite(x, y, Some(child)) {
                        return Err(out_of_range(x, y));
                    }
                }
                "transparent" => {
                    let (x, y) = cell_position(block, &group)?;
                    if !self.set_sprite_type(x, y, CellType::Transparent) {
                        return Err(out_of_range(x, y));
                    }
                }
                "section" => {
                    let child = match block.get_string("type") {
                        Some("transparent") => None,
                        Some("child") => {
                            let name = block.get_non_empty("id").ok_or_else(|| {
                                LoadError::MissingField { owner: group.clone(), field: "id" }.logged()
                            })?;
                            Some(resolve(name)?)
                        }
                        other => {
                            return Err(LoadError::InvalidField {
                                owner: group.clone(),
                                field: "type",
                                message: format!("section type must be 'child' or 'transparent', found {:?}", other),
                            }
                            .logged())
                        }
                    };

                    let region = block
                        .get_string("region")
                        .ok_or_else(|| LoadError::MissingField { owner: group.clone(), field: "region" }.logged())?;
                    let (x, y, width, height) = parse_unsigned_quad(region).map_err(|source| {
                        log::error!(
                            "Error attempting to parse property 'region' as a four-dimensional unsigned int vector."
                        );
                        LoadError::Parse { owner: group.clone(), source }
                    })?;

                    for i in 0..width {
                        for j in 0..height {
                            let (cx, cy) = (x.saturating_add(i), y.saturating_add(j));
                            if !self.set_sprite(cx, cy, child) {
                                return Err(out_of_range(cx, cy));
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// The default sprite state
    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    /// Mutable default sprite state
    pub fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    /// Number of columns
    pub fn group_width(&self) -> u32 {
        self.group_width
    }

    /// Number of rows
    pub fn group_height(&self) -> u32 {
        self.group_height
    }

    /// Horizontal and vertical gap between cells
    pub fn gap(&self) -> Vec2 {
        Vec2::new(self.horz_gap, self.vert_gap)
    }

    /// Set both gaps
    pub fn set_gap(&mut self, horz: f32, vert: f32) {
        self.horz_gap = horz;
        self.vert_gap = vert;
    }

    /// Horizontal gap between cells
    pub fn horz_gap(&self) -> f32 {
        self.horz_gap
    }

    /// Set the horizontal gap
    pub fn set_horz_gap(&mut self, gap: f32) {
        self.horz_gap = gap;
    }

    /// Vertical gap between cells
    pub fn vert_gap(&self) -> f32 {
        self.vert_gap
    }

    /// Set the vertical gap
    pub fn set_vert_gap(&mut self, gap: f32) {
        self.vert_gap = gap;
    }

    /// Whether cells outside the camera frustum are skipped
    pub fn frustum_cull(&self) -> bool {
        self.frustum_cull
    }

    /// Enable or disable frustum culling
    pub fn set_frustum_cull(&mut self, cull: bool) {
        self.frustum_cull = cull;
    }

    /// Linear index of a cell, `None` outside the grid
    fn cell_index(&self, x: u32, y: u32) -> Option<u32> {
        (x < self.group_width && y < self.group_height).then(|| x * self.group_height + y)
    }

    /// State of a cell, `None` outside the grid
    pub fn sprite_type(&self, x: u32, y: u32) -> Option<CellType> {
        let index = self.cell_index(x, y)?;
        Some(match self.children.get(&index) {
            None => CellType::Default,
            Some(None) => CellType::Transparent,
            Some(Some(_)) => CellType::Child,
        })
    }

    /// Set a cell to DEFAULT or TRANSPARENT, releasing any child
    ///
    /// Returns false outside the grid or for [`CellType::Child`], which needs a sprite.
    pub fn set_sprite_type(&mut self, x: u32, y: u32, cell_type: CellType) -> bool {
        let Some(index) = self.cell_index(x, y) else {
            return false;
        };
        match cell_type {
            CellType::Default => {
                self.children.remove(&index);
            }
            CellType::Transparent => {
                self.children.insert(index, None);
            }
            CellType::Child => return false,
        }
        true
    }

    /// What a cell draws, `None` for transparent cells and outside the grid
    pub fn get_sprite(&self, x: u32, y: u32) -> Option<CellSprite> {
        let index = self.cell_index(x, y)?;
        match self.children.get(&index) {
            None => Some(CellSprite::Group),
            Some(None) => None,
            Some(Some(child)) => Some(CellSprite::Child(Rc::clone(child))),
        }
    }

    /// Assign a cell
    ///
    /// `None` makes the cell TRANSPARENT and the group itself makes it DEFAULT; any
    /// other sprite makes it CHILD, sharing the sprite and releasing the previous
    /// occupant. Returns false outside the grid.
    pub fn set_sprite(&mut self, x: u32, y: u32, sprite: Option<&SharedDrawable>) -> bool {
        let Some(sprite) = sprite else {
            return self.set_sprite_type(x, y, CellType::Transparent);
        };
        if std::ptr::eq(sprite.as_ptr() as *const (), self as *const Self as *const ()) {
            return self.set_sprite_type(x, y, CellType::Default);
        }
        let Some(index) = self.cell_index(x, y) else {
            return false;
        };
        self.children.insert(index, Some(Rc::clone(sprite)));
        true
    }

    /// Number of non-default cells
    pub fn assigned_cell_count(&self) -> usize {
        self.children.len()
    }

    /// Copy for a cloned scene
    ///
    /// A child attached to a node whose clone already carries a drawable is replaced by
    /// that drawable. Other children are cloned once through `context`, so a child
    /// shared between cells stays shared in the copy.
    pub fn clone_with(&self, context: &mut NodeCloneContext) -> Self {
        let mut copy = Self {
            sprite: self.sprite.clone_with(context),
            group_width: self.group_width,
            group_height: self.group_height,
            horz_gap: self.horz_gap,
            vert_gap: self.vert_gap,
            frustum_cull: self.frustum_cull,
            children: BTreeMap::new(),
            registry: self.registry.clone(),
        };

        for (&index, cell) in &self.children {
            let cell = cell.as_ref().map(|child| clone_child(child, context));
            copy.children.insert(index, cell);
        }
        copy
    }

    fn property_count(property: AnimationProperty) -> Option<usize> {
        match property {
            AnimationProperty::Gap | AnimationProperty::GapHorz | AnimationProperty::GapVert => {
                Some(property.component_count())
            }
            _ => Sprite::property_count(property),
        }
    }
}

impl Drawable for SpriteGroup {
    fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }

    fn draw(&self, scene: &Scene, renderer: &mut dyn SpriteRenderer, isolate: bool) -> usize {
        let default_batch = self.sprite.tile_sheet().batch_id();
        let placement = self.sprite.placement(scene);
        let (angle, position) = (placement.angle, placement.position);

        let size = Vec2::new(
            self.sprite.width() * placement.scale.x,
            self.sprite.height() * placement.scale.y,
        );
        let h_gap = self.horz_gap * placement.scale.x;
        let v_gap = self.vert_gap * placement.scale.y;
        let rotation_center = Vec2::new(
            (size.x + h_gap) * self.group_width as f32 - h_gap,
            (size.y + v_gap) * self.group_height as f32 - v_gap,
        ) * 0.5;

        let view_projection = match placement.camera {
            Some(camera) if isolate => Some(camera.view_projection()),
            _ => None,
        };
        let frustum = match placement.camera {
            Some(camera) if self.frustum_cull && angle == 0.0 => Some(camera.frustum()),
            _ => None,
        };

        let mut default_size = size;
        let mut default_shift = Vec3::zeros();
        apply_flip(self.sprite.flip(), &mut default_shift, &mut default_size);
        let default_source = self.sprite.current_frame();

        let mut opened: Vec<BatchId> = vec![default_batch];
        if isolate {
            if let Some(matrix) = &view_projection {
                renderer.set_projection(default_batch, matrix);
            }
            renderer.start(default_batch);
        }

        let mut drawn = 0;
        let mut cells = self.children.iter().peekable();
        for x in 0..self.group_width {
            let column = x as f32 * (size.x + h_gap);
            for y in 0..self.group_height {
                let index = x * self.group_height + y;
                let row = y as f32 * (size.y + v_gap);
                let cell_position = Vec3::new(position.x + column, position.y + row, position.z);
                let rotation_point = Vec2::new(
                    (rotation_center.x - column) / size.x,
                    (rotation_center.y - row) / size.y,
                );

                // Cursor must advance even for culled cells
                let cell = cells.next_if(|(key, _)| **key == index).map(|(_, cell)| cell);

                if let Some(frustum) = &frustum {
                    let bounds = AABB::new(
                        cell_position,
                        Vec3::new(cell_position.x + size.x, cell_position.y + size.y, cell_position.z),
                    );
                    if !frustum.intersects_aabb(&bounds) {
                        log::trace!("Sprite group '{}' culled cell ({}, {})", self.sprite.id(), x, y);
                        continue;
                    }
                }

                match cell {
                    Some(None) => {}
                    Some(Some(child)) => {
                        let Ok(child) = child.try_borrow() else {
                            log::warn!(
                                "Sprite group '{}' skipped cell ({}, {}): child is already borrowed",
                                self.sprite.id(),
                                x,
                                y
                            );
                            continue;
                        };
                        let child = child.sprite();
                        let batch = child.tile_sheet().batch_id();
                        if isolate && !opened.contains(&batch) {
                            opened.push(batch);
                            if let Some(matrix) = &view_projection {
                                renderer.set_projection(batch, matrix);
                            }
                            renderer.start(batch);
                        }

                        let mut child_position = cell_position;
                        let mut child_size = size;
                        apply_flip(child.flip(), &mut child_position, &mut child_size);
                        renderer.draw(
                            batch,
                            &SpriteQuad {
                                position: child_position,
                                source: child.current_frame(),
                                size: child_size,
                                tint: child.tint(),
                                rotation_point,
                                angle,
                            },
                        );
                        drawn += 1;
                    }
                    None => {
                        renderer.draw(
                            default_batch,
                            &SpriteQuad {
                                position: cell_position + default_shift,
                                source: default_source,
                                size: default_size,
                                tint: self.sprite.tint(),
                                rotation_point,
                                angle,
                            },
                        );
                        drawn += 1;
                    }
                }
            }
        }

        if isolate {
            for batch in opened {
                renderer.finish(batch);
            }
        }
        drawn
    }

    fn animation_property_component_count(&self, property: AnimationProperty) -> Option<usize> {
        Self::property_count(property)
    }

    fn animation_property_value(&self, property: AnimationProperty) -> Option<AnimationValue> {
        match property {
            AnimationProperty::Gap => Some(AnimationValue::from_floats(&[self.horz_gap, self.vert_gap])),
            AnimationProperty::GapHorz => Some(AnimationValue::from_floats(&[self.horz_gap])),
            AnimationProperty::GapVert => Some(AnimationValue::from_floats(&[self.vert_gap])),
            _ => self.sprite.property_value(property),
        }
    }

    fn set_animation_property_value(&mut self, property: AnimationProperty, value: &AnimationValue, blend_weight: f32) {
        debug_assert!((0.0..=1.0).contains(&blend_weight));
        match property {
            AnimationProperty::Gap => self.set_gap(
                lerp(self.horz_gap, value.float(0), blend_weight),
                lerp(self.vert_gap, value.float(1), blend_weight),
            ),
            AnimationProperty::GapHorz => self.set_horz_gap(lerp(self.horz_gap, value.float(0), blend_weight)),
            AnimationProperty::GapVert => self.set_vert_gap(lerp(self.vert_gap, value.float(0), blend_weight)),
            _ => self.sprite.set_property_value(property, value, blend_weight),
        }
    }

    fn clone_drawable(&self, context: &mut NodeCloneContext) -> SharedDrawable {
        let copy = self.clone_with(context);
        match &self.registry {
            Some(registry) => registry.register(copy, None),
            None => share(copy),
        }
    }

    fn as_group(&self) -> Option<&SpriteGroup> {
        Some(self)
    }

    fn as_group_mut(&mut self) -> Option<&mut SpriteGroup> {
        Some(self)
    }
}

impl std::fmt::Debug for SpriteGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriteGroup")
            .field("id", &self.sprite.id())
            .field("group_width", &self.group_width)
            .field("group_height", &self.group_height)
            .field("gap", &(self.horz_gap, self.vert_gap))
            .field("frustum_cull", &self.frustum_cull)
            .field("assigned_cells", &self.children.len())
            .finish()
    }
}

/// Clone a CHILD cell's sprite, preferring the drawable already on its node's clone
fn clone_child(child: &SharedDrawable, context: &mut NodeCloneContext) -> SharedDrawable {
    let node = child.try_borrow().ok().and_then(|c| c.sprite().node());
    let existing = node
        .and_then(|node| context.find_cloned_node(node))
        .and_then(|cloned| context.node_drawable(cloned));
    match existing {
        Some(existing) => existing,
        None => context.clone_drawable(child),
    }
}

/// Read a block's `pos = X,Y`
fn cell_position(block: &Properties, group: &str) -> Result<(u32, u32), LoadError> {
    let value = block
        .get_string("pos")
        .ok_or_else(|| LoadError::MissingField { owner: group.to_string(), field: "pos" }.logged())?;
    parse_unsigned_pair(value).map_err(|source| {
        log::error!("Error attempting to parse property 'pos' as a two-dimensional unsigned int vector.");
        LoadError::Parse { owner: group.to_string(), source }
    })
}

/// Load the named sprites of a `sprites` block
fn load_pool(
    group: &str,
    pool: &Properties,
    catalog: &ResourceCatalog,
) -> Result<HashMap<String, SharedDrawable>, LoadError> {
    let mut sprites: HashMap<String, SharedDrawable> = HashMap::new();

    for entry in pool.namespaces() {
        let path = if entry.exists("path") {
            Some(entry.get_non_empty("path").ok_or_else(|| {
                LoadError::MissingField { owner: group.to_string(), field: "path" }.logged()
            })?)
        } else {
            None
        };

        let loaded: Result<SharedDrawable, LoadError> = match (entry.namespace(), path) {
            ("sprite", Some(url)) => catalog.load_sprite(url).map(|s| -> SharedDrawable { share(s) }),
            ("sprite", None) => Sprite::from_properties(entry, catalog).map(|s| -> SharedDrawable { share(s) }),
            ("spritegroup", Some(url)) => catalog.load_sprite_group(url).map(|g| -> SharedDrawable { g }),
            ("spritegroup", None) => catalog.create_sprite_group_from_properties(entry).map(|g| -> SharedDrawable { g }),
            (other, _) => {
                return Err(LoadError::InvalidField {
                    owner: group.to_string(),
                    field: "sprites",
                    message: format!("'{}' is not a sprite or spritegroup", other),
                }
                .logged())
            }
        };
        let sprite = loaded.map_err(|source| LoadError::Child { group: group.to_string(), source: Box::new(source) })?;

        let name = sprite.borrow().id().to_string();
        if sprites.contains_key(&name) {
            return Err(LoadError::DuplicateSprite { group: group.to_string(), name }.logged());
        }
        sprites.insert(name, sprite);
    }

    Ok(sprites)
}

struct GroupEntry {
    id: String,
    path: Option<String>,
    group: Weak<RefCell<SpriteGroup>>,
}

/// Registry of live sprite groups
///
/// Cheap to clone; clones share the same table. Groups registered here register
/// their own clones too.
#[derive(Clone, Default)]
pub struct SpriteGroups {
    entries: Rc<RefCell<Vec<GroupEntry>>>,
}

impl SpriteGroups {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Share `group` and track it, optionally under the URL it was loaded from
    pub fn register(&self, mut group: SpriteGroup, path: Option<&str>) -> Rc<RefCell<SpriteGroup>> {
        group.registry = Some(self.clone());
        let id = group.sprite.id().to_string();
        let group = share(group);

        let mut entries = self.entries.borrow_mut();
        entries.retain(|entry| entry.group.strong_count() > 0);
        log::debug!("Registered sprite group '{}' ({} live)", id, entries.len() + 1);
        entries.push(GroupEntry { id, path: path.map(str::to_string), group: Rc::downgrade(&group) });
        group
    }

    /// Find a live group by id
    pub fn get(&self, id: &str) -> Option<Rc<RefCell<SpriteGroup>>> {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.id == id)
            .find_map(|entry| entry.group.upgrade())
    }

    /// Find a live group by the URL it was loaded from
    pub fn find_by_path(&self, url: &str) -> Option<Rc<RefCell<SpriteGroup>>> {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.path.as_deref() == Some(url))
            .find_map(|entry| entry.group.upgrade())
    }

    /// Number of live groups
    pub fn len(&self) -> usize {
        self.entries.borrow().iter().filter(|entry| entry.group.strong_count() > 0).count()
    }

    /// True when no group is alive
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SpriteGroups {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriteGroups").field("live", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{BatchCommand, Camera, RecordingRenderer, Texture};
    use crate::sprites::TileSheets;
    use crate::foundation::math::{Quat, Rect};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn sheet(sheets: &TileSheets, id: &str) -> Rc<TileSheet> {
        sheets.create(id, Texture::new(&format!("{}.png", id), 16, 16, false), 0, None)
    }

    fn group(width: u32, height: u32) -> (TileSheets, SpriteGroup) {
        let sheets = TileSheets::new();
        let group = SpriteGroup::create("grid", width, height, &sheet(&sheets, "tiles"));
        (sheets, group)
    }

    fn child(sheets: &TileSheets, id: &str) -> SharedDrawable {
        share(Sprite::create(id, &sheet(sheets, id)))
    }

    #[test]
    fn test_coordinates_outside_grid_fail() {
        let (sheets, mut group) = group(3, 2);
        let sprite = child(&sheets, "gem");

        for (x, y) in [(3, 0), (0, 2), (7, 7)] {
            assert_eq!(group.sprite_type(x, y), None);
            assert!(group.get_sprite(x, y).is_none());
            assert!(!group.set_sprite(x, y, Some(&sprite)));
            assert!(!group.set_sprite_type(x, y, CellType::Transparent));
        }
        assert_eq!(group.sprite_type(2, 1), Some(CellType::Default));
    }

    #[test]
    fn test_cell_state_round_trip() {
        let (sheets, mut group) = group(2, 2);
        let sprite = child(&sheets, "gem");

        assert!(group.set_sprite(1, 0, Some(&sprite)));
        assert_eq!(group.sprite_type(1, 0), Some(CellType::Child));
        assert_eq!(Rc::strong_count(&sprite), 2);

        assert!(group.set_sprite(1, 0, None));
        assert_eq!(group.sprite_type(1, 0), Some(CellType::Transparent));
        assert_eq!(Rc::strong_count(&sprite), 1);

        assert!(group.set_sprite_type(1, 0, CellType::Default));
        assert_eq!(group.sprite_type(1, 0), Some(CellType::Default));
        assert!(matches!(group.get_sprite(1, 0), Some(CellSprite::Group)));

        assert!(!group.set_sprite_type(1, 0, CellType::Child));
        assert_eq!(group.assigned_cell_count(), 0);
    }

    #[test]
    fn test_non_square_cells_do_not_collide() {
        let (sheets, mut group) = group(3, 2);
        let a = child(&sheets, "a");
        let b = child(&sheets, "b");

        assert!(group.set_sprite(0, 1, Some(&a)));
        assert!(group.set_sprite(1, 0, Some(&b)));
        assert_eq!(group.assigned_cell_count(), 2);
        assert!(matches!(group.get_sprite(0, 1), Some(CellSprite::Child(c)) if Rc::ptr_eq(&c, &a)));
        assert!(matches!(group.get_sprite(1, 0), Some(CellSprite::Child(c)) if Rc::ptr_eq(&c, &b)));
    }

    #[test]
    fn test_group_cannot_contain_itself() {
        let (_sheets, group) = group(2, 2);
        let shared = share(group);
        let as_drawable: SharedDrawable = shared.clone();

        assert!(shared.borrow_mut().set_sprite(0, 0, None));
        assert!(shared.borrow_mut().set_sprite(0, 0, Some(&as_drawable)));
        assert_eq!(shared.borrow().sprite_type(0, 0), Some(CellType::Default));
        assert_eq!(Rc::strong_count(&shared), 2);
    }

    #[test]
    fn test_gap_properties() {
        let (_sheets, mut group) = group(2, 2);
        group.set_gap(2.0, 4.0);

        assert_eq!(group.animation_property_component_count(AnimationProperty::Gap), Some(2));
        assert_eq!(
            group.animation_property_value(AnimationProperty::Gap),
            Some(AnimationValue::from_floats(&[2.0, 4.0]))
        );

        group.set_animation_property_value(AnimationProperty::GapVert, &AnimationValue::from_floats(&[8.0]), 0.5);
        assert_relative_eq!(group.vert_gap(), 6.0);

        group.set_animation_property_value(AnimationProperty::Gap, &AnimationValue::from_floats(&[1.0, 1.0]), 0.0);
        assert_eq!(group.gap(), Vec2::new(2.0, 6.0));

        group.set_animation_property_value(AnimationProperty::SizeWidth, &AnimationValue::from_floats(&[32.0]), 1.0);
        assert_eq!(group.sprite().width(), 32.0);
    }

    #[test]
    fn test_draw_positions_and_pivots() {
        let (_sheets, mut group) = group(2, 1);
        group.set_gap(4.0, 0.0);

        let mut renderer = RecordingRenderer::new();
        assert_eq!(group.draw(&Scene::new(), &mut renderer, false), 2);

        let quads: Vec<_> = renderer.draws().map(|(_, q)| *q).collect();
        assert_eq!(quads[0].position, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(quads[1].position, Vec3::new(20.0, 0.0, 0.0));
        // Whole grid is 36 wide, so its center sits at 18
        assert_relative_eq!(quads[0].rotation_point, Vec2::new(18.0 / 16.0, 0.5));
        assert_relative_eq!(quads[1].rotation_point, Vec2::new(-2.0 / 16.0, 0.5));
    }

    #[test]
    fn test_flipped_default_cells_keep_footprint() {
        let (_sheets, mut group) = group(1, 1);
        group.sprite_mut().set_flip(crate::sprites::Flip::HORZ | crate::sprites::Flip::VERT);

        let mut renderer = RecordingRenderer::new();
        group.draw(&Scene::new(), &mut renderer, false);

        let (_, quad) = renderer.draws().next().unwrap();
        assert_eq!(quad.position, Vec3::new(16.0, 16.0, 0.0));
        assert_eq!(quad.size, Vec2::new(-16.0, -16.0));
    }

    #[test]
    fn test_isolated_draw_brackets_each_batch_once() {
        let (sheets, mut group) = group(3, 1);
        let other = child(&sheets, "other");
        let same_sheet = share(Sprite::create("same", group.sprite().tile_sheet()));
        group.set_sprite(0, 0, Some(&other));
        group.set_sprite(1, 0, Some(&other));
        group.set_sprite(2, 0, Some(&(same_sheet as SharedDrawable)));

        let mut renderer = RecordingRenderer::new();
        assert_eq!(group.draw(&Scene::new(), &mut renderer, true), 3);

        let default_batch = group.sprite().tile_sheet().batch_id();
        let other_batch = other.borrow().sprite().tile_sheet().batch_id();
        let brackets: Vec<_> = renderer
            .commands()
            .iter()
            .filter(|c| !matches!(c, BatchCommand::Draw(..)))
            .cloned()
            .collect();
        assert_eq!(
            brackets,
            vec![
                BatchCommand::Start(default_batch),
                BatchCommand::Start(other_batch),
                BatchCommand::Finish(default_batch),
                BatchCommand::Finish(other_batch),
            ]
        );
        assert!(renderer.open_batches().is_empty());
    }

    #[test]
    fn test_culling_skips_offscreen_cells() {
        let (sheets, mut group) = group(4, 1);
        let gem = child(&sheets, "gem");
        group.set_sprite(3, 0, Some(&gem));

        let mut scene = Scene::new();
        let node = scene.create_node("grid");
        // 30 wide view centered on x = 16 sees the first two columns only
        scene.set_active_camera(Some(Camera::orthographic(Vec3::new(16.0, 8.0, 10.0), 30.0, 40.0, 0.1, 100.0)));
        let shared = share(group);
        scene.set_drawable(node, Some(shared.clone()));

        let mut renderer = RecordingRenderer::new();
        assert_eq!(shared.borrow().draw(&scene, &mut renderer, false), 2);
        assert!(renderer.draws().all(|(batch, _)| batch == shared.borrow().sprite().tile_sheet().batch_id()));

        shared.borrow_mut().set_frustum_cull(false);
        renderer.clear();
        assert_eq!(shared.borrow().draw(&scene, &mut renderer, false), 4);
    }

    #[test]
    fn test_culled_child_cell_does_not_stall_later_cells() {
        let (sheets, mut group) = group(4, 1);
        let hidden = child(&sheets, "hidden");
        let ruby = child(&sheets, "ruby");
        ruby.borrow_mut().sprite_mut().set_default_tile(Rect::new(1.0, 2.0, 3.0, 4.0));
        group.set_sprite(0, 0, Some(&hidden));
        group.set_sprite(2, 0, Some(&ruby));

        let mut scene = Scene::new();
        let node = scene.create_node("grid");
        // 30 wide view centered on x = 48 sees the last two columns only
        scene.set_active_camera(Some(Camera::orthographic(Vec3::new(48.0, 8.0, 10.0), 30.0, 40.0, 0.1, 100.0)));
        let shared = share(group);
        scene.set_drawable(node, Some(shared.clone()));

        let mut renderer = RecordingRenderer::new();
        assert_eq!(shared.borrow().draw(&scene, &mut renderer, false), 2);

        let quads: Vec<_> = renderer.draws().collect();
        assert_eq!(quads[0].0, ruby.borrow().sprite().tile_sheet().batch_id());
        assert_eq!(quads[0].1.source, Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(quads[0].1.position, Vec3::new(32.0, 0.0, 0.0));
        assert_eq!(quads[1].0, shared.borrow().sprite().tile_sheet().batch_id());
        assert_eq!(quads[1].1.position, Vec3::new(48.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotated_group_draws_every_cell() {
        let (sheets, mut group) = group(4, 1);
        let gem = child(&sheets, "gem");
        group.set_sprite(3, 0, Some(&gem));

        let mut scene = Scene::new();
        let node = scene.create_node("grid");
        scene.node_mut(node).unwrap().rotation = Quat::from_axis_angle(&Vec3::z_axis(), FRAC_PI_2);
        // Unrotated, this view would cull the last two columns
        scene.set_active_camera(Some(Camera::orthographic(Vec3::new(16.0, 8.0, 10.0), 30.0, 40.0, 0.1, 100.0)));
        let shared = share(group);
        scene.set_drawable(node, Some(shared.clone()));

        let mut renderer = RecordingRenderer::new();
        assert_eq!(shared.borrow().draw(&scene, &mut renderer, false), 4);
        for (_, quad) in renderer.draws() {
            assert_relative_eq!(quad.angle, FRAC_PI_2, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_scaled_node_scales_cells_and_gaps() {
        let (_sheets, mut group) = group(2, 2);
        group.set_gap(4.0, 2.0);

        let mut scene = Scene::new();
        let node = scene.create_node("grid");
        scene.node_mut(node).unwrap().scale = Vec3::new(2.0, 0.5, 1.0);
        let shared = share(group);
        scene.set_drawable(node, Some(shared.clone()));

        let mut renderer = RecordingRenderer::new();
        assert_eq!(shared.borrow().draw(&scene, &mut renderer, false), 4);

        // Cells are 32x8 with gaps of 8 and 1, so the grid is 72x17
        let quads: Vec<_> = renderer.draws().map(|(_, q)| *q).collect();
        let positions: Vec<_> = quads.iter().map(|q| q.position).collect();
        assert_eq!(
            positions,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 9.0, 0.0),
                Vec3::new(40.0, 0.0, 0.0),
                Vec3::new(40.0, 9.0, 0.0),
            ]
        );
        assert!(quads.iter().all(|q| q.size == Vec2::new(32.0, 8.0)));
        assert_relative_eq!(quads[0].rotation_point, Vec2::new(36.0 / 32.0, 8.5 / 8.0), epsilon = 1e-5);
        assert_relative_eq!(quads[3].rotation_point, Vec2::new(-4.0 / 32.0, -0.5 / 8.0), epsilon = 1e-5);
    }

    #[test]
    fn test_child_draws_its_own_frame_at_group_size() {
        let (sheets, mut group) = group(1, 1);
        group.sprite_mut().set_size(8.0, 8.0);
        let gem = Sprite::create("gem", &sheet(&sheets, "gem"));
        let gem = share(gem);
        gem.borrow_mut().set_default_tile(Rect::new(4.0, 4.0, 2.0, 2.0));
        gem.borrow_mut().set_tint(crate::foundation::math::Vec4::new(1.0, 0.0, 0.0, 1.0));
        group.set_sprite(0, 0, Some(&(gem.clone() as SharedDrawable)));

        let mut renderer = RecordingRenderer::new();
        group.draw(&Scene::new(), &mut renderer, false);

        let (batch, quad) = renderer.draws().next().unwrap();
        assert_eq!(batch, gem.borrow().tile_sheet().batch_id());
        assert_eq!(quad.source, Rect::new(4.0, 4.0, 2.0, 2.0));
        assert_eq!(quad.size, Vec2::new(8.0, 8.0));
        assert_eq!(quad.tint.y, 0.0);
    }

    #[test]
    fn test_create_from_copies_settings() {
        let sheets = TileSheets::new();
        let mut sprite = Sprite::create("base", &sheet(&sheets, "tiles"));
        sprite.set_size(4.0, 6.0);
        sprite.set_offset(1.0, 2.0);

        let group = SpriteGroup::create_from("grid", 2, 3, &sprite);
        assert_eq!(group.sprite().id(), "grid");
        assert_eq!(group.sprite().size(), Vec2::new(4.0, 6.0));
        assert_eq!(group.sprite().offset(), Vec2::new(1.0, 2.0));
        assert_eq!((group.group_width(), group.group_height()), (2, 3));
    }

    #[test]
    fn test_registry_tracks_live_groups() {
        let (_sheets, group) = group(1, 1);
        let registry = SpriteGroups::new();

        let shared = registry.register(group, Some("grid.group"));
        assert!(registry.get("grid").is_some());
        assert!(registry.find_by_path("grid.group").is_some());
        assert_eq!(registry.len(), 1);

        let copy = shared.borrow().clone_drawable(&mut NodeCloneContext::new());
        assert_eq!(registry.len(), 2);
        assert!(copy.borrow().as_group().is_some());

        drop(shared);
        assert!(registry.find_by_path("grid.group").is_none());
        assert_eq!(registry.len(), 1);
        drop(copy);
        assert!(registry.is_empty());
    }
}
