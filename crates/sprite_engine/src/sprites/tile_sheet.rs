//! Tile sheets and their registry
//!
//! A [`TileSheet`] owns one sprite batch and an ordered list of named frame strips.
//! Sheets are shared between sprites through [`Rc`]; the [`TileSheets`] registry only
//! holds weak references, so a sheet leaves lookup as soon as its last sprite drops it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::LoadError;
use crate::assets::{AssetSource, Properties};
use crate::foundation::math::{Mat4, Rect};
use crate::render::{
    parse_mode_or, BatchId, Camera, Effect, SpriteBatch, SpriteRenderer, Texture, TextureFilter,
    TextureWrap,
};

/// A named, fixed-length sequence of frame rectangles
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStrip {
    id: String,
    frames: Vec<Rect>,
}

impl FrameStrip {
    fn new(id: &str, frame_count: usize) -> Self {
        Self { id: id.to_string(), frames: vec![Rect::empty(); frame_count] }
    }

    /// Strip id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Frame rectangles in order
    pub fn frames(&self) -> &[Rect] {
        &self.frames
    }

    /// Number of frames, fixed at creation
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// A texture-backed batch plus its animation strips
#[derive(Debug)]
pub struct TileSheet {
    id: String,
    path: Option<String>,
    batch: SpriteBatch,
    strips: RefCell<Vec<FrameStrip>>,
}

impl TileSheet {
    /// Sheet id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// URL the sheet was loaded from, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The batch sprites of this sheet draw into
    pub fn batch(&self) -> &SpriteBatch {
        &self.batch
    }

    /// Handle of the sheet's batch
    pub fn batch_id(&self) -> BatchId {
        self.batch.id()
    }

    /// Backing texture
    pub fn texture(&self) -> &Texture {
        self.batch.texture()
    }

    /// Number of strips
    pub fn strip_count(&self) -> usize {
        self.strips.borrow().len()
    }

    /// Id of the strip at `index`
    pub fn strip_id(&self, index: usize) -> Option<String> {
        self.strips.borrow().get(index).map(|s| s.id.clone())
    }

    /// Index of the strip named `id`
    pub fn strip_index(&self, id: &str) -> Option<usize> {
        self.strips.borrow().iter().position(|s| s.id == id)
    }

    /// Number of frames in the strip at `index`
    pub fn strip_frame_count(&self, index: usize) -> Option<usize> {
        debug_assert!(index < self.strip_count());
        self.strips.borrow().get(index).map(FrameStrip::frame_count)
    }

    /// Number of frames in the strip named `id`
    pub fn strip_frame_count_by_id(&self, id: &str) -> Option<usize> {
        self.strip_frame_count(self.strip_index(id)?)
    }

    /// Append a strip with `frame_count` empty frames, returning its index
    pub fn add_strip(&self, id: &str, frame_count: usize) -> usize {
        debug_assert!(frame_count > 0);
        let mut strips = self.strips.borrow_mut();
        strips.push(FrameStrip::new(id, frame_count));
        strips.len() - 1
    }

    /// Remove the strip at `index`
    ///
    /// Later strips shift down by one, so indices cached before the call go stale.
    pub fn remove_strip(&self, index: usize) -> bool {
        let mut strips = self.strips.borrow_mut();
        if index < strips.len() {
            strips.remove(index);
            true
        } else {
            false
        }
    }

    /// Remove the strip named `id`
    pub fn remove_strip_by_id(&self, id: &str) -> bool {
        self.strip_index(id).is_some_and(|index| self.remove_strip(index))
    }

    /// Frame rectangle at (`strip`, `frame`)
    pub fn strip_frame(&self, strip: usize, frame: usize) -> Option<Rect> {
        let strips = self.strips.borrow();
        let found = strips.get(strip).and_then(|s| s.frames.get(frame)).copied();
        debug_assert!(found.is_some(), "strip frame ({strip}, {frame}) out of range");
        found
    }

    /// Frame rectangle of the strip named `id`
    pub fn strip_frame_by_id(&self, id: &str, frame: usize) -> Option<Rect> {
        self.strip_frame(self.strip_index(id)?, frame)
    }

    /// Frame rectangle at (`strip`, `frame`) without asserting on bad indices
    pub(crate) fn try_strip_frame(&self, strip: usize, frame: usize) -> Option<Rect> {
        self.strips.borrow().get(strip).and_then(|s| s.frames.get(frame)).copied()
    }

    /// `count` consecutive frames starting at `first`
    pub fn strip_frames(&self, strip: usize, first: usize, count: usize) -> Option<Vec<Rect>> {
        let strips = self.strips.borrow();
        let frames = strips.get(strip)?.frames.get(first..first.checked_add(count)?);
        debug_assert!(frames.is_some(), "strip frame range out of bounds");
        frames.map(<[Rect]>::to_vec)
    }

    /// Consecutive frames of the strip named `id`
    pub fn strip_frames_by_id(&self, id: &str, first: usize, count: usize) -> Option<Vec<Rect>> {
        self.strip_frames(self.strip_index(id)?, first, count)
    }

    /// Replace one frame rectangle
    pub fn set_strip_frame(&self, strip: usize, frame: usize, rect: Rect) -> bool {
        self.set_strip_frames(strip, frame, &[rect])
    }

    /// Replace one frame rectangle of the strip named `id`
    pub fn set_strip_frame_by_id(&self, id: &str, frame: usize, rect: Rect) -> bool {
        self.strip_index(id).is_some_and(|strip| self.set_strip_frame(strip, frame, rect))
    }

    /// Replace consecutive frames starting at `first`
    pub fn set_strip_frames(&self, strip: usize, first: usize, frames: &[Rect]) -> bool {
        let mut strips = self.strips.borrow_mut();
        let target = strips
            .get_mut(strip)
            .and_then(|s| s.frames.get_mut(first..first + frames.len()));
        debug_assert!(target.is_some(), "strip frame range out of bounds");
        match target {
            Some(target) => {
                target.copy_from_slice(frames);
                true
            }
            None => false,
        }
    }

    /// Replace consecutive frames of the strip named `id`
    pub fn set_strip_frames_by_id(&self, id: &str, first: usize, frames: &[Rect]) -> bool {
        self.strip_index(id).is_some_and(|strip| self.set_strip_frames(strip, first, frames))
    }

    /// Snapshot of every strip
    pub fn strips(&self) -> Vec<FrameStrip> {
        self.strips.borrow().clone()
    }

    /// Open the sheet's batch, optionally loading a camera matrix
    ///
    /// `view_projection` selects the camera's view-projection matrix over its
    /// projection matrix.
    pub fn start_batch(&self, renderer: &mut dyn SpriteRenderer, camera: Option<&Camera>, view_projection: bool) {
        renderer.start(self.batch_id());
        if let Some(camera) = camera {
            let matrix: Mat4 = if view_projection {
                camera.view_projection()
            } else {
                camera.projection_matrix()
            };
            renderer.set_projection(self.batch_id(), &matrix);
        }
    }

    /// Close the sheet's batch
    pub fn finish_batch(&self, renderer: &mut dyn SpriteRenderer) {
        renderer.finish(self.batch_id());
    }
}

/// Registry of live tile sheets
#[derive(Debug, Default)]
pub struct TileSheets {
    sheets: RefCell<Vec<Weak<TileSheet>>>,
    next_batch: Cell<u32>,
}

impl TileSheets {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sheet drawing from `texture`
    pub fn create(
        &self,
        id: &str,
        texture: Texture,
        initial_capacity: u32,
        effect: Option<Rc<Effect>>,
    ) -> Rc<TileSheet> {
        self.register(self.build(id, texture, initial_capacity, effect))
    }

    /// Find a live sheet by id
    pub fn get(&self, id: &str) -> Option<Rc<TileSheet>> {
        self.live().into_iter().find(|sheet| sheet.id == id)
    }

    /// Find a live sheet by the URL it was loaded from
    pub fn find_by_path(&self, url: &str) -> Option<Rc<TileSheet>> {
        self.live().into_iter().find(|sheet| sheet.path.as_deref() == Some(url))
    }

    /// Number of live sheets
    pub fn len(&self) -> usize {
        self.live().len()
    }

    /// True when no sheet is alive
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a sheet from a properties URL, sharing an already loaded one
    pub fn create_from_url(&self, url: &str, source: &dyn AssetSource) -> Result<Rc<TileSheet>, LoadError> {
        if let Some(existing) = self.find_by_path(url) {
            log::trace!("Tile sheet '{}' already loaded from {}", existing.id, url);
            return Ok(existing);
        }

        let properties = Properties::load(url, source).map_err(|e| LoadError::from(e).logged())?;
        let definition = properties
            .definition()
            .ok_or_else(|| LoadError::MissingDefinition("tilesheet").logged())?;

        let mut sheet = self.load(definition, source)?;
        sheet.path = Some(url.to_string());
        Ok(self.register(sheet))
    }

    /// Build a sheet from a `tilesheet` properties block
    pub fn create_from_properties(
        &self,
        properties: &Properties,
        source: &dyn AssetSource,
    ) -> Result<Rc<TileSheet>, LoadError> {
        let sheet = self.load(properties, source)?;
        Ok(self.register(sheet))
    }

    fn load(&self, properties: &Properties, source: &dyn AssetSource) -> Result<TileSheet, LoadError> {
        if properties.namespace() != "tilesheet" {
            return Err(LoadError::WrongNamespace {
                expected: "tilesheet",
                found: properties.namespace().to_string(),
            }
            .logged());
        }

        let id = properties.id();
        if id.is_empty() {
            return Err(LoadError::MissingId("TileSheet").logged());
        }

        let path = properties.get_non_empty("path").ok_or_else(|| {
            LoadError::MissingField { owner: id.to_string(), field: "path" }.logged()
        })?;

        let mipmap = properties.get_bool("mipmap");
        let wrap_s = parse_mode_or(properties.get_string("wrapS"), TextureWrap::Repeat);
        let wrap_t = parse_mode_or(properties.get_string("wrapT"), TextureWrap::Repeat);
        let default_min = if mipmap { TextureFilter::NearestMipmapLinear } else { TextureFilter::Linear };
        let min_filter = parse_mode_or(properties.get_string("minFilter"), default_min);
        let mag_filter = parse_mode_or(properties.get_string("magFilter"), TextureFilter::Linear);

        let vertex_shader = properties.get_non_empty("vertexShader");
        let fragment_shader = properties.get_non_empty("fragmentShader");
        let effect = match (vertex_shader, fragment_shader) {
            (Some(vsh), Some(fsh)) => {
                Effect::from_files(vsh, fsh, properties.get_string("defines")).map(Rc::new)
            }
            (None, None) => None,
            _ => return Err(LoadError::ShaderPair(id.to_string()).logged()),
        };

        let info = source.texture_info(path).map_err(|e| {
            log::error!("TileSheet '{}' could not load texture '{}'.", id, path);
            LoadError::from(e)
        })?;

        let mut texture = Texture::new(path, info.width, info.height, mipmap);
        texture.sampler.wrap_s = wrap_s;
        texture.sampler.wrap_t = wrap_t;
        texture.sampler.min_filter = min_filter;
        texture.sampler.mag_filter = mag_filter;

        let sheet = self.build(id, texture, 0, effect);
        for strip in properties.namespaces_named("strip") {
            load_strip(&sheet, strip).map_err(|e| {
                log::error!("Failed to load strip for tilesheet '{}'.", id);
                e
            })?;
        }

        log::debug!("Loaded tile sheet '{}' with {} strips", id, sheet.strip_count());
        Ok(sheet)
    }

    fn build(&self, id: &str, texture: Texture, initial_capacity: u32, effect: Option<Rc<Effect>>) -> TileSheet {
        let batch_id = BatchId(self.next_batch.get());
        self.next_batch.set(batch_id.0 + 1);
        TileSheet {
            id: id.to_string(),
            path: None,
            batch: SpriteBatch::new(batch_id, texture, effect, initial_capacity),
            strips: RefCell::new(Vec::new()),
        }
    }

    fn register(&self, sheet: TileSheet) -> Rc<TileSheet> {
        let sheet = Rc::new(sheet);
        let mut sheets = self.sheets.borrow_mut();
        sheets.retain(|s| s.strong_count() > 0);
        sheets.push(Rc::downgrade(&sheet));
        log::debug!("Registered tile sheet '{}' ({:?})", sheet.id, sheet.batch_id());
        sheet
    }

    fn live(&self) -> Vec<Rc<TileSheet>> {
        let mut sheets = self.sheets.borrow_mut();
        sheets.retain(|s| s.strong_count() > 0);
        sheets.iter().filter_map(Weak::upgrade).collect()
    }
}

/// Load one `strip` block into `sheet`
///
/// The first frame's size is the default for later frames that omit `size`.
fn load_strip(sheet: &TileSheet, properties: &Properties) -> Result<(), LoadError> {
    let strip_id = properties.id();
    let frames: Vec<&Properties> = properties.namespaces_named("frame").collect();
    if frames.is_empty() {
        return Err(LoadError::EmptyStrip(strip_id.to_string()).logged());
    }

    let index = sheet.add_strip(strip_id, frames.len());
    let mut default_size = None;
    for (frame_index, frame) in frames.into_iter().enumerate() {
        let offset = frame.get_vector2("offset").ok_or_else(|| {
            LoadError::MissingFrameOffset { strip: strip_id.to_string(), frame: frame_index }.logged()
        })?;

        let size = frame
            .get_vector2("size")
            .or(default_size)
            .filter(|s| s.x != 0.0 || s.y != 0.0)
            .ok_or_else(|| {
                LoadError::ZeroSizeFrame { strip: strip_id.to_string(), frame: frame_index }.logged()
            })?;
        default_size.get_or_insert(size);

        sheet.set_strip_frame(index, frame_index, Rect::new(offset.x, offset.y, size.x, size.y));
    }
    Ok(())
}
