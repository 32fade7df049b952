//! Resource catalog
//!
//! Holds the tile sheet, sprite group and render target registries together with
//! the settings and asset source every loader needs. Scenes that should not share
//! resources use separate catalogs.

use std::cell::RefCell;
use std::rc::Rc;

use super::{share, LoadError, SharedDrawable, Sprite, SpriteGroup, SpriteGroups, TileSheet, TileSheets};
use crate::assets::{AssetSource, FileAssetSource, Properties};
use crate::config::SpriteSettings;
use crate::render::{Effect, RenderTargets, Texture};

/// Registries, settings and asset source used to create sprites
pub struct ResourceCatalog {
    settings: SpriteSettings,
    source: Box<dyn AssetSource>,
    tile_sheets: TileSheets,
    sprite_groups: SpriteGroups,
    render_targets: RenderTargets,
}

impl ResourceCatalog {
    /// Create a catalog reading assets from `source`
    pub fn new(settings: SpriteSettings, source: Box<dyn AssetSource>) -> Self {
        Self {
            settings,
            source,
            tile_sheets: TileSheets::new(),
            sprite_groups: SpriteGroups::new(),
            render_targets: RenderTargets::new(),
        }
    }

    /// Create a catalog reading assets from the settings' search paths
    pub fn with_file_source(settings: SpriteSettings) -> Self {
        let source = FileAssetSource::new(settings.search_paths.iter().cloned());
        Self::new(settings, Box::new(source))
    }

    /// Settings applied to new resources
    pub fn settings(&self) -> &SpriteSettings {
        &self.settings
    }

    /// Asset source loaders read from
    pub fn source(&self) -> &dyn AssetSource {
        self.source.as_ref()
    }

    /// Tile sheet registry
    pub fn tile_sheets(&self) -> &TileSheets {
        &self.tile_sheets
    }

    /// Sprite group registry
    pub fn sprite_groups(&self) -> &SpriteGroups {
        &self.sprite_groups
    }

    /// Render target registry
    pub fn render_targets(&self) -> &RenderTargets {
        &self.render_targets
    }

    /// Create a tile sheet using the configured batch capacity
    pub fn create_tile_sheet(&self, id: &str, texture: Texture, effect: Option<Rc<Effect>>) -> Rc<TileSheet> {
        self.tile_sheets.create(id, texture, self.settings.initial_batch_capacity, effect)
    }

    /// Load a tile sheet, sharing one already loaded from the same URL
    pub fn load_tile_sheet(&self, url: &str) -> Result<Rc<TileSheet>, LoadError> {
        self.tile_sheets.create_from_url(url, self.source())
    }

    /// Create a sprite with the configured default offset
    pub fn create_sprite(&self, id: &str, tile_sheet: &Rc<TileSheet>) -> Sprite {
        let mut sprite = Sprite::create(id, tile_sheet);
        let [x, y] = self.settings.default_sprite_offset;
        sprite.set_offset(x, y);
        sprite
    }

    /// Load a sprite from a properties URL
    pub fn load_sprite(&self, url: &str) -> Result<Sprite, LoadError> {
        let properties = self.load_definition(url, "sprite")?;
        let definition = definition(&properties, "sprite")?;
        Sprite::from_properties(definition, self)
    }

    /// Create and register a sprite group
    pub fn create_sprite_group(
        &self,
        id: &str,
        width: u32,
        height: u32,
        tile_sheet: &Rc<TileSheet>,
    ) -> Rc<RefCell<SpriteGroup>> {
        let mut group = SpriteGroup::with_sprite(self.create_sprite(id, tile_sheet), width, height);
        group.set_frustum_cull(self.settings.frustum_cull);
        self.sprite_groups.register(group, None)
    }

    /// Create and register a sprite group defaulting to a copy of `sprite`
    pub fn create_sprite_group_from(
        &self,
        id: &str,
        width: u32,
        height: u32,
        sprite: &Sprite,
    ) -> Rc<RefCell<SpriteGroup>> {
        let mut group = SpriteGroup::create_from(id, width, height, sprite);
        group.set_frustum_cull(self.settings.frustum_cull);
        self.sprite_groups.register(group, None)
    }

    /// Build and register a sprite group from a `spritegroup` block
    pub fn create_sprite_group_from_properties(
        &self,
        properties: &Properties,
    ) -> Result<Rc<RefCell<SpriteGroup>>, LoadError> {
        let group = SpriteGroup::from_properties(properties, self)?;
        Ok(self.sprite_groups.register(group, None))
    }

    /// Load a sprite group, sharing one already loaded from the same URL
    pub fn load_sprite_group(&self, url: &str) -> Result<Rc<RefCell<SpriteGroup>>, LoadError> {
        if let Some(existing) = self.sprite_groups.find_by_path(url) {
            log::trace!("Sprite group already loaded from {}", url);
            return Ok(existing);
        }

        let properties = self.load_definition(url, "sprite group")?;
        let group = SpriteGroup::from_properties(definition(&properties, "spritegroup")?, self)?;
        Ok(self.sprite_groups.register(group, Some(url)))
    }

    /// Load whichever drawable a properties URL defines
    pub fn load_drawable(&self, url: &str) -> Result<SharedDrawable, LoadError> {
        let properties = self.load_definition(url, "drawable")?;
        let definition = definition(&properties, "sprite")?;
        match definition.namespace() {
            "spritegroup" => Ok(self.load_sprite_group(url)?),
            _ => Ok(share(Sprite::from_properties(definition, self)?)),
        }
    }

    fn load_definition(&self, url: &str, kind: &str) -> Result<Properties, LoadError> {
        Properties::load(url, self.source()).map_err(|e| {
            log::error!("Failed to create {} from file '{}'.", kind, url);
            LoadError::from(e)
        })
    }
}

fn definition<'p>(properties: &'p Properties, kind: &'static str) -> Result<&'p Properties, LoadError> {
    properties.definition().ok_or_else(|| LoadError::MissingDefinition(kind).logged())
}

impl std::fmt::Debug for ResourceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCatalog")
            .field("settings", &self.settings)
            .field("tile_sheets", &self.tile_sheets.len())
            .field("sprite_groups", &self.sprite_groups.len())
            .field("render_targets", &self.render_targets.len())
            .finish_non_exhaustive()
    }
}
