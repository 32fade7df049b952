//! # Sprite Engine
//!
//! The sprite layer of a 3D game engine: tile sheets, sprites and sprite groups,
//! loaded from namespaced properties files and drawn through a batching renderer.
//!
//! ## Features
//!
//! - **Tile sheets**: a texture batch plus named animation frame strips, shared by every
//!   sprite that draws from it
//! - **Sprites**: tinted, mirrored, animatable quads bound to scene nodes
//! - **Sprite groups**: grids of cells drawn as one rigid body, with frustum culling and
//!   per-batch bracketing
//! - **Explicit registries**: a [`sprites::ResourceCatalog`] instead of global tables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sprite_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     sprite_engine::foundation::logging::init();
//!
//!     let catalog = ResourceCatalog::with_file_source(SpriteSettings::default());
//!     let hero = catalog.load_drawable("hero.sprite")?;
//!
//!     let mut scene = Scene::new();
//!     let node = scene.create_node("hero");
//!     scene.set_drawable(node, Some(hero));
//!
//!     let mut renderer = RecordingRenderer::new();
//!     scene.draw(&mut renderer);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;
pub mod sprites;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetSource, FileAssetSource, MemoryAssetSource, Properties},
        config::{Config, SpriteSettings},
        foundation::math::{Mat4, Quat, Rect, Vec2, Vec3, Vec4},
        render::{BatchCommand, Camera, RecordingRenderer, SpriteRenderer},
        scene::{NodeCloneContext, NodeId, Scene},
        sprites::{
            AnimationProperty, AnimationValue, CellSprite, CellType, Drawable, Flip, LoadError, ResourceCatalog,
            SharedDrawable, Sprite, SpriteGroup, TileSheet,
        },
    };
}
