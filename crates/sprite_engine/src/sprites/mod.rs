//! Sprites, sprite groups and tile sheets
//!
//! A [`TileSheet`] pairs a texture batch with named frame strips. A [`Sprite`] draws
//! one quad from a tile sheet, and a [`SpriteGroup`] draws a grid of cells that each
//! show the group's tile, nothing, or a shared child sprite. Both implement
//! [`Drawable`], the capability scene nodes and animations work through.
//!
//! Everything is created through a [`ResourceCatalog`]:
//!
//! ```rust,ignore
//! let catalog = ResourceCatalog::with_file_source(SpriteSettings::default());
//! let group = catalog.load_sprite_group("level.group")?;
//! group.borrow().draw(&scene, &mut renderer, true);
//! ```

mod animation;
mod catalog;
mod drawable;
mod error;
mod flip;
mod sprite;
mod sprite_group;
mod tile_sheet;

#[cfg(test)]
mod tests;

pub use animation::{AnimationClip, AnimationProperty, AnimationValue};
pub use catalog::ResourceCatalog;
pub use drawable::{share, Drawable, SharedDrawable};
pub use error::LoadError;
pub use flip::{parse_flip, Flip};
pub use sprite::{parse_tile_reference, DefaultTile, Sprite, TileRef};
pub use sprite_group::{CellSprite, CellType, SpriteGroup, SpriteGroups};
pub use tile_sheet::{FrameStrip, TileSheet, TileSheets};
