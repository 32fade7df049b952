//! The drawable capability shared by sprites and sprite groups

use std::cell::RefCell;
use std::rc::Rc;

use super::{AnimationProperty, AnimationValue, Sprite, SpriteGroup};
use crate::render::SpriteRenderer;
use crate::scene::{NodeCloneContext, Scene};

/// A drawable shared between scene nodes and group cells
pub type SharedDrawable = Rc<RefCell<dyn Drawable>>;

/// Something that draws quads from a tile sheet and can be animated
///
/// Both leaf sprites and sprite groups implement this. A group keeps its own
/// [`Sprite`] state as the default for its cells, exposed through [`Drawable::sprite`].
pub trait Drawable {
    /// Sprite state: tile sheet, size, tint, flip and current frame
    fn sprite(&self) -> &Sprite;

    /// Mutable sprite state
    fn sprite_mut(&mut self) -> &mut Sprite;

    /// Identifier
    fn id(&self) -> &str {
        self.sprite().id()
    }

    /// Draw into `renderer`, returning the number of quads drawn
    ///
    /// With `isolate` set the draw opens and closes its own batches and uses the
    /// active camera's view-projection when bound to a node. Otherwise the caller owns
    /// the batch lifecycle, which lets many drawables share one batch.
    fn draw(&self, scene: &Scene, renderer: &mut dyn SpriteRenderer, isolate: bool) -> usize;

    /// Number of float components of `property`, or `None` when unsupported
    fn animation_property_component_count(&self, property: AnimationProperty) -> Option<usize>;

    /// Current value of `property`
    fn animation_property_value(&self, property: AnimationProperty) -> Option<AnimationValue>;

    /// Blend `property` toward `value` by `blend_weight` in `[0, 1]`
    fn set_animation_property_value(
        &mut self,
        property: AnimationProperty,
        value: &AnimationValue,
        blend_weight: f32,
    );

    /// Duplicate for a cloned scene, resolving node references through `context`
    fn clone_drawable(&self, context: &mut NodeCloneContext) -> SharedDrawable;

    /// Downcast to a sprite group
    fn as_group(&self) -> Option<&SpriteGroup> {
        None
    }

    /// Mutable downcast to a sprite group
    fn as_group_mut(&mut self) -> Option<&mut SpriteGroup> {
        None
    }
}

/// Wrap a drawable for sharing
pub fn share<D: Drawable + 'static>(drawable: D) -> Rc<RefCell<D>> {
    Rc::new(RefCell::new(drawable))
}
