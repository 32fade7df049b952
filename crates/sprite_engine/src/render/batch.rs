//! Sprite batch resources and the batch emission interface
//!
//! A [`SpriteBatch`] is the GPU-facing accumulator owned by a tile sheet. Sprites never
//! talk to the GPU themselves: they hand [`SpriteQuad`]s to a [`SpriteRenderer`]
//! between `start`/`finish` brackets, addressed by [`BatchId`].
//!
//! # Design Philosophy
//!
//! The renderer is a passive sink:
//! - Accepts fully computed quads (no transform logic)
//! - Accepts batch handles (no resource ownership)
//! - Only handles drawing (no lifecycle or culling)

use std::rc::Rc;

use super::{Effect, Texture};
use crate::foundation::math::{Mat4, Rect, Vec2, Vec3, Vec4};

/// Identifies one sprite batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(pub u32);

/// Batch resource owned by a tile sheet
#[derive(Debug, Clone)]
pub struct SpriteBatch {
    id: BatchId,
    texture: Texture,
    effect: Option<Rc<Effect>>,
    initial_capacity: u32,
}

impl SpriteBatch {
    /// Create a batch drawing from `texture`
    pub fn new(id: BatchId, texture: Texture, effect: Option<Rc<Effect>>, initial_capacity: u32) -> Self {
        Self { id, texture, effect, initial_capacity }
    }

    /// Batch handle
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Texture sampled by this batch
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// Mutable texture access, used to adjust sampler state
    pub fn texture_mut(&mut self) -> &mut Texture {
        &mut self.texture
    }

    /// Custom effect, if any
    pub fn effect(&self) -> Option<&Rc<Effect>> {
        self.effect.as_ref()
    }

    /// Initial quad capacity
    pub fn initial_capacity(&self) -> u32 {
        self.initial_capacity
    }
}

/// A textured quad ready for emission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteQuad {
    /// World position of the quad anchor
    pub position: Vec3,
    /// Source rectangle in texels
    pub source: Rect,
    /// Size in world units; negative components mirror the quad
    pub size: Vec2,
    /// RGBA tint
    pub tint: Vec4,
    /// Rotation pivot relative to the quad size (0.5, 0.5 is the center)
    pub rotation_point: Vec2,
    /// Rotation angle in radians about Z
    pub angle: f32,
}

/// The external batch primitive sprites draw through
pub trait SpriteRenderer {
    /// Open a batch for drawing
    fn start(&mut self, batch: BatchId);

    /// Replace the projection matrix used by a batch
    fn set_projection(&mut self, batch: BatchId, projection: &Mat4);

    /// Queue one quad into an open batch
    fn draw(&mut self, batch: BatchId, quad: &SpriteQuad);

    /// Close a batch, flushing its quads
    fn finish(&mut self, batch: BatchId);
}

/// One call made against a [`SpriteRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub enum BatchCommand {
    /// `start(batch)`
    Start(BatchId),
    /// `set_projection(batch, matrix)`
    SetProjection(BatchId, Mat4),
    /// `draw(batch, quad)`
    Draw(BatchId, SpriteQuad),
    /// `finish(batch)`
    Finish(BatchId),
}

/// Renderer that records every call, used by tools and tests
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    commands: Vec<BatchCommand>,
    open: Vec<BatchId>,
}

impl RecordingRenderer {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded commands in call order
    pub fn commands(&self) -> &[BatchCommand] {
        &self.commands
    }

    /// Recorded quads with the batch they were drawn into
    pub fn draws(&self) -> impl Iterator<Item = (BatchId, &SpriteQuad)> {
        self.commands.iter().filter_map(|c| match c {
            BatchCommand::Draw(batch, quad) => Some((*batch, quad)),
            _ => None,
        })
    }

    /// Number of draw calls
    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }

    /// Batches currently between `start` and `finish`
    pub fn open_batches(&self) -> &[BatchId] {
        &self.open
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.commands.clear();
        self.open.clear();
    }
}

impl SpriteRenderer for RecordingRenderer {
    fn start(&mut self, batch: BatchId) {
        if self.open.contains(&batch) {
            log::warn!("Batch {:?} started twice without finish", batch);
        }
        self.open.push(batch);
        self.commands.push(BatchCommand::Start(batch));
    }

    fn set_projection(&mut self, batch: BatchId, projection: &Mat4) {
        self.commands.push(BatchCommand::SetProjection(batch, *projection));
    }

    fn draw(&mut self, batch: BatchId, quad: &SpriteQuad) {
        self.commands.push(BatchCommand::Draw(batch, *quad));
    }

    fn finish(&mut self, batch: BatchId) {
        if let Some(pos) = self.open.iter().position(|b| *b == batch) {
            self.open.remove(pos);
        } else {
            log::warn!("Batch {:?} finished without start", batch);
        }
        self.commands.push(BatchCommand::Finish(batch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> SpriteQuad {
        SpriteQuad {
            position: Vec3::zeros(),
            source: Rect::from_size(16.0, 16.0),
            size: Vec2::new(16.0, 16.0),
            tint: Vec4::new(1.0, 1.0, 1.0, 1.0),
            rotation_point: Vec2::new(0.5, 0.5),
            angle: 0.0,
        }
    }

    #[test]
    fn test_recording_renderer_tracks_brackets() {
        let mut renderer = RecordingRenderer::new();
        renderer.start(BatchId(1));
        renderer.draw(BatchId(1), &quad());
        assert_eq!(renderer.open_batches(), &[BatchId(1)]);
        renderer.finish(BatchId(1));

        assert!(renderer.open_batches().is_empty());
        assert_eq!(renderer.draw_count(), 1);
        assert_eq!(renderer.commands().len(), 3);
        assert_eq!(renderer.commands()[0], BatchCommand::Start(BatchId(1)));
    }
}
