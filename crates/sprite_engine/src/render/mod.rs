//! Rendering collaborators
//!
//! The narrow interfaces the sprite layer draws through: textures and effects, the
//! sprite batch primitive, cameras with frustum culling, render targets and
//! material/technique/pass descriptions. GPU work itself happens behind
//! [`SpriteRenderer`].

pub mod batch;
pub mod camera;
pub mod effect;
pub mod frustum;
pub mod material;
pub mod render_target;
pub mod texture;

pub use batch::{BatchCommand, BatchId, RecordingRenderer, SpriteBatch, SpriteQuad, SpriteRenderer};
pub use camera::{Camera, Projection};
pub use effect::Effect;
pub use frustum::{Frustum, Plane, AABB};
pub use material::{Material, MaterialError, Pass, Technique};
pub use render_target::{RenderTarget, RenderTargetError, RenderTargets, TextureFormat};
pub use texture::{parse_mode_or, Sampler, Texture, TextureFilter, TextureWrap};
