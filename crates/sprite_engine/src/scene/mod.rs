//! Scene hierarchy collaborators
//!
//! Sprites query their node for world translation, rotation and scale, and the scene
//! for its active camera. Cloning a subtree goes through a [`NodeCloneContext`].

mod clone_context;
mod node;

pub use clone_context::NodeCloneContext;
pub use node::{Node, NodeId, Scene};
