//! Bookkeeping for cloning part of a scene
//!
//! While a node subtree is duplicated, the context remembers which node became which
//! and which drawable became which, so that references inside the subtree point at
//! the copies instead of the originals.

use std::collections::HashMap;
use std::rc::Rc;

use super::NodeId;
use crate::sprites::SharedDrawable;

/// Address of the drawable behind a shared handle
fn drawable_key(drawable: &SharedDrawable) -> *const () {
    Rc::as_ptr(drawable) as *const ()
}

/// Original-to-clone mappings for nodes and drawables
#[derive(Default)]
pub struct NodeCloneContext {
    nodes: HashMap<NodeId, NodeId>,
    // Originals are held so their addresses stay unique for the context's lifetime
    drawables: HashMap<*const (), (SharedDrawable, SharedDrawable)>,
    node_drawables: HashMap<NodeId, SharedDrawable>,
}

impl NodeCloneContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// The clone of `original`, if it was part of the cloned set
    pub fn find_cloned_node(&self, original: NodeId) -> Option<NodeId> {
        self.nodes.get(&original).copied()
    }

    /// Record that `clone` is the copy of `original`
    pub fn register_cloned_node(&mut self, original: NodeId, clone: NodeId) {
        self.nodes.insert(original, clone);
    }

    /// Number of mapped nodes
    pub fn cloned_node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The clone of a drawable, if one has been made through this context
    pub fn find_cloned_drawable(&self, original: &SharedDrawable) -> Option<SharedDrawable> {
        self.drawables
            .get(&drawable_key(original))
            .map(|(_, clone)| Rc::clone(clone))
    }

    /// Clone a drawable, reusing an earlier clone of the same shared instance
    pub fn clone_drawable(&mut self, original: &SharedDrawable) -> SharedDrawable {
        if let Some(existing) = self.find_cloned_drawable(original) {
            return existing;
        }

        let clone = original.borrow().clone_drawable(self);
        self.drawables
            .insert(drawable_key(original), (Rc::clone(original), Rc::clone(&clone)));
        clone
    }

    /// Record the drawable now attached to a cloned node
    pub fn register_node_drawable(&mut self, cloned_node: NodeId, drawable: SharedDrawable) {
        self.node_drawables.insert(cloned_node, drawable);
    }

    /// The drawable attached to a cloned node, if any
    pub fn node_drawable(&self, cloned_node: NodeId) -> Option<SharedDrawable> {
        self.node_drawables.get(&cloned_node).cloned()
    }
}

impl std::fmt::Debug for NodeCloneContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCloneContext")
            .field("nodes", &self.nodes)
            .field("drawables", &self.drawables.len())
            .field("node_drawables", &self.node_drawables.len())
            .finish()
    }
}
