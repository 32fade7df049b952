//! Scene nodes and their hierarchy
//!
//! Nodes live in a [`SlotMap`] owned by the [`Scene`]; [`NodeId`] keys stay valid
//! handles even after other nodes are removed. A node may carry one drawable, which in
//! turn keeps the node's id as a non-owning back-reference.

use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use super::NodeCloneContext;
use crate::foundation::math::{Mat4, Quat, Vec3};
use crate::render::{Camera, SpriteRenderer};
use crate::sprites::SharedDrawable;

new_key_type! {
    /// Handle to a node inside a [`Scene`]
    pub struct NodeId;
}

/// A transform in the scene hierarchy
#[derive(Clone)]
pub struct Node {
    /// Display name
    pub name: String,
    /// Translation relative to the parent
    pub translation: Vec3,
    /// Rotation relative to the parent
    pub rotation: Quat,
    /// Scale relative to the parent
    pub scale: Vec3,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    drawable: Option<SharedDrawable>,
}

impl Node {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            parent: None,
            children: Vec::new(),
            drawable: None,
        }
    }

    /// Parent node
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Attached drawable
    pub fn drawable(&self) -> Option<&SharedDrawable> {
        self.drawable.as_ref()
    }

    /// Local TRS matrix
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("translation", &self.translation)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("drawable", &self.drawable.as_ref().and_then(|d| d.try_borrow().ok().map(|d| d.id().to_string())))
            .finish()
    }
}

/// Node hierarchy with an optional active camera
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    active_camera: Option<Camera>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node
    pub fn create_node(&mut self, name: &str) -> NodeId {
        self.nodes.insert(Node::new(name))
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node for modification
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Attach `child` under `parent`, detaching it from any previous parent
    ///
    /// Returns false when either node is missing or `child` is `parent` or one of its
    /// ancestors.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return false;
        }
        if self.is_ancestor_or_self(child, parent) {
            log::warn!("Cannot attach node under its own descendant");
            return false;
        }
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Remove a node and its subtree; the drawables lose their node reference
    pub fn remove_node(&mut self, id: NodeId) {
        self.detach(id);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(current) {
                if let Some(drawable) = node.drawable {
                    drawable.borrow_mut().sprite_mut().set_node(None);
                }
                pending.extend(node.children);
            }
        }
    }

    /// Attach a drawable to a node, replacing any previous one
    pub fn set_drawable(&mut self, id: NodeId, drawable: Option<SharedDrawable>) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if let Some(previous) = node.drawable.take() {
            previous.borrow_mut().sprite_mut().set_node(None);
        }
        if let Some(drawable) = &drawable {
            drawable.borrow_mut().sprite_mut().set_node(Some(id));
        }
        node.drawable = drawable;
    }

    /// Camera used for culling and isolated draws
    pub fn active_camera(&self) -> Option<&Camera> {
        self.active_camera.as_ref()
    }

    /// Replace the active camera
    pub fn set_active_camera(&mut self, camera: Option<Camera>) {
        self.active_camera = camera;
    }

    /// Mutable access to the active camera
    pub fn active_camera_mut(&mut self) -> Option<&mut Camera> {
        self.active_camera.as_mut()
    }

    /// Node-to-world transform
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::identity();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|c| self.nodes.get(c)) {
            matrix = node.local_matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// World-space translation of a node
    pub fn translation_world(&self, id: NodeId) -> Vec3 {
        let m = self.world_matrix(id);
        Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
    }

    /// Clone a node subtree
    ///
    /// All nodes are copied first; drawables are cloned afterwards through `context`
    /// so that references between them resolve to the copies. The new root has no
    /// parent.
    pub fn clone_node(&mut self, id: NodeId, context: &mut NodeCloneContext) -> Option<NodeId> {
        let root = self.clone_hierarchy(id, None, context)?;

        let mut pending = vec![id];
        while let Some(original) = pending.pop() {
            let Some(node) = self.nodes.get(original) else {
                continue;
            };
            pending.extend(node.children.iter().copied());
            let Some(drawable) = node.drawable.clone() else {
                continue;
            };
            let Some(copy) = context.find_cloned_node(original) else {
                continue;
            };
            let cloned = context.clone_drawable(&drawable);
            context.register_node_drawable(copy, Rc::clone(&cloned));
            self.set_drawable(copy, Some(cloned));
        }

        log::debug!(
            "Cloned node '{}' ({} nodes)",
            self.nodes.get(id).map(|n| n.name.as_str()).unwrap_or_default(),
            context.cloned_node_count()
        );
        Some(root)
    }

    /// Draw every node's drawable in isolation
    ///
    /// Returns the number of quads drawn.
    pub fn draw(&self, renderer: &mut dyn SpriteRenderer) -> usize {
        self.nodes
            .values()
            .filter_map(|node| node.drawable.as_ref())
            .map(|drawable| drawable.borrow().draw(self, renderer, true))
            .sum()
    }

    fn clone_hierarchy(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        context: &mut NodeCloneContext,
    ) -> Option<NodeId> {
        let source = self.nodes.get(id)?;
        let mut copy = Node::new(&source.name);
        copy.translation = source.translation;
        copy.rotation = source.rotation;
        copy.scale = source.scale;
        copy.parent = parent;
        let children = source.children.clone();

        let clone = self.nodes.insert(copy);
        context.register_cloned_node(id, clone);

        for child in children {
            if let Some(child_clone) = self.clone_hierarchy(child, Some(clone), context) {
                if let Some(node) = self.nodes.get_mut(clone) {
                    node.children.push(child_clone);
                }
            }
        }
        Some(clone)
    }

    /// True when `ancestor` is `node` or lies on its parent chain
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|c| *c != child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_translation_world_composes_parents() {
        let mut scene = Scene::new();
        let parent = scene.create_node("parent");
        let child = scene.create_node("child");
        assert!(scene.add_child(parent, child));

        scene.node_mut(parent).unwrap().translation = Vec3::new(10.0, 0.0, 0.0);
        scene.node_mut(parent).unwrap().scale = Vec3::new(2.0, 2.0, 1.0);
        scene.node_mut(child).unwrap().translation = Vec3::new(5.0, 1.0, 0.0);

        let world = scene.translation_world(child);
        assert_relative_eq!(world, Vec3::new(20.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotated_parent() {
        let mut scene = Scene::new();
        let parent = scene.create_node("parent");
        let child = scene.create_node("child");
        scene.add_child(parent, child);

        scene.node_mut(parent).unwrap().rotation =
            Quat::from_axis_angle(&Vector3::z_axis(), std::f32::consts::FRAC_PI_2);
        scene.node_mut(child).unwrap().translation = Vec3::new(1.0, 0.0, 0.0);

        assert_relative_eq!(scene.translation_world(child), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_add_child_reparents() {
        let mut scene = Scene::new();
        let a = scene.create_node("a");
        let b = scene.create_node("b");
        let c = scene.create_node("c");

        scene.add_child(a, c);
        scene.add_child(b, c);
        assert!(scene.node(a).unwrap().children().is_empty());
        assert_eq!(scene.node(b).unwrap().children(), &[c]);
        assert_eq!(scene.node(c).unwrap().parent(), Some(b));
        assert!(!scene.add_child(c, c));
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut scene = Scene::new();
        let a = scene.create_node("a");
        let b = scene.create_node("b");
        let c = scene.create_node("c");
        assert!(scene.add_child(a, b));
        assert!(scene.add_child(b, c));

        assert!(!scene.add_child(b, a));
        assert!(!scene.add_child(c, a));
        assert_eq!(scene.node(a).unwrap().parent(), None);
        assert_eq!(scene.node(b).unwrap().parent(), Some(a));

        // Transforms still resolve over the intact chain
        scene.node_mut(a).unwrap().translation = Vec3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(scene.translation_world(c), Vec3::new(1.0, 2.0, 3.0), epsilon = 1e-5);

        // Moving a node under a sibling subtree is still allowed
        let d = scene.create_node("d");
        assert!(scene.add_child(c, d));
        assert!(scene.add_child(a, d));
        assert_eq!(scene.node(d).unwrap().parent(), Some(a));
    }

    #[test]
    fn test_remove_node_removes_subtree() {
        let mut scene = Scene::new();
        let root = scene.create_node("root");
        let child = scene.create_node("child");
        let grandchild = scene.create_node("grandchild");
        scene.add_child(root, child);
        scene.add_child(child, grandchild);

        scene.remove_node(child);
        assert_eq!(scene.node_count(), 1);
        assert!(scene.node(grandchild).is_none());
        assert!(scene.node(root).unwrap().children().is_empty());
    }

    #[test]
    fn test_clone_node_maps_hierarchy() {
        let mut scene = Scene::new();
        let root = scene.create_node("root");
        let child = scene.create_node("child");
        scene.add_child(root, child);
        scene.node_mut(child).unwrap().translation = Vec3::new(3.0, 4.0, 0.0);

        let mut context = NodeCloneContext::new();
        let copy = scene.clone_node(root, &mut context).unwrap();

        assert_eq!(scene.node_count(), 4);
        assert_eq!(context.find_cloned_node(root), Some(copy));
        let child_copy = context.find_cloned_node(child).unwrap();
        assert_eq!(scene.node(copy).unwrap().children(), &[child_copy]);
        assert_eq!(scene.node(child_copy).unwrap().parent(), Some(copy));
        assert_eq!(scene.node(child_copy).unwrap().translation, Vec3::new(3.0, 4.0, 0.0));
        assert!(scene.node(copy).unwrap().parent().is_none());
    }
}
