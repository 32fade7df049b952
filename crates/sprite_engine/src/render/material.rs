//! Materials, techniques and passes
//!
//! A [`Material`] owns an ordered list of [`Technique`]s with one current technique;
//! each technique owns an ordered list of [`Pass`]es, and each pass shares an
//! [`Effect`]. Node bindings set on a material or technique flow down to every pass.

use std::rc::Rc;

use thiserror::Error;

use super::Effect;
use crate::scene::{NodeCloneContext, NodeId};

/// Material construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterialError {
    /// A pass could not create its effect
    #[error("Failed to create effect for pass '{pass}'. vertexShader = {vertex_shader}, fragmentShader = {fragment_shader}")]
    EffectCreation {
        /// Pass id
        pass: String,
        /// Vertex shader path
        vertex_shader: String,
        /// Fragment shader path
        fragment_shader: String,
    },

    /// No technique with the requested id
    #[error("Technique '{0}' not found")]
    UnknownTechnique(String),
}

/// Resolve a node binding through a clone context
///
/// A binding to a node outside the cloned set is dropped.
fn clone_binding(node: Option<NodeId>, context: &NodeCloneContext) -> Option<NodeId> {
    node.and_then(|n| context.find_cloned_node(n))
}

/// One rendering pass with its effect
#[derive(Debug, Clone)]
pub struct Pass {
    id: String,
    effect: Rc<Effect>,
    node: Option<NodeId>,
}

impl Pass {
    /// Create a pass and load its effect
    pub fn initialize(
        id: &str,
        vertex_shader: &str,
        fragment_shader: &str,
        defines: Option<&str>,
    ) -> Result<Self, MaterialError> {
        let effect = Effect::from_files(vertex_shader, fragment_shader, defines).ok_or_else(|| {
            let err = MaterialError::EffectCreation {
                pass: id.to_string(),
                vertex_shader: vertex_shader.to_string(),
                fragment_shader: fragment_shader.to_string(),
            };
            log::warn!("{}", err);
            err
        })?;

        Ok(Self::with_effect(id, Rc::new(effect)))
    }

    /// Create a pass sharing an existing effect
    pub fn with_effect(id: &str, effect: Rc<Effect>) -> Self {
        Self { id: id.to_string(), effect, node: None }
    }

    /// Pass id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Effect used by this pass
    pub fn effect(&self) -> &Rc<Effect> {
        &self.effect
    }

    /// Node this pass takes its transforms from
    pub fn node_binding(&self) -> Option<NodeId> {
        self.node
    }

    /// Bind the pass to a node
    pub fn set_node_binding(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    /// Copy the pass for a cloned scene; the effect is shared
    pub fn clone_with(&self, context: &NodeCloneContext) -> Self {
        Self {
            id: self.id.clone(),
            effect: Rc::clone(&self.effect),
            node: clone_binding(self.node, context),
        }
    }
}

/// An ordered set of passes
#[derive(Debug, Clone, Default)]
pub struct Technique {
    id: String,
    passes: Vec<Pass>,
    node: Option<NodeId>,
}

impl Technique {
    /// Create an empty technique
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string(), ..Default::default() }
    }

    /// Technique id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a pass, binding it to this technique's node
    pub fn add_pass(&mut self, mut pass: Pass) {
        pass.set_node_binding(self.node);
        self.passes.push(pass);
    }

    /// Number of passes
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Pass at `index`
    pub fn pass_by_index(&self, index: usize) -> Option<&Pass> {
        debug_assert!(index < self.passes.len());
        self.passes.get(index)
    }

    /// Pass with the given id
    pub fn pass(&self, id: &str) -> Option<&Pass> {
        self.passes.iter().find(|p| p.id == id)
    }

    /// Node binding of this technique
    pub fn node_binding(&self) -> Option<NodeId> {
        self.node
    }

    /// Bind this technique and all of its passes to a node
    pub fn set_node_binding(&mut self, node: Option<NodeId>) {
        self.node = node;
        for pass in &mut self.passes {
            pass.set_node_binding(node);
        }
    }

    /// Copy the technique and its passes for a cloned scene
    pub fn clone_with(&self, context: &NodeCloneContext) -> Self {
        Self {
            id: self.id.clone(),
            passes: self.passes.iter().map(|p| p.clone_with(context)).collect(),
            node: clone_binding(self.node, context),
        }
    }
}

/// A set of alternative techniques, one of which is current
#[derive(Debug, Clone, Default)]
pub struct Material {
    techniques: Vec<Technique>,
    current: usize,
    node: Option<NodeId>,
}

impl Material {
    /// Create a material with no techniques
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a single-technique, single-pass material from shader files
    pub fn from_shaders(
        vertex_shader: &str,
        fragment_shader: &str,
        defines: Option<&str>,
    ) -> Result<Self, MaterialError> {
        let mut technique = Technique::new("");
        technique.add_pass(Pass::initialize("", vertex_shader, fragment_shader, defines)?);

        let mut material = Self::new();
        material.add_technique(technique);
        Ok(material)
    }

    /// Append a technique; the first one added becomes current
    pub fn add_technique(&mut self, mut technique: Technique) {
        technique.set_node_binding(self.node);
        self.techniques.push(technique);
    }

    /// Number of techniques
    pub fn technique_count(&self) -> usize {
        self.techniques.len()
    }

    /// Technique at `index`
    pub fn technique_by_index(&self, index: usize) -> Option<&Technique> {
        self.techniques.get(index)
    }

    /// Technique with the given id
    pub fn technique(&self, id: &str) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.id == id)
    }

    /// The technique used for drawing
    pub fn current_technique(&self) -> Option<&Technique> {
        self.techniques.get(self.current)
    }

    /// Select the current technique by id
    pub fn set_technique(&mut self, id: &str) -> Result<(), MaterialError> {
        let index = self
            .techniques
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| MaterialError::UnknownTechnique(id.to_string()))?;
        self.current = index;
        Ok(())
    }

    /// Node binding of this material
    pub fn node_binding(&self) -> Option<NodeId> {
        self.node
    }

    /// Bind every technique and pass to a node
    pub fn set_node_binding(&mut self, node: Option<NodeId>) {
        self.node = node;
        for technique in &mut self.techniques {
            technique.set_node_binding(node);
        }
    }

    /// Copy the material for a cloned scene
    pub fn clone_with(&self, context: &NodeCloneContext) -> Self {
        Self {
            techniques: self.techniques.iter().map(|t| t.clone_with(context)).collect(),
            current: self.current,
            node: clone_binding(self.node, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    fn two_pass_technique(id: &str) -> Technique {
        let mut technique = Technique::new(id);
        technique.add_pass(Pass::initialize("base", "sprite.vert", "sprite.frag", None).unwrap());
        technique.add_pass(Pass::initialize("glow", "sprite.vert", "glow.frag", Some("GLOW")).unwrap());
        technique
    }

    #[test]
    fn test_pass_requires_shader_paths() {
        assert!(matches!(
            Pass::initialize("p", "", "sprite.frag", None),
            Err(MaterialError::EffectCreation { .. })
        ));
    }

    #[test]
    fn test_technique_lookup() {
        let technique = two_pass_technique("main");
        assert_eq!(technique.pass_count(), 2);
        assert_eq!(technique.pass_by_index(1).unwrap().id(), "glow");
        assert!(technique.pass("glow").is_some());
        assert!(technique.pass("shadow").is_none());
    }

    #[test]
    fn test_node_binding_propagates() {
        let mut scene = Scene::new();
        let node = scene.create_node("ship");

        let mut material = Material::new();
        material.add_technique(two_pass_technique("main"));
        material.set_node_binding(Some(node));

        let technique = material.current_technique().unwrap();
        assert_eq!(technique.node_binding(), Some(node));
        assert!(technique.pass_by_index(0).map(|p| p.node_binding()) == Some(Some(node)));

        material.add_technique(two_pass_technique("low"));
        assert_eq!(material.technique("low").unwrap().pass("base").unwrap().node_binding(), Some(node));
        assert!(material.set_technique("low").is_ok());
        assert!(material.set_technique("ultra").is_err());
    }

    #[test]
    fn test_clone_shares_effect_and_remaps_node() {
        let mut scene = Scene::new();
        let original = scene.create_node("ship");
        let copy = scene.create_node("ship copy");
        let mut context = NodeCloneContext::new();
        context.register_cloned_node(original, copy);

        let mut material = Material::new();
        material.add_technique(two_pass_technique("main"));
        material.set_node_binding(Some(original));

        let cloned = material.clone_with(&context);
        assert_eq!(cloned.node_binding(), Some(copy));

        let pass = cloned.current_technique().unwrap().pass("base").unwrap();
        assert_eq!(pass.node_binding(), Some(copy));
        let source_pass = material.current_technique().unwrap().pass("base").unwrap();
        assert!(Rc::ptr_eq(pass.effect(), source_pass.effect()));

        let unrelated = material.clone_with(&NodeCloneContext::new());
        assert_eq!(unrelated.node_binding(), None);
    }
}
