//! Shader effect references
//!
//! Shader compilation happens elsewhere; an effect only names the sources and the
//! preprocessor defines a batch or pass was configured with.

/// A vertex/fragment shader pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    /// Vertex shader path
    pub vertex_shader: String,
    /// Fragment shader path
    pub fragment_shader: String,
    /// Preprocessor defines, `;` separated
    pub defines: Option<String>,
}

impl Effect {
    /// Describe an effect from its shader sources
    ///
    /// Returns `None` when either path is empty.
    pub fn from_files(vertex_shader: &str, fragment_shader: &str, defines: Option<&str>) -> Option<Self> {
        if vertex_shader.is_empty() || fragment_shader.is_empty() {
            return None;
        }
        Some(Self {
            vertex_shader: vertex_shader.to_string(),
            fragment_shader: fragment_shader.to_string(),
            defines: defines.filter(|d| !d.is_empty()).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_files() {
        let effect = Effect::from_files("sprite.vert", "sprite.frag", Some("")).unwrap();
        assert_eq!(effect.defines, None);
        assert!(Effect::from_files("", "sprite.frag", None).is_none());
    }
}
