//! Scene nodes and the per-node shader parameters they record.

use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use crate::gfx::{
    camera::camera_utils::convert_matrix4_to_array, scene::object::RenderObject,
    transform::Transform,
};

use super::{graph::NodeId, shader::ShaderProgram};

/// How a node derives its uniforms during update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Model matrix is the world transform.
    Standard,
    /// Model matrix is identity, the view has its translation removed and the
    /// frame parameters (time, resolution, pointer) are recorded.
    Skybox,
}

/// Per-frame values passed unchanged to every node during update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Seconds since the renderer's start time.
    pub elapsed: f32,
    /// Viewport `(width, height, 1)`.
    pub resolution: [f32; 3],
    /// Pointer `(x, height - y, 0, 0)`, origin at the bottom left.
    pub mouse: [f32; 4],
}

impl FrameContext {
    pub fn new(elapsed: f32, width: u32, height: u32, pointer: (f32, f32)) -> Self {
        let height = height as f32;
        Self {
            elapsed,
            resolution: [width as f32, height, 1.0],
            mouse: [pointer.0, height - pointer.1, 0.0, 0.0],
        }
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            resolution: [1.0, 1.0, 1.0],
            mouse: [0.0; 4],
        }
    }
}

/// Shader parameters for one draw, laid out for a WGSL uniform block:
///
/// ```wgsl
/// struct NodeUniforms {
///     model: mat4x4<f32>,
///     view: mat4x4<f32>,
///     projection: mat4x4<f32>,
///     resolution: vec3<f32>,
///     time: f32,
///     mouse: vec4<f32>,
/// };
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniforms {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub resolution: [f32; 3],
    pub time: f32,
    pub mouse: [f32; 4],
}

impl Default for NodeUniforms {
    fn default() -> Self {
        let identity = convert_matrix4_to_array(Matrix4::identity());
        Self {
            model: identity,
            view: identity,
            projection: identity,
            resolution: [0.0; 3],
            time: 0.0,
            mouse: [0.0; 4],
        }
    }
}

/// A node in the scene graph.
///
/// Owns its shader program and local transform, and shares its render object
/// with any other node that shows the same mesh.
#[derive(Debug)]
pub struct SceneNode {
    pub(crate) kind: NodeKind,
    pub(crate) object: Option<Arc<RenderObject>>,
    pub(crate) local: Transform,
    pub(crate) world: Transform,
    pub(crate) shader: ShaderProgram,
    pub(crate) uniforms: NodeUniforms,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    /// Creates a standard node. A node without an object is a pure group: it
    /// still carries a transform for its children.
    pub fn new(object: Option<Arc<RenderObject>>, shader: ShaderProgram) -> Self {
        Self::with_kind(NodeKind::Standard, object, shader)
    }

    /// Creates a group node with no object, drawn with the built-in program.
    pub fn group() -> Self {
        Self::new(None, ShaderProgram::textured())
    }

    pub fn skybox(object: Arc<RenderObject>, shader: ShaderProgram) -> Self {
        Self::with_kind(NodeKind::Skybox, Some(object), shader)
    }

    fn with_kind(
        kind: NodeKind,
        object: Option<Arc<RenderObject>>,
        shader: ShaderProgram,
    ) -> Self {
        Self {
            kind,
            object,
            local: Transform::identity(),
            world: Transform::identity(),
            shader,
            uniforms: NodeUniforms::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Sets the initial local transform (builder pattern)
    pub fn with_transform(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn object(&self) -> Option<&Arc<RenderObject>> {
        self.object.as_ref()
    }

    pub fn local_transform(&self) -> &Transform {
        &self.local
    }

    pub fn local_transform_mut(&mut self) -> &mut Transform {
        &mut self.local
    }

    /// World transform as of the last update.
    pub fn world_transform(&self) -> &Transform {
        &self.world
    }

    pub fn shader(&self) -> &ShaderProgram {
        &self.shader
    }

    /// Uniforms recorded by the last update.
    pub fn uniforms(&self) -> &NodeUniforms {
        &self.uniforms
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Records this node's uniforms for the frame.
    pub(crate) fn record_uniforms(
        &mut self,
        projection: Matrix4<f32>,
        view: Matrix4<f32>,
        frame: &FrameContext,
    ) {
        use crate::gfx::camera::camera_utils::strip_translation;

        self.uniforms = match self.kind {
            NodeKind::Standard => NodeUniforms {
                model: self.world.to_array(),
                view: convert_matrix4_to_array(view),
                projection: convert_matrix4_to_array(projection),
                ..NodeUniforms::default()
            },
            NodeKind::Skybox => NodeUniforms {
                model: convert_matrix4_to_array(Matrix4::identity()),
                view: convert_matrix4_to_array(strip_translation(view)),
                projection: convert_matrix4_to_array(projection),
                resolution: frame.resolution,
                time: frame.elapsed,
                mouse: frame.mouse,
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniforms_size_is_uniform_friendly() {
        assert_eq!(std::mem::size_of::<NodeUniforms>(), 224);
        assert_eq!(std::mem::size_of::<NodeUniforms>() % 16, 0);
    }

    #[test]
    fn test_frame_context_flips_pointer_y() {
        let frame = FrameContext::new(2.5, 800, 600, (100.0, 50.0));
        assert_eq!(frame.resolution, [800.0, 600.0, 1.0]);
        assert_eq!(frame.mouse, [100.0, 550.0, 0.0, 0.0]);
        assert_eq!(frame.elapsed, 2.5);
    }

    #[test]
    fn test_new_node_is_detached_identity() {
        let node = SceneNode::group();
        assert_eq!(node.kind(), NodeKind::Standard);
        assert!(node.parent().is_none());
        assert!(node.children().is_empty());
        assert_eq!(*node.local_transform(), Transform::identity());
        assert!(node.object().is_none());
    }
}
