//! # Scene Graph
//!
//! Nodes live in a generational arena and refer to each other by [`NodeId`]:
//! a parent owns the ordered list of its children's ids, a child keeps its
//! parent's id as a plain back-reference.
//!
//! ## Traversal
//!
//! [`SceneGraph::update`] and [`SceneGraph::draw`] both walk the tree in
//! pre-order (node first, then children in insertion order). Update computes
//! `world = parent.world * local` top-down and records each node's uniforms;
//! draw compiles programs on first use, then binds, uploads and draws.
//!
//! ```rust
//! use arbor::gfx::scene::{graph::SceneGraph, node::SceneNode};
//!
//! let mut scene = SceneGraph::new();
//! let root = scene.insert(SceneNode::group());
//! let arm = scene.insert(SceneNode::group());
//! scene.add_child(root, arm).unwrap();
//!
//! assert_eq!(scene.traverse(root), vec![root, arm]);
//! ```

use std::sync::Arc;

use cgmath::Matrix4;
use generational_arena::{Arena, Index};
use log::debug;
use thiserror::Error;

use crate::gfx::{
    camera::Camera,
    rendering::backend::{RenderBackend, RenderError},
    transform::Transform,
};

use super::{
    node::{FrameContext, SceneNode},
    object::ObjectId,
};

/// Handle to a node in a [`SceneGraph`]. Stale after the node is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),
    #[error("node {0:?} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    WouldCreateCycle { parent: NodeId, child: NodeId },
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Arena<SceneNode>,
    /// Objects whose last holder was a destroyed node.
    released: Vec<ObjectId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a detached node.
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        NodeId(self.nodes.insert(node))
    }

    /// Appends `child` to `parent`'s children.
    ///
    /// # Errors
    /// - [`SceneError::NodeNotFound`] if either id is stale
    /// - [`SceneError::AlreadyAttached`] if `child` already has a parent
    /// - [`SceneError::WouldCreateCycle`] if `child` is `parent` or one of its ancestors
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.node(parent)?;
        if self.node(child)?.parent.is_some() {
            return Err(SceneError::AlreadyAttached(child));
        }
        if self.ancestors_and_self(parent).any(|id| id == child) {
            return Err(SceneError::WouldCreateCycle { parent, child });
        }

        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Recomputes world transforms and uniforms for the subtree at `root`.
    ///
    /// If `root` itself has a parent, its parent's cached world transform is
    /// used as the starting point.
    ///
    /// # Arguments
    /// * `root` - First node to update
    /// * `projection` - Projection matrix shared by every node
    /// * `camera` - Camera providing the view matrix
    /// * `frame` - Time, resolution and pointer for this frame
    pub fn update(
        &mut self,
        root: NodeId,
        projection: Matrix4<f32>,
        camera: &Camera,
        frame: &FrameContext,
    ) -> Result<(), SceneError> {
        let parent_world = match self.node(root)?.parent {
            Some(parent) => Some(self.node(parent)?.world),
            None => None,
        };
        let view = camera.view_matrix();

        let mut stack = vec![(root, parent_world)];
        while let Some((id, parent_world)) = stack.pop() {
            let node = self.node_mut(id)?;
            node.world = match parent_world {
                Some(parent_world) => parent_world * node.local,
                None => node.local,
            };
            node.record_uniforms(projection, view, frame);

            let world = node.world;
            stack.extend(node.children.iter().rev().map(|&child| (child, Some(world))));
        }
        Ok(())
    }

    /// Draws the subtree at `root` in pre-order.
    pub fn draw(&mut self, root: NodeId, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        self.node(root)?;

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.node_mut(id)?;
            let handle = node.shader.ensure_compiled(backend)?;
            backend.bind(handle)?;
            backend.set_uniforms(&node.uniforms)?;
            if let Some(object) = &node.object {
                backend.draw(object)?;
            }
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(())
    }

    /// Node ids of the subtree at `root` in pre-order. Empty for a stale id.
    pub fn traverse(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.0) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Removes `id` and its whole subtree and unlinks it from its parent.
    ///
    /// Render objects held only by the removed nodes are queued for
    /// [`take_released_objects`](Self::take_released_objects).
    ///
    /// # Returns
    /// The removed ids in pre-order
    pub fn destroy(&mut self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        if let Some(parent) = self.node(id)?.parent {
            self.node_mut(parent)?.children.retain(|&child| child != id);
        }

        let removed = self.traverse(id);
        for &node in &removed {
            let Some(node) = self.nodes.remove(node.0) else {
                continue;
            };
            if let Some(object) = node.object {
                if Arc::strong_count(&object) == 1 {
                    self.released.push(object.id());
                }
            }
        }
        debug!("Destroyed {} scene node(s)", removed.len());
        Ok(removed)
    }

    /// Drains the objects freed by [`destroy`](Self::destroy) since the last call.
    pub fn take_released_objects(&mut self) -> Vec<ObjectId> {
        std::mem::take(&mut self.released)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn local_transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.get_mut(id).map(|node| &mut node.local)
    }

    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        self.get(id).map(|node| node.world)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: NodeId) -> Result<&SceneNode, SceneError> {
        self.nodes.get(id.0).ok_or(SceneError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode, SceneError> {
        self.nodes.get_mut(id.0).ok_or(SceneError::NodeNotFound(id))
    }

    fn ancestors_and_self(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&current| self.parent(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::{
        node::{NodeKind, NodeUniforms},
        object::RenderObject,
        shader::{ShaderHandle, ShaderProgram, ShaderSource},
    };
    use crate::gfx::geometry::Geometry;
    use cgmath::{SquareMatrix, Vector3, Vector4};
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Compile(String),
        Bind(u32),
        Uniforms(NodeUniforms),
        Draw(String),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        compiled: u32,
    }

    impl RenderBackend for Recorder {
        fn compile(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError> {
            self.compiled += 1;
            self.calls.push(Call::Compile(source.label()));
            Ok(ShaderHandle::new(self.compiled))
        }

        fn bind(&mut self, shader: ShaderHandle) -> Result<(), RenderError> {
            self.calls.push(Call::Bind(shader.id()));
            Ok(())
        }

        fn set_uniforms(&mut self, uniforms: &NodeUniforms) -> Result<(), RenderError> {
            self.calls.push(Call::Uniforms(*uniforms));
            Ok(())
        }

        fn draw(&mut self, object: &RenderObject) -> Result<(), RenderError> {
            self.calls.push(Call::Draw(object.name().to_string()));
            Ok(())
        }
    }

    fn object(name: &str) -> Arc<RenderObject> {
        let mut g = Geometry::new();
        g.add_vertex([0.0; 3], [0.0; 3], [1.0, 0.0, 0.0], [0.0; 2]);
        Arc::new(RenderObject::new(name, g))
    }

    fn named(name: &str) -> SceneNode {
        SceneNode::new(
            Some(object(name)),
            ShaderProgram::from_source(ShaderSource::inline(name, "")),
        )
    }

    fn translated(node: SceneNode, x: f32, y: f32, z: f32) -> SceneNode {
        let mut t = Transform::identity();
        t.translate(x, y, z);
        node.with_transform(t)
    }

    /// root -> [a -> [a1], b -> [b1]]
    fn two_branches(scene: &mut SceneGraph) -> [NodeId; 5] {
        let root = scene.insert(named("root"));
        let a = scene.insert(named("a"));
        let a1 = scene.insert(named("a1"));
        let b = scene.insert(named("b"));
        let b1 = scene.insert(named("b1"));
        scene.add_child(root, a).unwrap();
        scene.add_child(a, a1).unwrap();
        scene.add_child(root, b).unwrap();
        scene.add_child(b, b1).unwrap();
        [root, a, a1, b, b1]
    }

    #[test]
    fn test_traverse_is_pre_order() {
        let mut scene = SceneGraph::new();
        let [root, a, a1, b, b1] = two_branches(&mut scene);
        assert_eq!(scene.traverse(root), vec![root, a, a1, b, b1]);
        assert_eq!(scene.traverse(b), vec![b, b1]);
    }

    #[test]
    fn test_draw_is_pre_order() {
        let mut scene = SceneGraph::new();
        let [root, ..] = two_branches(&mut scene);
        let mut backend = Recorder::default();
        scene.draw(root, &mut backend).unwrap();

        let drawn: Vec<String> = backend
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw(name) => Some(name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(drawn, vec!["root", "a", "a1", "b", "b1"]);
    }

    #[test]
    fn test_draw_call_sequence_per_node() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(named("root"));
        let mut backend = Recorder::default();
        scene.draw(root, &mut backend).unwrap();

        assert!(matches!(backend.calls[0], Call::Compile(ref label) if label == "root"));
        assert_eq!(backend.calls[1], Call::Bind(1));
        assert!(matches!(backend.calls[2], Call::Uniforms(_)));
        assert_eq!(backend.calls[3], Call::Draw("root".to_string()));
    }

    #[test]
    fn test_shader_compiled_once() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(named("root"));
        let mut backend = Recorder::default();
        scene.draw(root, &mut backend).unwrap();
        scene.draw(root, &mut backend).unwrap();

        assert_eq!(backend.compiled, 1);
        assert!(scene.get(root).unwrap().shader().is_compiled());
    }

    #[test]
    fn test_world_transforms_compose() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(translated(named("root"), 1.0, 0.0, 0.0));
        let child = scene.insert(translated(named("child"), 0.0, 2.0, 0.0));
        let grandchild = scene.insert(translated(named("grandchild"), 0.0, 0.0, 3.0));
        scene.add_child(root, child).unwrap();
        scene.add_child(child, grandchild).unwrap();

        scene
            .update(root, Matrix4::identity(), &Camera::default(), &FrameContext::default())
            .unwrap();

        let root_node = scene.get(root).unwrap();
        assert_eq!(root_node.world_transform(), root_node.local_transform());

        let child_node = scene.get(child).unwrap();
        assert_eq!(
            *child_node.world_transform(),
            *root_node.world_transform() * *child_node.local_transform()
        );
        assert_eq!(
            scene.world_transform(grandchild).unwrap().position(),
            Vector3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_group_nodes_propagate_transforms() {
        let mut scene = SceneGraph::new();
        let root = scene.insert(translated(SceneNode::group(), 5.0, 0.0, 0.0));
        let leaf = scene.insert(named("leaf"));
        scene.add_child(root, leaf).unwrap();

        scene
            .update(root, Matrix4::identity(), &Camera::default(), &FrameContext::default())
            .unwrap();
        assert_eq!(
            scene.world_transform(leaf).unwrap().position(),
            Vector3::new(5.0, 0.0, 0.0)
        );

        let mut backend = Recorder::default();
        scene.draw(root, &mut backend).unwrap();
        let draws = backend
            .calls
            .iter()
            .filter(|call| matches!(call, Call::Draw(_)))
            .count();
        assert_eq!(draws, 1);
    }

    #[test]
    fn test_skybox_uniforms() {
        let mut scene = SceneGraph::new();
        let sky = scene.insert(translated(
            SceneNode::skybox(object("sky"), ShaderProgram::skybox()),
            9.0,
            9.0,
            9.0,
        ));
        let mut camera = Camera::default();
        camera.set_eye_position(4.0, -2.0, 7.0);
        let frame = FrameContext::new(1.5, 640, 480, (10.0, 20.0));

        scene
            .update(sky, Matrix4::identity(), &camera, &frame)
            .unwrap();

        let node = scene.get(sky).unwrap();
        assert_eq!(node.kind(), NodeKind::Skybox);
        let uniforms = node.uniforms();
        assert_eq!(uniforms.model, NodeUniforms::default().model);
        assert_eq!(uniforms.view[3], [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniforms.time, 1.5);
        assert_eq!(uniforms.resolution, [640.0, 480.0, 1.0]);
        assert_eq!(uniforms.mouse, [10.0, 460.0, 0.0, 0.0]);
    }

    #[test]
    fn test_standard_uniforms_use_world_and_camera() {
        let mut scene = SceneGraph::new();
        let node = scene.insert(translated(named("n"), 0.0, 1.0, 0.0));
        let camera = Camera::default();
        let projection = cgmath::perspective(cgmath::Deg(45.0), 1.0, 0.1, 512.0);

        scene
            .update(node, projection, &camera, &FrameContext::default())
            .unwrap();

        let uniforms = scene.get(node).unwrap().uniforms();
        assert_eq!(uniforms.model[3], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(Matrix4::from(uniforms.view), camera.view_matrix());
        assert_eq!(Matrix4::from(uniforms.projection), projection);
        assert_eq!(Matrix4::from(uniforms.view).w, Vector4::new(0.0, 0.0, -3.0, 1.0));
    }

    #[test]
    fn test_add_child_errors() {
        let mut scene = SceneGraph::new();
        let [root, a, a1, b, _] = two_branches(&mut scene);

        assert_eq!(scene.add_child(b, a), Err(SceneError::AlreadyAttached(a)));
        assert_eq!(
            scene.add_child(a1, root),
            Err(SceneError::WouldCreateCycle {
                parent: a1,
                child: root
            })
        );
        let loose = scene.insert(SceneNode::group());
        assert_eq!(
            scene.add_child(loose, loose),
            Err(SceneError::WouldCreateCycle {
                parent: loose,
                child: loose
            })
        );

        let removed = scene.destroy(b).unwrap();
        assert_eq!(scene.add_child(b, loose), Err(SceneError::NodeNotFound(b)));
        assert_eq!(removed.len(), 2);
    }

    #[test]
    fn test_destroy_removes_subtree_and_unlinks() {
        let mut scene = SceneGraph::new();
        let [root, a, a1, b, b1] = two_branches(&mut scene);

        assert_eq!(scene.destroy(a).unwrap(), vec![a, a1]);
        assert_eq!(scene.len(), 3);
        assert!(!scene.contains(a1));
        assert_eq!(scene.children(root), &[b]);
        assert_eq!(scene.traverse(root), vec![root, b, b1]);
    }

    #[test]
    fn test_destroy_releases_unshared_objects() {
        let mut scene = SceneGraph::new();
        let shared = object("shared");
        let root = scene.insert(named("root"));
        let keep = scene.insert(SceneNode::new(Some(shared.clone()), ShaderProgram::textured()));
        let branch = scene.insert(named("branch"));
        let copy = scene.insert(SceneNode::new(Some(shared.clone()), ShaderProgram::textured()));
        scene.add_child(root, keep).unwrap();
        scene.add_child(root, branch).unwrap();
        scene.add_child(branch, copy).unwrap();
        let branch_object = scene.get(branch).unwrap().object().unwrap().id();

        scene.destroy(branch).unwrap();
        assert_eq!(scene.take_released_objects(), vec![branch_object]);
        assert!(scene.take_released_objects().is_empty());

        drop(shared);
        scene.destroy(keep).unwrap();
        assert_eq!(scene.take_released_objects().len(), 1);
    }

    #[test]
    fn test_update_unknown_root() {
        let mut scene = SceneGraph::new();
        let gone = scene.insert(SceneNode::group());
        scene.destroy(gone).unwrap();
        assert_eq!(
            scene.update(gone, Matrix4::identity(), &Camera::default(), &FrameContext::default()),
            Err(SceneError::NodeNotFound(gone))
        );
    }
}
