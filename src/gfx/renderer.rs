//! Frame orchestration.
//!
//! The [`Renderer`] owns the scene graph, its root and the cameras. Each frame
//! the application calls [`Renderer::update`] (projection, world transforms and
//! uniforms for the whole tree) and then [`Renderer::render`] (draw calls into
//! a [`RenderBackend`]), so every node is updated before anything is drawn.

use std::time::Instant;

use cgmath::{Deg, Matrix4};
use log::info;

use crate::gfx::{
    camera::Camera,
    rendering::backend::{RenderBackend, RenderError},
    scene::{
        graph::{NodeId, SceneError, SceneGraph},
        node::FrameContext,
    },
};

pub const FIELD_OF_VIEW_DEGREES: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 512.0;

pub struct Renderer {
    scene: SceneGraph,
    root: Option<NodeId>,
    cameras: Vec<Camera>,
    width: u32,
    height: u32,
    start: Instant,
    mouse: (f32, f32),
    projection: Matrix4<f32>,
}

impl Renderer {
    /// Creates a renderer with one default camera and an empty scene.
    pub fn new(width: u32, height: u32) -> Self {
        info!("Renderer created ({}x{})", width, height);
        Self {
            scene: SceneGraph::new(),
            root: None,
            cameras: vec![Camera::default()],
            width,
            height,
            start: Instant::now(),
            mouse: (0.0, 0.0),
            projection: Self::perspective(width, height),
        }
    }

    fn perspective(width: u32, height: u32) -> Matrix4<f32> {
        let aspect = width as f32 / height.max(1) as f32;
        cgmath::perspective(Deg(FIELD_OF_VIEW_DEGREES), aspect, NEAR_PLANE, FAR_PLANE)
    }

    /// Recomputes the projection and updates the scene from the root with
    /// camera 0. Does nothing until a root is set.
    pub fn update(&mut self) -> Result<(), SceneError> {
        self.projection = Self::perspective(self.width, self.height);

        let Some(root) = self.root else {
            return Ok(());
        };
        let frame = FrameContext::new(
            self.start.elapsed().as_secs_f32(),
            self.width,
            self.height,
            self.mouse,
        );
        self.scene
            .update(root, self.projection, &self.cameras[0], &frame)
    }

    /// Releases objects freed by destroyed nodes, then draws the scene from
    /// the root into `backend`.
    pub fn render(&mut self, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        for object in self.scene.take_released_objects() {
            backend.release(object);
        }
        match self.root {
            Some(root) => self.scene.draw(root, backend),
            None => Ok(()),
        }
    }

    pub fn set_root(&mut self, root: NodeId) -> Result<(), SceneError> {
        if !self.scene.contains(root) {
            return Err(SceneError::NodeNotFound(root));
        }
        self.root = Some(root);
        Ok(())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn camera(&self, index: usize) -> Option<&Camera> {
        self.cameras.get(index)
    }

    pub fn camera_mut(&mut self, index: usize) -> Option<&mut Camera> {
        self.cameras.get_mut(index)
    }

    /// Adds a camera and returns its index.
    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }

    pub fn set_start_time(&mut self, start: Instant) {
        self.start = start;
    }

    pub fn set_mouse_position(&mut self, x: f32, y: f32) {
        self.mouse = (x, y);
    }

    pub fn mouse_position(&self) -> (f32, f32) {
        self.mouse
    }

    pub fn screen_width(&self) -> u32 {
        self.width
    }

    pub fn screen_height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.projection = Self::perspective(width, height);
    }

    /// Projection matrix from the last update or resize.
    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }
}
