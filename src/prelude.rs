//! # Arbor Prelude
//!
//! Commonly used types in one import.
//!
//! ```no_run
//! use arbor::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     arbor::default().run(|renderer| {
//!         let model = Arc::new(RenderObject::load_obj("assets/cube.obj", &PnmDecoder)?);
//!         let root = renderer
//!             .scene_mut()
//!             .insert(SceneNode::new(Some(model), ShaderProgram::textured()));
//!         renderer.set_root(root)?;
//!         Ok(())
//!     })
//! }
//! ```

// Core application types
pub use crate::app::{AppConfig, ArborApp};
pub use crate::default;

// Scene and rendering
pub use crate::gfx::camera::{Camera, CameraController};
pub use crate::gfx::geometry::{Geometry, Vertex3D};
pub use crate::gfx::importer::{ImportError, ImportWarning, ImportedModel, ModelImporter};
pub use crate::gfx::renderer::Renderer;
pub use crate::gfx::rendering::{RenderBackend, RenderError, WgpuBackend};
pub use crate::gfx::resources::{ImageDecoder, PnmDecoder, Texture, TextureImage};
pub use crate::gfx::scene::{
    FrameContext, NodeId, NodeKind, NodeUniforms, RenderObject, SceneError, SceneGraph, SceneNode,
    ShaderProgram, ShaderSource,
};
pub use crate::gfx::transform::Transform;

// Common external dependencies
pub use cgmath::{Deg, Vector3};
