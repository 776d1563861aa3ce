//! # Graphics Module
//!
//! Everything between an OBJ file on disk and pixels on screen.
//!
//! ## Architecture Overview
//!
//! - **Import** ([`importer`]) - OBJ/MTL parsing with vertex deduplication
//! - **Geometry** ([`geometry`]) - attribute accumulation and interleaved packing
//! - **Resources** ([`resources`]) - image decoding and GPU textures
//! - **Scene** ([`scene`]) - render objects, nodes and the scene graph
//! - **Camera** ([`camera`]) - free-look camera and input controller
//! - **Renderer** ([`renderer`]) - per-frame update then draw
//! - **Rendering** ([`rendering`]) - the backend seam and its wgpu implementation
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use arbor::gfx::{
//!     renderer::Renderer,
//!     resources::PnmDecoder,
//!     scene::{RenderObject, SceneNode, ShaderProgram},
//! };
//!
//! let mut renderer = Renderer::new(1280, 720);
//! let house = Arc::new(RenderObject::load_obj("assets/house/house.obj", &PnmDecoder)?);
//! let root = renderer
//!     .scene_mut()
//!     .insert(SceneNode::new(Some(house), ShaderProgram::textured()));
//! renderer.set_root(root)?;
//! renderer.update()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod camera;
pub mod geometry;
pub mod importer;
pub mod renderer;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use camera::Camera;
pub use renderer::Renderer;
pub use rendering::WgpuBackend;
pub use transform::Transform;
