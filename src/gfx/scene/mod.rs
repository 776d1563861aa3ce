//! # Scene Management
//!
//! - [`graph`]: arena-backed node hierarchy with pre-order update and draw
//! - [`node`]: scene nodes, node kinds and per-node uniforms
//! - [`object`]: shareable meshes with their textures
//! - [`shader`]: per-node shader programs

pub mod graph;
pub mod node;
pub mod object;
pub mod shader;

pub use graph::{NodeId, SceneError, SceneGraph};
pub use node::{FrameContext, NodeKind, NodeUniforms, SceneNode};
pub use object::{ObjectId, RenderObject};
pub use shader::{ShaderHandle, ShaderProgram, ShaderSource, ShaderStage};
