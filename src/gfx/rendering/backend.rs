//! The seam between the scene graph and a graphics API.
//!
//! The scene graph only ever talks to a [`RenderBackend`]: it compiles each
//! node's shader program once, then per node binds the program, uploads the
//! node's uniforms and draws the node's object. [`WgpuBackend`] is the
//! production implementation; tests substitute a recorder.
//!
//! [`WgpuBackend`]: super::wgpu_backend::WgpuBackend

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::gfx::scene::{
    graph::SceneError,
    node::NodeUniforms,
    object::{ObjectId, RenderObject},
    shader::{ShaderHandle, ShaderSource},
};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot read shader source {path}: {source}")]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("shader program '{label}' failed to compile: {message}")]
    ShaderCompilation { label: String, message: String },
    #[error("surface error: {0}")]
    Surface(String),
    #[error("no GPU resources for object {0:?}")]
    MissingObject(ObjectId),
    #[error("unknown shader handle {0:?}")]
    UnknownShader(ShaderHandle),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Graphics API operations the scene graph relies on.
pub trait RenderBackend {
    /// Builds a program from its sources and returns a handle for [`bind`](Self::bind).
    fn compile(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError>;

    /// Makes `shader` the program used by subsequent draws.
    fn bind(&mut self, shader: ShaderHandle) -> Result<(), RenderError>;

    /// Uploads the parameters for the next draw.
    fn set_uniforms(&mut self, uniforms: &NodeUniforms) -> Result<(), RenderError>;

    /// Draws `object` with the bound program and uniforms.
    fn draw(&mut self, object: &RenderObject) -> Result<(), RenderError>;

    /// Frees whatever the backend cached for an object that no node holds.
    fn release(&mut self, _object: ObjectId) {}
}
