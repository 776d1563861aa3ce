// src/gfx/rendering/mod.rs
//! Rendering backends.
//!
//! [`backend::RenderBackend`] is what the scene graph draws into;
//! [`wgpu_backend::WgpuBackend`] implements it on wgpu with one pipeline per
//! compiled shader program ([`pipeline_manager`]).

pub mod backend;
pub mod pipeline_manager;
pub mod wgpu_backend;

pub use backend::{RenderBackend, RenderError};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use wgpu_backend::{DrawCommand, WgpuBackend};
