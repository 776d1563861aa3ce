// src/lib.rs
//! Arbor
//!
//! A small real-time 3D renderer built on wgpu and winit: OBJ models with
//! vertex deduplication, a scene graph with transform propagation, and a
//! free-look camera.

pub mod app;
pub mod gfx;
pub mod prelude;

// Re-export main types for convenience
pub use app::{AppConfig, ArborApp};

/// Creates an application with the default configuration
pub fn default() -> ArborApp {
    ArborApp::new(AppConfig::default())
}
