//! # Camera System
//!
//! - [`free_camera::Camera`]: eye, view direction and fixed up vector, with
//!   planar/vertical movement and pointer yaw
//! - [`camera_controller::CameraController`]: winit keyboard and cursor input
//! - [`camera_utils`]: matrix helpers shared with the renderer

pub mod camera_controller;
pub mod camera_utils;
pub mod free_camera;

pub use camera_controller::CameraController;
pub use free_camera::Camera;
