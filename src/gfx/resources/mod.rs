//! # Resources
//!
//! Texture loading on the CPU side ([`texture`]) and the matching GPU
//! resources ([`texture_resource`]).

pub mod texture;
pub mod texture_resource;

pub use texture::{ImageDecoder, PnmDecoder, Texture, TextureError, TextureImage};
pub use texture_resource::TextureResource;
