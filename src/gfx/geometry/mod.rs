//! # Mesh Geometry
//!
//! [`Geometry`] accumulates per-vertex attributes and triangle indices, then
//! packs them into a single interleaved float buffer ready for GPU upload.
//!
//! ## Buffer layout
//!
//! Each vertex occupies [`FLOATS_PER_VERTEX`] floats, always in this order:
//!
//! | floats | attribute          |
//! |--------|--------------------|
//! | 0..3   | position (x, y, z) |
//! | 3..6   | color (r, g, b)    |
//! | 6..9   | normal (x, y, z)   |
//! | 9..11  | texcoord (s, t)    |
//!
//! ## Usage
//!
//! ```rust
//! use arbor::gfx::geometry::Geometry;
//!
//! let mut geometry = Geometry::new();
//! geometry.add_vertex([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 0.0]);
//! geometry.add_vertex([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [1.0, 0.0]);
//! geometry.add_vertex([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0]);
//! geometry.make_triangle(0, 1, 2).unwrap();
//! geometry.gen();
//!
//! assert_eq!(geometry.buffer_data().len(), 3 * 11);
//! ```

pub mod vertex;

pub use vertex::Vertex3D;

use thiserror::Error;

/// Number of floats per packed vertex.
pub const FLOATS_PER_VERTEX: usize = 11;

/// Rejected index writes. Nothing is appended when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("triangle ({a}, {b}, {c}) is out of range for {vertex_count} vertices")]
    TriangleOutOfRange {
        a: u32,
        b: u32,
        c: u32,
        vertex_count: usize,
    },
}

/// Vertex attributes and triangle indices for a single mesh.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    indices: Vec<u32>,
    buffer: Vec<f32>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one vertex to every attribute sequence in lock-step.
    ///
    /// # Returns
    /// The index of the new vertex
    pub fn add_vertex(
        &mut self,
        position: [f32; 3],
        normal: [f32; 3],
        color: [f32; 3],
        tex_coord: [f32; 2],
    ) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.colors.push(color);
        self.tex_coords.push(tex_coord);
        index
    }

    /// Appends a single index if it refers to an existing vertex.
    pub fn add_index(&mut self, index: u32) -> Result<(), GeometryError> {
        if (index as usize) < self.vertex_count() {
            self.indices.push(index);
            Ok(())
        } else {
            Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count: self.vertex_count(),
            })
        }
    }

    /// Appends a triangle. Either all three indices are written or none.
    pub fn make_triangle(&mut self, a: u32, b: u32, c: u32) -> Result<(), GeometryError> {
        let vertex_count = self.vertex_count();
        if [a, b, c].iter().any(|&i| i as usize >= vertex_count) {
            return Err(GeometryError::TriangleOutOfRange {
                a,
                b,
                c,
                vertex_count,
            });
        }
        self.indices.extend_from_slice(&[a, b, c]);
        Ok(())
    }

    /// Rebuilds the interleaved buffer from the attribute sequences.
    ///
    /// The buffer is cleared first, so calling this more than once always yields
    /// `vertex_count() * FLOATS_PER_VERTEX` floats.
    pub fn gen(&mut self) {
        debug_assert_eq!(self.positions.len(), self.colors.len());
        debug_assert_eq!(self.positions.len(), self.normals.len());
        debug_assert_eq!(self.positions.len(), self.tex_coords.len());

        self.buffer.clear();
        self.buffer.reserve(self.positions.len() * FLOATS_PER_VERTEX);

        for i in 0..self.positions.len() {
            self.buffer.extend_from_slice(&self.positions[i]);
            self.buffer.extend_from_slice(&self.colors[i]);
            self.buffer.extend_from_slice(&self.normals[i]);
            self.buffer.extend_from_slice(&self.tex_coords[i]);
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Packed buffer as of the last [`gen`](Self::gen) call.
    pub fn buffer_data(&self) -> &[f32] {
        &self.buffer
    }

    pub fn buffer_size_in_bytes(&self) -> usize {
        self.buffer.len() * std::mem::size_of::<f32>()
    }

    /// Packed buffer viewed as vertex records.
    pub fn vertices(&self) -> &[Vertex3D] {
        bytemuck::cast_slice(&self.buffer)
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn tex_coords(&self) -> &[[f32; 2]] {
        &self.tex_coords
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
