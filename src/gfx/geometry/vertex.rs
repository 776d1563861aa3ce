//! # Vertex Data Structures
//!
//! GPU-side view of one interleaved vertex as packed by
//! [`Geometry::gen`](super::Geometry::gen).

/// One interleaved vertex: position, color, normal, texture coordinate.
///
/// # Memory Layout
///
/// `#[repr(C)]` keeps the field order identical to the packed float buffer,
/// 11 floats (44 bytes) per vertex, so a slice of packed floats can be cast
/// directly to a slice of `Vertex3D`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex3D {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x3,
        3 => Float32x2
    ];

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// # Returns
    ///
    /// A [`wgpu::VertexBufferLayout`] with:
    /// - location 0: position (Float32x3)
    /// - location 1: color (Float32x3)
    /// - location 2: normal (Float32x3)
    /// - location 3: texture coordinate (Float32x2)
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
