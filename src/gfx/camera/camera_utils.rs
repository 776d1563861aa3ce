use cgmath::{Matrix3, Matrix4};

/// Remaps OpenGL clip-space depth (-1..1) to wgpu's (0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

/// Keeps only the rotational part of a view matrix, so the result no longer
/// depends on the eye position. Used for skyboxes.
pub fn strip_translation(view: Matrix4<f32>) -> Matrix4<f32> {
    let rotation = Matrix3::from_cols(view.x.truncate(), view.y.truncate(), view.z.truncate());
    Matrix4::from(rotation)
}
