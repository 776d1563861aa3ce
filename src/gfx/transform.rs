//! # Transform
//!
//! A 4x4 affine transform backed by [`cgmath::Matrix4`]. Composition follows the
//! usual column-vector convention: `a * b` applies `b` first, then `a`, which is
//! exactly how a child's local transform is chained under its parent's world
//! transform.
//!
//! The `translate`/`rotate`/`scale` helpers post-multiply, so successive calls
//! read in the order they act on the model (the last call applies first).

use std::ops::{Add, Mul, MulAssign};

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};

use crate::gfx::camera::camera_utils::convert_matrix4_to_array;

/// Local or world transform of a scene node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn from_matrix(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }

    /// Post-multiplies a translation.
    pub fn translate(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.matrix = self.matrix * Matrix4::from_translation(Vector3::new(x, y, z));
        self
    }

    /// Post-multiplies a rotation of `degrees` about `axis`.
    ///
    /// # Arguments
    /// * `degrees` - Rotation angle in degrees
    /// * `axis` - Rotation axis, normalized internally
    pub fn rotate(&mut self, degrees: f32, axis: Vector3<f32>) -> &mut Self {
        use cgmath::InnerSpace;

        if axis.magnitude2() == 0.0 {
            return self;
        }
        self.matrix = self.matrix * Matrix4::from_axis_angle(axis.normalize(), Deg(degrees));
        self
    }

    /// Post-multiplies a non-uniform scale.
    pub fn scale(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.matrix = self.matrix * Matrix4::from_nonuniform_scale(x, y, z);
        self
    }

    pub fn load_identity(&mut self) {
        self.matrix = Matrix4::identity();
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    /// Translation component (last column).
    pub fn position(&self) -> Vector3<f32> {
        self.matrix.w.truncate()
    }

    pub fn to_array(&self) -> [[f32; 4]; 4] {
        convert_matrix4_to_array(self.matrix)
    }
}

impl From<Matrix4<f32>> for Transform {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        Transform {
            matrix: self.matrix * rhs.matrix,
        }
    }
}

impl MulAssign for Transform {
    fn mul_assign(&mut self, rhs: Transform) {
        self.matrix = self.matrix * rhs.matrix;
    }
}

/// Component-wise sum of the two matrices.
impl Add for Transform {
    type Output = Transform;

    fn add(self, rhs: Transform) -> Transform {
        Transform {
            matrix: self.matrix + rhs.matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, Transform as _};

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).x.abs() < 1e-5 && (a - b).y.abs() < 1e-5 && (a - b).z.abs() < 1e-5
    }

    #[test]
    fn test_default_is_identity() {
        assert_eq!(Transform::default().matrix(), Matrix4::identity());
    }

    #[test]
    fn test_mul_applies_right_operand_first() {
        let mut scale = Transform::identity();
        scale.scale(2.0, 2.0, 2.0);
        let mut shift = Transform::identity();
        shift.translate(1.0, 0.0, 0.0);

        let p = (shift * scale)
            .matrix()
            .transform_point(Point3::new(1.0, 0.0, 0.0));
        assert!((p.x - 3.0).abs() < 1e-6);

        let q = (scale * shift)
            .matrix()
            .transform_point(Point3::new(1.0, 0.0, 0.0));
        assert!((q.x - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_chained_helpers_post_multiply() {
        let mut t = Transform::identity();
        t.translate(0.0, 5.0, 0.0).scale(3.0, 3.0, 3.0);
        let p = t.matrix().transform_point(Point3::new(1.0, 1.0, 1.0));
        assert!(approx(
            Vector3::new(p.x, p.y, p.z),
            Vector3::new(3.0, 8.0, 3.0)
        ));
    }

    #[test]
    fn test_rotate_about_y() {
        let mut t = Transform::identity();
        t.rotate(90.0, Vector3::unit_y());
        let v = t.matrix().transform_vector(Vector3::unit_x());
        assert!(approx(v, Vector3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_mul_assign_and_add() {
        let mut a = Transform::identity();
        a.translate(1.0, 2.0, 3.0);
        let mut b = Transform::identity();
        b *= a;
        assert_eq!(b, a);
        assert_eq!((a + a).matrix(), a.matrix() * 2.0);
        assert!(approx(a.position(), Vector3::new(1.0, 2.0, 3.0)));
    }
}
