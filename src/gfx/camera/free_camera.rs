//! Free-look camera.
//!
//! The camera keeps an eye position, a view direction and a fixed up vector.
//! Movement is expressed in those terms: forward/backward along the view
//! direction, left/right along `view x up`, up/down along world Y. Pointer
//! motion yaws the view direction about the up vector.

use cgmath::{Deg, InnerSpace, Matrix3, Matrix4, Point3, Vector3};

/// Degrees of yaw per pixel of horizontal pointer motion.
pub const DEFAULT_LOOK_SENSITIVITY: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    eye: Point3<f32>,
    view_direction: Vector3<f32>,
    up: Vector3<f32>,
    last_pointer: Option<(f32, f32)>,
    look_sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 0.0, 3.0),
            view_direction: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            last_pointer: None,
            look_sensitivity: DEFAULT_LOOK_SENSITIVITY,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_look_sensitivity(mut self, degrees_per_pixel: f32) -> Self {
        self.look_sensitivity = degrees_per_pixel;
        self
    }

    /// Right-handed look-at matrix from the eye toward `eye + view_direction`.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.eye + self.view_direction, self.up)
    }

    /// Yaws the view direction from pointer motion.
    ///
    /// The first call only records the pointer position. Every later call
    /// rotates by `(previous_x - x) * sensitivity` degrees about the up vector;
    /// vertical motion is ignored.
    pub fn mouse_look(&mut self, x: f32, y: f32) {
        let Some((last_x, _)) = self.last_pointer.replace((x, y)) else {
            return;
        };

        let delta = last_x - x;
        if delta != 0.0 {
            let rotation =
                Matrix3::from_axis_angle(self.up.normalize(), Deg(delta * self.look_sensitivity));
            self.view_direction = rotation * self.view_direction;
        }
    }

    /// Forgets the last pointer position; the next `mouse_look` re-seeds it.
    pub fn reset_pointer(&mut self) {
        self.last_pointer = None;
    }

    // Movement is scaled by the view vector's length, which is not normalized.
    pub fn move_forward(&mut self, speed: f32) {
        self.eye += self.view_direction * speed;
    }

    pub fn move_backward(&mut self, speed: f32) {
        self.eye -= self.view_direction * speed;
    }

    pub fn move_left(&mut self, speed: f32) {
        self.eye -= self.view_direction.cross(self.up) * speed;
    }

    pub fn move_right(&mut self, speed: f32) {
        self.eye += self.view_direction.cross(self.up) * speed;
    }

    pub fn move_up(&mut self, speed: f32) {
        self.eye.y += speed;
    }

    pub fn move_down(&mut self, speed: f32) {
        self.eye.y -= speed;
    }

    pub fn set_eye_position(&mut self, x: f32, y: f32, z: f32) {
        self.eye = Point3::new(x, y, z);
    }

    pub fn set_view_direction(&mut self, direction: Vector3<f32>) {
        self.view_direction = direction;
    }

    pub fn eye_position(&self) -> Point3<f32> {
        self.eye
    }

    pub fn eye_x(&self) -> f32 {
        self.eye.x
    }

    pub fn eye_y(&self) -> f32 {
        self.eye.y
    }

    pub fn eye_z(&self) -> f32 {
        self.eye.z
    }

    pub fn view_direction(&self) -> Vector3<f32> {
        self.view_direction
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn look_sensitivity(&self) -> f32 {
        self.look_sensitivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{EuclideanSpace, Transform};

    const EPS: f32 = 1e-5;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < EPS
    }

    #[test]
    fn test_defaults() {
        let camera = Camera::default();
        assert_eq!(camera.eye_position(), Point3::new(0.0, 0.0, 3.0));
        assert_eq!(camera.view_direction(), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(camera.up(), Vector3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_first_mouse_look_only_seeds() {
        let mut camera = Camera::default();
        camera.mouse_look(400.0, 300.0);
        assert_eq!(camera.view_direction(), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_mouse_look_rotates_by_negative_dx() {
        let mut camera = Camera::default();
        camera.mouse_look(0.0, 0.0);
        camera.mouse_look(90.0, 50.0);
        // -90 degrees about +Y turns -Z into +X
        assert!(close(camera.view_direction(), Vector3::new(1.0, 0.0, 0.0)));

        camera.mouse_look(0.0, -20.0);
        assert!(close(camera.view_direction(), Vector3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn test_mouse_look_ignores_vertical_motion() {
        let mut camera = Camera::default();
        camera.mouse_look(10.0, 10.0);
        camera.mouse_look(10.0, 500.0);
        assert_eq!(camera.view_direction(), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_sensitivity_scales_rotation() {
        let mut camera = Camera::default().with_look_sensitivity(0.5);
        camera.mouse_look(0.0, 0.0);
        camera.mouse_look(180.0, 0.0);
        assert!(close(camera.view_direction(), Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_planar_movement() {
        let mut camera = Camera::default();
        camera.move_forward(1.0);
        assert!(close(camera.eye_position().to_vec(), Vector3::new(0.0, 0.0, 2.0)));
        camera.move_backward(2.0);
        assert!(close(camera.eye_position().to_vec(), Vector3::new(0.0, 0.0, 4.0)));
        camera.move_left(1.0);
        assert!(close(camera.eye_position().to_vec(), Vector3::new(-1.0, 0.0, 4.0)));
        camera.move_right(2.0);
        assert!(close(camera.eye_position().to_vec(), Vector3::new(1.0, 0.0, 4.0)));
    }

    #[test]
    fn test_movement_scales_with_view_length() {
        let mut camera = Camera::default();
        camera.set_view_direction(Vector3::new(0.0, 0.0, -2.0));
        camera.move_forward(1.0);
        assert_eq!(camera.eye_z(), 1.0);
    }

    #[test]
    fn test_vertical_movement() {
        let mut camera = Camera::default();
        camera.move_up(2.5);
        camera.move_down(1.0);
        assert_eq!(camera.eye_y(), 1.5);
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let mut camera = Camera::default();
        camera.set_eye_position(1.0, 2.0, 3.0);
        let p = camera.view_matrix().transform_point(camera.eye_position());
        assert!(close(p.to_vec(), Vector3::new(0.0, 0.0, 0.0)));

        let ahead = camera
            .view_matrix()
            .transform_point(camera.eye_position() + camera.view_direction());
        assert!(close(ahead.to_vec(), Vector3::new(0.0, 0.0, -1.0)));
    }
}
