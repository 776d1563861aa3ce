use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::free_camera::Camera;

/// Movement keys currently held down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct HeldKeys {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

/// Maps keyboard and cursor input onto a [`Camera`].
///
/// Arrows or WASD move in the view plane, right shift / E rise and right
/// ctrl / Q sink. Cursor motion is forwarded to [`Camera::mouse_look`].
pub struct CameraController {
    /// World units per second.
    pub speed: f32,
    held: HeldKeys,
}

impl CameraController {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            held: HeldKeys::default(),
        }
    }

    /// Records a key press or release.
    ///
    /// # Returns
    /// `true` if the key is a movement key
    pub fn process_keyed_events(&mut self, event: &KeyEvent) -> bool {
        let PhysicalKey::Code(code) = event.physical_key else {
            return false;
        };
        let pressed = event.state == ElementState::Pressed;
        self.process_key(code, pressed)
    }

    pub fn process_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        let slot = match code {
            KeyCode::ArrowUp | KeyCode::KeyW => &mut self.held.forward,
            KeyCode::ArrowDown | KeyCode::KeyS => &mut self.held.backward,
            KeyCode::ArrowLeft | KeyCode::KeyA => &mut self.held.left,
            KeyCode::ArrowRight | KeyCode::KeyD => &mut self.held.right,
            KeyCode::ShiftRight | KeyCode::KeyE => &mut self.held.up,
            KeyCode::ControlRight | KeyCode::KeyQ => &mut self.held.down,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    pub fn process_cursor(&mut self, position: PhysicalPosition<f64>, camera: &mut Camera) {
        camera.mouse_look(position.x as f32, position.y as f32);
    }

    /// Applies held movement keys for a frame of `dt` seconds.
    pub fn update_camera(&self, camera: &mut Camera, dt: f32) {
        let step = self.speed * dt;
        if self.held.forward {
            camera.move_forward(step);
        }
        if self.held.backward {
            camera.move_backward(step);
        }
        if self.held.left {
            camera.move_left(step);
        }
        if self.held.right {
            camera.move_right(step);
        }
        if self.held.up {
            camera.move_up(step);
        }
        if self.held.down {
            camera.move_down(step);
        }
    }

    /// Releases every key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.held = HeldKeys::default();
    }

    pub fn is_moving(&self) -> bool {
        self.held != HeldKeys::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_keys_move_camera() {
        let mut controller = CameraController::new(2.0);
        let mut camera = Camera::default();

        assert!(controller.process_key(KeyCode::KeyW, true));
        assert!(controller.process_key(KeyCode::ShiftRight, true));
        controller.update_camera(&mut camera, 0.5);

        assert_eq!(camera.eye_z(), 2.0);
        assert_eq!(camera.eye_y(), 1.0);
    }

    #[test]
    fn test_release_stops_movement() {
        let mut controller = CameraController::new(1.0);
        let mut camera = Camera::default();

        controller.process_key(KeyCode::ArrowLeft, true);
        controller.process_key(KeyCode::ArrowLeft, false);
        assert!(!controller.is_moving());
        controller.update_camera(&mut camera, 1.0);
        assert_eq!(camera, Camera::default());
    }

    #[test]
    fn test_unrelated_keys_are_ignored() {
        let mut controller = CameraController::new(1.0);
        assert!(!controller.process_key(KeyCode::KeyZ, true));
        assert!(!controller.is_moving());
    }

    #[test]
    fn test_cursor_drives_mouse_look() {
        let mut controller = CameraController::new(1.0);
        let mut camera = Camera::default();
        controller.process_cursor(PhysicalPosition::new(100.0, 0.0), &mut camera);
        controller.process_cursor(PhysicalPosition::new(10.0, 0.0), &mut camera);
        // +90 degrees about +Y turns -Z into -X
        assert!((camera.view_direction().x + 1.0).abs() < 1e-5);
    }
}
