use glam::{Mat4, Vec3};
use winit::dpi::PhysicalPosition;
use winit::event::MouseScrollDelta;

const YAW: f32 = -90.0;
const PITCH: f32 = 0.0;
const SPEED: f32 = 2.5;
const SENSITIVITY: f32 = 0.1;
const ZOOM: f32 = 45.0;
const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 45.0;
const PITCH_LIMIT: f32 = 89.0;

pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Free-fly camera. Angles are kept in degrees.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub world_up: Vec3,

    pub yaw: f32,
    pub pitch: f32,

    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.0, 12.0))
    }
}

impl FlyCamera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: YAW,
            pitch: PITCH,
            movement_speed: SPEED,
            mouse_sensitivity: SENSITIVITY,
            zoom: ZOOM,
        };
        camera.update_vectors();
        camera
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let front = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.front = front.normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    pub fn process_keyboard(&mut self, direction: Movement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        match direction {
            Movement::Forward => self.position += self.front * velocity,
            Movement::Backward => self.position -= self.front * velocity,
            Movement::Left => self.position -= self.right * velocity,
            Movement::Right => self.position += self.right * velocity,
        }
    }

    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;
        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        self.update_vectors();
    }

    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        let scroll_amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.01,
        };
        self.process_mouse_scroll(scroll_amount);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.zoom.to_radians(), aspect_ratio, NEAR_PLANE, FAR_PLANE)
    }
}

/// Turns absolute cursor positions into look offsets.
///
/// The first sample after creation only seeds the last position so the
/// camera does not jump when the cursor enters the window.
#[derive(Debug, Default)]
pub struct MouseTracker {
    last: Option<PhysicalPosition<f64>>,
}

impl MouseTracker {
    pub fn handle_motion(&mut self, position: PhysicalPosition<f64>) -> Option<(f32, f32)> {
        let offset = self.last.map(|last| {
            let x_offset = position.x - last.x;
            // window y grows downwards
            let y_offset = last.y - position.y;
            (x_offset as f32, y_offset as f32)
        });
        self.last = Some(position);
        offset
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn starts_looking_down_negative_z() {
        let camera = FlyCamera::default();
        assert_eq!(camera.position, Vec3::new(0.0, 1.0, 12.0));
        assert!((camera.front - Vec3::NEG_Z).length() < EPS);
        assert!((camera.right - Vec3::X).length() < EPS);
        assert!((camera.up - Vec3::Y).length() < EPS);
    }

    #[test]
    fn keyboard_moves_along_basis() {
        let mut camera = FlyCamera::default();
        camera.process_keyboard(Movement::Forward, 2.0);
        assert!((camera.position - Vec3::new(0.0, 1.0, 7.0)).length() < EPS);
        camera.process_keyboard(Movement::Right, 0.4);
        assert!((camera.position - Vec3::new(1.0, 1.0, 7.0)).length() < EPS);
        camera.process_keyboard(Movement::Backward, 2.0);
        camera.process_keyboard(Movement::Left, 0.4);
        assert!((camera.position - Vec3::new(0.0, 1.0, 12.0)).length() < EPS);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_movement(0.0, 10_000.0, true);
        assert_eq!(camera.pitch, 89.0);
        camera.process_mouse_movement(0.0, -20_000.0, true);
        assert_eq!(camera.pitch, -89.0);
        camera.process_mouse_movement(0.0, -10.0, false);
        assert_eq!(camera.pitch, -90.0);
    }

    #[test]
    fn yaw_turns_front() {
        let mut camera = FlyCamera::default();
        // 900 px * 0.1 = 90 degrees to the right
        camera.process_mouse_movement(900.0, 0.0, true);
        assert!((camera.front - Vec3::X).length() < 1e-4);
        assert!((camera.right - Vec3::Z).length() < 1e-4);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_scroll(-5.0);
        assert_eq!(camera.zoom, 45.0);
        camera.process_mouse_scroll(30.0);
        assert_eq!(camera.zoom, 15.0);
        camera.handle_scroll(MouseScrollDelta::LineDelta(0.0, 100.0));
        assert_eq!(camera.zoom, 1.0);
    }

    #[test]
    fn view_matrix_moves_eye_to_origin() {
        let camera = FlyCamera::default();
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert!(eye.length() < EPS);
        let ahead = camera
            .view_matrix()
            .transform_point3(camera.position + camera.front);
        assert!((ahead - Vec3::NEG_Z).length() < EPS);
    }

    #[test]
    fn first_mouse_sample_is_swallowed() {
        let mut tracker = MouseTracker::default();
        assert_eq!(tracker.handle_motion(PhysicalPosition::new(400.0, 300.0)), None);
        assert_eq!(
            tracker.handle_motion(PhysicalPosition::new(410.0, 280.0)),
            Some((10.0, 20.0))
        );
        tracker.reset();
        assert_eq!(tracker.handle_motion(PhysicalPosition::new(0.0, 0.0)), None);
    }
}
