use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::camera_controller::FlyCamera;

pub const POINT_LIGHT_COUNT: usize = 2;

const POINT_LINEAR: f32 = 0.05;
const POINT_QUADRATIC: f32 = 0.01;
const SPOT_LINEAR: f32 = 0.01;
const SPOT_QUADRATIC: f32 = 0.001;
const SPOT_CUT_OFF_DEG: f32 = 2.5;
const SPOT_OUTER_CUT_OFF_DEG: f32 = 22.0;

/// Offset of the glowing abdomen in firefly model space.
const FIREFLY_GLOW: Vec4 = Vec4::new(0.0, 7.0, 0.0, 1.0);

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PointLight {
    pub position: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    /// constant, linear, quadratic, unused
    pub attenuation: Vec4,
}

impl PointLight {
    pub fn firefly(position: Vec3) -> Self {
        Self {
            position: position.extend(1.0),
            ambient: Vec3::splat(0.4).extend(0.0),
            diffuse: Vec3::splat(0.6).extend(0.0),
            specular: Vec3::ONE.extend(0.0),
            attenuation: Vec4::new(1.0, POINT_LINEAR, POINT_QUADRATIC, 0.0),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SpotLight {
    pub position: Vec4,
    pub direction: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    /// constant, linear, quadratic, unused
    pub attenuation: Vec4,
    /// cos(inner), cos(outer), unused, unused
    pub cut_off: Vec4,
}

impl SpotLight {
    /// Flashlight held by the camera. Switched off means black, not absent.
    pub fn flashlight(camera: &FlyCamera, enabled: bool) -> Self {
        let intensity = if enabled { Vec3::ONE } else { Vec3::ZERO };
        Self {
            position: camera.position.extend(1.0),
            direction: camera.front.extend(0.0),
            ambient: Vec4::ZERO,
            diffuse: intensity.extend(0.0),
            specular: intensity.extend(0.0),
            attenuation: Vec4::new(1.0, SPOT_LINEAR, SPOT_QUADRATIC, 0.0),
            cut_off: Vec4::new(
                SPOT_CUT_OFF_DEG.to_radians().cos(),
                SPOT_OUTER_CUT_OFF_DEG.to_radians().cos(),
                0.0,
                0.0,
            ),
        }
    }
}

/// Model matrix and light position of one firefly.
#[derive(Copy, Clone, Debug)]
pub struct Firefly {
    pub model: Mat4,
    pub light_position: Vec3,
}

impl Firefly {
    pub fn new(translation: Vec3, angle: f32) -> Self {
        let model = Mat4::from_translation(translation)
            * Mat4::from_scale(Vec3::splat(0.18))
            * Mat4::from_scale(Vec3::splat(0.18))
            * Mat4::from_translation(Vec3::new(9.0, -7.8, 0.0))
            * Mat4::from_rotation_z(angle)
            * Mat4::from_rotation_x(-1.7)
            * Mat4::from_translation(Vec3::new(0.0, -1.32, 0.0));
        let light_position = (model * FIREFLY_GLOW).truncate();
        Self {
            model,
            light_position,
        }
    }

    /// Both fireflies at scene time `t` seconds.
    pub fn swarm(t: f32) -> [Firefly; POINT_LIGHT_COUNT] {
        let angle = (5.0 * (5.0 + 2.0 * t).sin()).to_radians();
        let bob = (2.0 + t).sin();
        let drift = 12.0 * (3.0 + 0.4 * t).sin();
        [
            Firefly::new(Vec3::new(5.0 * (1.0 + t).cos(), bob, drift), angle),
            Firefly::new(Vec3::new(6.0 + (1.0 + t).cos(), bob, drift), angle),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_sits_on_model() {
        let firefly = Firefly::new(Vec3::ZERO, 0.0);
        let expected = firefly.model.transform_point3(Vec3::new(0.0, 7.0, 0.0));
        assert!((firefly.light_position - expected).length() < 1e-5);
    }

    #[test]
    fn translation_is_applied_last() {
        let base = Firefly::new(Vec3::ZERO, 0.3);
        let moved = Firefly::new(Vec3::new(1.0, 2.0, 3.0), 0.3);
        let delta = moved.light_position - base.light_position;
        assert!((delta - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn swarm_at_time_zero() {
        let [a, b] = Firefly::swarm(0.0);
        let angle = (5.0 * 5.0f32.sin()).to_radians();
        let expected_a = Firefly::new(
            Vec3::new(5.0 * 1.0f32.cos(), 2.0f32.sin(), 12.0 * 3.0f32.sin()),
            angle,
        );
        assert!((a.light_position - expected_a.light_position).length() < 1e-5);
        // only x differs between the two flight paths
        let offset = (6.0 + 1.0f32.cos()) - 5.0 * 1.0f32.cos();
        assert!((b.light_position.x - a.light_position.x - offset).abs() < 1e-4);
        assert!((b.light_position.y - a.light_position.y).abs() < 1e-5);
        assert!((b.light_position.z - a.light_position.z).abs() < 1e-5);
    }

    #[test]
    fn flashlight_toggle_only_changes_intensity() {
        let camera = FlyCamera::default();
        let on = SpotLight::flashlight(&camera, true);
        let off = SpotLight::flashlight(&camera, false);
        assert_eq!(on.diffuse.truncate(), Vec3::ONE);
        assert_eq!(off.diffuse.truncate(), Vec3::ZERO);
        assert_eq!(off.specular.truncate(), Vec3::ZERO);
        assert_eq!(on.position, off.position);
        assert_eq!(on.cut_off, off.cut_off);
        assert!(on.cut_off.x > on.cut_off.y);
    }

    #[test]
    fn point_light_constants() {
        let light = PointLight::firefly(Vec3::X);
        assert_eq!(light.attenuation, Vec4::new(1.0, 0.05, 0.01, 0.0));
        assert_eq!(light.ambient.x, 0.4);
        assert_eq!(light.position.w, 1.0);
    }
}
