//! Fixed grove content and the per-frame values derived from it.
//!
//! Nothing here touches the GPU. [`SceneFrame::compute`] turns the clock,
//! the camera and the two toggles into every uniform the renderer uploads,
//! in the order the draws are issued.

mod layout;
mod lights;

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec4};

use crate::camera_controller::FlyCamera;

pub use layout::{
    bench_transform, floor_transform, grass_transform, tree_transform, SceneAssets,
    GRASS_POSITIONS, TREE_POSITIONS,
};
pub use lights::{Firefly, PointLight, SpotLight, POINT_LIGHT_COUNT};

pub const SHININESS: f32 = 128.0;

/// Total number of draws issued in the offscreen pass.
pub const DRAW_COUNT: usize = POINT_LIGHT_COUNT + 1 + TREE_POSITIONS.len() + 1 + GRASS_POSITIONS.len();

/// The two user switches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Toggles {
    pub spotlight: bool,
    pub effect: bool,
}

impl Toggles {
    pub fn toggle_spotlight(&mut self) {
        self.spotlight = !self.spotlight;
        log::info!("spotlight {}", if self.spotlight { "on" } else { "off" });
    }

    pub fn toggle_effect(&mut self) {
        self.effect = !self.effect;
        log::info!("tone mapping {}", if self.effect { "on" } else { "off" });
    }
}

/// Which model a draw uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Firefly,
    Bench,
    Tree,
    Floor,
    Grass,
}

/// Per-frame uniforms shared by every pipeline of the offscreen pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub view_pos: Vec4,
    pub point_lights: [PointLight; POINT_LIGHT_COUNT],
    pub spot_light: SpotLight,
    /// shininess, unused, unused, unused
    pub material: Vec4,
}

/// Per-draw uniforms, written at a dynamic offset.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct DrawUniforms {
    pub model: Mat4,
    pub normal: Mat4,
}

impl DrawUniforms {
    pub fn new(model: Mat4) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model,
            normal: Mat4::from_mat3(normal),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Draw {
    pub kind: DrawKind,
    pub uniforms: DrawUniforms,
}

/// Everything one frame needs.
#[derive(Clone, Debug)]
pub struct SceneFrame {
    pub uniforms: FrameUniforms,
    pub draws: Vec<Draw>,
    pub effect: bool,
}

impl SceneFrame {
    pub fn compute(time: f32, camera: &FlyCamera, toggles: Toggles, aspect_ratio: f32) -> Self {
        let fireflies = Firefly::swarm(time);
        let uniforms = FrameUniforms {
            projection: camera.projection(aspect_ratio),
            view: camera.view_matrix(),
            view_pos: camera.position.extend(1.0),
            point_lights: fireflies.map(|f| PointLight::firefly(f.light_position)),
            spot_light: SpotLight::flashlight(camera, toggles.spotlight),
            material: Vec4::new(SHININESS, 0.0, 0.0, 0.0),
        };

        let mut draws = Vec::with_capacity(DRAW_COUNT);
        let mut push = |kind, model| {
            draws.push(Draw {
                kind,
                uniforms: DrawUniforms::new(model),
            })
        };
        for firefly in &fireflies {
            push(DrawKind::Firefly, firefly.model);
        }
        push(DrawKind::Bench, bench_transform());
        for position in TREE_POSITIONS {
            push(DrawKind::Tree, tree_transform(position));
        }
        push(DrawKind::Floor, floor_transform());
        for position in GRASS_POSITIONS {
            push(DrawKind::Grass, grass_transform(position));
        }

        Self {
            uniforms,
            draws,
            effect: toggles.effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::mem::size_of;

    #[test]
    fn uniform_sizes_match_wgsl() {
        assert_eq!(size_of::<PointLight>(), 80);
        assert_eq!(size_of::<SpotLight>(), 112);
        assert_eq!(size_of::<FrameUniforms>(), 64 + 64 + 16 + 160 + 112 + 16);
        assert_eq!(size_of::<DrawUniforms>(), 128);
    }

    #[test]
    fn draws_follow_fixed_order() {
        let frame = SceneFrame::compute(0.0, &FlyCamera::default(), Toggles::default(), 4.0 / 3.0);
        let kinds: Vec<_> = frame.draws.iter().map(|d| d.kind).collect();
        use DrawKind::*;
        assert_eq!(
            kinds,
            vec![Firefly, Firefly, Bench, Tree, Tree, Tree, Floor, Grass, Grass, Grass, Grass, Grass]
        );
        assert_eq!(frame.draws.len(), DRAW_COUNT);
    }

    #[test]
    fn point_lights_follow_fireflies() {
        let t = 3.7;
        let frame = SceneFrame::compute(t, &FlyCamera::default(), Toggles::default(), 1.0);
        let swarm = Firefly::swarm(t);
        for (light, firefly) in frame.uniforms.point_lights.iter().zip(swarm.iter()) {
            assert_eq!(light.position.truncate(), firefly.light_position);
        }
        assert_eq!(frame.draws[0].uniforms.model, swarm[0].model);
        assert_eq!(frame.draws[1].uniforms.model, swarm[1].model);
    }

    #[test]
    fn toggles_reach_uniforms() {
        let camera = FlyCamera::default();
        let mut toggles = Toggles::default();
        toggles.toggle_spotlight();
        toggles.toggle_effect();
        let frame = SceneFrame::compute(0.0, &camera, toggles, 1.0);
        assert!(frame.effect);
        assert_eq!(frame.uniforms.spot_light.diffuse.truncate(), Vec3::ONE);
        assert_eq!(frame.uniforms.view_pos.truncate(), camera.position);
        assert_eq!(frame.uniforms.material.x, 128.0);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let uniforms = DrawUniforms::new(floor_transform());
        let n = uniforms.normal.transform_vector3(Vec3::Y).normalize();
        assert!((n - Vec3::Y).length() < 1e-6);
    }
}
