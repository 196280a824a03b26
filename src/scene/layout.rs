use glam::{Mat4, Vec3};
use std::path::{Path, PathBuf};

pub const BENCH_OBJ: &str = "objects/bench/bank.obj";
pub const FIREFLY_OBJ: &str = "objects/firefly/19910_firefly_V1.obj";
pub const TREE_OBJ: &str = "objects/Tree01/3dmodel/tree01.obj";
pub const FLOOR_TEXTURE: &str = "objects/floor/grass01.jpg";
pub const GRASS_TEXTURE: &str = "objects/Grass/grass.png";

pub const TREE_POSITIONS: [Vec3; 3] = [
    Vec3::new(1.5, -4.8, -8.0),
    Vec3::new(11.5, -4.8, -8.0),
    Vec3::new(-8.5, -4.8, -8.0),
];

pub const GRASS_POSITIONS: [Vec3; 5] = [
    Vec3::new(-3.5, -4.5, -0.48),
    Vec3::new(5.0, -4.5, 8.51),
    Vec3::new(8.0, -4.5, 0.0),
    Vec3::new(-2.3, -4.5, -8.3),
    Vec3::new(5.5, -4.5, -4.6),
];

/// Resolved file locations of everything the grove draws.
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub bench: PathBuf,
    pub firefly: PathBuf,
    pub tree: PathBuf,
    pub floor_texture: PathBuf,
    pub grass_texture: PathBuf,
}

impl SceneAssets {
    pub fn under(root: &Path) -> Self {
        Self {
            bench: root.join(BENCH_OBJ),
            firefly: root.join(FIREFLY_OBJ),
            tree: root.join(TREE_OBJ),
            floor_texture: root.join(FLOOR_TEXTURE),
            grass_texture: root.join(GRASS_TEXTURE),
        }
    }
}

pub fn bench_transform() -> Mat4 {
    Mat4::from_translation(Vec3::new(1.8, -5.0, 3.0)) * Mat4::from_scale(Vec3::new(0.2, 0.15, 0.15))
}

pub fn tree_transform(position: Vec3) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_rotation_y(-0.3)
}

pub fn floor_transform() -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, -5.0, 0.0)) * Mat4::from_scale(Vec3::new(20.0, 1.0, 20.0))
}

/// Grass quads are authored upside down and flipped back here.
pub fn grass_transform(position: Vec3) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_rotation_x(3.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_spans_forty_units() {
        let m = floor_transform();
        let corner = m.transform_point3(Vec3::new(1.0, 0.0, -1.0));
        assert_eq!(corner, Vec3::new(20.0, -5.0, -20.0));
    }

    #[test]
    fn bench_scales_before_translating() {
        let origin = bench_transform().transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(1.8, -5.0, 3.0));
        let x = bench_transform().transform_vector3(Vec3::X);
        assert!((x - Vec3::new(0.2, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn trees_keep_their_height() {
        for p in TREE_POSITIONS {
            let m = tree_transform(p);
            assert!((m.transform_point3(Vec3::Y) - (p + Vec3::Y)).length() < 1e-5);
        }
    }

    #[test]
    fn assets_resolve_under_root() {
        let assets = SceneAssets::under(Path::new("/data"));
        assert_eq!(assets.tree, PathBuf::from("/data/objects/Tree01/3dmodel/tree01.obj"));
        assert_eq!(assets.grass_texture, PathBuf::from("/data/objects/Grass/grass.png"));
    }
}
