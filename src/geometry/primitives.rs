use bytemuck::{Pod, Zeroable};
use std::mem::size_of;
use wgpu::{
    vertex_attr_array, BufferAddress, VertexAttribute, VertexBufferLayout, VertexStepMode,
};

use super::{Mesh, Vertex};

/// Unit floor in the XZ plane. Texture coordinates repeat ten times.
pub fn floor_quad() -> Mesh {
    let up = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex::new([1.0, 0.0, 1.0], up, [10.0, 10.0]),
        Vertex::new([1.0, 0.0, -1.0], up, [10.0, 0.0]),
        Vertex::new([-1.0, 0.0, 1.0], up, [0.0, 10.0]),
        Vertex::new([-1.0, 0.0, -1.0], up, [0.0, 0.0]),
    ];
    Mesh::new(vertices, vec![0, 1, 3, 0, 2, 3], None)
}

/// Billboard for vegetation. V runs top to bottom, the draw transform
/// rotates it back upright.
pub fn grass_quad() -> Mesh {
    let n = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex::new([0.0, 0.5, 0.0], n, [0.0, 0.0]),
        Vertex::new([0.0, -0.5, 0.0], n, [0.0, 1.0]),
        Vertex::new([1.0, -0.5, 0.0], n, [1.0, 1.0]),
        Vertex::new([0.0, 0.5, 0.0], n, [0.0, 0.0]),
        Vertex::new([1.0, -0.5, 0.0], n, [1.0, 1.0]),
        Vertex::new([1.0, 0.5, 0.0], n, [1.0, 0.0]),
    ];
    Mesh::new(vertices, (0..6).collect(), None)
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ScreenVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl ScreenVertex {
    const ATTRIBS: [VertexAttribute; 2] = vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: size_of::<ScreenVertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Clip-space quad covering the whole target. UV origin is the top-left
/// texel of the sampled render target.
pub fn screen_quad() -> [ScreenVertex; 6] {
    let v = |x: f32, y: f32, u: f32, w: f32| ScreenVertex {
        position: [x, y],
        uv: [u, w],
    };
    [
        v(-1.0, 1.0, 0.0, 0.0),
        v(-1.0, -1.0, 0.0, 1.0),
        v(1.0, -1.0, 1.0, 1.0),
        v(-1.0, 1.0, 0.0, 0.0),
        v(1.0, -1.0, 1.0, 1.0),
        v(1.0, 1.0, 1.0, 0.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_is_two_triangles_facing_up() {
        let floor = floor_quad();
        assert_eq!(floor.indices.len(), 6);
        assert!(floor.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        let max_uv = floor
            .vertices
            .iter()
            .map(|v| v.uv[0].max(v.uv[1]))
            .fold(0.0, f32::max);
        assert_eq!(max_uv, 10.0);
    }

    #[test]
    fn screen_quad_covers_clip_space() {
        let quad = screen_quad();
        for corner in [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]] {
            assert!(quad.iter().any(|v| v.position == corner));
        }
        let top_left = quad.iter().find(|v| v.position == [-1.0, 1.0]);
        assert_eq!(top_left.map(|v| v.uv), Some([0.0, 0.0]));
    }

    #[test]
    fn grass_indices_are_sequential() {
        let grass = grass_quad();
        assert_eq!(grass.indices, vec![0, 1, 2, 3, 4, 5]);
    }
}
