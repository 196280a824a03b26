use std::collections::HashMap;
use std::path::{Path, PathBuf};
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindingResource, Buffer,
    BufferUsages, Device, IndexFormat, Queue, RenderPass, Sampler,
};

use crate::geometry::{Mesh, Model};
use crate::texture::{create_sampler, Texture, TextureImage, TextureRole, WrapMode};

/// Uploads textures once per path and role and hands out shared samplers.
pub struct TextureCache {
    textures: HashMap<(PathBuf, TextureRole), Texture>,
    white: Texture,
    black: Texture,
    repeat: Sampler,
    clamp: Sampler,
}

impl TextureCache {
    pub fn new(device: &Device, queue: &Queue) -> Self {
        let black = TextureImage {
            mips: vec![image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]))],
            wrap: WrapMode::Repeat,
        };
        Self {
            textures: HashMap::new(),
            white: Texture::upload(
                device,
                queue,
                &TextureImage::white(),
                TextureRole::Color,
                "white",
            ),
            black: Texture::upload(device, queue, &black, TextureRole::Intensity, "black"),
            repeat: create_sampler(device, WrapMode::Repeat),
            clamp: create_sampler(device, WrapMode::ClampToEdge),
        }
    }

    fn load(&mut self, device: &Device, queue: &Queue, path: &Path, role: TextureRole) {
        self.textures
            .entry((path.to_path_buf(), role))
            .or_insert_with(|| {
                let image = TextureImage::load(path);
                Texture::upload(device, queue, &image, role, &path.to_string_lossy())
            });
    }

    pub fn get(&self, path: &Path, role: TextureRole) -> Option<&Texture> {
        self.textures.get(&(path.to_path_buf(), role))
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Bind group for a diffuse/specular pair. Diffuse maps are sRGB colour,
    /// specular maps linear intensity. A missing diffuse map reads as white,
    /// a missing specular map as black.
    pub fn material(
        &mut self,
        device: &Device,
        queue: &Queue,
        layout: &BindGroupLayout,
        diffuse: Option<&Path>,
        specular: Option<&Path>,
        label: &str,
    ) -> BindGroup {
        if let Some(path) = diffuse {
            self.load(device, queue, path, TextureRole::Color);
        }
        if let Some(path) = specular {
            self.load(device, queue, path, TextureRole::Intensity);
        }
        let diffuse = diffuse
            .and_then(|p| self.get(p, TextureRole::Color))
            .unwrap_or(&self.white);
        let specular = specular
            .and_then(|p| self.get(p, TextureRole::Intensity))
            .unwrap_or(&self.black);
        let sampler = match diffuse.wrap {
            WrapMode::Repeat => &self.repeat,
            WrapMode::ClampToEdge => &self.clamp,
        };
        device.create_bind_group(&BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureView(&diffuse.view),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::TextureView(&specular.view),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: BindingResource::Sampler(sampler),
                },
            ],
        })
    }
}

struct GpuMesh {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
    material: usize,
}

/// Vertex/index buffers of a model plus one bind group per material.
pub struct GpuModel {
    meshes: Vec<GpuMesh>,
    materials: Vec<BindGroup>,
}

impl GpuModel {
    pub fn from_model(
        device: &Device,
        queue: &Queue,
        cache: &mut TextureCache,
        layout: &BindGroupLayout,
        model: &Model,
        label: &str,
    ) -> Self {
        let mut materials: Vec<BindGroup> = model
            .materials
            .iter()
            .map(|m| {
                cache.material(
                    device,
                    queue,
                    layout,
                    m.diffuse_texture.as_deref(),
                    m.specular_texture.as_deref(),
                    &m.name,
                )
            })
            .collect();
        // untextured fallback for meshes without a usable material
        let fallback = materials.len();
        materials.push(cache.material(device, queue, layout, None, None, label));
        let meshes = model
            .meshes
            .iter()
            .filter(|mesh| !mesh.indices.is_empty())
            .map(|mesh| upload_mesh(device, mesh, mesh.material.unwrap_or(fallback), label))
            .collect();
        Self { meshes, materials }
    }

    /// A single built-in mesh with one material.
    pub fn from_mesh(device: &Device, mesh: &Mesh, material: BindGroup, label: &str) -> Self {
        Self {
            meshes: vec![upload_mesh(device, mesh, 0, label)],
            materials: vec![material],
        }
    }

    pub fn draw(&self, rpass: &mut RenderPass<'_>) {
        for mesh in &self.meshes {
            rpass.set_bind_group(2, &self.materials[mesh.material], &[]);
            rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            rpass.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint32);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn upload_mesh(device: &Device, mesh: &Mesh, material: usize, label: &str) -> GpuMesh {
    let vertex_buffer = device.create_buffer_init(&BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&mesh.vertices),
        usage: BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
        material,
    }
}
