mod capture;
mod model;
mod pipelines;
mod targets;

pub use capture::{padded_bytes_per_row, unpad_rows};
pub use model::{GpuModel, TextureCache};
pub use pipelines::Pipelines;
pub use targets::{choose_sample_count, OffscreenTargets, DEPTH_FORMAT, HDR_FORMAT};

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use image::RgbaImage;
use std::mem::size_of;
use std::sync::Arc;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindingResource, Buffer,
    BufferAddress, BufferBinding, BufferSize, BufferUsages, Color, CommandEncoderDescriptor, Device,
    DeviceDescriptor, Extent3d, Features, FilterMode, Instance, Limits, LoadOp, MemoryHints,
    Operations, PowerPreference, Queue, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, RenderPipeline, RequestAdapterOptions,
    Sampler, SamplerDescriptor, StoreOp, Surface, SurfaceConfiguration, SurfaceError,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor,
};
use winit::window::Window;

use crate::geometry::{floor_quad, grass_quad, screen_quad, Model};
use crate::scene::{DrawKind, DrawUniforms, FrameUniforms, SceneAssets, SceneFrame, DRAW_COUNT};

const SCENE_CLEAR: Color = Color {
    r: 0.05,
    g: 0.05,
    b: 0.05,
    a: 1.0,
};
const SCREEN_CLEAR: Color = Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};
const HEADLESS_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

pub enum RenderOutput {
    Window(Arc<Window>),
    Headless(u32, u32),
}

enum Presentation {
    Surface {
        surface: Surface<'static>,
        config: SurfaceConfiguration,
    },
    Headless {
        texture: wgpu::Texture,
    },
}

/// Outcome of [`Renderer::render`] when nothing fatal happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    /// The surface was lost or timed out; try again next frame.
    Skipped,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct PostUniforms {
    effect: u32,
    exposure: f32,
    _padding: [f32; 2],
}

impl PostUniforms {
    fn new(effect: bool) -> Self {
        Self {
            effect: effect as u32,
            exposure: 1.0,
            _padding: [0.0; 2],
        }
    }
}

/// GPU copies of everything the grove draws.
struct GpuScene {
    firefly: GpuModel,
    bench: GpuModel,
    tree: GpuModel,
    floor: GpuModel,
    grass: GpuModel,
}

impl GpuScene {
    fn load(
        device: &Device,
        queue: &Queue,
        pipelines: &Pipelines,
        assets: &SceneAssets,
    ) -> Result<Self> {
        let layout = &pipelines.material_layout;
        let mut cache = TextureCache::new(device, queue);
        let mut load_model = |path: &std::path::Path, label: &str| -> Result<GpuModel> {
            let model = Model::load_obj(path)?;
            Ok(GpuModel::from_model(device, queue, &mut cache, layout, &model, label))
        };
        let firefly = load_model(&assets.firefly, "firefly")?;
        let bench = load_model(&assets.bench, "bench")?;
        let tree = load_model(&assets.tree, "tree")?;

        let floor_material = cache.material(
            device,
            queue,
            layout,
            Some(assets.floor_texture.as_path()),
            None,
            "floor",
        );
        let floor = GpuModel::from_mesh(device, &floor_quad(), floor_material, "floor");
        let grass_material = cache.material(
            device,
            queue,
            layout,
            Some(assets.grass_texture.as_path()),
            None,
            "grass",
        );
        let grass = GpuModel::from_mesh(device, &grass_quad(), grass_material, "grass");
        log::info!("scene uploaded with {} textures", cache.texture_count());

        Ok(Self {
            firefly,
            bench,
            tree,
            floor,
            grass,
        })
    }

    fn model(&self, kind: DrawKind) -> &GpuModel {
        match kind {
            DrawKind::Firefly => &self.firefly,
            DrawKind::Bench => &self.bench,
            DrawKind::Tree => &self.tree,
            DrawKind::Floor => &self.floor,
            DrawKind::Grass => &self.grass,
        }
    }
}

pub fn align_to(size: BufferAddress, alignment: BufferAddress) -> BufferAddress {
    size.div_ceil(alignment) * alignment
}

pub struct Renderer {
    pub device: Device,
    pub queue: Queue,
    output: Presentation,
    width: u32,
    height: u32,
    pipelines: Pipelines,
    targets: OffscreenTargets,
    frame_buffer: Buffer,
    frame_bind_group: BindGroup,
    draw_buffer: Buffer,
    draw_stride: BufferAddress,
    draw_bind_group: BindGroup,
    post_buffer: Buffer,
    screen_sampler: Sampler,
    screen_bind_group: BindGroup,
    quad_buffer: Buffer,
    scene: GpuScene,
}

impl Renderer {
    pub async fn new(
        output: RenderOutput,
        assets: &SceneAssets,
        requested_samples: u32,
    ) -> Result<Renderer> {
        let (width, height) = match &output {
            RenderOutput::Window(window) => {
                let size = window.inner_size();
                (size.width.max(1), size.height.max(1))
            }
            RenderOutput::Headless(width, height) => ((*width).max(1), (*height).max(1)),
        };
        let instance = Instance::default();
        let surface = match &output {
            RenderOutput::Window(window) => Some(
                instance
                    .create_surface(window.clone())
                    .context("failed to create wgpu surface")?,
            ),
            RenderOutput::Headless(..) => None,
        };
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::default(),
                force_fallback_adapter: false,
                compatible_surface: surface.as_ref(),
            })
            .await
            .context("failed to find an appropriate adapter")?;
        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);
        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("grove device"),
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: MemoryHints::default(),
                },
                None,
            )
            .await
            .context("failed to create device")?;

        let sample_count = choose_sample_count(requested_samples, |n| {
            [HDR_FORMAT, DEPTH_FORMAT].iter().all(|&format| {
                adapter
                    .get_texture_format_features(format)
                    .flags
                    .sample_count_supported(n)
            })
        });
        if sample_count != requested_samples {
            log::warn!("{requested_samples}x MSAA unavailable, using {sample_count}x");
        }

        let (output, format) = match surface {
            Some(surface) => {
                let caps = surface.get_capabilities(&adapter);
                let format = caps
                    .formats
                    .iter()
                    .copied()
                    .find(TextureFormat::is_srgb)
                    .or_else(|| caps.formats.first().copied())
                    .context("surface reports no formats")?;
                let mut config = surface
                    .get_default_config(&adapter, width, height)
                    .context("surface is not supported by the adapter")?;
                config.format = format;
                surface.configure(&device, &config);
                (Presentation::Surface { surface, config }, format)
            }
            None => {
                let texture = create_headless_texture(&device, width, height);
                (Presentation::Headless { texture }, HEADLESS_FORMAT)
            }
        };
        log::debug!("output format {format:?}, {sample_count}x MSAA");

        let pipelines = Pipelines::new(&device, format, sample_count);
        let targets = OffscreenTargets::new(&device, width, height, sample_count);

        let frame_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("frame uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("frame bind group"),
            layout: &pipelines.frame_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let draw_size = size_of::<DrawUniforms>() as BufferAddress;
        let draw_stride = align_to(
            draw_size,
            device.limits().min_uniform_buffer_offset_alignment as BufferAddress,
        );
        let draw_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw uniforms"),
            size: draw_stride * DRAW_COUNT as BufferAddress,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let draw_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("draw bind group"),
            layout: &pipelines.draw_layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: BindingResource::Buffer(BufferBinding {
                    buffer: &draw_buffer,
                    offset: 0,
                    size: BufferSize::new(draw_size),
                }),
            }],
        });

        let post_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("post uniforms"),
            contents: bytemuck::bytes_of(&PostUniforms::new(false)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let screen_sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("screen sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        });
        let screen_bind_group =
            create_screen_bind_group(&device, &pipelines, &targets, &screen_sampler, &post_buffer);
        let quad_buffer = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("screen quad"),
            contents: bytemuck::cast_slice(&screen_quad()),
            usage: BufferUsages::VERTEX,
        });

        let scene = GpuScene::load(&device, &queue, &pipelines, assets)?;

        Ok(Self {
            device,
            queue,
            output,
            width,
            height,
            pipelines,
            targets,
            frame_buffer,
            frame_bind_group,
            draw_buffer,
            draw_stride,
            draw_bind_group,
            post_buffer,
            screen_sampler,
            screen_bind_group,
            quad_buffer,
            scene,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn sample_count(&self) -> u32 {
        self.targets.sample_count
    }

    /// Reconfigures the surface and rebuilds the offscreen targets.
    /// Zero sized requests are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        match &mut self.output {
            Presentation::Surface { surface, config } => {
                config.width = width;
                config.height = height;
                surface.configure(&self.device, config);
            }
            Presentation::Headless { texture } => {
                *texture = create_headless_texture(&self.device, width, height);
            }
        }
        self.targets = OffscreenTargets::new(&self.device, width, height, self.targets.sample_count);
        self.screen_bind_group = create_screen_bind_group(
            &self.device,
            &self.pipelines,
            &self.targets,
            &self.screen_sampler,
            &self.post_buffer,
        );
    }

    /// Draws one frame. Only an out-of-memory surface is reported as an error.
    pub fn render(&mut self, frame: &SceneFrame) -> Result<FrameStatus> {
        match &self.output {
            Presentation::Surface { surface, config } => match surface.get_current_texture() {
                Ok(surface_texture) => {
                    let view = surface_texture
                        .texture
                        .create_view(&TextureViewDescriptor::default());
                    self.encode(frame, &view);
                    surface_texture.present();
                    Ok(FrameStatus::Presented)
                }
                Err(SurfaceError::OutOfMemory) => {
                    anyhow::bail!("surface is out of memory")
                }
                Err(e @ (SurfaceError::Lost | SurfaceError::Outdated)) => {
                    log::warn!("surface {e}, reconfiguring");
                    surface.configure(&self.device, config);
                    Ok(FrameStatus::Skipped)
                }
                Err(e) => {
                    log::warn!("skipping frame: {e}");
                    Ok(FrameStatus::Skipped)
                }
            },
            Presentation::Headless { texture } => {
                let view = texture.create_view(&TextureViewDescriptor::default());
                self.encode(frame, &view);
                Ok(FrameStatus::Presented)
            }
        }
    }

    /// Reads the last headless frame back. Window outputs cannot be captured.
    pub fn capture(&self) -> Result<RgbaImage> {
        match &self.output {
            Presentation::Headless { texture } => {
                capture::read_texture(&self.device, &self.queue, texture, self.width, self.height)
            }
            Presentation::Surface { .. } => anyhow::bail!("only headless renderers can be captured"),
        }
    }

    fn pipeline(&self, kind: DrawKind) -> &RenderPipeline {
        match kind {
            DrawKind::Firefly => &self.pipelines.light,
            DrawKind::Grass => &self.pipelines.grass,
            DrawKind::Bench | DrawKind::Tree | DrawKind::Floor => &self.pipelines.object,
        }
    }

    fn encode(&self, frame: &SceneFrame, output_view: &TextureView) {
        debug_assert!(frame.draws.len() <= DRAW_COUNT);
        self.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame.uniforms));
        for (i, draw) in frame.draws.iter().enumerate().take(DRAW_COUNT) {
            self.queue.write_buffer(
                &self.draw_buffer,
                i as BufferAddress * self.draw_stride,
                bytemuck::bytes_of(&draw.uniforms),
            );
        }
        self.queue.write_buffer(
            &self.post_buffer,
            0,
            bytemuck::bytes_of(&PostUniforms::new(frame.effect)),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let (view, resolve_target) = self.targets.color_attachment();
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: Operations {
                        load: LoadOp::Clear(SCENE_CLEAR),
                        store: if resolve_target.is_some() {
                            StoreOp::Discard
                        } else {
                            StoreOp::Store
                        },
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_bind_group(0, &self.frame_bind_group, &[]);
            for (i, draw) in frame.draws.iter().enumerate().take(DRAW_COUNT) {
                let offset = (i as BufferAddress * self.draw_stride) as u32;
                rpass.set_pipeline(self.pipeline(draw.kind));
                rpass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                self.scene.model(draw.kind).draw(&mut rpass);
            }
        }
        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("screen pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: output_view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(SCREEN_CLEAR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.pipelines.screen);
            rpass.set_bind_group(0, &self.screen_bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad_buffer.slice(..));
            rpass.draw(0..6, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
    }
}

fn create_headless_texture(device: &Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&TextureDescriptor {
        label: Some("headless output"),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: HEADLESS_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn create_screen_bind_group(
    device: &Device,
    pipelines: &Pipelines,
    targets: &OffscreenTargets,
    sampler: &Sampler,
    post_buffer: &Buffer,
) -> BindGroup {
    device.create_bind_group(&BindGroupDescriptor {
        label: Some("screen bind group"),
        layout: &pipelines.screen_layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: BindingResource::TextureView(&targets.resolve_view),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::Sampler(sampler),
            },
            BindGroupEntry {
                binding: 2,
                resource: post_buffer.as_entire_binding(),
            },
        ],
    })
}

/// Loads the grove headless and renders a single frame to an image.
pub async fn render_image(
    assets: &SceneAssets,
    width: u32,
    height: u32,
    samples: u32,
    frame: impl FnOnce(f32) -> SceneFrame,
) -> Result<RgbaImage> {
    let mut renderer = Renderer::new(RenderOutput::Headless(width, height), assets, samples).await?;
    let frame = frame(renderer.aspect_ratio());
    renderer.render(&frame)?;
    renderer.capture()
}
