use std::borrow::Cow;
use std::mem::size_of;
use wgpu::{
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BlendState,
    BufferBindingType, BufferSize, ColorTargetState, ColorWrites, CompareFunction,
    DepthStencilState, Device, FragmentState, MultisampleState, PipelineCompilationOptions,
    PipelineLayoutDescriptor, PrimitiveState, RenderPipeline, RenderPipelineDescriptor,
    SamplerBindingType, ShaderModuleDescriptor, ShaderSource, ShaderStages, TextureFormat,
    TextureSampleType, TextureViewDimension, VertexBufferLayout, VertexState,
};

use crate::geometry::{ScreenVertex, Vertex};
use crate::renderer::targets::{DEPTH_FORMAT, HDR_FORMAT};
use crate::scene::{DrawUniforms, FrameUniforms};

const OBJECT_SHADER: &str = concat!(
    include_str!("../shaders/common.wgsl"),
    include_str!("../shaders/object.wgsl")
);
const LIGHT_SHADER: &str = concat!(
    include_str!("../shaders/common.wgsl"),
    include_str!("../shaders/light.wgsl")
);
const GRASS_SHADER: &str = concat!(
    include_str!("../shaders/common.wgsl"),
    include_str!("../shaders/grass.wgsl")
);
const SCREEN_SHADER: &str = include_str!("../shaders/screen.wgsl");

/// Size of the post-process uniform block.
pub const POST_UNIFORM_SIZE: u64 = 16;

fn uniform_entry(binding: u32, size: usize, dynamic: bool) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::VERTEX_FRAGMENT,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: BufferSize::new(size as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Texture {
            sample_type: TextureSampleType::Float { filterable: true },
            view_dimension: TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::FRAGMENT,
        ty: BindingType::Sampler(SamplerBindingType::Filtering),
        count: None,
    }
}

/// Bind group layouts and the four render pipelines of a frame.
pub struct Pipelines {
    pub frame_layout: BindGroupLayout,
    pub draw_layout: BindGroupLayout,
    pub material_layout: BindGroupLayout,
    pub screen_layout: BindGroupLayout,
    pub object: RenderPipeline,
    pub light: RenderPipeline,
    pub grass: RenderPipeline,
    pub screen: RenderPipeline,
}

impl Pipelines {
    pub fn new(device: &Device, output_format: TextureFormat, sample_count: u32) -> Self {
        let frame_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("frame layout"),
            entries: &[uniform_entry(0, size_of::<FrameUniforms>(), false)],
        });
        let draw_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("draw layout"),
            entries: &[uniform_entry(0, size_of::<DrawUniforms>(), true)],
        });
        let material_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("material layout"),
            entries: &[texture_entry(0), texture_entry(1), sampler_entry(2)],
        });
        let screen_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("screen layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2, POST_UNIFORM_SIZE as usize, false),
            ],
        });

        let scene_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("scene pipeline layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let screen_pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("screen pipeline layout"),
            bind_group_layouts: &[&screen_layout],
            push_constant_ranges: &[],
        });

        let scene_pipeline = |label: &str, source: &str, blend: Option<BlendState>| {
            create_pipeline(
                device,
                label,
                source,
                &scene_layout,
                Vertex::desc(),
                ColorTargetState {
                    format: HDR_FORMAT,
                    blend,
                    write_mask: ColorWrites::ALL,
                },
                Some(DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: CompareFunction::Less,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                sample_count,
            )
        };
        let object = scene_pipeline("object pipeline", OBJECT_SHADER, None);
        let light = scene_pipeline("light pipeline", LIGHT_SHADER, None);
        let grass = scene_pipeline(
            "grass pipeline",
            GRASS_SHADER,
            Some(BlendState::ALPHA_BLENDING),
        );
        let screen = create_pipeline(
            device,
            "screen pipeline",
            SCREEN_SHADER,
            &screen_pipeline_layout,
            ScreenVertex::desc(),
            output_format.into(),
            None,
            1,
        );

        Self {
            frame_layout,
            draw_layout,
            material_layout,
            screen_layout,
            object,
            light,
            grass,
            screen,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn create_pipeline(
    device: &Device,
    label: &str,
    source: &str,
    layout: &wgpu::PipelineLayout,
    vertex_layout: VertexBufferLayout<'static>,
    target: ColorTargetState,
    depth_stencil: Option<DepthStencilState>,
    sample_count: u32,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(label),
        source: ShaderSource::Wgsl(Cow::Borrowed(source)),
    });
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module: &shader,
            entry_point: "vs_main",
            compilation_options: PipelineCompilationOptions::default(),
            buffers: &[vertex_layout],
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: "fs_main",
            compilation_options: PipelineCompilationOptions::default(),
            targets: &[Some(target)],
        }),
        // no face culling, the grass billboards and floor are single sided quads
        primitive: PrimitiveState::default(),
        depth_stencil,
        multisample: MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        multiview: None,
        cache: None,
    })
}
