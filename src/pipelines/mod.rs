//! Render pipelines and the bind group slots they share.
//!
//! The scene pipeline binds camera, lights, node and shadow groups. The
//! shadow pipeline renders positions only from the light, the skybox is a
//! cube drawn last behind everything else.

pub mod light;
pub mod scene;
pub mod shadow;
pub mod skybox;

use crate::data_structures::texture::Texture;

pub const CAMERA_GROUP: u32 = 0;
pub const LIGHT_GROUP: u32 = 1;
pub const NODE_GROUP: u32 = 2;
pub const SHADOW_GROUP: u32 = 3;

/// Groups of the depth-only shadow pipeline.
pub const SHADOW_PASS_GROUP: u32 = 0;
pub const SHADOW_NODE_GROUP: u32 = 1;

pub const SKYBOX_GROUP: u32 = 1;

#[derive(Debug)]
pub struct Pipelines {
    pub scene: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,
    pub skybox: wgpu::RenderPipeline,
}

pub fn depth_state(compare: wgpu::CompareFunction, write: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: Texture::DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Builds a triangle-list pipeline with `vs_main`/`fs_main` entry points.
/// Without a colour format the pipeline has no fragment stage (depth only).
#[allow(clippy::too_many_arguments)]
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    color_format: Option<wgpu::TextureFormat>,
    depth_stencil: Option<wgpu::DepthStencilState>,
    cull_mode: Option<wgpu::Face>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);
    let targets = color_format.map(|format| {
        [Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState {
                alpha: wgpu::BlendComponent::REPLACE,
                color: wgpu::BlendComponent::REPLACE,
            }),
            write_mask: wgpu::ColorWrites::ALL,
        })]
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: targets.as_ref().map(|targets| wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets,
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
