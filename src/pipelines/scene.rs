use crate::{
    data_structures::layout::AttributeLayouts,
    pipelines::{depth_state, mk_render_pipeline},
};

/// The lit pipeline every node is drawn with. Culling is off so planes and
/// open models are visible from both sides.
pub fn mk_scene_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
    node_bind_group_layout: &wgpu::BindGroupLayout,
    shadow_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Scene Pipeline Layout"),
        bind_group_layouts: &[
            camera_bind_group_layout,
            light_bind_group_layout,
            node_bind_group_layout,
            shadow_bind_group_layout,
        ],
        immediate_size: 0,
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Scene Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
    };

    let attributes = AttributeLayouts::scene();
    mk_render_pipeline(
        device,
        "Scene Pipeline",
        &render_pipeline_layout,
        Some(config.format),
        Some(depth_state(wgpu::CompareFunction::Less, true)),
        None,
        &attributes.wgpu_layouts(),
        shader,
    )
}
