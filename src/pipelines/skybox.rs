//! Cube-mapped sky drawn after the scene.
//!
//! The vertex shader writes `w` into `z` so every sky fragment lands on the
//! far plane; with `LessEqual` and depth writes off it only fills pixels no
//! node covered.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{layout::AttributeLayouts, texture::CubeTexture},
    pipelines::{SKYBOX_GROUP, depth_state, mk_render_pipeline},
};

#[rustfmt::skip]
pub const SKYBOX_VERTICES: [f32; 108] = [
    -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,

    -1.0, -1.0,  1.0,  -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,

     1.0, -1.0, -1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,

    -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,   1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,

    -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,

    -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,
];

pub const DEFAULT_INTENSITY: f32 = 0.3;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxUniform {
    intensity: f32,
    _padding: [f32; 3],
}

impl SkyboxUniform {
    pub fn new(intensity: f32) -> Self {
        Self {
            intensity,
            _padding: [0.0; 3],
        }
    }
}

pub struct Skybox {
    cube: CubeTexture,
    intensity: f32,
    uniform: wgpu::Buffer,
    vertices: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl std::fmt::Debug for Skybox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Skybox")
            .field("intensity", &self.intensity)
            .finish_non_exhaustive()
    }
}

impl Skybox {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        cube: CubeTexture,
        intensity: f32,
    ) -> Self {
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SkyboxUniform::new(intensity)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Vertex Buffer"),
            contents: bytemuck::cast_slice(&SKYBOX_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&cube.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&cube.sampler),
                },
            ],
            label: Some("skybox_bind_group"),
        });
        Self {
            cube,
            intensity,
            uniform,
            vertices,
            bind_group,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn cube(&self) -> &CubeTexture {
        &self.cube
    }

    /// Brightness multiplier of the sky colour, clamped to `[0, 1]`.
    pub fn set_intensity(&mut self, queue: &wgpu::Queue, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
        queue.write_buffer(
            &self.uniform,
            0,
            bytemuck::cast_slice(&[SkyboxUniform::new(self.intensity)]),
        );
    }

    /// Expects the skybox pipeline and the camera group to be set.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_bind_group(SKYBOX_GROUP, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertices.slice(..));
        render_pass.draw(0..(SKYBOX_VERTICES.len() / 3) as u32, 0..1);
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::Cube,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("skybox_bind_group_layout"),
    })
}

pub fn mk_skybox_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    skybox_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Skybox Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout, skybox_bind_group_layout],
        immediate_size: 0,
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Skybox Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("skybox.wgsl").into()),
    };
    let attributes = AttributeLayouts::positions_only();
    mk_render_pipeline(
        device,
        "Skybox Pipeline",
        &layout,
        Some(config.format),
        Some(depth_state(wgpu::CompareFunction::LessEqual, false)),
        None,
        &attributes.wgpu_layouts(),
        shader,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_twelve_triangles_on_the_unit_box() {
        assert_eq!(SKYBOX_VERTICES.len() / 9, 12);
        assert!(SKYBOX_VERTICES.iter().all(|c| c.abs() == 1.0));
    }
}
