//! Directional shadow mapping.
//!
//! The first directional light renders the scene depth into a square map
//! through an orthographic projection centred on a focus point. The scene
//! shader compares against it with a comparison sampler. With shadows
//! disabled a 1x1 map stays bound and the uniform switches the lookup off.

use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Vector3, ortho};
use wgpu::util::DeviceExt;

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    config::ShadowConfig,
    data_structures::{layout::AttributeLayouts, texture::Texture},
    lights::DirectionalLight,
    pipelines::{depth_state, mk_render_pipeline},
};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowUniform {
    light_view_proj: [[f32; 4]; 4],
    enabled: u32,
    bias: f32,
    _padding: [u32; 2],
}

impl ShadowUniform {
    pub fn disabled() -> Self {
        Self {
            light_view_proj: Matrix4::identity().into(),
            enabled: 0,
            bias: 0.0,
            _padding: [0; 2],
        }
    }

    pub fn new(light_view_proj: Matrix4<f32>, bias: f32) -> Self {
        Self {
            light_view_proj: light_view_proj.into(),
            enabled: 1,
            bias,
            _padding: [0; 2],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled == 1
    }

    pub fn light_view_proj(&self) -> Matrix4<f32> {
        self.light_view_proj.into()
    }
}

/// View-projection of a light travelling along `direction`, looking at
/// `center` from `distance` away and covering `extent` in every direction
/// around it.
pub fn light_view_proj(
    direction: Vector3<f32>,
    center: Point3<f32>,
    extent: f32,
    distance: f32,
) -> Option<Matrix4<f32>> {
    if direction.magnitude2() <= f32::EPSILON {
        return None;
    }
    let direction = direction.normalize();
    let up = if direction.y.abs() > 0.99 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    let eye = center - direction * distance;
    let view = Matrix4::look_at_rh(eye, center, up);
    let proj = ortho(-extent, extent, -extent, extent, 0.1, distance * 2.0);
    Some(OPENGL_TO_WGPU_MATRIX * proj * view)
}

pub struct ShadowResources {
    pub map: Texture,
    pub uniform: ShadowUniform,
    pub buffer: wgpu::Buffer,
    /// Group 0 of the shadow pipeline.
    pub pass_bind_group_layout: wgpu::BindGroupLayout,
    pub pass_bind_group: wgpu::BindGroup,
    /// Group 3 of the scene pipeline.
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
    config: ShadowConfig,
}

impl std::fmt::Debug for ShadowResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowResources")
            .field("uniform", &self.uniform)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ShadowResources {
    pub fn new(device: &wgpu::Device, config: &ShadowConfig) -> Self {
        let resolution = if config.enabled {
            config.resolution.max(1)
        } else {
            1
        };
        let map = Texture::create_shadow_map(device, resolution);
        let uniform = ShadowUniform::disabled();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Shadow Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let pass_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[uniform_entry(wgpu::ShaderStages::VERTEX)],
                label: Some("shadow_pass_bind_group_layout"),
            });
        let pass_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &pass_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("shadow_pass_bind_group"),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                uniform_entry(wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
            label: Some("shadow_bind_group_layout"),
        });

        let bind_group = Self::mk_bind_group(device, &bind_group_layout, &buffer, &map);

        log::info!(
            "shadow map {}x{} ({})",
            resolution,
            resolution,
            if config.enabled { "enabled" } else { "disabled" }
        );

        Self {
            map,
            uniform,
            buffer,
            pass_bind_group_layout,
            pass_bind_group,
            bind_group_layout,
            bind_group,
            config: config.clone(),
        }
    }

    fn mk_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
        map: &Texture,
    ) -> wgpu::BindGroup {
        let fallback;
        let sampler = match &map.sampler {
            Some(sampler) => sampler,
            None => {
                fallback = crate::data_structures::texture::create_comparison_sampler(device);
                &fallback
            }
        };
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("shadow_bind_group"),
        })
    }

    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    /// Recomputes the light matrix from `caster` around `focus` and uploads
    /// it. Returns whether a shadow pass has to run this frame.
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        caster: Option<&DirectionalLight>,
        focus: Point3<f32>,
    ) -> bool {
        let matrix = match caster {
            Some(light) if self.config.enabled => light_view_proj(
                light.direction,
                Point3::new(focus.x, 0.0, focus.z),
                self.config.extent,
                self.config.distance,
            ),
            _ => None,
        };
        self.uniform = match matrix {
            Some(matrix) => ShadowUniform::new(matrix, self.config.bias),
            None => ShadowUniform::disabled(),
        };
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        self.uniform.is_enabled()
    }
}

/// Depth-only pipeline rendering node positions from the light.
pub fn mk_shadow_pipeline(
    device: &wgpu::Device,
    pass_bind_group_layout: &wgpu::BindGroupLayout,
    node_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[pass_bind_group_layout, node_bind_group_layout],
        immediate_size: 0,
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
    };
    let mut depth = depth_state(wgpu::CompareFunction::LessEqual, true);
    depth.bias = wgpu::DepthBiasState {
        constant: 2,
        slope_scale: 2.0,
        clamp: 0.0,
    };
    let attributes = AttributeLayouts::positions_only();
    mk_render_pipeline(
        device,
        "Shadow Pipeline",
        &layout,
        None,
        Some(depth),
        None,
        &attributes.wgpu_layouts(),
        shader,
    )
}
