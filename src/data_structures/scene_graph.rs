//! Drawable scene nodes.
//!
//! [`SceneNode`] is the object-safe surface the engine renders through; the
//! chainable setters live on the concrete node types ([`Mesh`], [`Plane`]).
//! [`CompiledNode`] holds the GPU state a node gets from its compile step
//! and [`NodeResources`] the layout and placeholder textures every node
//! binds against.
//!
//! [`Mesh`]: crate::data_structures::mesh::Mesh
//! [`Plane`]: crate::data_structures::plane::Plane

use std::sync::Arc;

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        geometry::Geometry,
        texture::{Texture, create_default_sampler},
        transform::{NodeUniform, Transform},
        vertex_array::VertexArray,
    },
    pipelines::{NODE_GROUP, SHADOW_NODE_GROUP},
};

pub trait SceneNode {
    fn get_label(&self) -> &str;

    fn get_transform(&self) -> &Transform;

    /// Replaces the whole transform. Nodes with children copy it to them.
    fn set_local_transform(&mut self, transform: Transform);

    fn get_model_matrix(&self) -> Matrix4<f32>;

    fn get_children(&self) -> Vec<&dyn SceneNode>;

    fn is_compiled(&self) -> bool;

    /// Uploads the node uniform (and the children's).
    fn write_to_buffers(&self, queue: &wgpu::Queue);

    /// Binds the node group and vertex buffers and draws, children included.
    /// Uncompiled nodes draw nothing.
    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>);

    /// Depth-only draw for the shadow pass.
    fn draw_depth(&self, render_pass: &mut wgpu::RenderPass<'_>);
}

/// Bind group layout of group 2 and the textures bound when a node has none.
#[derive(Clone, Debug)]
pub struct NodeResources {
    pub layout: wgpu::BindGroupLayout,
    /// Bound as diffuse map of untextured nodes.
    pub white: Arc<Texture>,
    /// The "no specular" map.
    pub black: Arc<Texture>,
    pub sampler: wgpu::Sampler,
}

impl NodeResources {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            layout: node_layout(device),
            white: Arc::new(Texture::create_solid(device, queue, [255; 4], "white")),
            black: Arc::new(Texture::create_solid(device, queue, [0, 0, 0, 255], "no_specular")),
            sampler: create_default_sampler(device),
        }
    }
}

pub fn node_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    let sampler = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture(1),
            sampler(2),
            texture(3),
            sampler(4),
        ],
        label: Some("node_bind_group_layout"),
    })
}

/// GPU state of a compiled node.
#[derive(Debug)]
pub struct CompiledNode {
    vertex_array: VertexArray,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl CompiledNode {
    /// Uploads `geometry` and binds the first two `textures` as diffuse and
    /// specular maps, falling back to the placeholders of `resources`.
    pub fn new(
        device: &wgpu::Device,
        resources: &NodeResources,
        geometry: &Geometry,
        textures: &[Arc<Texture>],
        uniform: NodeUniform,
    ) -> Self {
        if textures.len() > 2 {
            log::warn!(
                "{}: {} textures given, only diffuse and specular (the first two) are bound",
                geometry.label(),
                textures.len()
            );
        }
        let vertex_array = geometry.upload(device);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Node Buffer", geometry.label())),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let diffuse = textures.first().unwrap_or(&resources.white);
        let specular = textures.get(1).unwrap_or(&resources.black);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &resources.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(
                        diffuse.sampler.as_ref().unwrap_or(&resources.sampler),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(
                        specular.sampler.as_ref().unwrap_or(&resources.sampler),
                    ),
                },
            ],
            label: Some(&format!("{} Node Bind Group", geometry.label())),
        });
        log::info!(
            "{} compiled: {} vertices, {} textures",
            geometry.label(),
            geometry.vertex_count(),
            textures.len()
        );
        Self {
            vertex_array,
            uniform: uniform_buffer,
            bind_group,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, uniform: NodeUniform) {
        queue.write_buffer(&self.uniform, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_bind_group(NODE_GROUP, &self.bind_group, &[]);
        self.vertex_array.bind(render_pass);
        self.vertex_array.draw(render_pass);
    }

    pub fn draw_depth(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_bind_group(SHADOW_NODE_GROUP, &self.bind_group, &[]);
        self.vertex_array.bind_positions(render_pass);
        self.vertex_array.draw(render_pass);
    }
}

/// Warns when a node's CPU-side data changes after it was compiled. The GPU
/// copy stays as it was until the next compile. Returns whether it warned.
pub(crate) fn warn_if_compiled(compiled: bool, label: &str, what: &str) -> bool {
    if compiled {
        log::warn!("{label}: {what} changed after compile(), call compile() again to upload it");
    }
    compiled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_compiled_nodes_warn() {
        assert!(warn_if_compiled(true, "boat", "a buffer"));
        assert!(!warn_if_compiled(false, "boat", "a buffer"));
    }
}
