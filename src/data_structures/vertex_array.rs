//! GPU side of a node's geometry: one vertex buffer per attribute slot plus an
//! optional index buffer.

use wgpu::util::DeviceExt;

use crate::data_structures::{
    buffer::{AttributeBuffer, BufferKind},
    layout::VertexBufferLayout,
};

#[derive(Debug)]
pub struct VertexArray {
    label: String,
    slots: Vec<(u32, wgpu::Buffer)>,
    index: Option<(wgpu::Buffer, u32)>,
    vertex_count: u32,
}

impl VertexArray {
    pub fn new(label: &str, vertex_count: u32) -> Self {
        log::debug!("VertexArray {label} created for {vertex_count} vertices");
        Self {
            label: label.to_string(),
            slots: Vec::new(),
            index: None,
            vertex_count,
        }
    }

    /// Uploads `buffer` into its attribute slot. Re-adding a slot replaces it.
    pub fn add_buffer(
        &mut self,
        device: &wgpu::Device,
        buffer: &AttributeBuffer,
        layout: &VertexBufferLayout,
    ) {
        if layout.is_empty() {
            log::warn!(
                "{}: adding a {:?} buffer with an empty layout",
                self.label,
                buffer.kind
            );
        }
        if buffer.kind == BufferKind::Index {
            self.set_index_buffer(device, buffer);
            return;
        }
        let Some(slot) = buffer.slot else {
            log::warn!("{}: {:?} buffer has no slot, skipped", self.label, buffer.kind);
            return;
        };
        let gpu_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} {:?} Buffer", self.label, buffer.kind)),
            contents: buffer.data.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.slots.retain(|(s, _)| *s != slot);
        self.slots.push((slot, gpu_buffer));
        self.slots.sort_by_key(|(s, _)| *s);
    }

    pub fn set_index_buffer(&mut self, device: &wgpu::Device, buffer: &AttributeBuffer) {
        let Some(indices) = buffer.indices_data() else {
            log::error!("{}: index buffer does not hold indices", self.label);
            return;
        };
        let gpu_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", self.label)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.index = Some((gpu_buffer, indices.len() as u32));
    }

    pub fn has_slot(&self, slot: u32) -> bool {
        self.slots.iter().any(|(s, _)| *s == slot)
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        for (slot, buffer) in &self.slots {
            render_pass.set_vertex_buffer(*slot, buffer.slice(..));
        }
        if let Some((buffer, _)) = &self.index {
            render_pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
        }
    }

    /// Binds the position buffer alone to slot 0, for depth-only passes.
    pub fn bind_positions(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        let position_slot = BufferKind::Position.attribute_slot().unwrap_or(0);
        if let Some((_, buffer)) = self.slots.iter().find(|(s, _)| *s == position_slot) {
            render_pass.set_vertex_buffer(0, buffer.slice(..));
        }
        if let Some((buffer, _)) = &self.index {
            render_pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        match &self.index {
            Some((_, count)) => render_pass.draw_indexed(0..*count, 0, 0..1),
            None => render_pass.draw(0..self.vertex_count, 0..1),
        }
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        log::debug!("VertexArray {} destroyed", self.label);
    }
}
