//! CPU-side vertex attribute buffers tagged with their semantic kind.
//!
//! A drawable node keeps at most one [`AttributeBuffer`] per [`BufferKind`]
//! (see [`Geometry`](crate::data_structures::geometry::Geometry)). The kind
//! decides the shader location the data is bound to and how many floats make
//! up one vertex.

use cgmath::Vector3;

/// Semantic role of a vertex attribute buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Position,
    Normal,
    TexCoords,
    Color,
    Index,
    /// Free-form data. Not bound by the scene pipeline and never de-duplicated.
    Other,
}

impl BufferKind {
    /// Shader location (and vertex buffer slot) used by the scene pipeline.
    pub fn attribute_slot(&self) -> Option<u32> {
        match self {
            BufferKind::Position => Some(0),
            BufferKind::Color => Some(1),
            BufferKind::TexCoords => Some(2),
            BufferKind::Normal => Some(3),
            BufferKind::Index | BufferKind::Other => None,
        }
    }

    /// Number of scalars per vertex.
    pub fn components(&self) -> u32 {
        match self {
            BufferKind::TexCoords => 2,
            BufferKind::Index => 1,
            _ => 3,
        }
    }

    /// Kinds the scene pipeline expects, ordered by slot.
    pub const VERTEX_ATTRIBUTES: [BufferKind; 4] = [
        BufferKind::Position,
        BufferKind::Color,
        BufferKind::TexCoords,
        BufferKind::Normal,
    ];
}

#[derive(Clone, Debug, PartialEq)]
pub enum BufferData {
    Floats(Vec<f32>),
    Indices(Vec<u32>),
}

impl BufferData {
    pub fn len(&self) -> usize {
        match self {
            BufferData::Floats(data) => data.len(),
            BufferData::Indices(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            BufferData::Floats(data) => bytemuck::cast_slice(data),
            BufferData::Indices(data) => bytemuck::cast_slice(data),
        }
    }
}

/// One attribute buffer of a node: kind, payload and shader slot.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeBuffer {
    pub kind: BufferKind,
    pub data: BufferData,
    pub slot: Option<u32>,
}

impl AttributeBuffer {
    pub fn new(kind: BufferKind, data: Vec<f32>) -> Self {
        Self {
            kind,
            data: BufferData::Floats(data),
            slot: kind.attribute_slot(),
        }
    }

    pub fn positions(data: Vec<f32>) -> Self {
        Self::new(BufferKind::Position, data)
    }

    pub fn normals(data: Vec<f32>) -> Self {
        Self::new(BufferKind::Normal, data)
    }

    pub fn tex_coords(data: Vec<f32>) -> Self {
        Self::new(BufferKind::TexCoords, data)
    }

    pub fn colors(data: Vec<f32>) -> Self {
        Self::new(BufferKind::Color, data)
    }

    pub fn indices(data: Vec<u32>) -> Self {
        Self {
            kind: BufferKind::Index,
            data: BufferData::Indices(data),
            slot: None,
        }
    }

    /// Custom data bound to an explicit location by user pipelines.
    pub fn other(data: Vec<f32>, slot: u32) -> Self {
        Self {
            kind: BufferKind::Other,
            data: BufferData::Floats(data),
            slot: Some(slot),
        }
    }

    pub fn from_vectors(kind: BufferKind, data: &[Vector3<f32>]) -> Self {
        Self::new(kind, vec3_to_floats(data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of vertices (or indices) described by the payload.
    pub fn element_count(&self) -> usize {
        self.len() / self.kind.components() as usize
    }

    pub fn floats(&self) -> Option<&[f32]> {
        match &self.data {
            BufferData::Floats(data) => Some(data),
            BufferData::Indices(_) => None,
        }
    }

    pub fn indices_data(&self) -> Option<&[u32]> {
        match &self.data {
            BufferData::Indices(data) => Some(data),
            BufferData::Floats(_) => None,
        }
    }
}

pub fn vec3_to_floats(data: &[Vector3<f32>]) -> Vec<f32> {
    data.iter().flat_map(|v| [v.x, v.y, v.z]).collect()
}

/// Returns an empty vector if the input is not a multiple of three.
pub fn floats_to_vec3(data: &[f32]) -> Vec<Vector3<f32>> {
    if data.len() % 3 != 0 {
        log::error!(
            "Cannot convert {} floats into 3d vectors: not a multiple of 3",
            data.len()
        );
        return Vec::new();
    }
    data.chunks_exact(3)
        .map(|c| Vector3::new(c[0], c[1], c[2]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_match_shader_locations() {
        let slots: Vec<_> = BufferKind::VERTEX_ATTRIBUTES
            .iter()
            .map(|k| k.attribute_slot())
            .collect();
        assert_eq!(slots, vec![Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(BufferKind::Index.attribute_slot(), None);
    }

    #[test]
    fn element_count_uses_kind_width() {
        let tex = AttributeBuffer::tex_coords(vec![0.0; 12]);
        assert_eq!(tex.element_count(), 6);
        let pos = AttributeBuffer::positions(vec![0.0; 12]);
        assert_eq!(pos.element_count(), 4);
        let idx = AttributeBuffer::indices(vec![0, 1, 2]);
        assert_eq!(idx.element_count(), 3);
        assert_eq!(idx.data.as_bytes().len(), 12);
    }

    #[test]
    fn vec3_conversion_rejects_ragged_input() {
        assert!(floats_to_vec3(&[1.0, 2.0]).is_empty());
        let v = floats_to_vec3(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(v, vec![Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0)]);
        assert_eq!(vec3_to_floats(&v), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
