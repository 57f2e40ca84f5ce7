//! The attribute buffers of a drawable node.
//!
//! [`Geometry`] enforces the one-buffer-per-kind rule, synthesizes missing
//! attributes before upload and turns the CPU buffers into a
//! [`VertexArray`].

use anyhow::bail;
use cgmath::{InnerSpace, Vector3};

use crate::data_structures::{
    buffer::{AttributeBuffer, BufferData, BufferKind, floats_to_vec3, vec3_to_floats},
    layout::VertexBufferLayout,
    vertex_array::VertexArray,
};

const FALLBACK_NORMAL: Vector3<f32> = Vector3 {
    x: 0.0,
    y: 1.0,
    z: 0.0,
};

#[derive(Clone, Debug)]
pub struct Geometry {
    label: String,
    buffers: Vec<AttributeBuffer>,
}

impl Geometry {
    /// Geometry holding `coordinates` (x, y, z per vertex) as its position buffer.
    pub fn new(label: &str, coordinates: Vec<f32>) -> Self {
        if coordinates.len() % 3 != 0 {
            log::error!(
                "{label}: {} coordinates is not a multiple of 3, the tail is ignored",
                coordinates.len()
            );
        }
        Self {
            label: label.to_string(),
            buffers: vec![AttributeBuffer::positions(coordinates)],
        }
    }

    pub fn from_points(label: &str, points: &[Vector3<f32>]) -> Self {
        Self::new(label, vec3_to_floats(points))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn coordinates(&self) -> &[f32] {
        self.buffer(BufferKind::Position)
            .and_then(AttributeBuffer::floats)
            .unwrap_or(&[])
    }

    pub fn vertices(&self) -> Vec<Vector3<f32>> {
        let coordinates = self.coordinates();
        floats_to_vec3(&coordinates[..coordinates.len() - coordinates.len() % 3])
    }

    pub fn vertex_count(&self) -> usize {
        self.coordinates().len() / 3
    }

    pub fn buffers(&self) -> &[AttributeBuffer] {
        &self.buffers
    }

    pub fn has_buffer(&self, kind: BufferKind) -> bool {
        self.buffers.iter().any(|b| b.kind == kind)
    }

    pub fn buffer(&self, kind: BufferKind) -> Option<&AttributeBuffer> {
        self.buffers.iter().find(|b| b.kind == kind)
    }

    /// Adds `buffer`, replacing an existing buffer of the same kind only when
    /// `replace` is set. A conflicting add is logged, returned as an error and
    /// leaves the geometry unchanged. [`BufferKind::Other`] buffers always
    /// append.
    pub fn add_buffer(&mut self, buffer: AttributeBuffer, replace: bool) -> anyhow::Result<()> {
        if buffer.kind == BufferKind::Other {
            self.buffers.push(buffer);
            return Ok(());
        }
        match self.buffers.iter_mut().find(|b| b.kind == buffer.kind) {
            Some(existing) if replace => *existing = buffer,
            Some(existing) => {
                log::error!(
                    "{}: can't add {:?} buffer, a buffer of that kind is already defined",
                    self.label,
                    existing.kind
                );
                bail!("{:?} buffer already defined for {}", existing.kind, self.label);
            }
            None => self.buffers.push(buffer),
        }
        Ok(())
    }

    pub fn set_indices(&mut self, indices: Vec<u32>) {
        let vertex_count = self.vertex_count() as u32;
        if let Some(bad) = indices.iter().find(|&&i| i >= vertex_count) {
            log::warn!(
                "{}: index {} is out of range for {} vertices",
                self.label,
                bad,
                vertex_count
            );
        }
        // replacing is always fine for indices
        let _ = self.add_buffer(AttributeBuffer::indices(indices), true);
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.buffer(BufferKind::Index)
            .and_then(AttributeBuffer::indices_data)
    }

    /// Normals for the current vertices: flat per consecutive triple, or
    /// smoothed over the index triangles when an index buffer is present.
    pub fn synthesize_normals(&self) -> Vec<Vector3<f32>> {
        let vertices = self.vertices();
        match self.indices() {
            Some(indices) => smooth_normals(&vertices, indices),
            None => flat_normals(&vertices),
        }
    }

    /// Adds the attributes the scene pipeline binds but the node never set:
    /// normals (synthesized), white vertex colours and zero texture coordinates.
    /// Buffers whose length does not match the vertex count are then fitted,
    /// see [`fit_to_vertex_count`](Self::fit_to_vertex_count).
    pub fn fill_defaults(&mut self) {
        let count = self.vertex_count();
        if !self.has_buffer(BufferKind::Normal) {
            log::debug!("{}: synthesizing normals", self.label);
            let normals = self.synthesize_normals();
            self.buffers
                .push(AttributeBuffer::from_vectors(BufferKind::Normal, &normals));
        }
        if !self.has_buffer(BufferKind::Color) {
            self.buffers.push(AttributeBuffer::colors(vec![1.0; count * 3]));
        }
        if !self.has_buffer(BufferKind::TexCoords) {
            self.buffers
                .push(AttributeBuffer::tex_coords(vec![0.0; count * 2]));
        }
        self.fit_to_vertex_count();
    }

    /// Pads or truncates every slot-bound buffer to one element per vertex,
    /// so a draw never reads past the end of a vertex buffer. Missing
    /// normals are synthesized, missing colours are white and missing
    /// texture coordinates zero.
    pub fn fit_to_vertex_count(&mut self) {
        let count = self.vertex_count();
        let synthesized = match self.buffer(BufferKind::Normal) {
            Some(normals) if normals.len() < count * 3 => {
                Some(vec3_to_floats(&self.synthesize_normals()))
            }
            _ => None,
        };
        for buffer in &mut self.buffers {
            let expected = match buffer.kind {
                BufferKind::Index | BufferKind::Other => continue,
                kind => count * kind.components() as usize,
            };
            let BufferData::Floats(data) = &mut buffer.data else {
                continue;
            };
            if data.len() == expected {
                continue;
            }
            log::error!(
                "{}: {:?} buffer holds {} values, {} vertices need {}, fitting it",
                self.label,
                buffer.kind,
                data.len(),
                count,
                expected
            );
            if data.len() > expected {
                data.truncate(expected);
                continue;
            }
            match (buffer.kind, &synthesized) {
                (BufferKind::Normal, Some(normals)) => {
                    let start = data.len();
                    data.extend_from_slice(&normals[start..expected.min(normals.len())]);
                }
                (BufferKind::Color, _) => data.resize(expected, 1.0),
                _ => {}
            }
            data.resize(expected, 0.0);
        }
    }

    /// Uploads every bindable buffer. `Other` buffers stay on the CPU.
    pub fn upload(&self, device: &wgpu::Device) -> VertexArray {
        let mut vertex_array = VertexArray::new(&self.label, self.vertex_count() as u32);
        for buffer in &self.buffers {
            match buffer.kind {
                BufferKind::Other => {
                    log::debug!("{}: Other buffer is not bound by the scene pipeline", self.label)
                }
                kind => vertex_array.add_buffer(device, buffer, &VertexBufferLayout::for_kind(kind)),
            }
        }
        vertex_array
    }
}

fn triangle_normal(a: Vector3<f32>, b: Vector3<f32>, c: Vector3<f32>) -> Option<Vector3<f32>> {
    let cross = (b - a).cross(c - a);
    if cross.magnitude2() <= f32::EPSILON * f32::EPSILON {
        None
    } else {
        Some(cross.normalize())
    }
}

/// One normal per vertex; the three vertices of each consecutive triple
/// share the normal of their triangle. Trailing vertices reuse the last one.
pub fn flat_normals(vertices: &[Vector3<f32>]) -> Vec<Vector3<f32>> {
    let mut normals = Vec::with_capacity(vertices.len());
    let mut last = FALLBACK_NORMAL;
    let mut degenerate = 0;
    for triangle in vertices.chunks_exact(3) {
        last = triangle_normal(triangle[0], triangle[1], triangle[2]).unwrap_or_else(|| {
            degenerate += 1;
            FALLBACK_NORMAL
        });
        normals.extend([last; 3]);
    }
    normals.resize(vertices.len(), last);
    if degenerate > 0 {
        log::warn!("{degenerate} degenerate triangles got a fallback normal");
    }
    normals
}

/// Area weighted vertex normals over indexed triangles.
pub fn smooth_normals(vertices: &[Vector3<f32>], indices: &[u32]) -> Vec<Vector3<f32>> {
    let mut sums = vec![Vector3::new(0.0, 0.0, 0.0); vertices.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        if a.max(b).max(c) >= vertices.len() {
            log::warn!("triangle {triangle:?} references a missing vertex, skipped");
            continue;
        }
        let face = (vertices[b] - vertices[a]).cross(vertices[c] - vertices[a]);
        for i in [a, b, c] {
            sums[i] += face;
        }
    }
    sums.into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize()
            } else {
                FALLBACK_NORMAL
            }
        })
        .collect()
}

/// The normal of a quad given as the 6-vertex list `{a1, a2, b1, b1, b2, a1}`:
/// `(v2 - v0) x (v1 - v0)` normalized. For corners `a1 = (0,0,0)`,
/// `a2 = (0,0,-1)`, `b1 = (1,0,-1)` this points up the y axis.
pub fn quad_normal(vertices: &[Vector3<f32>]) -> Vector3<f32> {
    match vertices {
        [v0, v1, v2, ..] => triangle_normal(*v0, *v2, *v1).unwrap_or(FALLBACK_NORMAL),
        _ => FALLBACK_NORMAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> Geometry {
        Geometry::new("tri", vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }

    #[test]
    fn duplicate_kind_is_rejected_and_kept() {
        let mut geometry = triangle();
        geometry
            .add_buffer(AttributeBuffer::colors(vec![1.0; 9]), false)
            .unwrap();
        let result = geometry.add_buffer(AttributeBuffer::colors(vec![0.5; 9]), false);
        assert!(result.is_err());
        assert_eq!(
            geometry.buffer(BufferKind::Color).unwrap().floats().unwrap(),
            &[1.0; 9]
        );
    }

    #[test]
    fn replace_swaps_the_buffer() {
        let mut geometry = triangle();
        geometry
            .add_buffer(AttributeBuffer::colors(vec![1.0; 9]), false)
            .unwrap();
        geometry
            .add_buffer(AttributeBuffer::colors(vec![0.5; 9]), true)
            .unwrap();
        let colors: Vec<_> = geometry
            .buffers()
            .iter()
            .filter(|b| b.kind == BufferKind::Color)
            .collect();
        assert_eq!(colors.len(), 1);
        assert_eq!(colors[0].floats().unwrap(), &[0.5; 9]);
    }

    #[test]
    fn position_is_present_from_construction() {
        let mut geometry = triangle();
        assert!(geometry.has_buffer(BufferKind::Position));
        assert!(
            geometry
                .add_buffer(AttributeBuffer::positions(vec![0.0; 9]), false)
                .is_err()
        );
    }

    #[test]
    fn other_buffers_are_never_deduplicated() {
        let mut geometry = triangle();
        geometry.add_buffer(AttributeBuffer::other(vec![1.0], 7), false).unwrap();
        geometry.add_buffer(AttributeBuffer::other(vec![2.0], 8), false).unwrap();
        assert_eq!(
            geometry
                .buffers()
                .iter()
                .filter(|b| b.kind == BufferKind::Other)
                .count(),
            2
        );
    }

    #[test]
    fn flat_normals_share_the_triangle_normal() {
        let v = |x, y, z| Vector3::new(x, y, z);
        let vertices = [
            v(0.0, 0.0, 0.0),
            v(1.0, 0.0, 0.0),
            v(0.0, 1.0, 0.0),
            v(0.0, 0.0, 0.0),
            v(0.0, 0.0, 1.0),
            v(1.0, 0.0, 0.0),
            v(5.0, 5.0, 5.0),
        ];
        let normals = flat_normals(&vertices);
        assert_eq!(normals.len(), 7);
        for n in &normals[..3] {
            assert_relative_eq!(*n, v(0.0, 0.0, 1.0));
        }
        for n in &normals[3..] {
            assert_relative_eq!(*n, v(0.0, 1.0, 0.0));
        }
    }

    #[test]
    fn degenerate_triangles_fall_back_to_up() {
        let p = Vector3::new(1.0, 1.0, 1.0);
        assert_eq!(flat_normals(&[p, p, p]), vec![FALLBACK_NORMAL; 3]);
    }

    #[test]
    fn indexed_normals_are_smoothed() {
        let v = |x, y, z| Vector3::new(x, y, z);
        // two faces of a tent sharing the ridge (vertices 0 and 1)
        let vertices = [
            v(0.0, 1.0, 0.0),
            v(0.0, 1.0, 1.0),
            v(1.0, 0.0, 0.0),
            v(-1.0, 0.0, 0.0),
        ];
        let indices = [0, 1, 2, 1, 0, 3];
        let normals = smooth_normals(&vertices, &indices);
        assert_relative_eq!(normals[0], v(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(normals[1], v(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(normals[2].magnitude(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn fill_defaults_adds_missing_attributes() {
        let mut geometry = triangle();
        geometry.fill_defaults();
        assert_eq!(geometry.buffer(BufferKind::Normal).unwrap().len(), 9);
        assert_eq!(geometry.buffer(BufferKind::Color).unwrap().len(), 9);
        assert_eq!(geometry.buffer(BufferKind::TexCoords).unwrap().len(), 6);
    }

    #[test]
    fn explicit_normals_survive_fill_defaults() {
        let mut geometry = triangle();
        geometry
            .add_buffer(AttributeBuffer::normals(vec![0.0, 0.0, -1.0].repeat(3)), false)
            .unwrap();
        geometry.fill_defaults();
        assert_eq!(
            geometry.buffer(BufferKind::Normal).unwrap().floats().unwrap()[2],
            -1.0
        );
    }

    #[test]
    fn short_buffers_are_padded_to_the_vertex_count() {
        let mut geometry = triangle();
        geometry
            .add_buffer(AttributeBuffer::colors(vec![0.2, 0.3, 0.4]), false)
            .unwrap();
        geometry
            .add_buffer(AttributeBuffer::normals(vec![0.0, 0.0, -1.0]), false)
            .unwrap();
        geometry.fill_defaults();

        let colors = geometry.buffer(BufferKind::Color).unwrap().floats().unwrap();
        assert_eq!(colors, &[0.2, 0.3, 0.4, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let normals = geometry.buffer(BufferKind::Normal).unwrap().floats().unwrap();
        assert_eq!(&normals[..3], &[0.0, 0.0, -1.0]);
        // the rest comes from the triangle itself
        assert_eq!(&normals[3..], &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn long_buffers_are_truncated() {
        let mut geometry = triangle();
        geometry.add_buffer(AttributeBuffer::tex_coords(vec![0.5; 20]), false).unwrap();
        geometry.add_buffer(AttributeBuffer::other(vec![0.0; 50], 7), false).unwrap();
        geometry.fill_defaults();
        assert_eq!(geometry.buffer(BufferKind::TexCoords).unwrap().len(), 6);
        assert_eq!(geometry.buffer(BufferKind::Other).unwrap().len(), 50);
        for kind in BufferKind::VERTEX_ATTRIBUTES {
            let buffer = geometry.buffer(kind).unwrap();
            assert_eq!(buffer.element_count(), geometry.vertex_count());
        }
    }
}
