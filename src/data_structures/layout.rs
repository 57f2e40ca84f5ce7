//! Vertex buffer layout descriptors.
//!
//! A [`VertexBufferLayout`] lists the elements one vertex of a buffer is made
//! of and converts them into the `wgpu` attribute descriptions a pipeline
//! needs. Each attribute buffer of a node gets its own layout and slot.

use crate::data_structures::buffer::BufferKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementType {
    Float,
    UnsignedInt,
    UnsignedByte,
}

impl ElementType {
    pub fn size(&self) -> u32 {
        match self {
            ElementType::Float | ElementType::UnsignedInt => 4,
            ElementType::UnsignedByte => 1,
        }
    }
}

/// Scalar types that can be pushed onto a layout.
pub trait VertexElementType {
    const ELEMENT: ElementType;
}

impl VertexElementType for f32 {
    const ELEMENT: ElementType = ElementType::Float;
}

impl VertexElementType for u32 {
    const ELEMENT: ElementType = ElementType::UnsignedInt;
}

impl VertexElementType for u8 {
    const ELEMENT: ElementType = ElementType::UnsignedByte;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBufferElement {
    pub ty: ElementType,
    pub count: u32,
    pub normalized: bool,
}

impl VertexBufferElement {
    pub fn size(&self) -> u32 {
        self.count * self.ty.size()
    }

    /// The matching `wgpu` format, if the combination exists.
    pub fn format(&self) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;
        match (self.ty, self.count, self.normalized) {
            (ElementType::Float, 1, _) => Some(F::Float32),
            (ElementType::Float, 2, _) => Some(F::Float32x2),
            (ElementType::Float, 3, _) => Some(F::Float32x3),
            (ElementType::Float, 4, _) => Some(F::Float32x4),
            (ElementType::UnsignedInt, 1, _) => Some(F::Uint32),
            (ElementType::UnsignedInt, 2, _) => Some(F::Uint32x2),
            (ElementType::UnsignedInt, 3, _) => Some(F::Uint32x3),
            (ElementType::UnsignedInt, 4, _) => Some(F::Uint32x4),
            (ElementType::UnsignedByte, 2, false) => Some(F::Uint8x2),
            (ElementType::UnsignedByte, 4, false) => Some(F::Uint8x4),
            (ElementType::UnsignedByte, 2, true) => Some(F::Unorm8x2),
            (ElementType::UnsignedByte, 4, true) => Some(F::Unorm8x4),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBufferLayout {
    elements: Vec<VertexBufferElement>,
    stride: u32,
}

impl VertexBufferLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: VertexElementType>(&mut self, count: u32) -> &mut Self {
        self.push_element(VertexBufferElement {
            ty: T::ELEMENT,
            count,
            normalized: false,
        })
    }

    pub fn push_element(&mut self, element: VertexBufferElement) -> &mut Self {
        self.stride += element.size();
        self.elements.push(element);
        self
    }

    pub fn elements(&self) -> &[VertexBufferElement] {
        &self.elements
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The layout the scene pipeline uses for a buffer of `kind`.
    pub fn for_kind(kind: BufferKind) -> Self {
        let mut layout = Self::new();
        match kind {
            BufferKind::Index => layout.push::<u32>(1),
            other => layout.push::<f32>(other.components()),
        };
        layout
    }

    /// Attribute descriptions with running offsets. Consecutive elements get
    /// consecutive shader locations starting at `first_location`.
    /// Elements without a `wgpu` format are skipped.
    pub fn attributes(&self, first_location: u32) -> Vec<wgpu::VertexAttribute> {
        let mut offset = 0u64;
        let mut attributes = Vec::with_capacity(self.elements.len());
        for (i, element) in self.elements.iter().enumerate() {
            match element.format() {
                Some(format) => attributes.push(wgpu::VertexAttribute {
                    format,
                    offset,
                    shader_location: first_location + i as u32,
                }),
                None => log::warn!(
                    "No vertex format for {} x {:?}; attribute at location {} skipped",
                    element.count,
                    element.ty,
                    first_location + i as u32
                ),
            }
            offset += element.size() as u64;
        }
        attributes
    }
}

/// The per-slot layouts of the scene pipeline: one non-interleaved buffer per
/// [`BufferKind::VERTEX_ATTRIBUTES`] entry.
#[derive(Debug)]
pub struct AttributeLayouts {
    slots: Vec<(VertexBufferLayout, Vec<wgpu::VertexAttribute>)>,
}

impl AttributeLayouts {
    pub fn new(kinds: &[BufferKind]) -> Self {
        let slots = kinds
            .iter()
            .filter_map(|kind| {
                let location = kind.attribute_slot()?;
                let layout = VertexBufferLayout::for_kind(*kind);
                let attributes = layout.attributes(location);
                Some((layout, attributes))
            })
            .collect();
        Self { slots }
    }

    pub fn scene() -> Self {
        Self::new(&BufferKind::VERTEX_ATTRIBUTES)
    }

    pub fn positions_only() -> Self {
        Self::new(&[BufferKind::Position])
    }

    pub fn wgpu_layouts(&self) -> Vec<wgpu::VertexBufferLayout<'_>> {
        self.slots
            .iter()
            .map(|(layout, attributes)| wgpu::VertexBufferLayout {
                array_stride: layout.stride() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_accumulates_over_pushes() {
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(3).push::<u32>(1).push::<u8>(4);
        assert_eq!(layout.stride(), 12 + 4 + 4);
        assert_eq!(layout.elements().len(), 3);
    }

    #[test]
    fn attributes_have_running_offsets() {
        let mut layout = VertexBufferLayout::new();
        layout.push::<f32>(3).push::<f32>(2);
        let attributes = layout.attributes(4);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].offset, 0);
        assert_eq!(attributes[0].shader_location, 4);
        assert_eq!(attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(attributes[1].offset, 12);
        assert_eq!(attributes[1].shader_location, 5);
        assert_eq!(attributes[1].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn unsupported_elements_are_skipped_but_keep_offsets() {
        let mut layout = VertexBufferLayout::new();
        layout.push::<u8>(3).push::<f32>(1);
        let attributes = layout.attributes(0);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].offset, 3);
    }

    #[test]
    fn scene_layouts_follow_kind_slots() {
        let layouts = AttributeLayouts::scene();
        let wgpu_layouts = layouts.wgpu_layouts();
        assert_eq!(wgpu_layouts.len(), 4);
        let strides: Vec<_> = wgpu_layouts.iter().map(|l| l.array_stride).collect();
        assert_eq!(strides, vec![12, 12, 8, 12]);
        let locations: Vec<_> = wgpu_layouts
            .iter()
            .map(|l| l.attributes[0].shader_location)
            .collect();
        assert_eq!(locations, vec![0, 1, 2, 3]);
    }
}
