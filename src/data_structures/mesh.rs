//! Drawable mesh nodes.
//!
//! A [`Mesh`] accumulates attribute buffers and textures through chainable
//! setters, derives its model matrix from its [`Transform`] on every
//! transform setter and becomes drawable after [`Mesh::compile`].
//!
//! Imported models with several parts become one root mesh with the other
//! parts as children. Transform setters copy the new value into every child
//! (the child's field is overwritten, not composed with its own), and
//! texture changes hand the children the same shared textures.

use std::sync::Arc;

use cgmath::{Matrix4, Vector2, Vector3};

use crate::{
    context::InitContext,
    data_structures::{
        buffer::{AttributeBuffer, BufferKind},
        geometry::Geometry,
        material::Material,
        scene_graph::{CompiledNode, SceneNode, warn_if_compiled},
        texture::{Texture, generate_texture_coords},
        transform::{NodeUniform, Transform},
    },
    resources::ImportedMesh,
};

#[derive(Debug)]
pub struct Mesh {
    geometry: Geometry,
    transform: Transform,
    model: Matrix4<f32>,
    material: Material,
    textures: Vec<Arc<Texture>>,
    children: Vec<Mesh>,
    compiled: Option<CompiledNode>,
}

impl Mesh {
    /// A mesh from raw coordinates, three floats per vertex, drawn as a
    /// triangle list.
    pub fn new(coordinates: Vec<f32>) -> Self {
        Self::from_geometry(Geometry::new("mesh", coordinates))
    }

    pub fn from_points(points: &[Vector3<f32>]) -> Self {
        Self::from_geometry(Geometry::from_points("mesh", points))
    }

    fn from_geometry(geometry: Geometry) -> Self {
        let transform = Transform::new();
        Self {
            geometry,
            model: transform.to_matrix(),
            transform,
            material: Material::default(),
            textures: Vec::new(),
            children: Vec::new(),
            compiled: None,
        }
    }

    /// One imported part. Normals and texture coordinates are taken over
    /// when the file had them.
    pub fn from_import(part: ImportedMesh) -> Self {
        let mut mesh = Self::from_geometry(Geometry::new(&part.name, part.positions));
        if !part.tex_coords.is_empty() {
            mesh.set_texture_coords(part.tex_coords);
        }
        if !part.normals.is_empty() {
            mesh.set_normals(part.normals);
        }
        if !part.indices.is_empty() {
            mesh.set_indices(part.indices);
        }
        mesh.material = part.material;
        mesh
    }

    /// The first part becomes the root, the rest its children.
    pub fn from_imported(parts: Vec<ImportedMesh>) -> anyhow::Result<Self> {
        let mut parts = parts.into_iter();
        let Some(first) = parts.next() else {
            anyhow::bail!("the imported model has no meshes");
        };
        let mut mesh = Self::from_import(first);
        mesh.children = parts.map(Self::from_import).collect();
        Ok(mesh)
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.geometry.set_label(label);
        self
    }

    fn warn_if_compiled(&self, what: &str) {
        warn_if_compiled(self.compiled.is_some(), self.geometry.label(), what);
    }

    fn replace_buffer(&mut self, buffer: AttributeBuffer) {
        self.warn_if_compiled("a buffer");
        // replace never conflicts
        let _ = self.geometry.add_buffer(buffer, true);
    }

    /// Adds a buffer. Without `replace` a buffer of an already present kind
    /// is rejected and the existing one kept.
    pub fn add_buffer(&mut self, buffer: AttributeBuffer, replace: bool) -> anyhow::Result<&mut Self> {
        self.warn_if_compiled("a buffer");
        self.geometry.add_buffer(buffer, replace)?;
        Ok(self)
    }

    /// One colour for every vertex.
    pub fn set_color(&mut self, color: Vector3<f32>) -> &mut Self {
        let colors = vec![color; self.geometry.vertex_count()];
        self.replace_buffer(AttributeBuffer::from_vectors(BufferKind::Color, &colors));
        self
    }

    /// Per-vertex colours. A count mismatch is logged and the colours are
    /// set anyway.
    pub fn set_colors(&mut self, colors: &[Vector3<f32>]) -> &mut Self {
        if colors.len() != self.geometry.vertex_count() {
            log::error!(
                "{}: {} colours for {} vertices, setting them anyway",
                self.geometry.label(),
                colors.len(),
                self.geometry.vertex_count()
            );
        }
        self.replace_buffer(AttributeBuffer::from_vectors(BufferKind::Color, colors));
        self
    }

    pub fn set_normals(&mut self, normals: Vec<f32>) -> &mut Self {
        self.replace_buffer(AttributeBuffer::normals(normals));
        self
    }

    pub fn set_normal_vectors(&mut self, normals: &[Vector3<f32>]) -> &mut Self {
        self.replace_buffer(AttributeBuffer::from_vectors(BufferKind::Normal, normals));
        self
    }

    pub fn set_texture_coords(&mut self, tex_coords: Vec<f32>) -> &mut Self {
        self.replace_buffer(AttributeBuffer::tex_coords(tex_coords));
        self
    }

    pub fn set_indices(&mut self, indices: Vec<u32>) -> &mut Self {
        self.warn_if_compiled("the index buffer");
        self.geometry.set_indices(indices);
        self
    }

    pub fn set_material(&mut self, material: Material) -> &mut Self {
        self.material = material;
        self
    }

    /// Appends a texture (first diffuse, second specular). Generates texture
    /// coordinates if none were set and shares the texture list with the
    /// children.
    pub fn add_texture(&mut self, texture: Arc<Texture>) -> &mut Self {
        self.warn_if_compiled("the texture list");
        self.textures.push(texture);
        if !self.geometry.has_buffer(BufferKind::TexCoords) {
            log::info!("{}: generating texture coordinates", self.geometry.label());
            let tex_coords =
                generate_texture_coords(self.geometry.vertex_count(), Vector2::new(1.0, 1.0));
            // checked above, cannot conflict
            let _ = self
                .geometry
                .add_buffer(AttributeBuffer::tex_coords(tex_coords), false);
        }
        let textures = self.textures.clone();
        for child in &mut self.children {
            child.set_textures(textures.clone());
        }
        self
    }

    pub fn set_textures(&mut self, textures: Vec<Arc<Texture>>) -> &mut Self {
        self.warn_if_compiled("the texture list");
        self.textures = textures;
        self
    }

    pub fn set_position(&mut self, position: Vector3<f32>) -> &mut Self {
        self.transform.position = position;
        self.update_model();
        for child in &mut self.children {
            child.set_position(position);
        }
        self
    }

    pub fn set_origin(&mut self, origin: Vector3<f32>) -> &mut Self {
        self.transform.origin = origin;
        self.update_model();
        for child in &mut self.children {
            child.set_origin(origin);
        }
        self
    }

    /// Euler angles in degrees, applied X then Y then Z around the origin.
    pub fn set_rotation(&mut self, rotation: Vector3<f32>) -> &mut Self {
        self.transform.rotation = rotation;
        self.update_model();
        for child in &mut self.children {
            child.set_rotation(rotation);
        }
        self
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) -> &mut Self {
        self.transform.scale = scale;
        self.update_model();
        for child in &mut self.children {
            child.set_scale(scale);
        }
        self
    }

    fn update_model(&mut self) {
        self.model = self.transform.to_matrix();
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.model
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn textures(&self) -> &[Arc<Texture>] {
        &self.textures
    }

    pub fn children(&self) -> &[Mesh] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Mesh] {
        &mut self.children
    }

    pub fn label(&self) -> &str {
        self.geometry.label()
    }

    /// Completes the CPU buffers for upload: synthesizes normals when none
    /// were given and fills the other attributes the pipeline binds.
    /// [`compile`](Self::compile) runs this first.
    pub fn prepare_buffers(&mut self) -> &mut Self {
        self.geometry.fill_defaults();
        for child in &mut self.children {
            child.prepare_buffers();
        }
        self
    }

    /// Uploads the buffers and creates the node's bind group, children
    /// included. A lone diffuse texture is paired with the "no specular"
    /// placeholder.
    pub fn compile(&mut self, ctx: &InitContext) -> &mut Self {
        if self.geometry.coordinates().is_empty() {
            log::error!("{}: coordinates were not set", self.geometry.label());
            return self;
        }
        if self.textures.len() == 1 {
            self.textures.push(ctx.nodes.black.clone());
        }
        self.geometry.fill_defaults();
        self.compiled = Some(CompiledNode::new(
            &ctx.device,
            &ctx.nodes,
            &self.geometry,
            &self.textures,
            self.uniform(),
        ));
        for child in &mut self.children {
            child.compile(ctx);
        }
        self
    }

    fn uniform(&self) -> NodeUniform {
        NodeUniform::new(self.model, &self.material, self.textures.len())
    }
}

impl SceneNode for Mesh {
    fn get_label(&self) -> &str {
        self.label()
    }

    fn get_transform(&self) -> &Transform {
        &self.transform
    }

    fn set_local_transform(&mut self, transform: Transform) {
        self.set_position(transform.position)
            .set_origin(transform.origin)
            .set_rotation(transform.rotation)
            .set_scale(transform.scale);
    }

    fn get_model_matrix(&self) -> Matrix4<f32> {
        self.model
    }

    fn get_children(&self) -> Vec<&dyn SceneNode> {
        self.children.iter().map(|c| c as &dyn SceneNode).collect()
    }

    fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    fn write_to_buffers(&self, queue: &wgpu::Queue) {
        if let Some(compiled) = &self.compiled {
            compiled.write(queue, self.uniform());
        }
        for child in &self.children {
            child.write_to_buffers(queue);
        }
    }

    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        match &self.compiled {
            Some(compiled) => compiled.draw(render_pass),
            None => log::warn!("{}: draw() before compile(), nothing drawn", self.label()),
        }
        for child in &self.children {
            child.draw(render_pass);
        }
    }

    fn draw_depth(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if let Some(compiled) = &self.compiled {
            compiled.draw_depth(render_pass);
        }
        for child in &self.children {
            child.draw_depth(render_pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Vec<f32> {
        vec![
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0,
            0.0,
        ]
    }

    #[test]
    fn set_color_fills_every_vertex() {
        let mut mesh = Mesh::new(quad());
        mesh.set_color(Vector3::new(1.0, 0.0, 0.5));
        let colors = mesh.geometry().buffer(BufferKind::Color).unwrap();
        assert_eq!(colors.len(), 18);
        assert_eq!(&colors.floats().unwrap()[..3], &[1.0, 0.0, 0.5]);
    }

    #[test]
    fn mismatched_colors_are_still_set() {
        let mut mesh = Mesh::new(quad());
        mesh.set_colors(&[Vector3::new(1.0, 0.0, 0.0)]);
        assert_eq!(mesh.geometry().buffer(BufferKind::Color).unwrap().len(), 3);
    }

    #[test]
    fn mismatched_buffers_cover_every_vertex_once_prepared() {
        let mut mesh = Mesh::new(quad());
        mesh.set_colors(&[Vector3::new(1.0, 0.0, 0.0)])
            .set_normals(vec![0.0, 0.0, 1.0]);
        mesh.prepare_buffers();

        let colors = mesh.geometry().buffer(BufferKind::Color).unwrap();
        assert_eq!(colors.len(), 18);
        assert_eq!(&colors.floats().unwrap()[..6], &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let normals = mesh.geometry().buffer(BufferKind::Normal).unwrap();
        assert_eq!(normals.floats().unwrap(), [0.0, 0.0, 1.0].repeat(6).as_slice());
    }

    #[test]
    fn duplicate_buffer_without_replace_is_an_error() {
        let mut mesh = Mesh::new(quad());
        mesh.set_texture_coords(vec![0.5; 12]);
        assert!(
            mesh.add_buffer(AttributeBuffer::tex_coords(vec![0.0; 12]), false)
                .is_err()
        );
        assert_eq!(
            mesh.geometry()
                .buffer(BufferKind::TexCoords)
                .unwrap()
                .floats()
                .unwrap(),
            &[0.5; 12]
        );
    }

    #[test]
    fn setters_recompute_the_model_matrix() {
        let mut mesh = Mesh::new(quad());
        mesh.set_position(Vector3::new(1.0, 2.0, 3.0))
            .set_rotation(Vector3::new(10.0, 20.0, 30.0));
        assert_eq!(mesh.model_matrix(), mesh.transform().to_matrix());
    }

    #[test]
    fn prepare_buffers_synthesizes_flat_normals() {
        let mut mesh = Mesh::new(quad());
        mesh.prepare_buffers();
        let normals = mesh.geometry().buffer(BufferKind::Normal).unwrap();
        assert_eq!(normals.floats().unwrap(), [0.0, 0.0, 1.0].repeat(6).as_slice());
    }

    #[test]
    fn empty_import_is_rejected() {
        assert!(Mesh::from_imported(Vec::new()).is_err());
    }
}
