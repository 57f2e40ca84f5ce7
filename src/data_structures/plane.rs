//! A flat quad node built from four corner points.

use std::sync::Arc;

use cgmath::{Matrix4, Vector2, Vector3};

use crate::{
    context::InitContext,
    data_structures::{
        buffer::{AttributeBuffer, BufferKind},
        geometry::{Geometry, quad_normal},
        material::Material,
        scene_graph::{CompiledNode, SceneNode, warn_if_compiled},
        texture::{Texture, generate_texture_coords},
        transform::{NodeUniform, Transform},
    },
};

pub const PLANE_SHININESS: f32 = 10.0;

/// How generated texture coordinates are scaled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TexCoordScale {
    /// Repeat the texture with the plane's x/z scale (halved), so a texture
    /// keeps its size on the ground when the plane grows.
    FollowScale,
    Fixed(Vector2<f32>),
}

#[derive(Debug)]
pub struct Plane {
    geometry: Geometry,
    transform: Transform,
    model: Matrix4<f32>,
    material: Material,
    textures: Vec<Arc<Texture>>,
    tex_coord_scale: TexCoordScale,
    compiled: Option<CompiledNode>,
}

impl Plane {
    /// Corners in the order `a1, a2, b1, b2` where `a1`/`b2` and `a2`/`b1`
    /// are opposite. The triangles are `a1 a2 b1` and `b1 b2 a1`.
    pub fn new(corners: [Vector3<f32>; 4], scale: Vector3<f32>) -> Self {
        let [a1, a2, b1, b2] = corners;
        let geometry = Geometry::from_points("plane", &[a1, a2, b1, b1, b2, a1]);
        let transform = Transform {
            scale,
            ..Transform::new()
        };
        Self {
            geometry,
            model: transform.to_matrix(),
            transform,
            material: Material {
                name: "plane".to_string(),
                shininess: PLANE_SHININESS,
                ..Material::default()
            },
            textures: Vec::new(),
            tex_coord_scale: TexCoordScale::FollowScale,
            compiled: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.geometry.set_label(label);
        self
    }

    pub fn with_tex_coord_scale(mut self, scale: TexCoordScale) -> Self {
        self.tex_coord_scale = scale;
        self
    }

    fn tex_scale(&self) -> Vector2<f32> {
        match self.tex_coord_scale {
            TexCoordScale::FollowScale => {
                Vector2::new(self.transform.scale.x / 2.0, self.transform.scale.z / 2.0)
            }
            TexCoordScale::Fixed(scale) => scale,
        }
    }

    fn warn_if_compiled(&self, what: &str) {
        warn_if_compiled(self.compiled.is_some(), self.geometry.label(), what);
    }

    fn replace_buffer(&mut self, buffer: AttributeBuffer) {
        self.warn_if_compiled("a buffer");
        let _ = self.geometry.add_buffer(buffer, true);
    }

    pub fn add_buffer(&mut self, buffer: AttributeBuffer, replace: bool) -> anyhow::Result<&mut Self> {
        self.warn_if_compiled("a buffer");
        self.geometry.add_buffer(buffer, replace)?;
        Ok(self)
    }

    pub fn set_color(&mut self, color: Vector3<f32>) -> &mut Self {
        let colors = vec![color; self.geometry.vertex_count()];
        self.replace_buffer(AttributeBuffer::from_vectors(BufferKind::Color, &colors));
        self
    }

    /// Per-vertex colours, six for the two triangles. A count mismatch is
    /// logged and the colours are set anyway.
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

    fn ensure_tex_coords(&mut self) {
        if !self.geometry.has_buffer(BufferKind::TexCoords) {
            let tex_coords = generate_texture_coords(self.geometry.vertex_count(), self.tex_scale());
            let _ = self
                .geometry
                .add_buffer(AttributeBuffer::tex_coords(tex_coords), false);
        }
    }

    /// Appends a texture, generating scaled texture coordinates if none
    /// were set.
    pub fn add_texture(&mut self, texture: Arc<Texture>) -> &mut Self {
        self.warn_if_compiled("the texture list");
        self.textures.push(texture);
        self.ensure_tex_coords();
        self
    }

    /// Replaces the texture list (first diffuse, second specular),
    /// generating scaled texture coordinates if none were set.
    pub fn set_textures(&mut self, textures: Vec<Arc<Texture>>) -> &mut Self {
        self.warn_if_compiled("the texture list");
        self.textures = textures;
        if !self.textures.is_empty() {
            self.ensure_tex_coords();
        }
        self
    }

    pub fn set_position(&mut self, position: Vector3<f32>) -> &mut Self {
        self.transform.position = position;
        self.update_model();
        self
    }

    pub fn set_origin(&mut self, origin: Vector3<f32>) -> &mut Self {
        self.transform.origin = origin;
        self.update_model();
        self
    }

    pub fn set_rotation(&mut self, rotation: Vector3<f32>) -> &mut Self {
        self.transform.rotation = rotation;
        self.update_model();
        self
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) -> &mut Self {
        self.transform.scale = scale;
        self.update_model();
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

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn textures(&self) -> &[Arc<Texture>] {
        &self.textures
    }

    /// Gives all six vertices the normal of the first triangle unless
    /// normals were set explicitly, then fills the remaining attributes.
    pub fn prepare_buffers(&mut self) -> &mut Self {
        if !self.geometry.has_buffer(BufferKind::Normal) {
            let normal = quad_normal(&self.geometry.vertices());
            let normals = vec![normal; self.geometry.vertex_count()];
            let _ = self
                .geometry
                .add_buffer(AttributeBuffer::from_vectors(BufferKind::Normal, &normals), false);
        }
        self.geometry.fill_defaults();
        self
    }

    pub fn compile(&mut self, ctx: &InitContext) -> &mut Self {
        if self.textures.len() == 1 {
            self.textures.push(ctx.nodes.black.clone());
        }
        self.prepare_buffers();
        self.compiled = Some(CompiledNode::new(
            &ctx.device,
            &ctx.nodes,
            &self.geometry,
            &self.textures,
            self.uniform(),
        ));
        self
    }

    fn uniform(&self) -> NodeUniform {
        NodeUniform::new(self.model, &self.material, self.textures.len())
    }
}

impl SceneNode for Plane {
    fn get_label(&self) -> &str {
        self.geometry.label()
    }

    fn get_transform(&self) -> &Transform {
        &self.transform
    }

    fn set_local_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.update_model();
    }

    fn get_model_matrix(&self) -> Matrix4<f32> {
        self.model
    }

    fn get_children(&self) -> Vec<&dyn SceneNode> {
        Vec::new()
    }

    fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    fn write_to_buffers(&self, queue: &wgpu::Queue) {
        if let Some(compiled) = &self.compiled {
            compiled.write(queue, self.uniform());
        }
    }

    fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        match &self.compiled {
            Some(compiled) => compiled.draw(render_pass),
            None => log::warn!("{}: draw() before compile(), nothing drawn", self.get_label()),
        }
    }

    fn draw_depth(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if let Some(compiled) = &self.compiled {
            compiled.draw_depth(render_pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ground() -> Plane {
        Plane::new(
            [
                Vector3::new(0.0, 0.0, 0.0),
                Vector3::new(0.0, 0.0, -1.0),
                Vector3::new(1.0, 0.0, -1.0),
                Vector3::new(1.0, 0.0, 0.0),
            ],
            Vector3::new(10.0, 1.0, 10.0),
        )
    }

    #[test]
    fn corners_become_two_triangles() {
        let plane = ground();
        let vertices = plane.geometry().vertices();
        assert_eq!(vertices.len(), 6);
        assert_eq!(vertices[2], vertices[3]);
        assert_eq!(vertices[0], vertices[5]);
    }

    #[test]
    fn synthesized_normal_points_up_on_every_vertex() {
        let mut plane = ground();
        plane.prepare_buffers();
        let normals = plane.geometry().buffer(BufferKind::Normal).unwrap();
        for n in normals.floats().unwrap().chunks(3) {
            assert_relative_eq!(n[0], 0.0);
            assert_relative_eq!(n[1], 1.0);
            assert_relative_eq!(n[2], 0.0);
        }
    }

    #[test]
    fn explicit_normals_survive_prepare() {
        let mut plane = ground();
        plane.set_normals([0.0, -1.0, 0.0].repeat(6));
        plane.prepare_buffers();
        let normals = plane.geometry().buffer(BufferKind::Normal).unwrap();
        assert_eq!(&normals.floats().unwrap()[..3], &[0.0, -1.0, 0.0]);
    }

    #[test]
    fn texture_scale_follows_plane_scale() {
        let plane = ground();
        assert_eq!(plane.tex_scale(), Vector2::new(5.0, 5.0));
        let fixed = ground().with_tex_coord_scale(TexCoordScale::Fixed(Vector2::new(2.0, 3.0)));
        assert_eq!(fixed.tex_scale(), Vector2::new(2.0, 3.0));
    }

    #[test]
    fn default_material_is_dull() {
        assert_eq!(ground().material().shininess, PLANE_SHININESS);
    }

    #[test]
    fn set_colors_is_fitted_to_the_six_vertices() {
        let mut plane = ground();
        plane.set_colors(&[Vector3::new(0.0, 0.5, 0.0)]);
        assert_eq!(plane.geometry().buffer(BufferKind::Color).unwrap().len(), 3);
        plane.prepare_buffers();
        let colors = plane.geometry().buffer(BufferKind::Color).unwrap();
        assert_eq!(colors.len(), 18);
        assert_eq!(&colors.floats().unwrap()[..6], &[0.0, 0.5, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn set_colors_keeps_one_colour_per_vertex() {
        let mut plane = ground();
        let colors: Vec<_> = (0..6).map(|i| Vector3::new(i as f32, 0.0, 0.0)).collect();
        plane.set_colors(&colors);
        let buffer = plane.geometry().buffer(BufferKind::Color).unwrap();
        assert_eq!(buffer.element_count(), 6);
        assert_eq!(buffer.floats().unwrap()[15], 5.0);
    }

    #[test]
    fn texture_coords_are_generated_with_the_plane_scale() {
        let mut plane = ground();
        plane.set_textures(Vec::new());
        assert!(!plane.geometry().has_buffer(BufferKind::TexCoords));

        let expected = generate_texture_coords(6, Vector2::new(5.0, 5.0));
        plane.ensure_tex_coords();
        let tex_coords = plane.geometry().buffer(BufferKind::TexCoords).unwrap();
        assert_eq!(tex_coords.floats().unwrap(), expected.as_slice());
    }

    #[test]
    fn explicit_tex_coords_are_not_regenerated() {
        let mut plane = ground();
        plane.set_texture_coords(vec![0.25; 12]);
        plane.ensure_tex_coords();
        let tex_coords = plane.geometry().buffer(BufferKind::TexCoords).unwrap();
        assert_eq!(tex_coords.floats().unwrap(), &[0.25; 12]);
    }

    #[test]
    fn set_indices_replaces_the_index_buffer() {
        let mut plane = ground();
        plane.set_indices(vec![0, 1, 2]).set_indices(vec![3, 4, 5, 0, 1, 2]);
        assert_eq!(plane.geometry().indices(), Some(&[3, 4, 5, 0, 1, 2][..]));
    }
}
