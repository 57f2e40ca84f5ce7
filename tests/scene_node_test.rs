use approx::assert_relative_eq;
use cgmath::{Deg, InnerSpace, Matrix4, Vector3};
use scene_ngin::data_structures::{
    buffer::{AttributeBuffer, BufferKind},
    mesh::Mesh,
    plane::Plane,
    scene_graph::SceneNode,
};

use crate::common::{canonical_plane_corners, quad, three_part_model};

mod common;

fn expected_model(
    position: Vector3<f32>,
    origin: Vector3<f32>,
    rotation: Vector3<f32>,
    scale: Vector3<f32>,
) -> Matrix4<f32> {
    Matrix4::from_translation(origin)
        * Matrix4::from_angle_x(Deg(rotation.x))
        * Matrix4::from_angle_y(Deg(rotation.y))
        * Matrix4::from_angle_z(Deg(rotation.z))
        * Matrix4::from_translation(position - origin)
        * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
}

#[test]
fn model_matrix_follows_every_setter() {
    let mut mesh = Mesh::new(quad());
    let position = Vector3::new(20.0, -1.5, 0.0);
    let origin = Vector3::new(20.0, -1.5, 0.0);
    let rotation = Vector3::new(10.0, 90.0, 0.0);
    let scale = Vector3::new(0.3, 0.3, 0.3);

    mesh.set_scale(scale);
    assert_relative_eq!(
        mesh.model_matrix(),
        Matrix4::from_nonuniform_scale(0.3, 0.3, 0.3),
        epsilon = 1e-6
    );

    mesh.set_position(position).set_origin(origin).set_rotation(rotation);
    assert_relative_eq!(
        mesh.model_matrix(),
        expected_model(position, origin, rotation, scale),
        epsilon = 1e-5
    );

    // setter order does not matter, only the final values
    let mut other = Mesh::new(quad());
    other
        .set_rotation(rotation)
        .set_origin(origin)
        .set_scale(scale)
        .set_position(position);
    assert_relative_eq!(other.model_matrix(), mesh.model_matrix(), epsilon = 1e-5);
}

#[test]
fn rotation_turns_around_the_origin() {
    let mut mesh = Mesh::new(quad());
    mesh.set_position(Vector3::new(5.0, 0.0, 0.0))
        .set_origin(Vector3::new(5.0, 0.0, 0.0))
        .set_rotation(Vector3::new(0.0, 90.0, 0.0));
    // the pivot stays where it is
    let pivot = mesh.model_matrix() * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert_relative_eq!(pivot.truncate(), Vector3::new(5.0, 0.0, 0.0), epsilon = 1e-5);
}

#[test]
fn transform_setters_reach_every_child() {
    let mut model = three_part_model();
    assert_eq!(model.children().len(), 2);

    model
        .set_position(Vector3::new(0.0, -1.3, 0.0))
        .set_origin(Vector3::new(0.0, -1.3, 0.0))
        .set_rotation(Vector3::new(0.0, 70.0, 0.0))
        .set_scale(Vector3::new(0.3, 0.3, 0.3));

    for child in model.children() {
        assert_eq!(child.transform(), model.transform());
        assert_relative_eq!(child.model_matrix(), model.model_matrix(), epsilon = 1e-6);
    }
}

#[test]
fn children_keep_their_own_values_until_the_parent_overwrites_them() {
    let mut model = three_part_model();
    model.children_mut()[0].set_position(Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(model.transform().position, Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(
        model.children()[0].transform().position,
        Vector3::new(1.0, 2.0, 3.0)
    );

    model.set_position(Vector3::new(-4.0, 0.0, 0.0));
    assert_eq!(
        model.children()[0].transform().position,
        Vector3::new(-4.0, 0.0, 0.0)
    );
}

#[test]
fn scene_node_surface_sees_the_children() {
    let model = three_part_model();
    let node: &dyn SceneNode = &model;
    let labels: Vec<_> = node
        .get_children()
        .iter()
        .map(|c| c.get_label().to_string())
        .collect();
    assert_eq!(labels, ["mast", "sail"]);
    assert!(!node.is_compiled());
}

#[test]
fn duplicate_buffer_kind_is_rejected() {
    let mut mesh = Mesh::new(quad());
    mesh.add_buffer(AttributeBuffer::colors(vec![1.0; 18]), false)
        .unwrap();

    let result = mesh.add_buffer(AttributeBuffer::colors(vec![0.5; 18]), false);
    assert!(result.is_err());
    let colors = mesh.geometry().buffer(BufferKind::Color).unwrap();
    assert_eq!(colors.floats().unwrap(), &[1.0; 18][..]);

    mesh.add_buffer(AttributeBuffer::colors(vec![0.5; 18]), true)
        .unwrap();
    let colors = mesh.geometry().buffer(BufferKind::Color).unwrap();
    assert_eq!(colors.floats().unwrap(), &[0.5; 18][..]);
}

#[test]
fn plane_normal_is_shared_by_all_six_vertices() {
    let mut plane = Plane::new(canonical_plane_corners(), Vector3::new(60.0, 60.0, 60.0));
    plane.prepare_buffers();

    let normals = plane.geometry().buffer(BufferKind::Normal).unwrap();
    let normals = normals.floats().unwrap();
    assert_eq!(normals.len(), 18);
    for normal in normals.chunks(3) {
        assert_relative_eq!(normal[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(normal[1], 1.0, epsilon = 1e-6);
        assert_relative_eq!(normal[2], 0.0, epsilon = 1e-6);
    }
}

#[test]
fn tilted_plane_normal_comes_from_its_first_triangle() {
    let a1 = Vector3::new(0.0, 0.0, 0.0);
    let a2 = Vector3::new(0.3, 0.5, -1.0);
    let b1 = Vector3::new(1.0, 0.8, -0.7);
    let b2 = Vector3::new(0.7, 0.3, 0.3);
    let mut plane = Plane::new([a1, a2, b1, b2], Vector3::new(1.0, 1.0, 1.0));
    plane.prepare_buffers();

    // vertices are a1 a2 b1 b1 b2 a1
    let expected = (b1 - a1).cross(a2 - a1).normalize();
    assert!((expected - Vector3::new(0.0, 1.0, 0.0)).magnitude() > 0.1);

    let normals = plane.geometry().buffer(BufferKind::Normal).unwrap();
    let normals = normals.floats().unwrap();
    assert_eq!(normals.len(), 18);
    for normal in normals.chunks(3) {
        assert_relative_eq!(
            Vector3::new(normal[0], normal[1], normal[2]),
            expected,
            epsilon = 1e-6
        );
    }
}

#[test]
fn plane_colors_cover_all_six_vertices_once_prepared() {
    let mut plane = Plane::new(canonical_plane_corners(), Vector3::new(1.0, 1.0, 1.0));
    plane.set_colors(&[Vector3::new(0.2, 0.4, 0.6)]);
    plane.prepare_buffers();
    let colors = plane.geometry().buffer(BufferKind::Color).unwrap();
    assert_eq!(colors.element_count(), plane.geometry().vertex_count());
}

#[test]
fn mesh_colors_cover_all_vertices_once_prepared() {
    let mut mesh = Mesh::new(quad());
    mesh.set_colors(&[Vector3::new(0.2, 0.4, 0.6)]);
    mesh.prepare_buffers();
    let colors = mesh.geometry().buffer(BufferKind::Color).unwrap();
    assert_eq!(colors.len(), 18);
}

#[test]
fn explicit_plane_normals_are_kept() {
    let mut plane = Plane::new(canonical_plane_corners(), Vector3::new(1.0, 1.0, 1.0));
    plane.set_normals(vec![0.0, 0.0, 1.0].repeat(6));
    plane.prepare_buffers();
    let normals = plane.geometry().buffer(BufferKind::Normal).unwrap();
    assert_eq!(normals.floats().unwrap()[..3], [0.0, 0.0, 1.0]);
}

#[test]
fn mesh_without_normals_gets_flat_normals() {
    let mut mesh = Mesh::new(quad());
    mesh.prepare_buffers();
    let normals = mesh.geometry().buffer(BufferKind::Normal).unwrap();
    for normal in normals.floats().unwrap().chunks(3) {
        assert_relative_eq!(normal[2].abs(), 1.0, epsilon = 1e-6);
    }
}
