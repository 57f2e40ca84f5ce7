use cgmath::Vector3;
use scene_ngin::{data_structures::mesh::Mesh, resources::ImportedMesh};

/// Unit quad in the xy plane as two triangles.
pub fn quad() -> Vec<f32> {
    vec![
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0,
    ]
}

pub fn part(name: &str) -> ImportedMesh {
    ImportedMesh {
        name: name.to_string(),
        positions: quad(),
        ..Default::default()
    }
}

/// A model of three parts: the root and two children.
pub fn three_part_model() -> Mesh {
    Mesh::from_imported(vec![part("hull"), part("mast"), part("sail")])
        .expect("three parts given")
}

pub fn canonical_plane_corners() -> [Vector3<f32>; 4] {
    [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, -1.0),
        Vector3::new(1.0, 0.0, -1.0),
        Vector3::new(1.0, 0.0, 0.0),
    ]
}
