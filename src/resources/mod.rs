//! Loading meshes and textures from asset files.
//!
//! Model files are read into [`ImportedMesh`] parts, one per sub-mesh, and
//! turned into nodes with [`Mesh::from_imported`]. OBJ goes through `tobj`
//! (materials from the MTL file), glTF/GLB through `gltf` (node transforms
//! are baked into the vertex data).

use std::{
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
};

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::{
    context::InitContext,
    data_structures::{material::Material, mesh::Mesh},
};

pub mod texture;

pub use texture::{
    load_binary, load_cube_map, load_image, load_string, load_texture, resolve_asset_path,
};

/// One sub-mesh of a model file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<f32>,
    /// Empty when the file had none; normals are then synthesized on compile.
    pub normals: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub indices: Vec<u32>,
    pub material: Material,
    /// Diffuse texture named by the material, relative to the asset
    /// directory. Not loaded automatically.
    pub diffuse_texture: Option<String>,
}

impl ImportedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Loads a model file, choosing the importer by extension.
pub async fn load_model(file_name: &str) -> anyhow::Result<Vec<ImportedMesh>> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let parts = match extension.as_deref() {
        Some("obj") => load_model_obj(file_name).await?,
        Some("gltf") | Some("glb") => load_model_gltf(file_name).await?,
        _ => anyhow::bail!("{file_name}: unsupported model format, use .obj, .gltf or .glb"),
    };
    log::info!(
        "{file_name}: {} meshes, {} vertices",
        parts.len(),
        parts.iter().map(ImportedMesh::vertex_count).sum::<usize>()
    );
    Ok(parts)
}

/// Loads a model file and builds a compiled mesh from it.
pub async fn load_mesh(file_name: &str, ctx: &InitContext) -> anyhow::Result<Mesh> {
    let parts = load_model(file_name).await?;
    let mut mesh = Mesh::from_imported(parts)?.with_label(file_name);
    mesh.compile(ctx);
    Ok(mesh)
}

fn parent_dir(file_name: &str) -> PathBuf {
    Path::new(file_name)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

pub async fn load_model_obj(file_name: &str) -> anyhow::Result<Vec<ImportedMesh>> {
    let obj_text = load_string(file_name).await?;
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);
    let dir = parent_dir(file_name);

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        move |p| {
            let path = dir.join(p);
            async move {
                match load_string(&path).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(e) => {
                        log::warn!("{e:#}");
                        Err(tobj::LoadError::OpenFileFailed)
                    }
                }
            }
        },
    )
    .await?;

    let materials = match obj_materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!("{file_name}: materials could not be loaded ({e}), using the default material");
            Vec::new()
        }
    };

    let parts = models
        .into_iter()
        .map(|model| {
            let obj_material = model.mesh.material_id.and_then(|id| materials.get(id));
            let material = obj_material.map(Material::from_obj).unwrap_or_default();
            let diffuse_texture = obj_material.and_then(|m| m.diffuse_texture.clone()).map(|t| {
                parent_dir(file_name).join(t).to_string_lossy().into_owned()
            });
            ImportedMesh {
                name: model.name,
                positions: model.mesh.positions,
                normals: model.mesh.normals,
                tex_coords: model.mesh.texcoords,
                indices: model.mesh.indices,
                material,
                diffuse_texture,
            }
        })
        .collect();
    Ok(parts)
}

pub async fn load_model_gltf(file_name: &str) -> anyhow::Result<Vec<ImportedMesh>> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    let dir = parent_dir(file_name);
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => match gltf.blob.as_deref() {
                Some(blob) => buffer_data.push(blob.to_vec()),
                None => anyhow::bail!("{file_name}: binary buffer referenced but missing"),
            },
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(dir.join(uri)).await?);
            }
        }
    }

    let mut parts = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            collect_gltf_node(&node, Matrix4::identity(), &buffer_data, &mut parts);
        }
    }
    if parts.is_empty() {
        anyhow::bail!("{file_name}: no meshes found");
    }
    Ok(parts)
}

fn collect_gltf_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffer_data: &[Vec<u8>],
    parts: &mut Vec<ImportedMesh>,
) {
    let transform = parent * Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        for (i, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("{:?}: primitive {i} is not a triangle list, skipped", mesh.name());
                continue;
            }
            let name = format!("{}#{i}", mesh.name().or(node.name()).unwrap_or("gltf"));
            match read_primitive(&primitive, transform, buffer_data, name) {
                Some(part) => parts.push(part),
                None => log::warn!("{:?}: primitive {i} has no positions, skipped", mesh.name()),
            }
        }
    }
    for child in node.children() {
        collect_gltf_node(&child, transform, buffer_data, parts);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive,
    transform: Matrix4<f32>,
    buffer_data: &[Vec<u8>],
    name: String,
) -> Option<ImportedMesh> {
    let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
    let positions = reader
        .read_positions()?
        .flat_map(|p| {
            let p = transform * Vector4::new(p[0], p[1], p[2], 1.0);
            [p.x, p.y, p.z]
        })
        .collect();
    let normal_matrix = normal_matrix3(&transform);
    let normals = reader
        .read_normals()
        .map(|normals| {
            normals
                .flat_map(|n| {
                    let n = (normal_matrix * Vector3::from(n)).normalize();
                    [n.x, n.y, n.z]
                })
                .collect()
        })
        .unwrap_or_default();
    // glTF puts v = 0 at the top of the image, textures are uploaded with
    // v = 0 at the bottom
    let tex_coords = reader
        .read_tex_coords(0)
        .map(|tc| tc.into_f32().flat_map(|[u, v]| [u, 1.0 - v]).collect())
        .unwrap_or_default();
    let indices = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_default();
    Some(ImportedMesh {
        name,
        positions,
        normals,
        tex_coords,
        indices,
        material: Material::from_gltf(&primitive.material()),
        diffuse_texture: None,
    })
}

fn normal_matrix3(transform: &Matrix4<f32>) -> Matrix3<f32> {
    let linear = Matrix3::from_cols(
        transform.x.truncate(),
        transform.y.truncate(),
        transform.z.truncate(),
    );
    linear
        .invert()
        .map(|m| m.transpose())
        .unwrap_or_else(Matrix3::identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_extension_is_rejected() {
        let err = load_model("model.fbx").await.unwrap_err();
        assert!(err.to_string().contains("unsupported model format"));
    }

    #[tokio::test]
    async fn obj_without_materials_uses_the_default() {
        let dir = std::env::temp_dir().join(format!("scene-ngin-obj-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("tri.obj");
        std::fs::write(
            &path,
            "mtllib missing.mtl\no tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl nothing\nf 1 2 3\n",
        )
        .unwrap();
        let parts = load_model(path.to_str().unwrap()).await.unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].vertex_count(), 3);
        assert_eq!(parts[0].indices, vec![0, 1, 2]);
        assert!(parts[0].normals.is_empty());
        assert_eq!(parts[0].material, Material::default());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let m = normal_matrix3(&Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0));
        let n = (m * Vector3::new(1.0, 1.0, 0.0)).normalize();
        assert!(n.x < n.y);
    }
}
