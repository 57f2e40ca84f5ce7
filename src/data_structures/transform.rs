//! Node transforms and the per-node uniform stored on the GPU.

use cgmath::{Deg, Matrix, Matrix4, SquareMatrix, Vector3};

use crate::data_structures::material::Material;

/// Position, pivot, Euler rotation (degrees) and scale of a drawable node.
///
/// The model matrix is
/// `T(origin) * Rx * Ry * Rz * T(position - origin) * S(scale)`, so rotations
/// turn the node around `origin` rather than around its own position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub origin: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            origin: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.origin)
            * Matrix4::from_angle_x(Deg(self.rotation.x))
            * Matrix4::from_angle_y(Deg(self.rotation.y))
            * Matrix4::from_angle_z(Deg(self.rotation.z))
            * Matrix4::from_translation(self.position - self.origin)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vector3<f32>> for Transform {
    fn from(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }
}

/// Inverse transpose of the model matrix; identity for singular models.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix4<f32> {
    model
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Matrix4::identity)
}

/**
 * The per-node data stored on the GPU: model and normal matrices plus the
 * material used when no texture is bound.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NodeUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    ambient: [f32; 4],
    diffuse: [f32; 4],
    specular: [f32; 3],
    shininess: f32,
    use_texture: u32,
    use_specular_map: u32,
    _padding: [u32; 2],
}

impl NodeUniform {
    pub fn new(model: Matrix4<f32>, material: &Material, textures: usize) -> Self {
        let [ar, ag, ab] = material.ambient;
        let [dr, dg, db] = material.diffuse;
        Self {
            model: model.into(),
            normal: normal_matrix(&model).into(),
            ambient: [ar, ag, ab, 1.0],
            diffuse: [dr, dg, db, 1.0],
            specular: material.specular,
            shininess: material.shininess,
            use_texture: (textures > 0) as u32,
            use_specular_map: (textures > 1) as u32,
            _padding: [0; 2],
        }
    }

    pub fn model(&self) -> Matrix4<f32> {
        self.model.into()
    }

    pub fn uses_texture(&self) -> bool {
        self.use_texture == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Vector4, Zero};

    #[test]
    fn default_transform_is_identity() {
        assert_eq!(Transform::new().to_matrix(), Matrix4::identity());
    }

    #[test]
    fn rotation_pivots_around_origin() {
        let transform = Transform {
            position: Vector3::new(2.0, 0.0, 0.0),
            origin: Vector3::new(1.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 90.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        };
        // the local origin lands one unit "above" the pivot
        let p = transform.to_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p, Vector4::new(1.0, 1.0, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn scale_applies_before_translation() {
        let transform = Transform {
            position: Vector3::new(0.0, 5.0, 0.0),
            scale: Vector3::new(2.0, 3.0, 4.0),
            ..Default::default()
        };
        let p = transform.to_matrix() * Vector4::new(1.0, 1.0, 1.0, 1.0);
        assert_relative_eq!(p, Vector4::new(2.0, 8.0, 4.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn normal_matrix_of_singular_model_is_identity() {
        let transform = Transform {
            scale: Vector3::zero(),
            ..Default::default()
        };
        assert_eq!(normal_matrix(&transform.to_matrix()), Matrix4::identity());
    }

    #[test]
    fn uniform_flags_follow_texture_count() {
        let material = Material::default();
        let plain = NodeUniform::new(Matrix4::identity(), &material, 0);
        assert!(!plain.uses_texture());
        let textured = NodeUniform::new(Matrix4::identity(), &material, 2);
        assert!(textured.uses_texture());
        assert_eq!(textured.use_specular_map, 1);
        assert_eq!(std::mem::size_of::<NodeUniform>(), 192);
    }
}
