//! Phong material used when a node has no diffuse texture.

pub const DEFAULT_SHININESS: f32 = 30.0;

/// Fraction of the diffuse colour used as ambient when a material file
/// gives no ambient term of its own.
pub const AMBIENT_FACTOR: f32 = 0.2;

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            ambient: [AMBIENT_FACTOR; 3],
            diffuse: [1.0; 3],
            specular: [0.5; 3],
            shininess: DEFAULT_SHININESS,
        }
    }
}

impl Material {
    pub fn new(name: &str, ambient: [f32; 3], diffuse: [f32; 3], specular: [f32; 3], shininess: f32) -> Self {
        Self {
            name: name.to_string(),
            ambient,
            diffuse,
            specular,
            shininess: if shininess == 0.0 {
                DEFAULT_SHININESS
            } else {
                shininess
            },
        }
    }

    /// Converts an MTL material. The ambient colour is damped by
    /// [`AMBIENT_FACTOR`] and a zero shininess falls back to the default.
    pub fn from_obj(material: &tobj::Material) -> Self {
        let diffuse = material.diffuse.unwrap_or([1.0; 3]);
        let ambient = material.ambient.unwrap_or(diffuse);
        Self::new(
            &material.name,
            ambient.map(|c| c * AMBIENT_FACTOR),
            diffuse,
            material.specular.unwrap_or([0.0; 3]),
            material.shininess.unwrap_or(0.0),
        )
    }

    /// glTF only carries a base colour, the other terms are derived from it.
    pub fn from_gltf(material: &gltf::Material) -> Self {
        let [r, g, b, _] = material.pbr_metallic_roughness().base_color_factor();
        let diffuse = [r, g, b];
        Self::new(
            material.name().unwrap_or("gltf"),
            diffuse.map(|c| c * AMBIENT_FACTOR),
            diffuse,
            [0.5; 3],
            DEFAULT_SHININESS,
        )
    }

    /// Solid colour material for procedural geometry.
    pub fn from_color(color: [f32; 3]) -> Self {
        Self {
            name: "color".to_string(),
            ambient: color.map(|c| c * AMBIENT_FACTOR),
            diffuse: color,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obj_material_is_damped_and_defaulted() {
        let mut mtl = tobj::Material::default();
        mtl.name = "paint".to_string();
        mtl.ambient = Some([1.0, 0.5, 0.0]);
        mtl.diffuse = Some([0.8, 0.1, 0.1]);
        mtl.shininess = Some(0.0);
        let material = Material::from_obj(&mtl);
        assert_eq!(material.ambient, [0.2, 0.1, 0.0]);
        assert_eq!(material.diffuse, [0.8, 0.1, 0.1]);
        assert_eq!(material.shininess, DEFAULT_SHININESS);
        assert_eq!(material.name, "paint");
    }

    #[test]
    fn explicit_shininess_is_kept() {
        let material = Material::new("m", [0.0; 3], [1.0; 3], [1.0; 3], 64.0);
        assert_eq!(material.shininess, 64.0);
    }
}
