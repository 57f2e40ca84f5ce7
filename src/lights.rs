//! Light registry.
//!
//! Lights are named records stored by value in one collection per kind.
//! The registry is uploaded as a whole once per frame with
//! [`LightRegistry::pass_data_to_shader`].

use cgmath::{Deg, Vector3};

use crate::pipelines::light::{
    DirectionalLightRaw, LightResources, LightsUniform, MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS,
    MAX_SPOT_LIGHTS, PointLightRaw, SpotLightRaw,
};

/// Light coming from infinitely far away. `direction` is the direction the
/// light travels in.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub name: String,
    pub direction: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl DirectionalLight {
    pub fn new(
        name: &str,
        direction: Vector3<f32>,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
    ) -> Self {
        Self {
            name: name.to_string(),
            direction,
            ambient,
            diffuse,
            specular,
        }
    }
}

/// Attenuated omnidirectional light:
/// `1 / (constant + linear * d + quadratic * d²)`.
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub name: String,
    pub position: Vector3<f32>,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl PointLight {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        position: Vector3<f32>,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        constant: f32,
        linear: f32,
        quadratic: f32,
    ) -> Self {
        Self {
            name: name.to_string(),
            position,
            ambient,
            diffuse,
            specular,
            constant,
            linear,
            quadratic,
        }
    }
}

/// Attenuated cone light with a soft edge between `cut_off` and
/// `outer_cut_off`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpotLight {
    pub name: String,
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub cut_off: Deg<f32>,
    pub outer_cut_off: Deg<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
}

impl SpotLight {
    /// Attenuation terms follow [`PointLight::new`]; the cone is given by
    /// the inner and outer cut-off angles.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        position: Vector3<f32>,
        direction: Vector3<f32>,
        cut_off: Deg<f32>,
        outer_cut_off: Deg<f32>,
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        constant: f32,
        linear: f32,
        quadratic: f32,
    ) -> Self {
        if outer_cut_off < cut_off {
            log::warn!("{name}: outer cut-off {outer_cut_off:?} is inside the cut-off {cut_off:?}");
        }
        Self {
            name: name.to_string(),
            position,
            direction,
            cut_off,
            outer_cut_off,
            constant,
            linear,
            quadratic,
            ambient,
            diffuse,
            specular,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Directional(DirectionalLight),
    Point(PointLight),
    Spot(SpotLight),
}

impl From<DirectionalLight> for Light {
    fn from(light: DirectionalLight) -> Self {
        Light::Directional(light)
    }
}

impl From<PointLight> for Light {
    fn from(light: PointLight) -> Self {
        Light::Point(light)
    }
}

impl From<SpotLight> for Light {
    fn from(light: SpotLight) -> Self {
        Light::Spot(light)
    }
}

#[derive(Clone, Debug, Default)]
pub struct LightRegistry {
    directional: Vec<DirectionalLight>,
    point: Vec<PointLight>,
    spot: Vec<SpotLight>,
}

impl LightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the collection of the light's kind. Names are not checked
    /// for uniqueness, lookups return the first match.
    pub fn add_light(&mut self, light: impl Into<Light>) -> &mut Self {
        match light.into() {
            Light::Directional(l) => self.directional.push(l),
            Light::Point(l) => self.point.push(l),
            Light::Spot(l) => self.spot.push(l),
        }
        self
    }

    pub fn directional_light_by_name(&mut self, name: &str) -> Option<&mut DirectionalLight> {
        self.directional.iter_mut().find(|l| l.name == name)
    }

    pub fn point_light_by_name(&mut self, name: &str) -> Option<&mut PointLight> {
        self.point.iter_mut().find(|l| l.name == name)
    }

    pub fn spot_light_by_name(&mut self, name: &str) -> Option<&mut SpotLight> {
        self.spot.iter_mut().find(|l| l.name == name)
    }

    pub fn remove_point_light(&mut self, name: &str) -> Option<PointLight> {
        let index = self.point.iter().position(|l| l.name == name)?;
        Some(self.point.remove(index))
    }

    pub fn directional_lights(&self) -> &[DirectionalLight] {
        &self.directional
    }

    pub fn point_lights(&self) -> &[PointLight] {
        &self.point
    }

    pub fn spot_lights(&self) -> &[SpotLight] {
        &self.spot
    }

    /// The light the shadow map is rendered from.
    pub fn shadow_caster(&self) -> Option<&DirectionalLight> {
        self.directional.first()
    }

    pub fn is_empty(&self) -> bool {
        self.directional.is_empty() && self.point.is_empty() && self.spot.is_empty()
    }

    /// Packs every light into the uniform layout. Lights beyond the array
    /// capacities are left out with a warning.
    pub fn to_uniform(&self) -> LightsUniform {
        warn_truncated("directional", self.directional.len(), MAX_DIRECTIONAL_LIGHTS);
        warn_truncated("point", self.point.len(), MAX_POINT_LIGHTS);
        warn_truncated("spot", self.spot.len(), MAX_SPOT_LIGHTS);

        let mut uniform = LightsUniform::default();
        for (slot, light) in uniform.directional.iter_mut().zip(&self.directional) {
            *slot = DirectionalLightRaw::from(light);
        }
        for (slot, light) in uniform.point.iter_mut().zip(&self.point) {
            *slot = PointLightRaw::from(light);
        }
        for (slot, light) in uniform.spot.iter_mut().zip(&self.spot) {
            *slot = SpotLightRaw::from(light);
        }
        uniform.counts = [
            self.directional.len().min(MAX_DIRECTIONAL_LIGHTS) as u32,
            self.point.len().min(MAX_POINT_LIGHTS) as u32,
            self.spot.len().min(MAX_SPOT_LIGHTS) as u32,
            0,
        ];
        uniform
    }

    pub fn pass_data_to_shader(&self, queue: &wgpu::Queue, resources: &LightResources) {
        resources.write(queue, &self.to_uniform());
    }
}

fn warn_truncated(kind: &str, count: usize, capacity: usize) {
    if count > capacity {
        log::warn!("{count} {kind} lights registered, only the first {capacity} are uploaded");
    }
}
