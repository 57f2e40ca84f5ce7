//! Sun movement and sky brightness over a day.

use cgmath::Vector3;

use crate::context::Context;

pub const SUN: &str = "sun";

/// Sun angle added per step, in radians.
pub const ROTATION_STEP: f32 = 0.002;
/// The angle wraps back to this value once it reaches [`ROTATION_END`].
pub const ROTATION_RESTART: f32 = 0.005;
pub const ROTATION_END: f32 = 8.0;

pub const NIGHT_SKY: f32 = 0.4;
pub const MIN_SKY: f32 = 0.3;
pub const MAX_SKY: f32 = 1.0;

const DAY_COLOUR: Vector3<f32> = Vector3 {
    x: 1.0,
    y: 0.95,
    z: 0.79,
};
const COLOUR_SHIFT: f32 = 0.001;
const DUSK_FADE: f32 = 0.0015;
const DAWN_GAIN: f32 = 0.002;

/// State of the sun after one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sun {
    pub direction: Vector3<f32>,
    /// Used for both diffuse and specular.
    pub colour: Vector3<f32>,
    pub sky_intensity: f32,
}

/// Rotates a directional light around the scene and dims the skybox.
///
/// The sun is down while the angle is below 0.5 or above 5: it gives no
/// diffuse or specular light and the sky stays at [`NIGHT_SKY`]. During the
/// day the sky brightens until the angle passes 4 and fades afterwards,
/// always within `[MIN_SKY, MAX_SKY]`.
#[derive(Clone, Debug)]
pub struct DayCycle {
    light: String,
    rotation: f32,
    sky_intensity: f32,
    missing_light_reported: bool,
}

impl Default for DayCycle {
    fn default() -> Self {
        Self::new(SUN)
    }
}

impl DayCycle {
    /// Drives the directional light called `light`.
    pub fn new(light: &str) -> Self {
        Self {
            light: light.to_string(),
            rotation: 0.0,
            sky_intensity: 0.0,
            missing_light_reported: false,
        }
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn sky_intensity(&self) -> f32 {
        self.sky_intensity
    }

    pub fn is_night(&self) -> bool {
        self.rotation > 5.0 || self.rotation < 0.5
    }

    pub fn step(&mut self) -> Sun {
        self.rotation += ROTATION_STEP;
        if self.rotation >= ROTATION_END {
            self.rotation = ROTATION_RESTART;
        }

        let colour = if self.is_night() {
            self.sky_intensity = NIGHT_SKY;
            Vector3::new(0.0, 0.0, 0.0)
        } else {
            let (shift, sky) = if self.rotation > 4.0 {
                (-COLOUR_SHIFT, -DUSK_FADE)
            } else {
                (COLOUR_SHIFT, DAWN_GAIN)
            };
            self.sky_intensity = (self.sky_intensity + sky).clamp(MIN_SKY, MAX_SKY);
            Vector3::new(DAY_COLOUR.x, DAY_COLOUR.y + shift, DAY_COLOUR.z + shift)
        };

        let (sin, cos) = self.rotation.sin_cos();
        Sun {
            direction: Vector3::new(sin, cos, cos),
            colour,
            sky_intensity: self.sky_intensity,
        }
    }

    /// Steps and writes the result into the light and the skybox of `ctx`.
    pub fn apply(&mut self, ctx: &mut Context) -> Sun {
        let sun = self.step();
        match ctx.lights.directional_light_by_name(&self.light) {
            Some(light) => {
                light.direction = sun.direction;
                light.diffuse = sun.colour;
                light.specular = sun.colour;
            }
            None if !self.missing_light_reported => {
                log::warn!("day cycle: no directional light called {:?}", self.light);
                self.missing_light_reported = true;
            }
            None => (),
        }
        if ctx.skybox.is_some() {
            ctx.set_skybox_intensity(sun.sky_intensity);
        }
        sun
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn starts_at_night() {
        let mut cycle = DayCycle::default();
        let sun = cycle.step();
        assert!(cycle.is_night());
        assert_eq!(sun.colour, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(sun.sky_intensity, NIGHT_SKY);
        assert_relative_eq!(sun.direction.y, ROTATION_STEP.cos(), epsilon = 1e-6);
    }

    #[test]
    fn morning_brightens_within_bounds() {
        let mut cycle = DayCycle::default().with_rotation(1.0);
        let first = cycle.step();
        assert!(!cycle.is_night());
        assert_eq!(first.sky_intensity, MIN_SKY);
        assert_relative_eq!(first.colour, Vector3::new(1.0, 0.951, 0.791), epsilon = 1e-6);
        let later = (0..1000).map(|_| cycle.step()).last().unwrap();
        assert_eq!(later.sky_intensity, MAX_SKY);
    }

    #[test]
    fn evening_fades() {
        let mut cycle = DayCycle::default().with_rotation(4.5);
        let sun = cycle.step();
        assert_relative_eq!(sun.colour, Vector3::new(1.0, 0.949, 0.789), epsilon = 1e-6);
        assert_eq!(sun.sky_intensity, MIN_SKY);
    }

    #[test]
    fn rotation_wraps() {
        let mut cycle = DayCycle::default().with_rotation(7.999);
        cycle.step();
        assert_eq!(cycle.rotation(), ROTATION_RESTART);
    }
}
