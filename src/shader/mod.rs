use crate::error::{Error, Result};
use crate::math::{dot, mul, try_normalize, V3};
use image::Rgb;

/// Diffuse-only lighting from a single directional light. No ambient term,
/// so faces turned away from the light come out black.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lambertian {
    light_dir: V3,
    light_color: V3,
}

impl Lambertian {
    /// `light_dir` points from the surface towards the light and is normalized here.
    /// `light_color` is in 0..=255 per channel.
    pub fn new(light_dir: V3, light_color: V3) -> Result<Lambertian> {
        let light_dir = try_normalize(&light_dir)
            .ok_or_else(|| Error::invalid("light_dir", "must be a non-zero finite vector"))?;
        if !light_color.is_finite() {
            return Err(Error::invalid("light_color", "must be finite"));
        }
        Ok(Lambertian {
            light_dir,
            light_color,
        })
    }

    pub fn light_dir(&self) -> V3 {
        self.light_dir
    }

    /// Cosine of the angle between `normal` and the light, floored at zero.
    pub fn intensity(&self, normal: &V3) -> f64 {
        dot(normal, &self.light_dir).max(0.)
    }

    /// Unquantized colour; what supersampling averages.
    pub fn radiance(&self, normal: &V3) -> V3 {
        mul(self.intensity(normal), &self.light_color)
    }

    pub fn shade(&self, normal: &V3) -> Rgb<u8> {
        to_rgb(&self.radiance(normal))
    }
}

/// Rounds each channel and clamps it into a byte. NaN maps to 0.
pub fn to_rgb(c: &V3) -> Rgb<u8> {
    Rgb([channel(c.x), channel(c.y), channel(c.z)])
}

fn channel(x: f64) -> u8 {
    if x.is_nan() {
        0
    } else {
        x.round().clamp(0., 255.) as u8
    }
}
