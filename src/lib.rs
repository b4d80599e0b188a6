use crate::math::V3;

pub mod bulb;
pub mod camera;
pub mod error;
pub mod marcher;
pub mod math;
pub mod render;
pub mod shader;

pub use error::{Error, Result};

/// Output of a distance estimator at one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceEstimate {
    /// Lower bound on the distance to the surface. Zero or below means on or inside it.
    pub distance: f64,
    /// Iteration at which the orbit escaped, or the last iteration if it never did.
    pub iterations: u32,
}

/// Anything a ray can be marched against.
pub trait Scene {
    fn estimate(&self, x: &V3) -> DistanceEstimate;

    fn sdf(&self, x: &V3) -> f64 {
        self.estimate(x).distance
    }
}
