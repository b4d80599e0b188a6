use crate::math::{abs, mul, sub, try_normalize, v, Ray, B1, B2, B3, V3};
use crate::{DistanceEstimate, Scene};

/// Exact signed distance to a ball. Handy as a field with a known gradient.
#[derive(Clone, Copy, Debug)]
pub struct Sphere {
    pub center: V3,
    pub radius: f64,
}

impl Scene for Sphere {
    fn estimate(&self, x: &V3) -> DistanceEstimate {
        DistanceEstimate {
            distance: abs(&sub(x, &self.center)) - self.radius,
            iterations: 0,
        }
    }
}

/// Termination policy for [`march`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarchParams {
    pub max_dist: f64,
    pub max_steps: u32,
    pub eps: f64,
}

impl Default for MarchParams {
    fn default() -> Self {
        MarchParams {
            max_dist: 20.,
            max_steps: 200,
            eps: 1e-3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissReason {
    /// Travelled past `max_dist`.
    Escaped,
    /// Ran out of steps before hitting or escaping.
    Exhausted,
    /// The field returned NaN.
    Degenerate,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarchResult {
    Hit {
        traveled: f64,
        point: V3,
        iterations: u32,
    },
    Miss(MissReason),
}

impl MarchResult {
    pub fn is_hit(&self) -> bool {
        matches!(self, MarchResult::Hit { .. })
    }
}

/// Sphere-traces `ray` against `s`, stepping by exactly the estimated distance.
pub fn march(s: &impl Scene, ray: &Ray, params: &MarchParams) -> MarchResult {
    let mut traveled = 0.;
    for _ in 0..params.max_steps {
        let point = ray.at(traveled);
        let DistanceEstimate {
            distance,
            iterations,
        } = s.estimate(&point);
        if distance.is_nan() {
            return MarchResult::Miss(MissReason::Degenerate);
        }
        if distance < params.eps {
            return MarchResult::Hit {
                traveled,
                point,
                iterations,
            };
        }
        traveled += distance;
        if traveled >= params.max_dist {
            return MarchResult::Miss(MissReason::Escaped);
        }
    }
    MarchResult::Miss(MissReason::Exhausted)
}

/// Central-difference gradient of the field, forward minus backward on each axis.
/// Not divided by `2 * delta`; only its direction is used.
pub fn dsdf(s: &impl Scene, x: &V3, delta: f64) -> V3 {
    let axis = |e: &V3| {
        let h = mul(delta, e);
        s.sdf(&(*x + h)) - s.sdf(&(*x - h))
    };
    v(axis(&B1), axis(&B2), axis(&B3))
}

/// Unit outward normal at `x`. Falls back to world up where the gradient vanishes.
pub fn normal(s: &impl Scene, x: &V3, delta: f64) -> V3 {
    try_normalize(&dsdf(s, x, delta)).unwrap_or(B2)
}
