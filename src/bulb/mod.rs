//! Distance estimator for the power-N Mandelbulb.
//!
//! The orbit `z -> z^n + p` is iterated in spherical coordinates while the
//! running derivative `dr` is tracked alongside it. Once `|z|` passes the
//! bailout radius, `0.5 * ln(r) * r / dr` bounds the distance from `p` to
//! the set's boundary.

use crate::math::{abs, v, V3};
use crate::{DistanceEstimate, Scene};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mandelbulb {
    pub power: i32,
    pub max_iterations: u32,
    pub bailout: f64,
}

impl Default for Mandelbulb {
    fn default() -> Self {
        Mandelbulb {
            power: 8,
            max_iterations: 100,
            bailout: 2.0,
        }
    }
}

/// State of the orbit when iteration stopped.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Orbit {
    r: f64,
    dr: f64,
    iteration: u32,
}

impl Mandelbulb {
    fn orbit(&self, p: &V3) -> Orbit {
        let power = self.power as f64;
        let mut z = *p;
        let mut dr = 1.0;
        let mut r = 0.0;
        for i in 0..self.max_iterations {
            r = abs(&z);
            if r > self.bailout {
                return Orbit { r, dr, iteration: i };
            }
            let theta = z.x.hypot(z.y).atan2(z.z) * power;
            let phi = z.y.atan2(z.x) * power;
            dr = power * r.powi(self.power - 1) * dr + 1.0;
            let zr = r.powi(self.power);
            z = zr * v(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()) + *p;
        }
        Orbit {
            r,
            dr,
            iteration: self.max_iterations.saturating_sub(1),
        }
    }
}

impl Scene for Mandelbulb {
    fn estimate(&self, p: &V3) -> DistanceEstimate {
        let Orbit { r, dr, iteration } = self.orbit(p);
        DistanceEstimate {
            distance: clamp_distance(0.5 * r.ln() * r / dr),
            iterations: iteration,
        }
    }
}

/// Bounded orbits with `r < 1` give a negative estimate and `r = 0` gives NaN.
/// Both mean the point is inside the set, so they collapse to zero.
fn clamp_distance(d: f64) -> f64 {
    if d.is_finite() && d > 0. {
        d
    } else {
        0.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::O;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn origin_never_escapes() {
        let est = Mandelbulb::default().estimate(&O);
        assert_eq!(est.iterations, 99);
        assert_eq!(est.distance, 0.);
    }

    #[test]
    fn points_beyond_bailout_escape_immediately() {
        let bulb = Mandelbulb::default();
        let est = bulb.estimate(&v(3., 0., 0.));
        assert_eq!(est.iterations, 0);
        // dr is still 1 before the first iteration
        assert_relative_eq!(est.distance, 0.5 * 3f64.ln() * 3., epsilon = 1e-12);

        for p in [v(0., -2.5, 0.), v(1.5, 1.5, 1.5), v(0., 0., 10.)] {
            assert_eq!(bulb.estimate(&p).iterations, 0);
        }
    }

    #[test]
    fn iteration_cap_is_respected() {
        let bulb = Mandelbulb {
            max_iterations: 7,
            ..Default::default()
        };
        assert_eq!(bulb.estimate(&v(0.1, 0.1, 0.1)).iterations, 6);

        let degenerate = Mandelbulb {
            max_iterations: 0,
            ..Default::default()
        };
        let est = degenerate.estimate(&v(0.1, 0., 0.));
        assert_eq!(est.iterations, 0);
        assert_eq!(est.distance, 0.);
    }

    #[test]
    fn axis_point_escapes_after_a_few_iterations() {
        // (0, 0, 1.352) maps to ~12.5 after one step
        let est = Mandelbulb::default().estimate(&v(0., 0., 1.352));
        assert_eq!(est.iterations, 1);
        assert!(est.distance > 0.2 && est.distance < 0.3, "{est:?}");
    }

    #[test]
    fn distance_is_finite_and_non_negative_everywhere() {
        let bulb = Mandelbulb::default();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..2000 {
            let p = v(
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
            );
            let est = bulb.estimate(&p);
            assert!(est.distance.is_finite() && est.distance >= 0., "{p:?} -> {est:?}");
            assert!(est.iterations < bulb.max_iterations);
        }
    }

    #[test]
    fn estimate_shrinks_towards_the_surface() {
        let bulb = Mandelbulb::default();
        let far = bulb.sdf(&v(0., 0., 2.5));
        let near = bulb.sdf(&v(0., 0., 1.0));
        assert!(far > near && near > 0.);
    }

    #[test]
    fn power_two_bulb_reaches_further_along_negative_z() {
        // on the axis the power-2 orbit is x^2 - 1.2, which settles into a 2-cycle
        let p = v(0., 0., -1.2);
        let eight = Mandelbulb::default().estimate(&p);
        let two = Mandelbulb {
            power: 2,
            ..Default::default()
        }
        .estimate(&p);
        assert_eq!(eight.iterations, 1);
        assert!(eight.distance > 0.);
        assert_eq!(two.iterations, 99);
        assert_eq!(two.distance, 0.);
    }
}
