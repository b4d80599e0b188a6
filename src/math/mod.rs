use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops;

/// Lengths below this are treated as zero when normalizing.
pub const NORM_EPS: f64 = 1e-12;

/// Allowed deviation from unit length for ray directions.
pub const UNIT_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct V3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A half-line with a unit direction. Only constructible through [`Ray::new`],
/// so everything downstream may rely on `|d| = 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    x: V3,
    d: V3,
}

impl Ray {
    pub fn new(origin: V3, direction: V3) -> Result<Ray> {
        let len = abs(&direction);
        if !((len - 1.).abs() <= UNIT_TOLERANCE) {
            return Err(Error::NonUnitDirection(len));
        }
        Ok(Ray {
            x: origin,
            d: direction,
        })
    }

    pub fn origin(&self) -> V3 {
        self.x
    }

    pub fn direction(&self) -> V3 {
        self.d
    }

    /// Point reached after travelling `t` along the ray.
    pub fn at(&self, t: f64) -> V3 {
        add(&self.x, &mul(t, &self.d))
    }
}

pub fn sub(x: &V3, y: &V3) -> V3 {
    V3 {
        x: x.x - y.x,
        y: x.y - y.y,
        z: x.z - y.z,
    }
}

pub fn abs2(x: &V3) -> f64 {
    x.x * x.x + x.y * x.y + x.z * x.z
}

pub fn abs(x: &V3) -> f64 {
    abs2(x).sqrt()
}

pub fn v(x: f64, y: f64, z: f64) -> V3 {
    V3 { x, y, z }
}

pub fn mul(scalar: f64, x: &V3) -> V3 {
    V3 {
        x: x.x * scalar,
        y: x.y * scalar,
        z: x.z * scalar,
    }
}

pub fn add(x: &V3, y: &V3) -> V3 {
    V3 {
        x: x.x + y.x,
        y: x.y + y.y,
        z: x.z + y.z,
    }
}

pub fn dist(x: &V3, y: &V3) -> f64 {
    abs(&sub(x, y))
}

/// Scales `x` to unit length. Callers must know `x` is not (close to) zero;
/// use [`try_normalize`] otherwise.
pub fn normalize(x: &V3) -> V3 {
    mul(1. / abs(x), x)
}

/// Like [`normalize`], but yields `None` for zero-length or non-finite input
/// instead of a vector full of NaN.
pub fn try_normalize(x: &V3) -> Option<V3> {
    let len = abs(x);
    if len.is_finite() && len > NORM_EPS {
        Some(mul(1. / len, x))
    } else {
        None
    }
}

pub fn dot(x: &V3, y: &V3) -> f64 {
    x.x * y.x + x.y * y.y + x.z * y.z
}

pub fn cross(v1: &V3, v2: &V3) -> V3 {
    v(
        v1.y * v2.z - v1.z * v2.y,
        v1.z * v2.x - v1.x * v2.z,
        v1.x * v2.y - v1.y * v2.x,
    )
}

impl V3 {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl ops::Add<V3> for V3 {
    type Output = V3;

    fn add(self, rhs: V3) -> V3 {
        add(&self, &rhs)
    }
}

impl ops::Sub<V3> for V3 {
    type Output = V3;

    fn sub(self, rhs: V3) -> V3 {
        sub(&self, &rhs)
    }
}

impl ops::Neg for V3 {
    type Output = V3;

    fn neg(self) -> V3 {
        mul(-1., &self)
    }
}

impl ops::Mul<V3> for f64 {
    type Output = V3;

    fn mul(self, rhs: V3) -> Self::Output {
        mul(self, &rhs)
    }
}

pub const B1: V3 = V3 {
    x: 1.,
    y: 0.,
    z: 0.,
};

pub const B2: V3 = V3 {
    x: 0.,
    y: 1.,
    z: 0.,
};

pub const B3: V3 = V3 {
    x: 0.,
    y: 0.,
    z: 1.,
};

pub const O: V3 = V3 {
    x: 0.,
    y: 0.,
    z: 0.,
};
