use crate::error::{Error, Result};
use crate::math::{cross, normalize, try_normalize, v, Ray, B2, O, V3};

pub const WORLD_UP: V3 = B2;

/// Orthonormal view basis of a camera looking at a fixed target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    pub position: V3,
    pub forward: V3,
    pub right: V3,
    pub up: V3,
}

impl CameraFrame {
    /// Camera on a circle of radius `distance` in the XZ plane, looking at the origin.
    /// `angle = 0` puts it on the positive Z axis.
    pub fn orbit(angle: f64, distance: f64) -> Result<CameraFrame> {
        let position = v(distance * angle.sin(), 0., distance * angle.cos());
        CameraFrame::look_at(position, O)
    }

    /// Builds the basis by Gram-Schmidt against [`WORLD_UP`]. Fails when the
    /// view direction is zero or parallel to world up, which never happens on
    /// the XZ orbit.
    pub fn look_at(position: V3, target: V3) -> Result<CameraFrame> {
        let forward = try_normalize(&(target - position)).ok_or(Error::DegenerateCamera)?;
        let right = try_normalize(&cross(&WORLD_UP, &forward)).ok_or(Error::DegenerateCamera)?;
        let up = normalize(&cross(&forward, &right));
        Ok(CameraFrame {
            position,
            forward,
            right,
            up,
        })
    }
}

/// Pinhole camera mapping pixel coordinates to primary rays.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    frame: CameraFrame,
    width: f64,
    height: f64,
    half_height: f64,
    aspect_ratio: f64,
}

impl Camera {
    pub fn new(
        frame: CameraFrame,
        width: u32,
        height: u32,
        fov: f64,
        aspect_ratio: f64,
    ) -> Result<Camera> {
        if width == 0 || height == 0 {
            return Err(Error::invalid(
                "resolution",
                format!("{width}x{height} has no pixels"),
            ));
        }
        if !(fov > 0. && fov < std::f64::consts::PI) {
            return Err(Error::invalid("fov", format!("{fov} is not in (0, pi)")));
        }
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.) {
            return Err(Error::invalid(
                "aspect_ratio",
                format!("{aspect_ratio} is not positive"),
            ));
        }
        Ok(Camera {
            frame,
            width: width as f64,
            height: height as f64,
            half_height: (fov / 2.).tan(),
            aspect_ratio,
        })
    }

    /// Camera orbiting the origin for one animation frame.
    pub fn orbit(
        angle: f64,
        distance: f64,
        width: u32,
        height: u32,
        fov: f64,
        aspect_ratio: f64,
    ) -> Result<Camera> {
        if !(distance.is_finite() && distance > 0.) {
            return Err(Error::invalid(
                "camera_distance",
                format!("{distance} is not positive"),
            ));
        }
        Camera::new(
            CameraFrame::orbit(angle, distance)?,
            width,
            height,
            fov,
            aspect_ratio,
        )
    }

    pub fn frame(&self) -> &CameraFrame {
        &self.frame
    }

    /// Ray through pixel coordinate `(x, y)`. Fractional coordinates address
    /// sub-pixel positions; `(width / 2, height / 2)` looks straight ahead.
    pub fn ray_for(&self, x: f64, y: f64) -> Result<Ray> {
        let u = (x / self.width - 0.5) * 2. * self.half_height * self.aspect_ratio;
        let v = (y / self.height - 0.5) * 2. * self.half_height;
        let f = &self.frame;
        let dir = f.forward + u * f.right + v * f.up;
        Ray::new(f.position, normalize(&dir))
    }
}
