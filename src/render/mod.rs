//! Per-frame orchestration: camera ray, march, normal, shade, for every pixel.

use crate::bulb::Mandelbulb;
use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::marcher::{march, normal, MarchParams, MarchResult, MissReason};
use crate::math::{mul, v, Ray, O, V3};
use crate::shader::{to_rgb, Lambertian};
use image::{Rgb, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fs::File;
use std::io::BufReader;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

/// Every tunable of the renderer. Missing fields in a config file take the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub power: i32,
    pub max_iterations: u32,
    pub bailout: f64,
    pub max_dist: f64,
    pub max_steps: u32,
    pub eps: f64,
    /// Finite-difference step for normals.
    pub delta: f64,
    pub width: u32,
    pub height: u32,
    /// Vertical field of view in radians.
    pub fov: f64,
    /// Defaults to `width / height` of the frame being rendered.
    pub aspect_ratio: Option<f64>,
    pub camera_distance: f64,
    pub light_dir: V3,
    pub light_color: V3,
    pub background: [u8; 3],
    /// Side of the per-pixel supersampling grid.
    pub samples: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let bulb = Mandelbulb::default();
        let march = MarchParams::default();
        RenderConfig {
            power: bulb.power,
            max_iterations: bulb.max_iterations,
            bailout: bulb.bailout,
            max_dist: march.max_dist,
            max_steps: march.max_steps,
            eps: march.eps,
            delta: 1e-3,
            width: 400,
            height: 300,
            fov: PI / 4.,
            aspect_ratio: None,
            camera_distance: 3.,
            light_dir: v(1., 1., -1.),
            light_color: v(255., 200., 150.),
            background: [0, 0, 0],
            samples: 1,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(Error::invalid(name, format!("{value} is not a positive number")))
    }
}

fn nonzero(name: &'static str, value: u32) -> Result<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(Error::invalid(name, "must be at least 1"))
    }
}

impl RenderConfig {
    pub fn from_json_file(path: &Path) -> Result<RenderConfig> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.power < 2 {
            return Err(Error::invalid(
                "power",
                format!("{} is below 2", self.power),
            ));
        }
        nonzero("max_iterations", self.max_iterations)?;
        nonzero("max_steps", self.max_steps)?;
        nonzero("samples", self.samples)?;
        nonzero("width", self.width)?;
        nonzero("height", self.height)?;
        if !(self.bailout.is_finite() && self.bailout > 1.) {
            return Err(Error::invalid(
                "bailout",
                format!("{} must exceed 1", self.bailout),
            ));
        }
        positive("max_dist", self.max_dist)?;
        positive("eps", self.eps)?;
        positive("delta", self.delta)?;
        positive("camera_distance", self.camera_distance)?;
        if !(self.fov > 0. && self.fov < PI) {
            return Err(Error::invalid(
                "fov",
                format!("{} is not in (0, pi)", self.fov),
            ));
        }
        if let Some(aspect) = self.aspect_ratio {
            positive("aspect_ratio", aspect)?;
        }
        Ok(())
    }

    pub fn bulb(&self) -> Mandelbulb {
        Mandelbulb {
            power: self.power,
            max_iterations: self.max_iterations,
            bailout: self.bailout,
        }
    }

    pub fn march_params(&self) -> MarchParams {
        MarchParams {
            max_dist: self.max_dist,
            max_steps: self.max_steps,
            eps: self.eps,
        }
    }
}

/// Ray outcomes tallied over a frame. Counts rays, so with supersampling
/// the total is `width * height * samples^2`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub hits: u64,
    pub escaped: u64,
    pub exhausted: u64,
    pub degenerate: u64,
}

impl FrameStats {
    fn record(&mut self, result: &MarchResult) {
        match result {
            MarchResult::Hit { .. } => self.hits += 1,
            MarchResult::Miss(MissReason::Escaped) => self.escaped += 1,
            MarchResult::Miss(MissReason::Exhausted) => self.exhausted += 1,
            MarchResult::Miss(MissReason::Degenerate) => self.degenerate += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.hits + self.escaped + self.exhausted + self.degenerate
    }
}

impl AddAssign for FrameStats {
    fn add_assign(&mut self, rhs: FrameStats) {
        self.hits += rhs.hits;
        self.escaped += rhs.escaped;
        self.exhausted += rhs.exhausted;
        self.degenerate += rhs.degenerate;
    }
}

pub struct Renderer {
    config: RenderConfig,
    bulb: Mandelbulb,
    march: MarchParams,
    shader: Lambertian,
    background: V3,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Result<Renderer> {
        config.validate()?;
        log::trace!("renderer config: {config:?}");
        let [r, g, b] = config.background;
        Ok(Renderer {
            bulb: config.bulb(),
            march: config.march_params(),
            shader: Lambertian::new(config.light_dir, config.light_color)?,
            background: v(r as f64, g as f64, b as f64),
            config,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders the bulb as seen from orbit angle `angle`. Pixels whose rays
    /// miss keep the background colour.
    pub fn render_frame(&self, angle: f64, width: u32, height: u32) -> Result<RgbImage> {
        self.render_frame_with_stats(angle, width, height)
            .map(|(img, _)| img)
    }

    pub fn render_frame_with_stats(
        &self,
        angle: f64,
        width: u32,
        height: u32,
    ) -> Result<(RgbImage, FrameStats)> {
        let aspect_ratio = self
            .config
            .aspect_ratio
            .unwrap_or(width as f64 / height as f64);
        let camera = Camera::orbit(
            angle,
            self.config.camera_distance,
            width,
            height,
            self.config.fov,
            aspect_ratio,
        )?;

        let w = width as usize;
        let pixels = (0..w * height as usize)
            .into_par_iter()
            .map(|i| self.render_pixel(&camera, (i % w) as u32, (i / w) as u32))
            .collect::<Result<Vec<_>>>()?;

        let mut stats = FrameStats::default();
        let mut img = RgbImage::new(width, height);
        for (x, y, p) in img.enumerate_pixels_mut() {
            let (color, s) = pixels[x as usize + y as usize * w];
            *p = color;
            stats += s;
        }
        log::debug!(
            "frame at {angle:.4} rad: {} hits, {} escaped, {} exhausted, {} degenerate",
            stats.hits,
            stats.escaped,
            stats.exhausted,
            stats.degenerate
        );
        Ok((img, stats))
    }

    /// Averages an n-by-n grid of rays starting at the pixel's top-left corner.
    fn render_pixel(&self, camera: &Camera, x: u32, y: u32) -> Result<(Rgb<u8>, FrameStats)> {
        let n = self.config.samples;
        let mut stats = FrameStats::default();
        let mut sum = O;
        for sy in 0..n {
            for sx in 0..n {
                let ray = camera.ray_for(
                    x as f64 + sx as f64 / n as f64,
                    y as f64 + sy as f64 / n as f64,
                )?;
                let (result, color) = self.trace(&ray);
                stats.record(&result);
                sum = sum + color;
            }
        }
        Ok((to_rgb(&mul(1. / (n * n) as f64, &sum)), stats))
    }

    /// Marches a single ray and returns its unquantized colour.
    pub fn trace(&self, ray: &Ray) -> (MarchResult, V3) {
        let result = march(&self.bulb, ray, &self.march);
        let color = match result {
            MarchResult::Hit { point, .. } => {
                self.shader
                    .radiance(&normal(&self.bulb, &point, self.config.delta))
            }
            MarchResult::Miss(_) => self.background,
        };
        (result, color)
    }
}

/// Orbit angle of frame `index` in a loop of `frames` evenly spaced frames.
pub fn frame_angle(index: usize, frames: usize) -> f64 {
    2. * PI * index as f64 / frames as f64
}

/// `frame_000.png`, `frame_001.png`, ... inside `dir`.
pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("frame_{index:03}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small() -> Renderer {
        Renderer::new(RenderConfig {
            background: [10, 20, 30],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn defaults_match_reference_parameters() {
        let c = RenderConfig::default();
        assert_eq!((c.power, c.max_iterations, c.bailout), (8, 100, 2.));
        assert_eq!((c.max_dist, c.max_steps, c.eps), (20., 200, 1e-3));
        assert_eq!((c.width, c.height, c.samples), (400, 300, 1));
        assert_relative_eq!(c.fov, PI / 4.);
        assert_eq!(c.camera_distance, 3.);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn validation_names_the_bad_parameter() {
        let cases: Vec<(&str, RenderConfig)> = vec![
            ("width", RenderConfig { width: 0, ..Default::default() }),
            ("height", RenderConfig { height: 0, ..Default::default() }),
            ("samples", RenderConfig { samples: 0, ..Default::default() }),
            ("power", RenderConfig { power: 1, ..Default::default() }),
            ("max_iterations", RenderConfig { max_iterations: 0, ..Default::default() }),
            ("max_steps", RenderConfig { max_steps: 0, ..Default::default() }),
            ("bailout", RenderConfig { bailout: 1., ..Default::default() }),
            ("eps", RenderConfig { eps: 0., ..Default::default() }),
            ("delta", RenderConfig { delta: f64::NAN, ..Default::default() }),
            ("max_dist", RenderConfig { max_dist: -1., ..Default::default() }),
            ("fov", RenderConfig { fov: 4., ..Default::default() }),
            ("aspect_ratio", RenderConfig { aspect_ratio: Some(0.), ..Default::default() }),
            ("camera_distance", RenderConfig { camera_distance: 0., ..Default::default() }),
        ];
        for (expected, config) in cases {
            match config.validate() {
                Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("{expected}: expected InvalidParameter, got {other:?}"),
            }
        }
        let no_light = RenderConfig {
            light_dir: O,
            ..Default::default()
        };
        assert!(Renderer::new(no_light).is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let c: RenderConfig =
            serde_json::from_str(r#"{ "width": 64, "light_dir": { "x": 0, "y": 1, "z": 0 } }"#)
                .unwrap();
        assert_eq!(c.width, 64);
        assert_eq!(c.height, 300);
        assert_eq!(c.light_dir, v(0., 1., 0.));
        assert_eq!(c.aspect_ratio, None);
    }

    #[test]
    fn center_hits_and_corners_keep_background() {
        let (img, stats) = small().render_frame_with_stats(0., 40, 30).unwrap();
        assert_eq!(img.dimensions(), (40, 30));
        assert_ne!(*img.get_pixel(20, 15), Rgb([10, 20, 30]));
        assert_eq!(*img.get_pixel(0, 0), Rgb([10, 20, 30]));
        assert_eq!(*img.get_pixel(39, 29), Rgb([10, 20, 30]));
        assert_eq!(stats.total(), 40 * 30);
        assert!(stats.hits > 0 && stats.escaped > 0);
        assert_eq!(stats.degenerate, 0);
    }

    #[test]
    fn rendering_is_deterministic() {
        let r = small();
        let a = r.render_frame(1.3, 24, 18).unwrap();
        let b = r.render_frame(1.3, 24, 18).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn supersampling_traces_more_rays() {
        let r = Renderer::new(RenderConfig {
            samples: 2,
            ..Default::default()
        })
        .unwrap();
        let (img, stats) = r.render_frame_with_stats(0.5, 16, 12).unwrap();
        assert_eq!(stats.total(), 16 * 12 * 4);
        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn zero_sized_frames_are_rejected() {
        let r = small();
        assert!(r.render_frame(0., 0, 10).is_err());
        assert!(r.render_frame(0., 10, 0).is_err());
    }

    #[test]
    fn animation_angles_and_paths() {
        assert_eq!(frame_angle(0, 30), 0.);
        assert_relative_eq!(frame_angle(15, 30), PI);
        assert_relative_eq!(frame_angle(29, 30), 2. * PI * 29. / 30.);
        assert_eq!(
            frame_path(Path::new("animation"), 7),
            Path::new("animation").join("frame_007.png")
        );
    }
}
