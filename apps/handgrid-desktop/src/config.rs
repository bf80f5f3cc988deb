use anyhow::{Context, Result, bail};
use glam::Vec3;
use handgrid_kernel::{AnimationDriver, Easing, HandLayout, IdleSpin, Repeat, Tween};
use handgrid_render::SceneSettings;
use handgrid_render_wgpu::OrbitCamera;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Hand Grid".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub size: f32,
    pub divisions: u32,
    /// Scroll speed in world units per second.
    pub speed: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 20.0,
            divisions: 10,
            speed: 1.0,
        }
    }
}

/// Curl tween. Angles are fractions of π.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurlConfig {
    pub from_turns: f32,
    pub to_turns: f32,
    pub half_period_ms: u64,
    pub easing: Easing,
    pub phase_step_ms: f32,
}

impl Default for CurlConfig {
    fn default() -> Self {
        Self {
            from_turns: 0.075,
            to_turns: 0.45,
            half_period_ms: 4000,
            easing: Easing::QuadraticInOut,
            phase_step_ms: 0.0,
        }
    }
}

impl CurlConfig {
    pub fn driver(&self) -> AnimationDriver {
        let tween = Tween::new(
            self.from_turns * PI,
            self.to_turns * PI,
            Duration::from_millis(self.half_period_ms),
        )
        .easing(self.easing)
        .repeat(Repeat::Forever)
        .yoyo(true);
        AnimationDriver::new(tween).with_phase_step(self.phase_step_ms / 1000.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub damping: f32,
    pub zoom: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(-5.0, 10.0, 20.0),
            fov_degrees: 60.0,
            near: 1.0,
            far: 100.0,
            damping: 0.05,
            zoom: false,
        }
    }
}

impl CameraConfig {
    pub fn camera(&self) -> OrbitCamera {
        let mut camera = OrbitCamera::from_position(self.position, Vec3::ZERO);
        camera.fov = self.fov_degrees.to_radians();
        camera.near = self.near;
        camera.far = self.far;
        camera.damping = self.damping;
        camera.zoom_enabled = self.zoom;
        camera
    }
}

/// Everything the desktop viewer can be configured with. Missing fields take
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub grid: GridConfig,
    pub curl: CurlConfig,
    pub spin: IdleSpin,
    pub camera: CameraConfig,
    pub hand: HandLayout,
}

impl AppConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self> = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml,
            Some("json") => Self::from_json,
            _ => bail!("unsupported config format: {}", path.display()),
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        parse(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing YAML config")
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing JSON config")
    }

    pub fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            layout: self.hand.clone(),
            grid_size: self.grid.size,
            grid_divisions: self.grid.divisions,
            grid_speed: self.grid.speed,
            driver: self.curl.driver(),
            spin: self.spin,
        }
    }
}
