//! Demo configuration.
//!
//! Every tunable of the demo lives in [`DemoConfig`], a Bevy resource with
//! defaults matching the classic tower setup. A JSON file can override any
//! subset of fields:
//!
//! ```ignore
//! use jenga_core::DemoConfig;
//!
//! let config = DemoConfig::load("config/tower.json")?;
//! config.save("config/tower_copy.json")?;
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::tower::TowerLayout;

/// Errors that can occur while loading or saving a config file.
#[derive(Debug)]
pub enum ConfigError {
    /// File system error
    Io(std::io::Error),
    /// JSON (de)serialization error
    Json(serde_json::Error),
    /// Values parsed but are not usable
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Window settings.
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
            title: "Jenga".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical gravity (units/sec^2, negative = down)
    pub gravity: f32,
    /// Fixed simulation rate in steps per second
    pub fixed_hz: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -30.0,
            fixed_hz: 120.0,
        }
    }
}

impl PhysicsConfig {
    /// Length of one physics tick in seconds.
    pub fn timestep(&self) -> f32 {
        (1.0 / self.fixed_hz) as f32
    }
}

/// Perspective camera placement. Shared by the render camera and the pick rays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub eye: [f32; 3],
    pub look_at: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 35.0,
            near: 1.0,
            far: 1000.0,
            eye: [25.0, 20.0, 25.0],
            look_at: [0.0, 7.0, 0.0],
        }
    }
}

/// Drag behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Proportional gain from position error to commanded velocity
    pub gain: f32,
    /// Side length of the invisible drag plane
    pub ground_plane_size: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            gain: 5.0,
            ground_plane_size: 150.0,
        }
    }
}

/// Hand tracking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Pinch strength above which the hand counts as pinched
    pub pinch_threshold: f32,
    /// Frames buffered between a tracker bridge and the app
    pub channel_capacity: usize,
    /// Drive a virtual hand from mouse + Space
    pub emulate_with_keyboard: bool,
    /// Normalized depth reported by the emulated hand
    pub emulated_depth: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.70,
            channel_capacity: 64,
            emulate_with_keyboard: false,
            emulated_depth: 0.5,
        }
    }
}

/// Friction/restitution pair for a collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub friction: f32,
    pub restitution: f32,
}

/// The static table the tower stands on. Its top face sits at y = 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub size: [f32; 3],
    pub material: SurfaceMaterial,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            size: [50.0, 1.0, 50.0],
            // high friction, low restitution
            material: SurfaceMaterial {
                friction: 0.9,
                restitution: 0.2,
            },
        }
    }
}

impl TableConfig {
    pub fn half_extents(&self) -> Vec3 {
        Vec3::from_array(self.size) * 0.5
    }

    /// Center of the table box.
    pub fn center(&self) -> Vec3 {
        Vec3::new(0.0, -self.size[1] * 0.5, 0.0)
    }
}

/// Root configuration resource.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub physics: PhysicsConfig,
    pub camera: CameraConfig,
    pub interaction: InteractionConfig,
    pub gesture: GestureConfig,
    pub tower: TowerLayout,
    pub table: TableConfig,
    pub block_material: SurfaceMaterial,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            physics: PhysicsConfig::default(),
            camera: CameraConfig::default(),
            interaction: InteractionConfig::default(),
            gesture: GestureConfig::default(),
            tower: TowerLayout::default(),
            table: TableConfig::default(),
            // medium friction, medium restitution
            block_material: SurfaceMaterial {
                friction: 0.4,
                restitution: 0.4,
            },
        }
    }
}

impl DemoConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let config: DemoConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Config from the file named by the first command line argument.
    ///
    /// Without an argument this is the default config.
    pub fn from_args() -> ConfigResult<Self> {
        match std::env::args().nth(1) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Config from an optional file, falling back to defaults when the file is
    /// unusable. The outcome is kept for [`report_config_load`], since this
    /// runs before logging is set up.
    pub fn load_or_default(path: Option<&Path>) -> (Self, ConfigLoadReport) {
        let Some(path) = path else {
            return (Self::default(), ConfigLoadReport::default());
        };
        let (config, error) = match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        };
        let report = ConfigLoadReport {
            path: Some(path.to_path_buf()),
            error,
        };
        (config, report)
    }

    /// [`Self::load_or_default`] on the first command line argument.
    pub fn from_args_or_default() -> (Self, ConfigLoadReport) {
        let path = std::env::args().nth(1).map(PathBuf::from);
        Self::load_or_default(path.as_deref())
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.physics.fixed_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed_hz must be positive, got {}",
                self.physics.fixed_hz
            )));
        }
        if !(self.interaction.gain > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "drag gain must be positive, got {}",
                self.interaction.gain
            )));
        }
        if !(self.interaction.ground_plane_size > 0.0) {
            return Err(ConfigError::Invalid(
                "ground plane size must be positive".to_string(),
            ));
        }
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov must be in (0, 180) degrees, got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.near > 0.0 && camera.near < camera.far) {
            return Err(ConfigError::Invalid(format!(
                "camera planes must satisfy 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }
        if self.tower.rows == 0 || self.tower.columns == 0 {
            return Err(ConfigError::Invalid(
                "tower needs at least one row and one column".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.gesture.pinch_threshold) {
            return Err(ConfigError::Invalid(format!(
                "pinch threshold must be in [0, 1], got {}",
                self.gesture.pinch_threshold
            )));
        }
        if self.gesture.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "hand frame channel needs capacity".to_string(),
            ));
        }
        Ok(())
    }
}

/// How the startup config was obtained.
#[derive(Resource, Debug, Default)]
pub struct ConfigLoadReport {
    /// File that was requested, `None` when running on defaults
    pub path: Option<PathBuf>,
    /// Why the file was rejected in favour of defaults
    pub error: Option<ConfigError>,
}

impl ConfigLoadReport {
    pub fn fell_back(&self) -> bool {
        self.error.is_some()
    }
}

/// Log the startup config outcome once logging is up.
pub fn report_config_load(report: Res<ConfigLoadReport>) {
    match (&report.path, &report.error) {
        (Some(path), Some(e)) => {
            warn!("Config {:?} not usable, running on defaults: {}", path, e)
        }
        (Some(path), None) => info!("Loaded config from {:?}", path),
        (None, _) => debug!("No config file given, running on defaults"),
    }
}
