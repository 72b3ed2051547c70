//! Configuration management for the smile lab application

use crate::constants::{
    DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_DURATION_SECS, DEFAULT_EXPORT_FILE_NAME, DEFAULT_FPS,
    DEFAULT_GLASSES_SCALE, DEFAULT_MOUTH_OPEN_THRESHOLD, DEFAULT_PARTICLE_COLOR_MIN, DEFAULT_PARTICLE_DECAY,
    DEFAULT_PARTICLE_JITTER, DEFAULT_PARTICLE_SIZE, DEFAULT_PARTICLE_VX, DEFAULT_PARTICLE_VY, DEFAULT_TICK_INTERVAL_MS,
    VIDEO_HEIGHT, VIDEO_TOP_OFFSET, VIDEO_WIDTH,
};
use crate::landmarks::BackendKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Asset file paths
    pub assets: AssetConfig,

    /// Video capture parameters
    pub capture: CaptureConfig,

    /// Display canvas layout
    pub layout: LayoutConfig,

    /// Mouth gesture detection
    pub gesture: GestureConfig,

    /// Glasses overlay
    pub overlay: OverlayConfig,

    /// Particle emission and decay
    pub particles: ParticleConfig,

    /// Countdown session
    pub session: SessionConfig,

    /// Snapshot export
    pub export: ExportConfig,

    /// Detection backend selection
    pub backend: BackendConfig,
}

/// Asset file paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Full-canvas background image
    pub background: PathBuf,

    /// Glasses images, one picked at random per session
    pub glasses: Vec<PathBuf>,

    /// Looping ambient music track
    pub music: PathBuf,
}

/// Video capture parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Native capture width
    pub width: u32,

    /// Native capture height
    pub height: u32,

    /// Camera index (camera feature only)
    pub camera_index: i32,

    /// Target frames per second
    pub target_fps: u32,
}

/// Display canvas layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Initial canvas width
    pub canvas_width: u32,

    /// Initial canvas height
    pub canvas_height: u32,

    /// Distance from the top of the canvas to the video rectangle
    pub video_top_offset: f32,
}

/// Mouth gesture parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Mouth counts as open when the lip gap is strictly above this (display pixels).
    /// Tuned for 640x480 capture.
    pub mouth_open_threshold: f32,
}

/// Glasses overlay parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Glasses width as a multiple of the outer eye-to-eye distance
    pub eye_distance_scale: f32,
}

/// Particle emission and decay parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Maximum horizontal jitter around the emission point
    pub jitter: f32,

    /// Horizontal velocity range per step
    pub velocity_x: [f32; 2],

    /// Vertical velocity range per step (negative is upward)
    pub velocity_y: [f32; 2],

    /// Diameter range
    pub size: [f32; 2],

    /// Lowest value of each color channel
    pub color_min: u8,

    /// Opacity lost per rendered frame
    pub decay: i32,
}

/// Countdown session parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Duration preselected in the duration selector
    pub default_duration_secs: u32,

    /// Wall-clock time between countdown ticks
    pub tick_interval_ms: u64,

    /// Encouragement phrases, one shown per run
    pub phrases: Vec<String>,
}

/// Snapshot export parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the snapshot is written to
    pub output_dir: PathBuf,

    /// Snapshot file name
    pub file_name: String,
}

/// Detection backend parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Landmark scheme of the backend
    pub kind: BackendKind,

    /// Run detection on a worker thread instead of inline
    pub asynchronous: bool,

    /// Recorded landmark track for the replay backend
    pub recording: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            background: PathBuf::from("assets/background.png"),
            glasses: (1..=3).map(|i| PathBuf::from(format!("assets/glasses{i}.png"))).collect(),
            music: PathBuf::from("assets/music.mp3"),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: VIDEO_WIDTH,
            height: VIDEO_HEIGHT,
            camera_index: 0,
            target_fps: DEFAULT_FPS,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            video_top_offset: VIDEO_TOP_OFFSET,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            mouth_open_threshold: DEFAULT_MOUTH_OPEN_THRESHOLD,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            eye_distance_scale: DEFAULT_GLASSES_SCALE,
        }
    }
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            jitter: DEFAULT_PARTICLE_JITTER,
            velocity_x: [DEFAULT_PARTICLE_VX.0, DEFAULT_PARTICLE_VX.1],
            velocity_y: [DEFAULT_PARTICLE_VY.0, DEFAULT_PARTICLE_VY.1],
            size: [DEFAULT_PARTICLE_SIZE.0, DEFAULT_PARTICLE_SIZE.1],
            color_min: DEFAULT_PARTICLE_COLOR_MIN,
            decay: DEFAULT_PARTICLE_DECAY,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: DEFAULT_DURATION_SECS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            phrases: [
                "Brushing is your superpower!",
                "A healthy smile shines brighter.",
                "Clean teeth, happy smile!",
                "Brushing is fun, give it a try!",
                "Your mouth is a treasure, take care of it!",
                "Every brush counts.",
                "Strong teeth, happy kids.",
                "Wake up your smile with a brush!",
                "Twice a day, every day.",
                "Brushing is playing at being healthy.",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Ibug68,
            asynchronous: true,
            recording: None,
        }
    }
}

impl ExportConfig {
    /// Full path of the exported snapshot
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration values. Asset presence is checked at load time.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        if self.assets.glasses.is_empty() {
            return Err(Error::ConfigError("At least one glasses image is required".to_string()));
        }

        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(Error::ConfigError("Capture size must be non-zero".to_string()));
        }
        if self.capture.target_fps == 0 {
            return Err(Error::ConfigError("Target FPS must be greater than 0".to_string()));
        }
        if self.layout.canvas_width == 0 || self.layout.canvas_height == 0 {
            return Err(Error::ConfigError("Canvas size must be non-zero".to_string()));
        }

        if !(self.gesture.mouth_open_threshold.is_finite() && self.gesture.mouth_open_threshold > 0.0) {
            return Err(Error::ConfigError(
                "Mouth open threshold must be a positive number".to_string(),
            ));
        }
        if !(self.overlay.eye_distance_scale.is_finite() && self.overlay.eye_distance_scale > 0.0) {
            return Err(Error::ConfigError(
                "Eye distance scale must be a positive number".to_string(),
            ));
        }

        let p = &self.particles;
        if !(p.jitter.is_finite() && p.jitter >= 0.0) {
            return Err(Error::ConfigError("Particle jitter must be non-negative".to_string()));
        }
        for (name, range) in [("velocity_x", p.velocity_x), ("velocity_y", p.velocity_y), ("size", p.size)] {
            if !(range[0].is_finite() && range[1].is_finite() && range[0] <= range[1]) {
                return Err(Error::ConfigError(format!(
                    "Particle {name} range must be finite and ordered"
                )));
            }
        }
        if p.size[0] <= 0.0 {
            return Err(Error::ConfigError("Particle size must be positive".to_string()));
        }
        if p.decay <= 0 {
            return Err(Error::ConfigError("Particle decay must be greater than 0".to_string()));
        }

        if self.session.default_duration_secs == 0 {
            return Err(Error::ConfigError("Session duration must be at least 1 second".to_string()));
        }
        if self.session.tick_interval_ms == 0 {
            return Err(Error::ConfigError("Tick interval must be greater than 0".to_string()));
        }

        if self.export.file_name.trim().is_empty() {
            return Err(Error::ConfigError("Export file name must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Healthy Smile Lab Configuration

# Asset paths
assets:
  background: "assets/background.png"
  glasses:
    - "assets/glasses1.png"
    - "assets/glasses2.png"
    - "assets/glasses3.png"
  music: "assets/music.mp3"

# Video capture
capture:
  width: 640
  height: 480
  camera_index: 0
  target_fps: 30

# Display canvas
layout:
  canvas_width: 1280
  canvas_height: 720
  video_top_offset: 150.0

# Mouth gesture (display pixels, tuned for 640x480)
gesture:
  mouth_open_threshold: 20.0

# Glasses overlay
overlay:
  eye_distance_scale: 2.5

# Particles
particles:
  jitter: 30.0
  velocity_x: [-2.0, 2.0]
  velocity_y: [-3.0, -1.0]
  size: [4.0, 8.0]
  color_min: 100
  decay: 3

# Countdown session
session:
  default_duration_secs: 30
  tick_interval_ms: 1000
  phrases:
    - "Brushing is your superpower!"
    - "Twice a day, every day."

# Snapshot export
export:
  output_dir: "."
  file_name: "my_smile_with_glasses.png"

# Detection backend (ibug68 or clm71)
backend:
  kind: ibug68
  asynchronous: true
  recording: null
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.gesture.mouth_open_threshold, 20.0);
        assert_eq!(config.overlay.eye_distance_scale, 2.5);
        assert_eq!(config.particles, ParticleConfig::default());
        assert_eq!(config.assets.glasses.len(), 3);
        assert_eq!(config.backend.kind, BackendKind::Ibug68);
        assert_eq!(config.session.phrases.len(), 2);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("backend:\n  kind: clm71\n  asynchronous: false\n  recording: null\n").unwrap();
        assert_eq!(config.backend.kind, BackendKind::Clm71);
        assert!(!config.backend.asynchronous);
        assert_eq!(config.session.default_duration_secs, 30);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(Config::from_yaml("capture: [1, 2"), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.assets.glasses.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.gesture.mouth_open_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.particles.velocity_y = [-1.0, -3.0];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.particles.decay = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.session.default_duration_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.capture.target_fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let yaml = "session:\n  default_duration_secs: 10\nbackend:\n  kind: clm71\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.session.default_duration_secs, 10);
        assert_eq!(config.session.tick_interval_ms, SessionConfig::default().tick_interval_ms);
        assert_eq!(config.backend.kind, BackendKind::Clm71);
        assert!(config.backend.asynchronous);
        assert_eq!(config.capture.width, CaptureConfig::default().width);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_round_trip_through_file() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.session.default_duration_secs = 45;
        config.to_file(file.path()).unwrap();
        let loaded = Config::from_file(file.path()).unwrap();
        assert_eq!(loaded.session.default_duration_secs, 45);
    }

    #[test]
    fn test_export_path() {
        let export = ExportConfig {
            output_dir: PathBuf::from("out"),
            file_name: "snap.png".to_string(),
        };
        assert_eq!(export.path(), PathBuf::from("out").join("snap.png"));
    }
}
