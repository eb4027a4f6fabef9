//! # Unified Configuration System
//!
//! All configuration structures for the engine in one place: frame loop
//! behaviour, window geometry (used for the projection aspect ratio), the
//! renderer's projection and shader location, and physics defaults.
//!
//! Every struct derives `Serialize`/`Deserialize`, so an [`ApplicationConfig`]
//! round-trips through TOML or RON via the [`Config`] trait.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Core frame loop behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine (`RUST_LOG` overrides it)
    pub log_level: String,
    /// Target FPS for frame rate limiting
    pub target_fps: Option<u32>,
    /// Stop the loop after this many frames (headless runs and tests)
    pub max_frames: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            target_fps: Some(60),
            max_frames: None,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set target FPS (`None` runs unthrottled)
    pub fn with_target_fps(mut self, fps: Option<u32>) -> Self {
        self.target_fps = fps;
        self
    }

    /// Stop after a fixed number of frames
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
}

impl WindowConfig {
    /// Width over height
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Ping Pong".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// # Renderer Configuration
///
/// Projection parameters and where shader sources are looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Distance to the near clipping plane
    pub near: f32,
    /// Distance to the far clipping plane
    pub far: f32,
    /// Color the frame is cleared to (RGBA)
    pub clear_color: [f32; 4],
    /// Directory holding `<name>.shader` files
    pub shader_dir: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            shader_dir: "resources/shaders".to_string(),
        }
    }
}

/// # Physics Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward velocity added per step by gravity animators
    pub gravity: f32,
    /// Treat volume pairs without a collision test as non-colliding
    pub suppress_unsupported_collisions: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.002,
            suppress_unsupported_collisions: false,
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Frame loop configuration
    pub engine: EngineConfig,
    /// Window configuration
    pub window: WindowConfig,
    /// Rendering configuration
    pub renderer: RendererConfig,
    /// Physics configuration
    pub physics: PhysicsConfig,
}

impl ApplicationConfig {
    /// Create a configuration with defaults and the given window title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            window: WindowConfig {
                title: title.into(),
                ..WindowConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        let renderer = &self.renderer;
        if !(renderer.fov_degrees > 0.0 && renderer.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "field of view must be in (0, 180) degrees, got {}",
                renderer.fov_degrees
            )));
        }
        if !(renderer.near > 0.0 && renderer.far > renderer.near) {
            return Err(ConfigError::Invalid(format!(
                "clipping planes must satisfy 0 < near < far, got near={} far={}",
                renderer.near, renderer.far
            )));
        }
        if !self.physics.gravity.is_finite() {
            return Err(ConfigError::Invalid("gravity must be finite".to_string()));
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ApplicationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_planes() {
        let mut config = ApplicationConfig::default();
        config.renderer.near = 10.0;
        config.renderer.far = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ApplicationConfig::new("Test Table");
        config.engine = config.engine.with_max_frames(12).with_target_fps(Some(30));
        config.physics.gravity = 0.5;

        let text = config.to_string_with_format("pong.toml").unwrap();
        let parsed = ApplicationConfig::from_str_with_format(&text, "pong.toml").unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_ron_partial_uses_defaults() {
        let parsed =
            ApplicationConfig::from_str_with_format("(physics: (gravity: 1.5))", "pong.ron").unwrap();
        assert_eq!(parsed.physics.gravity, 1.5);
        assert_eq!(parsed.window, WindowConfig::default());
    }

    #[test]
    fn test_unknown_extension() {
        let result = ApplicationConfig::from_str_with_format("", "pong.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
