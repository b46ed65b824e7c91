//! Game configuration (movement tuning, shift timing, camera, headless run). Loaded from config.ron at startup.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::camera::CameraConfig;
use crate::locomotion::LocomotionConfig;
use crate::shift::ShiftConfig;

/// Tuning that fails validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must be finite and not negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("{field} must lie in [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },
    #[error("wall_jump_direction must have a non-zero x or y component")]
    DegenerateWallJump,
}

pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

pub(crate) fn unit_range(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}

/// Agent body shape and mass plus world gravity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub gravity: Vec3,
    pub agent_mass: f32,
    pub agent_half_height: f32,
    pub agent_radius: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            agent_mass: 1.0,
            agent_half_height: 0.5,
            agent_radius: 0.5,
        }
    }
}

impl StageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("agent_mass", self.agent_mass)?;
        positive("agent_radius", self.agent_radius)?;
        non_negative("agent_half_height", self.agent_half_height)
    }
}

/// Key a scripted input event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptKey {
    Left,
    Right,
    Jump,
    Dash,
    Shift,
}

/// One scripted key transition for the headless run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedInput {
    /// Simulated time in seconds at which the event is delivered.
    pub at: f32,
    pub key: ScriptKey,
    pub pressed: bool,
}

impl ScriptedInput {
    pub fn press(at: f32, key: ScriptKey) -> Self {
        Self { at, key, pressed: true }
    }

    pub fn release(at: f32, key: ScriptKey) -> Self {
        Self { at, key, pressed: false }
    }
}

/// Headless host loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Physics rate in Hz.
    pub fixed_rate_hz: f64,
    /// Simulated duration of one input frame in seconds.
    pub frame_delta: f32,
    /// Total simulated time in seconds.
    pub duration: f32,
    /// Key transitions, in any order.
    pub script: Vec<ScriptedInput>,
}

impl Default for RunConfig {
    fn default() -> Self {
        use ScriptKey::*;
        Self {
            fixed_rate_hz: 60.0,
            frame_delta: 1.0 / 60.0,
            duration: 8.0,
            script: vec![
                ScriptedInput::press(0.5, Right),
                ScriptedInput::press(1.0, Jump),
                ScriptedInput::release(1.05, Jump),
                ScriptedInput::press(1.3, Jump),
                ScriptedInput::release(1.35, Jump),
                ScriptedInput::press(2.0, Dash),
                ScriptedInput::release(2.05, Dash),
                ScriptedInput::release(2.5, Right),
                ScriptedInput::press(3.5, Shift),
                ScriptedInput::release(3.55, Shift),
                ScriptedInput::press(3.6, Shift),
                ScriptedInput::release(3.65, Shift),
                ScriptedInput::press(5.5, Left),
                ScriptedInput::press(6.0, Dash),
                ScriptedInput::release(6.05, Dash),
                ScriptedInput::release(7.0, Left),
            ],
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("fixed_rate_hz", self.fixed_rate_hz as f32)?;
        positive("frame_delta", self.frame_delta)?;
        non_negative("duration", self.duration)
    }
}

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub locomotion: LocomotionConfig,
    pub shift: ShiftConfig,
    pub camera: CameraConfig,
    pub stage: StageConfig,
    pub run: RunConfig,
}

impl GameConfig {
    /// Load config from `config.ron` in the working directory.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load config from `path`. A missing file yields defaults; an unreadable, malformed or
    /// out-of-range one logs and yields defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => match Self::from_ron(&data) {
                Ok(c) => match c.validate() {
                    Ok(()) => return c,
                    Err(e) => log::warn!("Rejected config at {:?}: {}, using defaults", path, e),
                },
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {:?}, using defaults", path);
            }
            Err(e) => log::warn!("Could not read config at {:?}: {}, using defaults", path, e),
        }
        Self::default()
    }

    pub fn from_ron(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Save current config to `path`. Logs on error.
    pub fn save(&self, path: &Path) {
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.locomotion.validate()?;
        self.shift.validate()?;
        self.camera.validate()?;
        self.stage.validate()?;
        self.run.validate()
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::Polarity;

    #[test]
    fn defaults_validate() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_ron_fills_in_defaults() {
        let config = GameConfig::from_ron("(locomotion: (max_jumps: 3), shift: (initial_polarity: Black))").unwrap();
        assert_eq!(config.locomotion.max_jumps, 3);
        assert_eq!(config.locomotion.max_speed, 12.0);
        assert_eq!(config.shift.initial_polarity, Polarity::Black);
        assert_eq!(config.run.fixed_rate_hz, 60.0);
    }

    #[test]
    fn ron_round_trip_preserves_script() {
        let config = GameConfig::default();
        let text = ron::ser::to_string(&config).unwrap();
        let back = GameConfig::from_ron(&text).unwrap();
        assert_eq!(back.run.script, config.run.script);
        assert_eq!(back.locomotion.ground_check_offset, config.locomotion.ground_check_offset);
    }

    #[test]
    fn invalid_sections_are_reported() {
        let mut config = GameConfig::default();
        config.run.frame_delta = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "frame_delta", value: 0.0 })
        );
    }

    #[test]
    fn out_of_range_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("polarity-bad-config-{}.ron", std::process::id()));
        std::fs::write(&path, "(locomotion: (max_speed: -1.0, max_jumps: 5))").unwrap();
        let config = GameConfig::load_from(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.locomotion.max_speed, 12.0);
        assert_eq!(config.locomotion.max_jumps, 2);
    }

    #[test]
    fn valid_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("polarity-good-config-{}.ron", std::process::id()));
        std::fs::write(&path, "(locomotion: (max_jumps: 3))").unwrap();
        let config = GameConfig::load_from(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.locomotion.max_jumps, 3);
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut config = GameConfig::default();
        config.run.frame_delta = f32::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "frame_delta", .. })
        ));

        let mut config = GameConfig::default();
        config.run.duration = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Negative { field: "duration", .. })
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = GameConfig::load_from(Path::new("/nonexistent/dir/config.ron"));
        assert_eq!(config.locomotion.max_jumps, 2);
    }
}
