//! Follow camera bound to the live agent.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{non_negative, ConfigError};
use crate::interfaces::{AgentHandle, CameraFollow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera position relative to the followed agent.
    pub offset: Vec3,
    /// Exponential approach rate in 1/s. Zero freezes the camera.
    pub smoothing: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 2.0, -12.0),
            smoothing: 6.0,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("camera smoothing", self.smoothing)
    }
}

/// Tracks one agent and eases toward it.
#[derive(Debug, Clone)]
pub struct FollowCamera {
    config: CameraConfig,
    target: Option<AgentHandle>,
    position: Vec3,
}

impl FollowCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            position: config.offset,
            config,
            target: None,
        }
    }

    pub fn target(&self) -> Option<AgentHandle> {
        self.target
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Ease toward the target's position. `None` (no live agent) holds still.
    pub fn update(&mut self, dt: f32, target_position: Option<Vec3>) {
        let Some(target) = target_position else {
            return;
        };
        let goal = target + self.config.offset;
        let t = 1.0 - (-self.config.smoothing * dt).exp();
        self.position = self.position.lerp(goal, t);
    }
}

impl CameraFollow for FollowCamera {
    fn set_target(&mut self, agent: AgentHandle) {
        log::debug!("camera following {:?}", agent);
        self.target = Some(agent);
    }
}
