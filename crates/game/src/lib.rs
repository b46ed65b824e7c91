//! Polarity: a 2.5D platformer whose world flips between two obstacle sets.
//!
//! The agent runs, jumps, wall-jumps and dashes under [`locomotion`]; a
//! [`shift`] swaps the solid obstacle group and turns the world half a turn
//! around the agent. [`stage`] backs both with hecs and Rapier, and [`host`]
//! wires them to the input and physics ticks.

pub mod camera;
pub mod config;
pub mod dash;
pub mod host;
pub mod interfaces;
pub mod locomotion;
pub mod shift;
pub mod stage;

pub use camera::{CameraConfig, FollowCamera};
pub use config::{ConfigError, GameConfig, RunConfig, ScriptKey, ScriptedInput, StageConfig};
pub use dash::{DashEvent, DashTimers};
pub use host::Game;
pub use interfaces::*;
pub use locomotion::{
    AgentState, LocomotionConfig, LocomotionController, LocomotionState, MovementPhase, WallSide,
};
pub use shift::{Polarity, ShiftConfig, ShiftProgress, ShiftSequencer};
pub use stage::{AgentBody, BodyProxy, ObstacleBlock, ObstacleGroup, Stage};
