//! Narrow seams to the collaborators the movement core does not own.
//!
//! The locomotion controller and the shift sequencer only ever talk to the
//! world through these traits. [`crate::stage::Stage`] implements them on top
//! of hecs and Rapier; tests implement them with plain structs.

use glam::{Quat, Vec3};
use hecs::Entity;
use physics::CollisionGroup;
use serde::{Deserialize, Serialize};

use crate::shift::Polarity;

/// Layer mask used by environment probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionFilter(pub u32);

impl CollisionFilter {
    pub const ENVIRONMENT: Self = Self(CollisionGroup::Environment as u32);
    pub const AGENT: Self = Self(CollisionGroup::Agent as u32);
    pub const WHITE: Self = Self(CollisionGroup::WhiteObstacle as u32);
    pub const BLACK: Self = Self(CollisionGroup::BlackObstacle as u32);
    pub const OBSTACLES: Self = Self(Self::WHITE.0 | Self::BLACK.0);
    pub const SOLID: Self = Self(Self::ENVIRONMENT.0 | Self::OBSTACLES.0);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Reference to a live agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentHandle(pub Entity);

/// Velocity and position access for the agent's body.
pub trait PhysicsBody {
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    /// Instantaneous, mass-scaled change of momentum.
    fn apply_impulse(&mut self, impulse: Vec3);
    fn position(&self) -> Vec3;
}

/// Contact probes against the solid world.
pub trait EnvironmentQuery {
    /// Does a sphere at `position` overlap anything matching `filter`?
    fn is_grounded(&self, position: Vec3, radius: f32, filter: CollisionFilter) -> bool;
    /// Does a ray from `origin` along `direction` hit anything within `distance`?
    /// A zero-length `direction` reports no contact.
    fn wall_contact(&self, origin: Vec3, direction: Vec3, distance: f32, filter: CollisionFilter) -> bool;
}

/// Polled input. Edge events are true for exactly one tick per press.
pub trait InputSource {
    fn horizontal(&self) -> f32;
    fn jump_pressed(&self) -> bool;
    fn dash_pressed(&self) -> bool;
    fn shift_pressed(&self) -> bool;
}

/// One tick's worth of sampled input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    /// Horizontal axis, clamped to `[-1, 1]`.
    pub horizontal: f32,
    pub jump: bool,
    pub dash: bool,
    pub shift: bool,
}

impl InputFrame {
    pub fn sample(source: &dyn InputSource) -> Self {
        Self {
            horizontal: source.horizontal().clamp(-1.0, 1.0),
            jump: source.jump_pressed(),
            dash: source.dash_pressed(),
            shift: source.shift_pressed(),
        }
    }

    /// Only horizontal input, no edge events.
    pub fn axis(horizontal: f32) -> Self {
        Self {
            horizontal: horizontal.clamp(-1.0, 1.0),
            ..Default::default()
        }
    }
}

impl InputSource for input::InputState {
    fn horizontal(&self) -> f32 {
        self.horizontal_axis()
    }

    fn jump_pressed(&self) -> bool {
        self.is_jump_pressed()
    }

    fn dash_pressed(&self) -> bool {
        self.is_dash_pressed()
    }

    fn shift_pressed(&self) -> bool {
        self.is_shift_pressed()
    }
}

/// Receives the agent the camera should track.
pub trait CameraFollow {
    fn set_target(&mut self, agent: AgentHandle);
}

/// Creates and destroys agents.
pub trait AgentFactory {
    fn spawn(&mut self, position: Vec3, orientation: Quat) -> AgentHandle;
    fn despawn(&mut self, agent: AgentHandle);
    /// Current position of a live agent; `None` once despawned.
    fn agent_position(&self, agent: AgentHandle) -> Option<Vec3>;
}

/// Parent relation of an obstacle group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// Child of the anchor; follows its position and rotation.
    Anchor,
    /// Free-standing at its last world placement.
    Detached,
}

/// Activation and parenting of the two obstacle groups.
pub trait ObstacleControl {
    fn set_active(&mut self, group: Polarity, active: bool);
    fn set_parent(&mut self, group: Polarity, attachment: Attachment);
}

/// The shared pivot the obstacle groups rotate around.
pub trait AnchorControl {
    fn anchor_position(&self) -> Vec3;
    fn set_anchor_position(&mut self, position: Vec3);
    fn anchor_rotation(&self) -> Quat;
    fn set_anchor_rotation(&mut self, rotation: Quat);
}

/// Everything the shift sequencer manipulates besides the camera.
pub trait ShiftWorld: AgentFactory + ObstacleControl + AnchorControl {}

impl<T: AgentFactory + ObstacleControl + AnchorControl> ShiftWorld for T {}
