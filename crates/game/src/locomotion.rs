//! Agent locomotion: ground/air/wall movement, jumps, wall jumps and dashes.
//!
//! The phase is recomputed every input tick from the environment probes
//! rather than stored as a transition graph. Dashing is an overlay that
//! suppresses continuous force application whatever the phase.
//!
//! Per tick the host calls [`LocomotionController::on_input_tick`] (timers,
//! probes, phase, jump and dash) and then zero or more
//! [`LocomotionController::on_physics_tick`] (force, clamp, idle damping).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{non_negative, positive, unit_range, ConfigError};
use crate::dash::{DashEvent, DashTimers};
use crate::interfaces::{CollisionFilter, EnvironmentQuery, InputFrame, PhysicsBody};

/// Movement tuning for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Horizontal velocity gained per second of full input on the ground.
    pub move_force: f32,
    /// Fraction of `move_force` available while not grounded.
    pub air_control_multiplier: f32,
    /// Horizontal speed limit.
    pub max_speed: f32,

    pub jump_force: f32,
    pub max_jumps: u32,

    /// Horizontal speed set at dash start.
    pub dash_force: f32,
    /// Seconds the dash overlay stays on.
    pub dash_duration: f32,
    /// Seconds after the dash ends before the next one is allowed.
    pub dash_cooldown: f32,

    pub wall_jump_force: f32,
    /// Away-from-wall and upward components; only x and y are used.
    pub wall_jump_direction: Vec3,
    pub wall_check_distance: f32,
    pub wall_layers: CollisionFilter,

    pub ground_check_radius: f32,
    /// Offset from the agent's position to the ground probe. `None` disables ground detection.
    pub ground_check_offset: Option<Vec3>,
    pub ground_layers: CollisionFilter,

    /// Inputs with a smaller magnitude count as idle.
    pub idle_threshold: f32,
    /// Per-tick horizontal damping while idle on the ground.
    pub idle_damping: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            move_force: 60.0,
            air_control_multiplier: 0.5,
            max_speed: 12.0,
            jump_force: 10.0,
            max_jumps: 2,
            dash_force: 20.0,
            dash_duration: 0.15,
            dash_cooldown: 1.0,
            wall_jump_force: 12.0,
            wall_jump_direction: Vec3::new(1.0, 1.0, 0.0),
            wall_check_distance: 0.6,
            wall_layers: CollisionFilter::SOLID,
            ground_check_radius: 0.3,
            ground_check_offset: Some(Vec3::new(0.0, -1.0, 0.0)),
            ground_layers: CollisionFilter::SOLID,
            idle_threshold: 0.01,
            idle_damping: 0.9,
        }
    }
}

impl LocomotionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("move_force", self.move_force)?;
        unit_range("air_control_multiplier", self.air_control_multiplier)?;
        positive("max_speed", self.max_speed)?;
        non_negative("jump_force", self.jump_force)?;
        non_negative("dash_force", self.dash_force)?;
        non_negative("dash_duration", self.dash_duration)?;
        non_negative("dash_cooldown", self.dash_cooldown)?;
        non_negative("wall_jump_force", self.wall_jump_force)?;
        non_negative("wall_check_distance", self.wall_check_distance)?;
        non_negative("ground_check_radius", self.ground_check_radius)?;
        non_negative("idle_threshold", self.idle_threshold)?;
        unit_range("idle_damping", self.idle_damping)?;
        if self.wall_jump_direction.x == 0.0 && self.wall_jump_direction.y == 0.0 {
            return Err(ConfigError::DegenerateWallJump);
        }
        Ok(())
    }
}

/// Ground contact as of the last input tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementPhase {
    Grounded,
    #[default]
    Airborne,
}

/// Side of the agent the wall probe hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    Left,
    Right,
}

/// Observable locomotion state, dash overlay included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocomotionState {
    Grounded,
    Airborne,
    WallAdjacent,
    Dashing,
}

/// Per-agent movement state.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    /// Mirrored from the body; not authoritative.
    pub velocity: Vec3,
    /// Mirrored from the body; not authoritative.
    pub position: Vec3,
    /// Always within `0..=max_jumps`.
    pub jump_count: u32,
    pub movement_phase: MovementPhase,
    pub wall_contact: Option<WallSide>,
    pub can_dash: bool,
    pub is_dashing: bool,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            position: Vec3::ZERO,
            jump_count: 0,
            movement_phase: MovementPhase::Airborne,
            wall_contact: None,
            can_dash: true,
            is_dashing: false,
        }
    }
}

impl AgentState {
    pub fn is_grounded(&self) -> bool {
        self.movement_phase == MovementPhase::Grounded
    }

    /// Airborne with a wall on the probed side.
    pub fn is_wall_adjacent(&self) -> bool {
        !self.is_grounded() && self.wall_contact.is_some()
    }
}

/// `sign` with zero mapped to zero.
fn sign_or_zero(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Movement state machine for a single live agent.
#[derive(Debug, Clone)]
pub struct LocomotionController {
    config: LocomotionConfig,
    state: AgentState,
    timers: DashTimers,
    /// Last non-zero input direction, `+1` until one is seen.
    facing: f32,
    /// Horizontal input latched by the last input tick for the physics ticks.
    input_x: f32,
}

impl LocomotionController {
    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            config,
            state: AgentState::default(),
            timers: DashTimers::new(),
            facing: 1.0,
            input_x: 0.0,
        }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn movement_phase(&self) -> MovementPhase {
        self.state.movement_phase
    }

    pub fn locomotion_state(&self) -> LocomotionState {
        if self.state.is_dashing {
            LocomotionState::Dashing
        } else if self.state.is_grounded() {
            LocomotionState::Grounded
        } else if self.state.wall_contact.is_some() {
            LocomotionState::WallAdjacent
        } else {
            LocomotionState::Airborne
        }
    }

    pub fn is_dashing(&self) -> bool {
        self.state.is_dashing
    }

    pub fn can_dash(&self) -> bool {
        self.state.can_dash
    }

    /// Input-rate entry point: timers, probes, phase, then jump and dash.
    pub fn on_input_tick(
        &mut self,
        input: &InputFrame,
        env: Option<&dyn EnvironmentQuery>,
        body: &mut dyn PhysicsBody,
        dt: f32,
    ) {
        self.advance_timers(dt);
        self.mirror(body);

        let x = input.horizontal.clamp(-1.0, 1.0);
        self.input_x = x;
        if x != 0.0 {
            self.facing = sign_or_zero(x);
        }

        self.sense(env, x);

        if input.jump {
            self.jump(body, x);
        }
        if input.dash {
            self.dash(body, x);
        }
        self.mirror(body);
    }

    /// Fixed-rate entry point: continuous horizontal force, clamp and idle damping.
    /// Skipped entirely while dashing.
    pub fn on_physics_tick(&mut self, body: &mut dyn PhysicsBody, dt: f32) {
        if self.state.is_dashing {
            self.mirror(body);
            return;
        }

        let grounded = self.state.is_grounded();
        let force_multiplier = if grounded { 1.0 } else { self.config.air_control_multiplier };
        let x = self.input_x;

        let mut velocity = body.velocity();
        velocity.x += x * self.config.move_force * force_multiplier * dt;
        velocity.x = velocity.x.clamp(-self.config.max_speed, self.config.max_speed);
        if x.abs() < self.config.idle_threshold && grounded {
            velocity.x *= self.config.idle_damping;
        }
        body.set_velocity(velocity);
        self.mirror(body);
    }

    fn advance_timers(&mut self, dt: f32) {
        match self.timers.advance(dt) {
            Some(DashEvent::Ended) => {
                self.state.is_dashing = false;
                log::debug!("dash ended");
            }
            Some(DashEvent::Ready) => {
                self.state.can_dash = true;
                log::debug!("dash ready");
            }
            None => {}
        }
    }

    fn mirror(&mut self, body: &dyn PhysicsBody) {
        self.state.velocity = body.velocity();
        self.state.position = body.position();
    }

    /// Query the environment and recompute the phase. A missing query or
    /// ground probe reads as fully airborne.
    fn sense(&mut self, env: Option<&dyn EnvironmentQuery>, x: f32) {
        let position = self.state.position;

        let grounded = match (env, self.config.ground_check_offset) {
            (Some(env), Some(offset)) => env.is_grounded(
                position + offset,
                self.config.ground_check_radius,
                self.config.ground_layers,
            ),
            _ => false,
        };

        if grounded {
            if !self.state.is_grounded() {
                log::debug!("landed at {:?}", position);
            }
            self.state.jump_count = self.config.max_jumps;
        }
        self.state.movement_phase = if grounded {
            MovementPhase::Grounded
        } else {
            MovementPhase::Airborne
        };

        // The probe points along the input; no input means a zero-length probe and no wall.
        let direction = Vec3::X * sign_or_zero(x);
        self.state.wall_contact = match env {
            Some(env)
                if direction != Vec3::ZERO
                    && env.wall_contact(
                        position,
                        direction,
                        self.config.wall_check_distance,
                        self.config.wall_layers,
                    ) =>
            {
                Some(if x > 0.0 { WallSide::Right } else { WallSide::Left })
            }
            _ => None,
        };
    }

    fn jump(&mut self, body: &mut dyn PhysicsBody, x: f32) {
        if self.state.is_wall_adjacent() {
            let d = self.config.wall_jump_direction;
            let direction = Vec3::new(-sign_or_zero(x) * d.x, d.y, 0.0).normalize_or_zero();
            body.set_velocity(Vec3::ZERO);
            body.apply_impulse(direction * self.config.wall_jump_force);
            log::debug!("wall jump off {:?}", self.state.wall_contact);
        } else if self.state.jump_count > 0 {
            let mut velocity = body.velocity();
            velocity.y = 0.0;
            body.set_velocity(velocity);
            body.apply_impulse(Vec3::Y * self.config.jump_force);
            self.state.jump_count -= 1;
            log::debug!("jump, {} left", self.state.jump_count);
        }
    }

    fn dash(&mut self, body: &mut dyn PhysicsBody, x: f32) {
        if !self.state.can_dash || self.state.is_dashing {
            return;
        }
        let facing = if x != 0.0 { sign_or_zero(x) } else { self.facing };
        // Velocity change rather than impulse: dash speed ignores mass.
        body.set_velocity(Vec3::X * self.config.dash_force * facing);

        self.state.is_dashing = true;
        self.state.can_dash = false;
        self.timers.start(self.config.dash_duration, self.config.dash_cooldown);
        log::debug!("dash facing {}", facing);
    }
}
