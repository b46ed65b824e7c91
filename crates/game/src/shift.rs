//! World polarity shift: swap the solid obstacle group, rotate the world half
//! a turn around the agent, and respawn the agent.
//!
//! A shift is a resumable task. [`ShiftSequencer::trigger`] runs the set-up
//! steps on the tick the shift is requested; [`ShiftSequencer::advance`] then
//! rotates the anchor once per tick and finishes the sequence on the tick the
//! rotation reaches its target. While a shift is in flight no agent exists.

use engine_core::{angle_degrees, half_turn_z, rotate_towards, TaskStatus};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::{non_negative, positive, ConfigError};
use crate::interfaces::{AgentHandle, Attachment, CameraFollow, ShiftWorld};

/// Which obstacle group is solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    White,
    Black,
}

impl Polarity {
    pub const BOTH: [Polarity; 2] = [Polarity::White, Polarity::Black];

    pub fn flipped(self) -> Self {
        match self {
            Polarity::White => Polarity::Black,
            Polarity::Black => Polarity::White,
        }
    }

    /// Sense of the half turn taken when leaving this polarity.
    pub fn rotation_sign(self) -> f32 {
        match self {
            Polarity::White => 1.0,
            Polarity::Black => -1.0,
        }
    }
}

/// Shift timing and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    /// Anchor angular speed in degrees per second.
    pub rotation_speed_degrees: f32,
    /// The rotation counts as finished once this close to the target.
    pub completion_tolerance_degrees: f32,
    /// Added to the saved position when the agent respawns.
    pub respawn_offset: Vec3,
    /// Where the first agent is placed.
    pub spawn_point: Vec3,
    pub initial_polarity: Polarity,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            rotation_speed_degrees: 180.0,
            completion_tolerance_degrees: 0.1,
            respawn_offset: Vec3::Y,
            spawn_point: Vec3::ZERO,
            initial_polarity: Polarity::White,
        }
    }
}

impl ShiftConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("rotation_speed_degrees", self.rotation_speed_degrees)?;
        non_negative("completion_tolerance_degrees", self.completion_tolerance_degrees)
    }
}

/// What happened on one [`ShiftSequencer::advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShiftProgress {
    /// No shift in flight.
    Idle,
    /// Rotated one step; this much is left.
    Rotating { remaining_degrees: f32 },
    /// The shift finished on this tick and a new agent is live.
    Completed { agent: AgentHandle },
}

impl ShiftProgress {
    /// The shift as a resumable task: only a rotating shift wants another tick.
    pub fn status(&self) -> TaskStatus {
        match self {
            ShiftProgress::Rotating { .. } => TaskStatus::Continue,
            ShiftProgress::Idle | ShiftProgress::Completed { .. } => TaskStatus::Done,
        }
    }
}

/// Data that only exists while a shift is in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    saved_position: Vec3,
    start_rotation: Quat,
    target_rotation: Quat,
}

/// Owns the polarity, the in-flight shift and the live agent handle.
#[derive(Debug, Clone)]
pub struct ShiftSequencer {
    config: ShiftConfig,
    polarity: Polarity,
    transition: Option<Transition>,
    agent: Option<AgentHandle>,
}

impl ShiftSequencer {
    pub fn new(config: ShiftConfig) -> Self {
        Self {
            polarity: config.initial_polarity,
            config,
            transition: None,
            agent: None,
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn in_progress(&self) -> bool {
        self.transition.is_some()
    }

    pub fn current_agent(&self) -> Option<AgentHandle> {
        self.agent
    }

    pub fn saved_position(&self) -> Option<Vec3> {
        self.transition.map(|t| t.saved_position)
    }

    pub fn start_rotation(&self) -> Option<Quat> {
        self.transition.map(|t| t.start_rotation)
    }

    pub fn target_rotation(&self) -> Option<Quat> {
        self.transition.map(|t| t.target_rotation)
    }

    /// Lay out the initial quiescent world: only the current polarity's group
    /// active, the first agent spawned and followed by the camera.
    pub fn on_init(&mut self, world: &mut impl ShiftWorld, camera: &mut dyn CameraFollow) -> AgentHandle {
        for group in Polarity::BOTH {
            world.set_active(group, group == self.polarity);
        }
        let agent = world.spawn(self.config.spawn_point, Quat::IDENTITY);
        camera.set_target(agent);
        self.agent = Some(agent);
        log::info!("world initialised as {:?}", self.polarity);
        agent
    }

    /// Start a shift. Ignored, returning false, while one is already in flight.
    pub fn trigger(&mut self, world: &mut impl ShiftWorld) -> bool {
        if self.in_progress() {
            log::debug!("shift requested while shifting, ignored");
            return false;
        }

        // Detach first so activation changes never ride on the anchor.
        for group in Polarity::BOTH {
            world.set_parent(group, Attachment::Detached);
        }

        let next = self.polarity.flipped();
        world.set_active(next, true);
        world.set_active(self.polarity, false);

        let saved_position = match self.agent.take() {
            Some(agent) => {
                let position = world.agent_position(agent);
                world.despawn(agent);
                position.unwrap_or_else(|| {
                    log::warn!("agent {:?} vanished before shift, pivoting on anchor", agent);
                    world.anchor_position()
                })
            }
            None => {
                log::warn!("shift with no live agent, pivoting on anchor");
                world.anchor_position()
            }
        };

        // Reposition before reattaching so the groups never inherit a transient pivot.
        world.set_anchor_position(saved_position);

        let start_rotation = world.anchor_rotation();
        let target_rotation = (start_rotation * half_turn_z(self.polarity.rotation_sign())).normalize();

        for group in Polarity::BOTH {
            world.set_parent(group, Attachment::Anchor);
        }

        self.transition = Some(Transition {
            saved_position,
            start_rotation,
            target_rotation,
        });
        log::info!("shift {:?} -> {:?} around {:?}", self.polarity, next, saved_position);
        true
    }

    /// Advance an in-flight shift by one tick.
    pub fn advance(
        &mut self,
        world: &mut impl ShiftWorld,
        camera: &mut dyn CameraFollow,
        dt: f32,
    ) -> ShiftProgress {
        let Some(transition) = self.transition else {
            return ShiftProgress::Idle;
        };

        let step = self.config.rotation_speed_degrees * dt;
        let rotation = rotate_towards(world.anchor_rotation(), transition.target_rotation, step);
        world.set_anchor_rotation(rotation);

        let remaining_degrees = angle_degrees(rotation, transition.target_rotation);
        if remaining_degrees > self.config.completion_tolerance_degrees {
            return ShiftProgress::Rotating { remaining_degrees };
        }

        world.set_anchor_rotation(transition.target_rotation);

        let agent = world.spawn(
            transition.saved_position + self.config.respawn_offset,
            Quat::IDENTITY,
        );
        camera.set_target(agent);

        self.polarity = self.polarity.flipped();
        self.agent = Some(agent);
        self.transition = None;
        log::info!("shift complete, now {:?}", self.polarity);
        ShiftProgress::Completed { agent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{AgentFactory, AnchorControl, ObstacleControl};
    use hecs::World;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SetActive(Polarity, bool),
        SetParent(Polarity, Attachment),
        Spawn(Vec3),
        Despawn,
        AnchorPosition(Vec3),
        AnchorRotation,
    }

    struct MockWorld {
        entities: World,
        agents: HashMap<AgentHandle, Vec3>,
        active: HashMap<Polarity, bool>,
        parent: HashMap<Polarity, Attachment>,
        anchor_position: Vec3,
        anchor_rotation: Quat,
        calls: Vec<Call>,
    }

    impl MockWorld {
        fn new() -> Self {
            Self {
                entities: World::new(),
                agents: HashMap::new(),
                active: HashMap::new(),
                parent: HashMap::new(),
                anchor_position: Vec3::ZERO,
                anchor_rotation: Quat::IDENTITY,
                calls: Vec::new(),
            }
        }

        fn active_groups(&self) -> usize {
            self.active.values().filter(|a| **a).count()
        }

        fn move_agent(&mut self, agent: AgentHandle, position: Vec3) {
            self.agents.insert(agent, position);
        }
    }

    impl AgentFactory for MockWorld {
        fn spawn(&mut self, position: Vec3, _orientation: Quat) -> AgentHandle {
            let agent = AgentHandle(self.entities.spawn(()));
            self.agents.insert(agent, position);
            self.calls.push(Call::Spawn(position));
            agent
        }
        fn despawn(&mut self, agent: AgentHandle) {
            self.agents.remove(&agent);
            let _ = self.entities.despawn(agent.0);
            self.calls.push(Call::Despawn);
        }
        fn agent_position(&self, agent: AgentHandle) -> Option<Vec3> {
            self.agents.get(&agent).copied()
        }
    }

    impl ObstacleControl for MockWorld {
        fn set_active(&mut self, group: Polarity, active: bool) {
            self.active.insert(group, active);
            self.calls.push(Call::SetActive(group, active));
        }
        fn set_parent(&mut self, group: Polarity, attachment: Attachment) {
            self.parent.insert(group, attachment);
            self.calls.push(Call::SetParent(group, attachment));
        }
    }

    impl AnchorControl for MockWorld {
        fn anchor_position(&self) -> Vec3 {
            self.anchor_position
        }
        fn set_anchor_position(&mut self, position: Vec3) {
            self.anchor_position = position;
            self.calls.push(Call::AnchorPosition(position));
        }
        fn anchor_rotation(&self) -> Quat {
            self.anchor_rotation
        }
        fn set_anchor_rotation(&mut self, rotation: Quat) {
            self.anchor_rotation = rotation;
            self.calls.push(Call::AnchorRotation);
        }
    }

    #[derive(Default)]
    struct MockCamera {
        target: Option<AgentHandle>,
        rebinds: usize,
    }

    impl CameraFollow for MockCamera {
        fn set_target(&mut self, agent: AgentHandle) {
            self.target = Some(agent);
            self.rebinds += 1;
        }
    }

    const DT: f32 = 1.0 / 60.0;

    fn initialised() -> (ShiftSequencer, MockWorld, MockCamera) {
        let mut seq = ShiftSequencer::new(ShiftConfig::default());
        let mut world = MockWorld::new();
        let mut camera = MockCamera::default();
        seq.on_init(&mut world, &mut camera);
        world.calls.clear();
        (seq, world, camera)
    }

    fn run_to_completion(
        seq: &mut ShiftSequencer,
        world: &mut MockWorld,
        camera: &mut MockCamera,
    ) -> (usize, AgentHandle) {
        for tick in 1..=1000 {
            if let ShiftProgress::Completed { agent } = seq.advance(world, camera, DT) {
                return (tick, agent);
            }
        }
        panic!("shift never completed");
    }

    #[test]
    fn init_activates_only_initial_polarity() {
        let mut seq = ShiftSequencer::new(ShiftConfig::default());
        let mut world = MockWorld::new();
        let mut camera = MockCamera::default();
        let agent = seq.on_init(&mut world, &mut camera);

        assert_eq!(world.active.get(&Polarity::White), Some(&true));
        assert_eq!(world.active.get(&Polarity::Black), Some(&false));
        assert_eq!(world.agent_position(agent), Some(Vec3::ZERO));
        assert_eq!(camera.target, Some(agent));
        assert_eq!(seq.current_agent(), Some(agent));
        assert!(!seq.in_progress());
    }

    #[test]
    fn trigger_runs_setup_steps_in_order() {
        let (mut seq, mut world, _camera) = initialised();
        let agent = seq.current_agent().unwrap();
        let p = Vec3::new(4.0, 2.0, 0.0);
        world.move_agent(agent, p);

        assert!(seq.trigger(&mut world));
        assert_eq!(
            world.calls,
            vec![
                Call::SetParent(Polarity::White, Attachment::Detached),
                Call::SetParent(Polarity::Black, Attachment::Detached),
                Call::SetActive(Polarity::Black, true),
                Call::SetActive(Polarity::White, false),
                Call::Despawn,
                Call::AnchorPosition(p),
                Call::SetParent(Polarity::White, Attachment::Anchor),
                Call::SetParent(Polarity::Black, Attachment::Anchor),
            ]
        );
        assert!(seq.in_progress());
        assert_eq!(seq.current_agent(), None);
        assert!(world.agents.is_empty());
        assert_eq!(seq.saved_position(), Some(p));
        assert_eq!(seq.start_rotation(), Some(Quat::IDENTITY));
        assert_eq!(seq.target_rotation(), Some(half_turn_z(1.0)));
        // Polarity only flips at the end.
        assert_eq!(seq.polarity(), Polarity::White);
    }

    #[test]
    fn retrigger_while_shifting_changes_nothing() {
        let (mut seq, mut world, mut camera) = initialised();
        seq.trigger(&mut world);
        seq.advance(&mut world, &mut camera, DT);
        world.calls.clear();
        let rotation = world.anchor_rotation;
        let target = seq.target_rotation();

        assert!(!seq.trigger(&mut world));
        assert!(world.calls.is_empty());
        assert_eq!(world.anchor_rotation, rotation);
        assert_eq!(seq.target_rotation(), target);
        assert_eq!(seq.polarity(), Polarity::White);
    }

    #[test]
    fn rotation_closes_three_degrees_per_tick_and_completes_in_sixty() {
        let (mut seq, mut world, mut camera) = initialised();
        seq.trigger(&mut world);

        let mut previous = 180.0;
        for _ in 0..59 {
            let progress = seq.advance(&mut world, &mut camera, DT);
            assert_eq!(progress.status(), TaskStatus::Continue);
            match progress {
                ShiftProgress::Rotating { remaining_degrees } => {
                    assert!((previous - remaining_degrees - 3.0).abs() < 0.01);
                    previous = remaining_degrees;
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(seq.in_progress());
        let progress = seq.advance(&mut world, &mut camera, DT);
        assert!(progress.status().is_done());
        match progress {
            ShiftProgress::Completed { .. } => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(!seq.in_progress());
        assert_eq!(world.anchor_rotation, half_turn_z(1.0));
    }

    #[test]
    fn completion_respawns_above_saved_position_and_rebinds_camera() {
        let (mut seq, mut world, mut camera) = initialised();
        let first = seq.current_agent().unwrap();
        world.move_agent(first, Vec3::new(-2.0, 5.0, 0.0));
        seq.trigger(&mut world);

        let (_, agent) = run_to_completion(&mut seq, &mut world, &mut camera);
        assert_ne!(agent, first);
        assert_eq!(world.agent_position(agent), Some(Vec3::new(-2.0, 6.0, 0.0)));
        assert_eq!(camera.target, Some(agent));
        assert_eq!(camera.rebinds, 2);
        assert_eq!(seq.current_agent(), Some(agent));
        assert_eq!(seq.polarity(), Polarity::Black);
        assert_eq!(world.active_groups(), 1);
        assert_eq!(world.active.get(&Polarity::Black), Some(&true));
        assert_eq!(seq.saved_position(), None);
    }

    #[test]
    fn completion_snaps_before_spawning() {
        let (mut seq, mut world, mut camera) = initialised();
        seq.trigger(&mut world);
        world.calls.clear();
        run_to_completion(&mut seq, &mut world, &mut camera);
        let n = world.calls.len();
        assert_eq!(world.calls[n - 2], Call::AnchorRotation);
        assert!(matches!(world.calls[n - 1], Call::Spawn(_)));
    }

    #[test]
    fn consecutive_shifts_rotate_in_opposite_senses() {
        let (mut seq, mut world, mut camera) = initialised();

        seq.trigger(&mut world);
        seq.advance(&mut world, &mut camera, DT);
        assert!(world.anchor_rotation.z > 0.0);
        run_to_completion(&mut seq, &mut world, &mut camera);
        assert_eq!(seq.polarity(), Polarity::Black);

        seq.trigger(&mut world);
        assert_eq!(seq.target_rotation(), Some(Quat::IDENTITY));
        seq.advance(&mut world, &mut camera, DT);
        // Leaving Black unwinds the half turn: angle about +Z decreases.
        let (axis, angle) = world.anchor_rotation.to_axis_angle();
        assert!((axis.z * angle).to_degrees() < 180.0);
        run_to_completion(&mut seq, &mut world, &mut camera);
        assert_eq!(seq.polarity(), Polarity::White);
        assert_eq!(world.anchor_rotation, Quat::IDENTITY);
        assert_eq!(world.active.get(&Polarity::White), Some(&true));
        assert_eq!(world.active_groups(), 1);
    }

    #[test]
    fn advance_while_idle_does_nothing() {
        let (mut seq, mut world, mut camera) = initialised();
        assert_eq!(seq.advance(&mut world, &mut camera, DT), ShiftProgress::Idle);
        assert!(world.calls.is_empty());
    }

    #[test]
    fn shift_without_agent_pivots_on_anchor() {
        let mut seq = ShiftSequencer::new(ShiftConfig::default());
        let mut world = MockWorld::new();
        let mut camera = MockCamera::default();
        world.anchor_position = Vec3::new(1.0, 1.0, 0.0);

        assert!(seq.trigger(&mut world));
        assert_eq!(seq.saved_position(), Some(Vec3::new(1.0, 1.0, 0.0)));
        let (_, agent) = run_to_completion(&mut seq, &mut world, &mut camera);
        assert_eq!(world.agent_position(agent), Some(Vec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn polarity_helpers() {
        assert_eq!(Polarity::White.flipped(), Polarity::Black);
        assert_eq!(Polarity::Black.flipped().flipped(), Polarity::Black);
        assert_eq!(Polarity::White.rotation_sign(), -Polarity::Black.rotation_sign());
    }
}
