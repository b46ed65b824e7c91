//! The playable stage: agents and the two obstacle groups in a hecs world,
//! backed by Rapier for bodies, colliders and probes.
//!
//! The anchor is a bare transform. Obstacle groups attached to it keep a
//! transform relative to it; every anchor change recomputes their world
//! placement and pushes it to the group's colliders.

use engine_core::Transform;
use glam::{Quat, Vec3};
use hecs::{Entity, World};
use physics::{AgentShape, CollisionGroup, PhysicsWorld};
use rapier3d::na::Vector3;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

use crate::config::StageConfig;
use crate::interfaces::{
    AgentFactory, AgentHandle, AnchorControl, Attachment, CollisionFilter, EnvironmentQuery,
    ObstacleControl, PhysicsBody,
};
use crate::shift::Polarity;

/// Links an agent entity to its Rapier body.
#[derive(Debug, Clone, Copy)]
pub struct AgentBody {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub mass: f32,
}

/// One of the two obstacle groups.
#[derive(Debug, Clone, Copy)]
pub struct ObstacleGroup {
    pub polarity: Polarity,
    pub active: bool,
    pub attachment: Attachment,
    /// Placement relative to the anchor; meaningful while attached.
    pub local: Transform,
    /// Current world placement.
    pub world: Transform,
}

/// A solid block belonging to an obstacle group.
#[derive(Debug, Clone, Copy)]
pub struct ObstacleBlock {
    pub group: Polarity,
    /// Placement relative to the group.
    pub local: Transform,
    pub half_extents: Vec3,
    pub collider: ColliderHandle,
}

fn group_index(polarity: Polarity) -> usize {
    match polarity {
        Polarity::White => 0,
        Polarity::Black => 1,
    }
}

fn layer(polarity: Polarity) -> CollisionGroup {
    match polarity {
        Polarity::White => CollisionGroup::WhiteObstacle,
        Polarity::Black => CollisionGroup::BlackObstacle,
    }
}

/// Snapshot of an agent body for one controller tick.
///
/// Impulses are folded into the velocity with the body's inverse mass; the
/// result is written back with [`Stage::commit`].
#[derive(Debug, Clone, Copy)]
pub struct BodyProxy {
    body: RigidBodyHandle,
    position: Vec3,
    velocity: Vec3,
    inverse_mass: f32,
}

impl PhysicsBody for BodyProxy {
    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        self.velocity += impulse * self.inverse_mass;
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

pub struct Stage {
    pub world: World,
    pub physics: PhysicsWorld,
    anchor: Transform,
    groups: [Entity; 2],
    shape: AgentShape,
}

impl Stage {
    /// Empty stage: both groups attached to an identity anchor, both active.
    pub fn new(config: &StageConfig) -> Self {
        let mut physics = PhysicsWorld::new();
        physics.gravity = Vector3::new(config.gravity.x, config.gravity.y, config.gravity.z);

        let mut world = World::new();
        let groups = Polarity::BOTH.map(|polarity| {
            world.spawn((ObstacleGroup {
                polarity,
                active: true,
                attachment: Attachment::Anchor,
                local: Transform::default(),
                world: Transform::default(),
            },))
        });

        Self {
            world,
            physics,
            anchor: Transform::default(),
            groups,
            shape: AgentShape {
                half_height: config.agent_half_height,
                radius: config.agent_radius,
                mass: config.agent_mass,
            },
        }
    }

    pub fn anchor(&self) -> Transform {
        self.anchor
    }

    pub fn group(&self, polarity: Polarity) -> Option<ObstacleGroup> {
        self.world
            .get::<&ObstacleGroup>(self.groups[group_index(polarity)])
            .ok()
            .map(|g| *g)
    }

    pub fn is_group_active(&self, polarity: Polarity) -> bool {
        self.group(polarity).is_some_and(|g| g.active)
    }

    /// Add a block to `group`, placed relative to the group.
    pub fn add_block(&mut self, group: Polarity, local: Transform, half_extents: Vec3) -> Entity {
        let (placement, active) = match self.group(group) {
            Some(g) => (g.world.mul_transform(&local), g.active),
            None => (local, true),
        };
        let collider = self.physics.add_static_cuboid(&placement, half_extents, layer(group));
        self.physics.set_collider_enabled(collider, active);
        self.physics.update_query_pipeline();
        self.world.spawn((ObstacleBlock {
            group,
            local,
            half_extents,
            collider,
        },))
    }

    /// Two-polarity test level.
    ///
    /// White: a floor whose top is at y = -1 and a wall on the right.
    /// Black: a slab whose underside is at y = 1 and a wall on the left;
    /// after a half turn around a resting agent it becomes the floor.
    pub fn build_demo_level(&mut self) {
        let slab = Vec3::new(15.0, 0.5, 2.0);
        let wall = Vec3::new(0.5, 3.5, 2.0);

        self.add_block(Polarity::White, Transform::from_position(Vec3::new(0.0, -1.5, 0.0)), slab);
        self.add_block(Polarity::White, Transform::from_position(Vec3::new(8.5, 2.0, 0.0)), wall);
        self.add_block(Polarity::Black, Transform::from_position(Vec3::new(0.0, 1.5, 0.0)), slab);
        self.add_block(Polarity::Black, Transform::from_position(Vec3::new(-8.5, 0.0, 0.0)), wall);
    }

    /// Snapshot a live agent's body for a controller tick.
    pub fn body_proxy(&self, agent: AgentHandle) -> Option<BodyProxy> {
        let handle = *self.world.get::<&AgentBody>(agent.0).ok()?;
        let transform = self.physics.get_body_transform(handle.body)?;
        let velocity = self.physics.body_velocity(handle.body)?;
        Some(BodyProxy {
            body: handle.body,
            position: transform.position,
            velocity,
            inverse_mass: handle.mass.recip(),
        })
    }

    /// Write a proxy's velocity back to its body.
    pub fn commit(&mut self, proxy: &BodyProxy) {
        self.physics.set_body_velocity(proxy.body, proxy.velocity);
    }

    /// Step physics, then mirror body transforms onto agent entities.
    pub fn step(&mut self, dt: f32) {
        self.physics.step(dt);
        for (_, (transform, handle)) in self.world.query_mut::<(&mut Transform, &AgentBody)>() {
            if let Some(t) = self.physics.get_body_transform(handle.body) {
                *transform = t;
            }
        }
        self.physics.update_query_pipeline();
    }

    pub fn agent_count(&self) -> usize {
        self.world.query::<&AgentBody>().iter().count()
    }

    /// Recompute attached groups from the anchor and move their colliders.
    fn sync_attached(&mut self) {
        let anchor = self.anchor;
        for (_, group) in self.world.query_mut::<&mut ObstacleGroup>() {
            if group.attachment == Attachment::Anchor {
                group.world = anchor.mul_transform(&group.local);
            }
        }

        let placements = Polarity::BOTH.map(|p| self.group(p).map(|g| g.world).unwrap_or_default());
        for (_, block) in self.world.query::<&ObstacleBlock>().iter() {
            let placement = placements[group_index(block.group)].mul_transform(&block.local);
            if !self.physics.set_collider_transform(block.collider, &placement) {
                log::warn!("stale collider {:?} in {:?} group", block.collider, block.group);
            }
        }
        self.physics.update_query_pipeline();
    }

    fn group_mut(&mut self, polarity: Polarity) -> Option<&mut ObstacleGroup> {
        self.world
            .query_one_mut::<&mut ObstacleGroup>(self.groups[group_index(polarity)])
            .ok()
    }
}

impl EnvironmentQuery for Stage {
    fn is_grounded(&self, position: Vec3, radius: f32, filter: CollisionFilter) -> bool {
        self.physics.overlap_sphere(position, radius, filter.0)
    }

    fn wall_contact(&self, origin: Vec3, direction: Vec3, distance: f32, filter: CollisionFilter) -> bool {
        self.physics.raycast(origin, direction, distance, filter.0).is_some()
    }
}

impl AgentFactory for Stage {
    fn spawn(&mut self, position: Vec3, orientation: Quat) -> AgentHandle {
        let (body, collider) = self.physics.add_agent_body(position, orientation, self.shape);
        let entity = self.world.spawn((
            Transform::from_position_rotation(position, orientation),
            AgentBody {
                body,
                collider,
                mass: self.shape.mass,
            },
        ));
        log::debug!("spawned agent {:?} at {:?}", entity, position);
        AgentHandle(entity)
    }

    fn despawn(&mut self, agent: AgentHandle) {
        let body = self.world.get::<&AgentBody>(agent.0).ok().map(|b| b.body);
        match body {
            Some(body) => {
                self.physics.remove_body(body);
                let _ = self.world.despawn(agent.0);
                log::debug!("despawned agent {:?}", agent.0);
            }
            None => log::warn!("despawn of unknown agent {:?}", agent.0),
        }
    }

    fn agent_position(&self, agent: AgentHandle) -> Option<Vec3> {
        let handle = *self.world.get::<&AgentBody>(agent.0).ok()?;
        self.physics.get_body_transform(handle.body).map(|t| t.position)
    }
}

impl ObstacleControl for Stage {
    fn set_active(&mut self, polarity: Polarity, active: bool) {
        match self.group_mut(polarity) {
            Some(group) => group.active = active,
            None => return,
        }
        for (_, block) in self.world.query::<&ObstacleBlock>().iter() {
            if block.group == polarity {
                self.physics.set_collider_enabled(block.collider, active);
            }
        }
        self.physics.update_query_pipeline();
    }

    fn set_parent(&mut self, polarity: Polarity, attachment: Attachment) {
        let anchor = self.anchor;
        if let Some(group) = self.group_mut(polarity) {
            if attachment == Attachment::Anchor {
                group.local = anchor.relative(&group.world);
            }
            group.attachment = attachment;
        }
    }
}

impl AnchorControl for Stage {
    fn anchor_position(&self) -> Vec3 {
        self.anchor.position
    }

    fn set_anchor_position(&mut self, position: Vec3) {
        self.anchor.position = position;
        self.sync_attached();
    }

    fn anchor_rotation(&self) -> Quat {
        self.anchor.rotation
    }

    fn set_anchor_rotation(&mut self, rotation: Quat) {
        self.anchor.rotation = rotation;
        self.sync_attached();
    }
}
