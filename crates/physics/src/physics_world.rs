//! Physics world management with Rapier3D.

use crate::collision::CollisionGroup;
use engine_core::{Transform, Vec3};
use glam::Quat;
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude::*;

pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    Vector3::new(v.x, v.y, v.z)
}

pub(crate) fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn to_isometry(position: Vec3, rotation: Quat) -> Isometry3<Real> {
    let rotation = UnitQuaternion::new_normalize(Quaternion::new(
        rotation.w, rotation.x, rotation.y, rotation.z,
    ));
    Isometry3::from_parts(Translation3::new(position.x, position.y, position.z), rotation)
}

/// Capsule and mass of an agent body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentShape {
    pub half_height: f32,
    pub radius: f32,
    pub mass: f32,
}

impl Default for AgentShape {
    fn default() -> Self {
        Self {
            half_height: 0.5,
            radius: 0.5,
            mass: 1.0,
        }
    }
}

/// Main physics world containing all simulation state.
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with default gravity.
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: Vector3::new(0.0, -9.81, 0.0),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Step the physics simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Update query pipeline for raycasting.
    pub fn update_query_pipeline(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Add a dynamic agent body: a frictionless capsule whose rotation is
    /// locked about every axis except the vertical one.
    pub fn add_agent_body(
        &mut self,
        position: Vec3,
        orientation: Quat,
        shape: AgentShape,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let rigid_body = RigidBodyBuilder::dynamic()
            .position(to_isometry(position, orientation))
            .enabled_rotations(false, true, false)
            .ccd_enabled(true)
            .build();
        let body = self.rigid_body_set.insert(rigid_body);
        let collider = ColliderBuilder::capsule_y(shape.half_height, shape.radius)
            .friction(0.0)
            .friction_combine_rule(CoefficientCombineRule::Min)
            .mass(shape.mass)
            .collision_groups(CollisionGroup::agent())
            .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        (body, collider)
    }

    /// Add a static cuboid collider with no parent body, placed at `transform`.
    pub fn add_static_cuboid(
        &mut self,
        transform: &Transform,
        half_extents: Vec3,
        layer: CollisionGroup,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(
            half_extents.x as Real,
            half_extents.y as Real,
            half_extents.z as Real,
        )
        .position(to_isometry(transform.position, transform.rotation))
        .collision_groups(layer.static_groups())
        .build();
        self.collider_set.insert(collider)
    }

    /// Move a parentless collider. Returns false if the handle is stale.
    pub fn set_collider_transform(&mut self, handle: ColliderHandle, transform: &Transform) -> bool {
        match self.collider_set.get_mut(handle) {
            Some(collider) => {
                collider.set_position(to_isometry(transform.position, transform.rotation));
                true
            }
            None => false,
        }
    }

    /// Enable or disable a collider. Disabled colliders neither collide nor show up in queries.
    pub fn set_collider_enabled(&mut self, handle: ColliderHandle, enabled: bool) -> bool {
        match self.collider_set.get_mut(handle) {
            Some(collider) => {
                collider.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn is_collider_enabled(&self, handle: ColliderHandle) -> Option<bool> {
        self.collider_set.get(handle).map(|c| c.is_enabled())
    }

    /// Get the transform of a rigid body.
    pub fn get_body_transform(&self, handle: RigidBodyHandle) -> Option<Transform> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            let rot = body.rotation();
            Transform {
                position: from_vector(pos),
                rotation: Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
                scale: Vec3::ONE,
            }
        })
    }

    pub fn body_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.rigid_body_set.get(handle).map(|body| from_vector(body.linvel()))
    }

    /// Overwrite the linear velocity of a body, waking it.
    pub fn set_body_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) {
        match self.rigid_body_set.get_mut(handle) {
            Some(body) => body.set_linvel(to_vector(velocity), true),
            None => log::warn!("set_body_velocity on stale body {:?}", handle),
        }
    }

    /// Remove a rigid body and its colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_body_falls_under_gravity() {
        let mut world = PhysicsWorld::new();
        let (body, _) = world.add_agent_body(Vec3::new(0.0, 10.0, 0.0), Quat::IDENTITY, AgentShape::default());
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        let t = world.get_body_transform(body).unwrap();
        assert!(t.position.y < 10.0);
        assert!(world.body_velocity(body).unwrap().y < 0.0);
    }

    #[test]
    fn set_velocity_round_trips() {
        let mut world = PhysicsWorld::new();
        let (body, _) = world.add_agent_body(Vec3::ZERO, Quat::IDENTITY, AgentShape::default());
        world.set_body_velocity(body, Vec3::new(3.0, 1.0, 0.0));
        assert_eq!(world.body_velocity(body), Some(Vec3::new(3.0, 1.0, 0.0)));
    }

    #[test]
    fn removed_body_reports_none() {
        let mut world = PhysicsWorld::new();
        let (body, _) = world.add_agent_body(Vec3::ZERO, Quat::IDENTITY, AgentShape::default());
        world.remove_body(body);
        assert!(world.get_body_transform(body).is_none());
        assert!(world.body_velocity(body).is_none());
    }

    #[test]
    fn static_cuboid_toggles_and_moves() {
        let mut world = PhysicsWorld::new();
        let handle = world.add_static_cuboid(
            &Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
            Vec3::new(5.0, 0.5, 1.0),
            CollisionGroup::WhiteObstacle,
        );
        assert_eq!(world.is_collider_enabled(handle), Some(true));
        assert!(world.set_collider_enabled(handle, false));
        assert_eq!(world.is_collider_enabled(handle), Some(false));
        assert!(world.set_collider_transform(handle, &Transform::from_position(Vec3::Y)));
        let pos = world.collider_set.get(handle).unwrap().translation();
        assert!((pos.y - 1.0).abs() < 1e-6);
    }
}
