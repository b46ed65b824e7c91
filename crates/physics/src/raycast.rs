//! Scene queries used for ground and wall probes.

use crate::physics_world::to_vector;
use crate::{CollisionGroup, PhysicsWorld};
use engine_core::Vec3;
use rapier3d::na::Point3;
use rapier3d::prelude::*;

/// Result of a raycast query.
#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    /// The collider that was hit.
    pub collider: ColliderHandle,
    /// Distance along the ray to the hit point.
    pub distance: f32,
}

fn enabled_only(_: ColliderHandle, collider: &Collider) -> bool {
    collider.is_enabled()
}

impl PhysicsWorld {
    /// Cast a ray against colliders on the layers in `mask` and return the first hit.
    /// A zero-length direction never hits.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: u32,
    ) -> Option<RaycastHit> {
        if direction.length_squared() <= f32::EPSILON {
            return None;
        }
        let direction = direction.normalize();
        let ray = Ray::new(Point3::new(origin.x, origin.y, origin.z), to_vector(direction));

        let filter = QueryFilter::default()
            .groups(CollisionGroup::query(mask))
            .predicate(&enabled_only);

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                max_distance,
                true,
                filter,
            )
            .map(|(collider, distance)| RaycastHit { collider, distance })
    }

    /// Check whether a sphere overlaps any enabled collider on the layers in `mask`.
    pub fn overlap_sphere(&self, center: Vec3, radius: f32, mask: u32) -> bool {
        let shape = Ball::new(radius);
        let shape_pos = Isometry::translation(center.x, center.y, center.z);
        let filter = QueryFilter::default()
            .groups(CollisionGroup::query(mask))
            .predicate(&enabled_only);

        let mut found = false;
        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &shape_pos,
            &shape,
            filter,
            |_| {
                found = true;
                false // Stop at the first overlap
            },
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Transform;

    fn world_with_floor_and_wall() -> PhysicsWorld {
        let mut world = PhysicsWorld::new();
        world.add_static_cuboid(
            &Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
            Vec3::new(10.0, 0.5, 2.0),
            CollisionGroup::WhiteObstacle,
        );
        world.add_static_cuboid(
            &Transform::from_position(Vec3::new(1.0, 2.0, 0.0)),
            Vec3::new(0.5, 2.0, 2.0),
            CollisionGroup::BlackObstacle,
        );
        world.update_query_pipeline();
        world
    }

    #[test]
    fn overlap_sphere_finds_floor() {
        let world = world_with_floor_and_wall();
        let white = CollisionGroup::WhiteObstacle.bits();
        assert!(world.overlap_sphere(Vec3::new(-3.0, 0.1, 0.0), 0.3, white));
        assert!(!world.overlap_sphere(Vec3::new(-3.0, 2.0, 0.0), 0.3, white));
    }

    #[test]
    fn overlap_sphere_respects_mask() {
        let world = world_with_floor_and_wall();
        let black = CollisionGroup::BlackObstacle.bits();
        assert!(!world.overlap_sphere(Vec3::new(-3.0, 0.1, 0.0), 0.3, black));
    }

    #[test]
    fn raycast_hits_wall_within_distance() {
        let world = world_with_floor_and_wall();
        let black = CollisionGroup::BlackObstacle.bits();
        let hit = world.raycast(Vec3::new(0.1, 2.0, 0.0), Vec3::X, 0.6, black);
        let hit = hit.expect("wall should be hit");
        assert!((hit.distance - 0.4).abs() < 1e-3);
        let wall = world.collider_set.get(hit.collider).unwrap();
        assert!((wall.translation().x - 1.0).abs() < 1e-6);
        assert!(world.raycast(Vec3::new(0.1, 2.0, 0.0), Vec3::NEG_X, 0.6, black).is_none());
    }

    #[test]
    fn zero_direction_never_hits() {
        let world = world_with_floor_and_wall();
        assert!(world.raycast(Vec3::new(0.4, 2.0, 0.0), Vec3::ZERO, 0.6, u32::MAX).is_none());
    }

    #[test]
    fn disabled_collider_is_invisible_to_queries() {
        let mut world = PhysicsWorld::new();
        let floor = world.add_static_cuboid(
            &Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
            Vec3::new(10.0, 0.5, 2.0),
            CollisionGroup::WhiteObstacle,
        );
        world.set_collider_enabled(floor, false);
        world.update_query_pipeline();
        assert!(!world.overlap_sphere(Vec3::new(0.0, 0.1, 0.0), 0.3, u32::MAX));
    }
}
