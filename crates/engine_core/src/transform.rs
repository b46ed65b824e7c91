//! Transform component and utilities for spatial positioning.

use glam::{Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation.
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Transform a point from this transform's local space into its parent space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (self.scale * point)
    }

    /// Compose `self` (parent) with a child expressed in the parent's local space.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            position: self.transform_point(child.position),
            rotation: (self.rotation * child.rotation).normalize(),
            scale: self.scale * child.scale,
        }
    }

    /// Inverse transform. Exact for uniform scale, which is all the stage uses.
    pub fn inverse(&self) -> Transform {
        let rotation = self.rotation.inverse();
        let scale = self.scale.recip();
        Transform {
            position: scale * (rotation * -self.position),
            rotation,
            scale,
        }
    }

    /// Express `world` relative to `self`, so that `self.mul_transform(&local) == world`.
    pub fn relative(&self, world: &Transform) -> Transform {
        self.inverse().mul_transform(world)
    }
}

/// Half a turn about the depth (Z) axis. `sign` picks the sense.
///
/// Built component-wise so the result is exact: `from_rotation_z(PI)` leaves
/// a tiny negative `w` that flips the sense chosen by shortest-arc slerp.
pub fn half_turn_z(sign: f32) -> Quat {
    Quat::from_xyzw(0.0, 0.0, sign.signum(), 0.0)
}

/// Angle between two orientations in degrees, in `[0, 180]`.
pub fn angle_degrees(a: Quat, b: Quat) -> f32 {
    let delta = a.inverse() * b;
    // atan2 stays accurate near zero where acos(dot) loses precision.
    let s = delta.xyz().length();
    let c = delta.w.abs();
    (2.0 * s.atan2(c)).to_degrees()
}

/// Rotate `from` toward `to` by at most `max_degrees`, along the shortest arc.
/// Never overshoots; returns `to` exactly once within reach.
pub fn rotate_towards(from: Quat, to: Quat, max_degrees: f32) -> Quat {
    let angle = angle_degrees(from, to);
    if angle <= max_degrees || angle == 0.0 {
        return to;
    }
    from.slerp(to, max_degrees / angle).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_then_relative_recovers_child() {
        let parent = Transform::from_position_rotation(
            Vec3::new(3.0, -1.0, 0.0),
            Quat::from_rotation_z(0.7),
        );
        let world = Transform::from_position_rotation(Vec3::new(5.0, 2.0, 0.0), Quat::from_rotation_z(-0.2));
        let local = parent.relative(&world);
        let back = parent.mul_transform(&local);
        assert!((back.position - world.position).length() < 1e-4);
        assert!(angle_degrees(back.rotation, world.rotation) < 1e-2);
    }

    #[test]
    fn half_turn_is_exact() {
        let q = half_turn_z(1.0);
        assert_eq!(q.w, 0.0);
        assert!((angle_degrees(Quat::IDENTITY, q) - 180.0).abs() < 1e-3);
        let back = q * half_turn_z(-1.0);
        assert_eq!(back, Quat::IDENTITY);
    }

    #[test]
    fn rotate_towards_steps_by_max_and_stops_on_target() {
        let target = half_turn_z(1.0);
        let step = rotate_towards(Quat::IDENTITY, target, 3.0);
        assert!((angle_degrees(Quat::IDENTITY, step) - 3.0).abs() < 1e-2);
        assert!((angle_degrees(step, target) - 177.0).abs() < 1e-2);

        let near = rotate_towards(target, target, 3.0);
        assert_eq!(near, target);
    }

    #[test]
    fn opposite_half_turns_rotate_in_opposite_senses() {
        let pos = rotate_towards(Quat::IDENTITY, half_turn_z(1.0), 10.0);
        let neg = rotate_towards(Quat::IDENTITY, half_turn_z(-1.0), 10.0);
        assert!(pos.z > 0.0);
        assert!(neg.z < 0.0);
    }
}
