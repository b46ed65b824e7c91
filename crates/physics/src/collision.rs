//! Collision groups and filtering.

use rapier3d::prelude::*;

/// Collision layers. The two obstacle layers are the two world polarities.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroup {
    /// Static environment shared by both polarities
    Environment = 1 << 0,
    /// The controlled agent
    Agent = 1 << 1,
    /// Obstacles that are solid in the White world
    WhiteObstacle = 1 << 2,
    /// Obstacles that are solid in the Black world
    BlackObstacle = 1 << 3,
}

impl CollisionGroup {
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Static geometry: member of its own layer, collides with everything.
    pub fn static_groups(self) -> InteractionGroups {
        InteractionGroups::new(Group::from_bits_retain(self as u32), Group::ALL)
    }

    /// The agent collides with the environment and both obstacle layers.
    /// Inactive obstacles are disabled outright rather than filtered.
    pub fn agent() -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_retain(Self::Agent as u32),
            Group::from_bits_retain(
                Self::Environment as u32 | Self::WhiteObstacle as u32 | Self::BlackObstacle as u32,
            ),
        )
    }

    /// Groups for a scene query issued on behalf of the agent against `mask`.
    pub fn query(mask: u32) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_retain(Self::Agent as u32),
            Group::from_bits_retain(mask),
        )
    }
}
