// Interfaces consumed from the scene and animation subsystems, plus the small amount of
// vector math the badge code needs.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub type NodeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        self * -1.0
    }
}

/// Local transform of a node relative to its parent.
///
/// `origin` shifts the node's geometry before scaling, which is how text gets centered on
/// its own bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub scale: Vec3,
    pub origin: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            origin: Vec3::ZERO,
        }
    }
}

/// Badge variants present in the shield scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeKind {
    Follower,
    Subscriber,
}

impl BadgeKind {
    pub fn all() -> &'static [BadgeKind] {
        &[Self::Follower, Self::Subscriber]
    }

    /// Scene node holding the badge mesh
    pub fn node_name(&self) -> &'static str {
        match self {
            Self::Follower => "FollowerShield",
            Self::Subscriber => "SubscriberShield",
        }
    }

    /// One-shot lifetime clip of the badge
    pub fn animation_name(&self) -> &'static str {
        match self {
            Self::Follower => "FollowerAnimation",
            Self::Subscriber => "SubscriberAnimation",
        }
    }

    /// Material reused for the name text
    pub fn material_name(&self) -> &'static str {
        match self {
            Self::Follower => "Silver",
            Self::Subscriber => "Gold",
        }
    }
}

impl fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Follower => f.write_str("follower"),
            Self::Subscriber => f.write_str("subscriber"),
        }
    }
}

/// Scene graph operations the badge controller relies on.
pub trait Scene: Send {
    fn add_to_scene(&mut self, node: NodeId);
    fn remove_from_scene(&mut self, node: NodeId);
    fn is_in_scene(&self, node: NodeId) -> bool;
    /// Parents `child` under `parent`, replacing any previous parent.
    fn attach(&mut self, parent: NodeId, child: NodeId);
    /// Removes `node` from its parent.
    fn detach(&mut self, node: NodeId);
    /// Bounding-box size of the node's own geometry.
    fn size_of(&self, node: NodeId) -> Option<Vec3>;
    fn position_of(&self, node: NodeId) -> Option<Vec3>;
    fn set_transform(&mut self, node: NodeId, transform: Transform);
    fn set_material(&mut self, node: NodeId, material: &str);
    /// Creates a detached text node whose geometry measures `size`.
    fn create_text(&mut self, text: &str, size: Vec3) -> NodeId;
    fn remove_node(&mut self, node: NodeId);
}

/// A single animation clip driven by frame deltas.
pub trait AnimationClip: Send {
    /// Starts playback configured to run once and stop.
    fn play_once(&mut self);
    fn stop(&mut self);
    fn set_time(&mut self, seconds: f32);
    /// Advances playback; returns true when the clip reports "finished".
    fn update(&mut self, delta: Duration) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_ops() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(a + Vec3::ONE, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(a - a, Vec3::ZERO);
        assert_eq!(-(a * 2.0), Vec3::new(-2.0, -4.0, -6.0));
    }

    #[test]
    fn test_badge_names_are_distinct() {
        assert_ne!(BadgeKind::Follower.node_name(), BadgeKind::Subscriber.node_name());
        assert_eq!(BadgeKind::Subscriber.material_name(), "Gold");
        assert_eq!(BadgeKind::Follower.animation_name(), "FollowerAnimation");
    }
}
