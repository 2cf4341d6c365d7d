use crate::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered waypoints from the requested start towards the goal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavPath {
    pub points: Vec<Vec2>,
}

impl NavPath {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<Vec2> {
        self.points.last().copied()
    }
}

/// Terrain layers a mover may cross. A cell is traversable when it shares a layer with the
/// request's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraversalMask(pub u32);

impl TraversalMask {
    pub const NONE: TraversalMask = TraversalMask(0);
    pub const GROUND: TraversalMask = TraversalMask(1 << 0);
    pub const WATER: TraversalMask = TraversalMask(1 << 1);
    pub const ALL: TraversalMask = TraversalMask(u32::MAX);

    pub const fn union(self, other: TraversalMask) -> TraversalMask {
        TraversalMask(self.0 | other.0)
    }

    pub const fn intersects(self, other: TraversalMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for TraversalMask {
    fn default() -> Self {
        TraversalMask::GROUND
    }
}

/// Route query: reach anywhere within `proximity` of `goal` using only `mask` terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathRequest {
    pub start: Vec2,
    pub goal: Vec2,
    pub mask: TraversalMask,
    pub proximity: f32,
}

impl PathRequest {
    pub fn new(start: Vec2, goal: Vec2) -> Self {
        Self {
            start,
            goal,
            mask: TraversalMask::default(),
            proximity: 0.0,
        }
    }

    pub fn with_mask(mut self, mask: TraversalMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_proximity(mut self, proximity: f32) -> Self {
        self.proximity = proximity.max(0.0);
        self
    }

    pub fn accepts(&self, point: Vec2) -> bool {
        point.distance(self.goal) <= self.proximity
    }
}

/// Synchronous route backend.
pub trait Navigator {
    /// Returns `None` when no traversable route reaches the goal's proximity.
    fn find_path(&self, request: &PathRequest) -> Option<NavPath>;
}
