use crate::geometry::{body_to_world, forward, normalize_degrees, right, BodyAnchor};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable key for a block placed in a [`World`](crate::World)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Integer-aligned bounding box of a block, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Footprint {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Overlapping region of two footprints, if any
    pub fn intersect(&self, other: &Footprint) -> Option<Footprint> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x0 <= x1 && y0 <= y1 {
            Some(Footprint { x0, y0, x1, y1 })
        } else {
            None
        }
    }
}

/// Oriented rectangle: an obstacle in the world, or the robot's body.
///
/// Corners are always derived from (center, width, height, heading) and are
/// recomputed after every mutation, never edited on their own. Order is
/// front-left, front-right, rear-left, rear-right.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    center: DVec2,
    width: f64,
    height: f64,
    heading: f64,
    corners: [DVec2; 4],
}

impl Block {
    /// Create a block; `width` is lateral, `height` longitudinal, heading in degrees
    pub fn new(width: f64, height: f64, center_x: f64, center_y: f64, heading: f64) -> Self {
        let mut block = Block {
            center: DVec2::new(center_x, center_y),
            width,
            height,
            heading: normalize_degrees(heading),
            corners: [DVec2::ZERO; 4],
        };
        block.recompute_corners();
        block
    }

    /// Move along the current heading; negative `delta` backs up
    pub fn translate(&mut self, delta: f64) {
        self.center += forward(self.heading) * delta;
        self.recompute_corners();
    }

    /// Move sideways; positive `delta` goes toward the right-hand side
    pub fn strafe(&mut self, delta: f64) {
        self.center += right(self.heading) * delta;
        self.recompute_corners();
    }

    /// Turn around the center; positive `delta_deg` turns right
    pub fn rotate(&mut self, delta_deg: f64) {
        self.heading = normalize_degrees(self.heading + delta_deg);
        self.recompute_corners();
    }

    fn recompute_corners(&mut self) {
        self.corners = [
            self.anchor(BodyAnchor::FrontLeft),
            self.anchor(BodyAnchor::FrontRight),
            body_to_world(
                self.center,
                self.heading,
                DVec2::new(-self.width / 2.0, -self.height / 2.0),
            ),
            body_to_world(
                self.center,
                self.heading,
                DVec2::new(self.width / 2.0, -self.height / 2.0),
            ),
        ];
    }

    /// World position of a named body anchor
    pub fn anchor(&self, anchor: BodyAnchor) -> DVec2 {
        body_to_world(
            self.center,
            self.heading,
            anchor.local_offset(self.width, self.height),
        )
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn center_x(&self) -> f64 {
        self.center.x
    }

    pub fn center_y(&self) -> f64 {
        self.center.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Heading in degrees, always in [0, 360)
    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn corners(&self) -> [DVec2; 4] {
        self.corners
    }

    pub fn corner(&self, index: usize) -> Option<DVec2> {
        self.corners.get(index).copied()
    }

    pub fn front_center(&self) -> DVec2 {
        (self.corners[0] + self.corners[1]) * 0.5
    }

    pub fn rear_center(&self) -> DVec2 {
        (self.corners[2] + self.corners[3]) * 0.5
    }

    pub fn left_center(&self) -> DVec2 {
        (self.corners[0] + self.corners[2]) * 0.5
    }

    pub fn right_center(&self) -> DVec2 {
        (self.corners[1] + self.corners[3]) * 0.5
    }

    /// Inclusive integer bounding box used for grid occupancy.
    ///
    /// Uses the unrotated extents; placed obstacles are axis aligned.
    pub fn footprint(&self) -> Footprint {
        let x0 = (self.center.x - self.width / 2.0) as i32;
        let y0 = (self.center.y - self.height / 2.0) as i32;
        Footprint {
            x0,
            y0,
            x1: (x0 as f64 + self.width) as i32,
            y1: (y0 as f64 + self.height) as i32,
        }
    }
}
