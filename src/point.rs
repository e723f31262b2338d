use crate::block::BlockId;
use serde::{Deserialize, Serialize};

/// Integer world coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub fn new(x: i32, y: i32) -> Self {
        GridPoint { x, y }
    }

    /// Floor a floating-point position onto the grid
    pub fn from_world(x: f64, y: f64) -> Self {
        GridPoint {
            x: x.floor() as i32,
            y: y.floor() as i32,
        }
    }

    /// Euclidean distance from a floating-point position to this grid point
    pub fn distance_from(&self, x: f64, y: f64) -> f64 {
        let dx = self.x as f64 - x;
        let dy = self.y as f64 - y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One unit cell of the world.
///
/// The owner is a non-owning lookup key into the world's block list;
/// a point is occupied exactly when it has an owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub pos: GridPoint,
    owner: Option<BlockId>,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point {
            pos: GridPoint::new(x, y),
            owner: None,
        }
    }

    pub fn occupy(&mut self, block: BlockId) {
        self.owner = Some(block);
    }

    pub fn unoccupy(&mut self) {
        self.owner = None;
    }

    pub fn is_occupied(&self) -> bool {
        self.owner.is_some()
    }

    pub fn owner(&self) -> Option<BlockId> {
        self.owner
    }

    pub fn matches(&self, x: i32, y: i32) -> bool {
        self.pos.x == x && self.pos.y == y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupied_tracks_owner() {
        let mut p = Point::new(3, 4);
        assert!(!p.is_occupied());
        assert_eq!(p.owner(), None);

        p.occupy(BlockId(7));
        assert!(p.is_occupied());
        assert_eq!(p.owner(), Some(BlockId(7)));

        p.unoccupy();
        assert!(!p.is_occupied());
        assert!(p.matches(3, 4));
    }

    #[test]
    fn test_from_world_floors_negatives() {
        assert_eq!(GridPoint::from_world(2.9, 0.1), GridPoint::new(2, 0));
        assert_eq!(GridPoint::from_world(-0.5, -1.0), GridPoint::new(-1, -1));
    }
}
