use crate::block::Block;
use crate::geometry::{body_to_world, forward, normalize_degrees, BodyAnchor};
use crate::world::World;
use glam::DVec2;
use serde::Serialize;

/// Ranging sensor rigidly mounted on a robot body.
///
/// The mount is stored as a body-frame offset; the sensor never holds a
/// reference to its robot. Pose upkeep happens through [`translate`] and
/// [`rotate`], driven by the robot's tick with the body's own deltas.
///
/// [`translate`]: SonarSensor::translate
/// [`rotate`]: SonarSensor::rotate
#[derive(Debug, Clone, PartialEq)]
pub struct SonarSensor {
    name: String,
    origin: DVec2,
    /// Mount point relative to the body center as (lateral, longitudinal)
    offset: DVec2,
    bearing: f64,
    heading: f64,
    max_range: f64,
    /// Reserved terrain classification; not used by ranging
    terrain: char,
    boundary_blocks: bool,
}

/// One ranging result for telemetry consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SonarReading {
    pub name: String,
    pub distance: f64,
}

impl SonarSensor {
    /// Mount a sensor at `anchor` on `body`, pointing `bearing` degrees off the body heading
    pub fn new(
        name: impl Into<String>,
        body: &Block,
        anchor: BodyAnchor,
        bearing: f64,
        max_range: f64,
        terrain: char,
    ) -> Self {
        SonarSensor {
            name: name.into(),
            origin: body.anchor(anchor),
            offset: anchor.local_offset(body.width(), body.height()),
            bearing,
            heading: normalize_degrees(body.heading() + bearing),
            max_range,
            terrain,
            boundary_blocks: false,
        }
    }

    /// Treat leaving the world as hitting a wall
    pub fn with_boundary_walls(mut self, enabled: bool) -> Self {
        self.boundary_blocks = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    /// Absolute heading in degrees
    pub fn heading(&self) -> f64 {
        self.heading
    }

    /// Fixed offset from the body heading
    pub fn bearing(&self) -> f64 {
        self.bearing
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    pub fn terrain(&self) -> char {
        self.terrain
    }

    /// Far end of the ray at full range
    pub fn ray_end(&self) -> DVec2 {
        self.origin + forward(self.heading) * self.max_range
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.origin += DVec2::new(dx, dy);
    }

    /// Turn with the body: the origin orbits the body center, not itself
    pub fn rotate(&mut self, delta_deg: f64, body: &Block) {
        self.heading = normalize_degrees(self.heading + delta_deg);
        self.origin = body_to_world(body.center(), body.heading(), self.offset);
    }

    /// Distance to the first occupied point along the ray, or `max_range` if none
    pub fn measure(&self, world: &World) -> f64 {
        let end = self.ray_end();
        let line = World::rasterize_segment(self.origin.x, self.origin.y, end.x, end.y);

        for p in line {
            let hit = if world.in_bounds(p.x, p.y) {
                world.is_occupied(p.x, p.y)
            } else {
                self.boundary_blocks
            };
            if hit {
                return p.distance_from(self.origin.x, self.origin.y).min(self.max_range);
            }
        }

        self.max_range
    }

    pub fn reading(&self, world: &World) -> SonarReading {
        SonarReading {
            name: self.name.clone(),
            distance: self.measure(world),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn body() -> Block {
        Block::new(20.0, 30.0, 100.0, 100.0, 0.0)
    }

    #[test]
    fn test_mount_follows_anchor_and_bearing() {
        let b = body();
        let s = SonarSensor::new("Front-Left", &b, BodyAnchor::FrontLeft, 315.0, 750.0, 'l');
        assert_abs_diff_eq!(s.origin().x, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.origin().y, 115.0, epsilon = 1e-9);
        assert_eq!(s.heading(), 315.0);
        assert_eq!(s.terrain(), 'l');
    }

    #[test]
    fn test_empty_world_reads_max_range() {
        let world = World::new(200, 200).unwrap();
        let s = SonarSensor::new("Front", &body(), BodyAnchor::FrontCenter, 0.0, 750.0, 'l');
        assert_eq!(s.measure(&world), 750.0);
    }

    #[test]
    fn test_axis_aligned_hit_distance() {
        let mut world = World::new(200, 400).unwrap();
        // square (4, 9) covers y = 180..=200; front sensor sits at y = 115
        world.toggle_cell(100, 190).unwrap();
        let s = SonarSensor::new("Front", &body(), BodyAnchor::FrontCenter, 0.0, 750.0, 'l');
        let d = s.measure(&world);
        assert_abs_diff_eq!(d, 65.0, epsilon = 1.0);
    }

    #[test]
    fn test_boundary_walls() {
        let world = World::new(200, 200).unwrap();
        let s = SonarSensor::new("Front", &body(), BodyAnchor::FrontCenter, 0.0, 750.0, 'l')
            .with_boundary_walls(true);
        // world ends at y = 199, first outside point is y = 200
        assert_abs_diff_eq!(s.measure(&world), 85.0, epsilon = 1.0);
    }

    #[test]
    fn test_short_range_never_exceeds_max() {
        let mut world = World::new(200, 200).unwrap();
        world.toggle_cell(100, 130).unwrap();
        let s = SonarSensor::new("Front", &body(), BodyAnchor::FrontCenter, 0.0, 3.5, 'l');
        assert!(s.measure(&world) <= 3.5);
    }

    #[test]
    fn test_rotate_orbits_body_center() {
        let mut b = body();
        let mut s = SonarSensor::new("Right", &b, BodyAnchor::RightCenter, 90.0, 750.0, 'l');
        let before = b.heading();
        b.rotate(90.0);
        s.rotate(b.heading() - before, &b);

        // right side now faces -y
        assert_abs_diff_eq!(s.origin().x, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.origin().y, 90.0, epsilon = 1e-9);
        assert_eq!(s.heading(), 180.0);
    }

    #[test]
    fn test_translate_shifts_origin_only() {
        let mut s = SonarSensor::new("Rear", &body(), BodyAnchor::RearCenter, 180.0, 750.0, 'l');
        s.translate(2.0, -3.0);
        assert_abs_diff_eq!(s.origin().x, 102.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.origin().y, 82.0, epsilon = 1e-9);
        assert_eq!(s.heading(), 180.0);
    }
}
