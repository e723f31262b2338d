#![allow(dead_code)]

use approx::abs_diff_eq;
use robosim::geometry::BodyAnchor;
use robosim::robot::SONAR_LAYOUT;
use robosim::{Config, RobotSnapshot, World};

/// Default configuration shrunk to a small world with a fast tick
pub fn fast_config(width: i32, height: i32) -> Config {
    let mut config = Config::default();
    config.world.width = width;
    config.world.height = height;
    config.robot.tick_ms = 5;
    config.robot.min_sleep_ms = 1;
    config.logging.enable_action_log = false;
    config
}

/// Draw the world one character per coarse cell, top row first.
/// `#` = occupied square, `R` = robot center, `.` = free.
pub fn render_world(world: &World, robot: Option<&RobotSnapshot>) -> String {
    let (cols, rows) = world.grid_size();
    let robot_cell = robot.map(|snap| {
        (
            (snap.center().x / world.cell_width() as f64).floor() as i32,
            (snap.center().y / world.cell_height() as f64).floor() as i32,
        )
    });

    let mut result = String::new();
    for cy in 0..rows {
        for cx in 0..cols {
            let symbol = if robot_cell == Some((cx, cy)) {
                'R'
            } else if world.grid_square(cx, cy).map_or(false, |s| s.is_occupied()) {
                '#'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }
    result
}

fn anchor_position(snap: &RobotSnapshot, anchor: BodyAnchor) -> glam::DVec2 {
    snap.body.anchor(anchor)
}

/// Every sensor sits on its anchor and points along body heading + bearing
pub fn sensors_attached(snap: &RobotSnapshot, epsilon: f64) -> bool {
    snap.sonars
        .iter()
        .zip(SONAR_LAYOUT.iter())
        .all(|(sonar, (name, anchor, bearing))| {
            let expected = anchor_position(snap, *anchor);
            let heading = (snap.heading() + bearing).rem_euclid(360.0);
            let heading_diff = (sonar.heading() - heading).abs();
            sonar.name() == *name
                && abs_diff_eq!(sonar.origin().x, expected.x, epsilon = epsilon)
                && abs_diff_eq!(sonar.origin().y, expected.y, epsilon = epsilon)
                && (heading_diff < epsilon || (heading_diff - 360.0).abs() < epsilon)
        })
}
