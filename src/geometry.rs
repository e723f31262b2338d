use glam::DVec2;

/// Wrap a heading in degrees into [0, 360)
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Unit vector a body faces at `heading_deg`.
///
/// Heading 0 faces +y and increasing the heading swings toward +x, which is
/// counterclockwise when the world is drawn with y growing downward.
pub fn forward(heading_deg: f64) -> DVec2 {
    let rad = heading_deg.to_radians();
    DVec2::new(rad.sin(), rad.cos())
}

/// Unit vector pointing out of the body's right-hand side
pub fn right(heading_deg: f64) -> DVec2 {
    let rad = heading_deg.to_radians();
    DVec2::new(rad.cos(), -rad.sin())
}

/// Map a body-frame offset (lateral, longitudinal) into world space around `center`
pub fn body_to_world(center: DVec2, heading_deg: f64, local: DVec2) -> DVec2 {
    center + right(heading_deg) * local.x + forward(heading_deg) * local.y
}

/// Named points on a rectangular body used to mount sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyAnchor {
    FrontLeft,
    FrontCenter,
    FrontRight,
    RightCenter,
    RearCenter,
    LeftCenter,
}

impl BodyAnchor {
    /// Offset of the anchor from the body center as (lateral, longitudinal)
    pub fn local_offset(self, width: f64, height: f64) -> DVec2 {
        let hw = width / 2.0;
        let hh = height / 2.0;
        match self {
            BodyAnchor::FrontLeft => DVec2::new(-hw, hh),
            BodyAnchor::FrontCenter => DVec2::new(0.0, hh),
            BodyAnchor::FrontRight => DVec2::new(hw, hh),
            BodyAnchor::RightCenter => DVec2::new(hw, 0.0),
            BodyAnchor::RearCenter => DVec2::new(0.0, -hh),
            BodyAnchor::LeftCenter => DVec2::new(-hw, 0.0),
        }
    }
}
