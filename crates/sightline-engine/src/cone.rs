//! Cone membership math: range, forward hemisphere, half angle.

use glam::DVec3;

use sightline_core::config::DetectionConfig;
use sightline_core::constants::COINCIDENT_DIST_SQ;

/// Quantities derived from the active configuration, cached so per-candidate
/// tests and scoring never touch trigonometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeGeometry {
    pub range: f64,
    pub range_sq: f64,
    pub cos_half_angle: f64,
    pub cos_sq_half_angle: f64,
    pub height_offset: f64,
}

impl ConeGeometry {
    pub fn new(range: f64, half_angle: f64, height_offset: f64) -> Self {
        let cos_half_angle = half_angle.cos();
        Self {
            range,
            range_sq: range * range,
            cos_half_angle,
            cos_sq_half_angle: cos_half_angle * cos_half_angle,
            height_offset,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.range, config.half_angle, config.height_offset)
    }
}

/// Geometry facts about one candidate that passed the cone, kept for the
/// scorer so it never recomputes the displacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeHit {
    /// Squared horizontal distance to the candidate.
    pub dist_sq: f64,
    /// Dot of the unit facing with the horizontal displacement.
    pub facing_dot: f64,
}

/// Test one candidate against the cone. `facing` must already be the
/// horizontal unit facing. Rejections, in order: at or beyond range,
/// coincident with the observer, behind, outside the half angle.
pub fn test_cone(
    observer: DVec3,
    facing: DVec3,
    candidate: DVec3,
    geometry: &ConeGeometry,
) -> Option<ConeHit> {
    let mut displacement = candidate - observer;
    displacement.y = 0.0; // membership is horizontal only

    let dist_sq = displacement.length_squared();
    if dist_sq >= geometry.range_sq || dist_sq < COINCIDENT_DIST_SQ {
        return None;
    }

    let facing_dot = facing.dot(displacement);
    if facing_dot < 0.0 {
        return None;
    }

    // Square-root-free angle test: dot^2 >= cos^2(half) * dist^2 is the
    // squared form of cos(angle) >= cos(half). Valid only while the cosine
    // is positive; at half angles of 90 degrees and wider every forward
    // candidate passes (the rear hemisphere is already cut above).
    if geometry.cos_half_angle > 0.0
        && facing_dot * facing_dot < geometry.cos_sq_half_angle * dist_sq
    {
        return None;
    }

    Some(ConeHit { dist_sq, facing_dot })
}
