//! Detection configuration with sanitized construction.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::DetectionError;

/// Per-engine detection parameters.
///
/// Values arrive from host data (code or JSON, with per-field defaults for
/// missing keys) and are sanitized before use: each invalid field is
/// replaced by its documented default and reported as a warning, never a
/// hard failure and never a silent no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Maximum detection distance in meters.
    pub range: f64,
    /// Ray origin height above the observer position (meters).
    pub height_offset: f64,
    /// Half cone angle in radians, in (0, pi].
    pub half_angle: f64,
    /// Candidate category queried from the population provider.
    pub category: String,
    /// Geometry layers visibility rays collide with.
    pub occlusion_mask: u32,
    /// Score and retarget during every update. When false the engine still
    /// maintains the detected set and lock validity each tick, but ranking
    /// and retargeting happen only in on-demand queries.
    pub continuous_update: bool,
    /// Narrow large populations through the grid index.
    pub enable_spatial_partitioning: bool,
    /// Stagger visibility ray tests by distance band.
    pub enable_visibility_lod: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            range: DEFAULT_RANGE,
            height_offset: DEFAULT_HEIGHT_OFFSET,
            half_angle: DEFAULT_HALF_ANGLE,
            category: DEFAULT_CATEGORY.to_string(),
            occlusion_mask: DEFAULT_OCCLUSION_MASK,
            continuous_update: true,
            enable_spatial_partitioning: true,
            enable_visibility_lod: true,
        }
    }
}

impl DetectionConfig {
    /// Replace every invalid field with its documented default, collecting
    /// one error per substitution.
    pub fn sanitized(mut self) -> (Self, Vec<DetectionError>) {
        let mut errors = Vec::new();

        let (range, err) = sanitize_range(self.range);
        self.range = range;
        errors.extend(err);

        let (height_offset, err) = sanitize_height_offset(self.height_offset);
        self.height_offset = height_offset;
        errors.extend(err);

        let (half_angle, err) = sanitize_half_angle(self.half_angle);
        self.half_angle = half_angle;
        errors.extend(err);

        let (category, err) = sanitize_category(self.category);
        self.category = category;
        errors.extend(err);

        let (occlusion_mask, err) = sanitize_occlusion_mask(self.occlusion_mask);
        self.occlusion_mask = occlusion_mask;
        errors.extend(err);

        (self, errors)
    }
}

/// Range must be a positive finite number of meters.
pub fn sanitize_range(range: f64) -> (f64, Option<DetectionError>) {
    if range.is_finite() && range > 0.0 {
        (range, None)
    } else {
        (
            DEFAULT_RANGE,
            Some(DetectionError::InvalidRange {
                given: range,
                fallback: DEFAULT_RANGE,
            }),
        )
    }
}

/// Height offset must be a finite non-negative number of meters.
pub fn sanitize_height_offset(height_offset: f64) -> (f64, Option<DetectionError>) {
    if height_offset.is_finite() && height_offset >= 0.0 {
        (height_offset, None)
    } else {
        (
            DEFAULT_HEIGHT_OFFSET,
            Some(DetectionError::InvalidHeightOffset {
                given: height_offset,
                fallback: DEFAULT_HEIGHT_OFFSET,
            }),
        )
    }
}

/// Half angle must be finite, positive, and at most pi.
pub fn sanitize_half_angle(half_angle: f64) -> (f64, Option<DetectionError>) {
    if half_angle.is_finite() && half_angle > 0.0 && half_angle <= std::f64::consts::PI {
        (half_angle, None)
    } else {
        (
            DEFAULT_HALF_ANGLE,
            Some(DetectionError::InvalidHalfAngle {
                given: half_angle,
                fallback: DEFAULT_HALF_ANGLE,
            }),
        )
    }
}

/// Category must be non-empty.
pub fn sanitize_category(category: String) -> (String, Option<DetectionError>) {
    if category.is_empty() {
        (
            DEFAULT_CATEGORY.to_string(),
            Some(DetectionError::EmptyCategory {
                fallback: DEFAULT_CATEGORY,
            }),
        )
    } else {
        (category, None)
    }
}

/// Occlusion mask must have at least one layer set.
pub fn sanitize_occlusion_mask(mask: u32) -> (u32, Option<DetectionError>) {
    if mask == 0 {
        (
            DEFAULT_OCCLUSION_MASK,
            Some(DetectionError::ZeroOcclusionMask {
                fallback: DEFAULT_OCCLUSION_MASK,
            }),
        )
    } else {
        (mask, None)
    }
}
