//! Error taxonomy for the detection engine.
//!
//! Nothing here aborts an update. Configuration and input problems are
//! recovered locally with documented fallbacks; invariant violations put
//! the affected subsystem in a degraded mode. The engine records the most
//! recent error in a last-error slot rather than propagating.

use thiserror::Error;

/// How severe a recorded error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Recovered on the spot; the engine stays fully operational.
    Warning,
    /// A subsystem is running degraded until its input is corrected.
    Critical,
}

/// Everything the detection engine can record in its last-error slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    #[error("detection range {given} is not positive; using {fallback}")]
    InvalidRange { given: f64, fallback: f64 },

    #[error("height offset {given} is negative; using {fallback}")]
    InvalidHeightOffset { given: f64, fallback: f64 },

    #[error("half angle {given} rad is outside (0, pi]; using {fallback}")]
    InvalidHalfAngle { given: f64, fallback: f64 },

    #[error("category is empty; using {fallback:?}")]
    EmptyCategory { fallback: &'static str },

    #[error("occlusion mask has no layers set; using {fallback:#06x}")]
    ZeroOcclusionMask { fallback: u32 },

    #[error("facing vector has no horizontal component")]
    DegenerateFacing,

    #[error("spatial cell size {cell_size} is not positive; scanning unindexed")]
    SpatialIndexDegraded { cell_size: f64 },
}

impl DetectionError {
    pub fn severity(&self) -> Severity {
        match self {
            DetectionError::SpatialIndexDegraded { .. } => Severity::Critical,
            _ => Severity::Warning,
        }
    }
}
