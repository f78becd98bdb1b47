//! Events raised by the detection engine for the host.

use serde::{Deserialize, Serialize};

use crate::types::CandidateId;

/// Locked-target identity change, either side nullable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetChange {
    pub new: Option<CandidateId>,
    pub previous: Option<CandidateId>,
}

/// Events appended to the engine queue by `update()` and explicit mutators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DetectionEvent {
    /// The locked target changed. `update()` emits at most one of these per
    /// call, after the new lock state is committed.
    TargetChanged(TargetChange),
    /// The spatial index hit an invalid cell size; detection continues on
    /// unindexed full scans.
    SpatialIndexDegraded { cell_size: f64 },
}
