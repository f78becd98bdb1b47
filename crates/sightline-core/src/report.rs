//! Serializable detection views for host-side diagnostics.

use serde::{Deserialize, Serialize};

use crate::types::CandidateId;

/// One ranked detected candidate as the host sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetView {
    pub id: CandidateId,
    /// Host-provided description, when the population offers one.
    pub label: Option<String>,
    /// Horizontal distance from the observer in meters.
    pub distance: f64,
    pub score: f64,
    pub angle_score: f64,
}

/// Snapshot of the engine after an update: ranked targets, lock, last error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Tick of the underlying update; `None` before the first valid one.
    pub tick: Option<u64>,
    /// Detected candidates, best first.
    pub detected: Vec<TargetView>,
    pub locked_target: Option<CandidateId>,
    /// Most recent recorded error, rendered as text.
    pub last_error: Option<String>,
}
