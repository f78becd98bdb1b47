//! Fundamental detection types.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Stable identity of a candidate entity, as issued by the host world.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CandidateId(pub u64);

/// One entry of the candidate population: identity plus current position.
///
/// All positions use a Y-up frame: x/z span the horizontal plane, +y is up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub position: DVec3,
}

/// Observer pose for one detection update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    pub position: DVec3,
    /// Raw facing vector; projected onto the horizontal plane before use.
    pub facing: DVec3,
    /// Collision identity of the observer's own body, excluded from
    /// visibility rays. `None` when the observer has no collision volume.
    pub body: Option<CandidateId>,
}

/// Lock held by the persistence tracker on a detected candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetLock {
    pub target: CandidateId,
    /// Tick the lock was last confirmed: set at acquisition, refreshed to
    /// the current tick on every update where the target is detected.
    pub lock_tick: u64,
}

impl Candidate {
    pub fn new(id: CandidateId, position: DVec3) -> Self {
        Self { id, position }
    }
}

impl Observer {
    pub fn new(position: DVec3, facing: DVec3) -> Self {
        Self {
            position,
            facing,
            body: None,
        }
    }

    pub fn with_body(position: DVec3, facing: DVec3, body: CandidateId) -> Self {
        Self {
            position,
            facing,
            body: Some(body),
        }
    }

    /// Horizontal unit facing vector, or `None` when the raw facing has no
    /// usable horizontal component (zero input, or looking straight up).
    pub fn facing_horizontal(&self) -> Option<DVec3> {
        let flat = DVec3::new(self.facing.x, 0.0, self.facing.z);
        let len_sq = flat.length_squared();
        if len_sq < crate::constants::DEGENERATE_FACING_SQ {
            return None;
        }
        Some(flat / len_sq.sqrt())
    }
}
