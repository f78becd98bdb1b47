//! Visibility scheduling: distance-banded level of detail for ray casts.
//!
//! Rays are the expensive step of a detection pass, so candidates that
//! passed the cone are banded by distance. Close candidates are ray-tested
//! every tick, mid-band candidates on a staggered interval, and far
//! candidates keep their first verdict until they move inward. Verdicts are
//! cached per candidate and pruned once a candidate has not been seen for a
//! while.

use std::collections::HashMap;

use sightline_core::constants::{
    LOD_CLOSE_RATIO, LOD_MID_RATIO, VISIBILITY_CACHE_RETENTION_TICKS, VISIBILITY_RETEST_INTERVAL,
};
use sightline_core::types::CandidateId;

use crate::cone::ConeGeometry;

/// Distance band of a cone-passed candidate, relative to range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// Within half of range.
    Close,
    /// Within three quarters of range.
    Mid,
    /// The outer band.
    Far,
}

/// Band for a squared distance against the active range.
pub fn band(dist_sq: f64, geometry: &ConeGeometry) -> Band {
    let close = geometry.range * LOD_CLOSE_RATIO;
    let mid = geometry.range * LOD_MID_RATIO;
    if dist_sq <= close * close {
        Band::Close
    } else if dist_sq <= mid * mid {
        Band::Mid
    } else {
        Band::Far
    }
}

/// What the scheduler wants done for one candidate this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Cast the ray and report the outcome through `record`.
    Test,
    /// Reuse the cached verdict.
    Cached(bool),
}

#[derive(Debug, Clone, Copy)]
struct Verdict {
    visible: bool,
    touched_tick: u64,
}

/// Per-candidate verdict cache with banded re-test scheduling.
#[derive(Debug, Default)]
pub struct VisibilityScheduler {
    cache: HashMap<CandidateId, Verdict>,
}

impl VisibilityScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `id` needs a fresh ray this tick. A candidate with no
    /// cached verdict is always tested, whatever its band.
    pub fn decide(&mut self, id: CandidateId, band: Band, tick: u64) -> Decision {
        let Some(verdict) = self.cache.get_mut(&id) else {
            return Decision::Test;
        };
        verdict.touched_tick = tick;
        match band {
            Band::Close => Decision::Test,
            Band::Mid => {
                if tick.wrapping_add(stagger(id)) % VISIBILITY_RETEST_INTERVAL == 0 {
                    Decision::Test
                } else {
                    Decision::Cached(verdict.visible)
                }
            }
            Band::Far => Decision::Cached(verdict.visible),
        }
    }

    /// Store the outcome of a ray test.
    pub fn record(&mut self, id: CandidateId, tick: u64, visible: bool) {
        self.cache.insert(
            id,
            Verdict {
                visible,
                touched_tick: tick,
            },
        );
    }

    /// Forget verdicts that have not been consulted recently, so departed
    /// candidates do not accumulate.
    pub fn prune(&mut self, tick: u64) {
        self.cache
            .retain(|_, v| tick.saturating_sub(v.touched_tick) <= VISIBILITY_CACHE_RETENTION_TICKS);
    }

    /// Drop every cached verdict. Mask, ray-height, and category changes
    /// stale the whole cache at once.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Per-candidate tick offset so mid-band re-tests spread across ticks
/// instead of spiking together. Fibonacci hash of the id.
fn stagger(id: CandidateId) -> u64 {
    id.0.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 56
}
