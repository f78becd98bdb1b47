//! SpatialGrid: sparse hash grid over the horizontal plane.

use std::collections::{HashMap, HashSet};

use glam::DVec3;
use thiserror::Error;

use sightline_core::constants::{GRID_REBUILD_COOLDOWN_TICKS, MAX_QUERY_CELL_RADIUS};
use sightline_core::types::{Candidate, CandidateId};

/// Raised when a rebuild runs with a non-positive cell size.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("grid cell size {cell_size} is not positive")]
pub struct InvalidCellSize {
    pub cell_size: f64,
}

#[derive(Debug, Clone, Copy)]
struct RebuildMark {
    x: f64,
    z: f64,
    tick: u64,
}

/// Sparse hash grid bucketing candidates by horizontal cell.
///
/// The grid is rebuilt wholesale, never patched incrementally: stale
/// entries cannot survive a rebuild. Between rebuilds the contents reflect
/// the population as of the last rebuild, which the rebuild policy keeps
/// within one cell size of observer movement.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f64,
    cooldown_ticks: u64,
    cells: HashMap<(i32, i32), Vec<CandidateId>>,
    /// Candidates captured by the last rebuild; storage reused across ticks.
    slab: Vec<Candidate>,
    rebuilt: Option<RebuildMark>,
    invalidated: bool,
    degraded: bool,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        Self::with_cooldown(cell_size, GRID_REBUILD_COOLDOWN_TICKS)
    }

    /// Grid with a custom rebuild cooldown, for hosts that prefer fewer
    /// rebuilds under sustained observer movement.
    pub fn with_cooldown(cell_size: f64, cooldown_ticks: u64) -> Self {
        Self {
            cell_size,
            cooldown_ticks,
            cells: HashMap::new(),
            slab: Vec::new(),
            rebuilt: None,
            invalidated: true,
            degraded: false,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of candidates captured by the last rebuild.
    pub fn len(&self) -> usize {
        self.slab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }

    /// True while the grid is bypassing itself after an invalid cell size.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Mark the index stale so the next `needs_rebuild` check fires.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
        self.degraded = false;
    }

    /// Change the cell size; implies an invalidation.
    pub fn set_cell_size(&mut self, cell_size: f64) {
        self.cell_size = cell_size;
        self.invalidate();
    }

    /// Rebuild policy: an explicit invalidation always fires; otherwise the
    /// observer must have moved more than one cell size horizontally since
    /// the last rebuild and the cooldown must have elapsed. A degraded grid
    /// never asks to rebuild, since the same cell size would fail again.
    pub fn needs_rebuild(&self, observer: DVec3, tick: u64) -> bool {
        if self.degraded {
            return false;
        }
        if self.invalidated {
            return true;
        }
        let Some(mark) = self.rebuilt else {
            return true;
        };
        let dx = observer.x - mark.x;
        let dz = observer.z - mark.z;
        dx * dx + dz * dz > self.cell_size * self.cell_size
            && tick.saturating_sub(mark.tick) >= self.cooldown_ticks
    }

    /// Drop every cell and insert the population wholesale.
    ///
    /// On an invalid cell size the grid keeps the candidate list, marks
    /// itself degraded, and reports the violation; queries then return the
    /// full list unfiltered.
    pub fn rebuild(
        &mut self,
        candidates: &[Candidate],
        observer: DVec3,
        tick: u64,
    ) -> Result<(), InvalidCellSize> {
        self.slab.clear();
        self.slab.extend_from_slice(candidates);
        self.cells.clear();
        if !(self.cell_size > 0.0) {
            self.degraded = true;
            return Err(InvalidCellSize {
                cell_size: self.cell_size,
            });
        }
        for candidate in &self.slab {
            let key = cell_key(candidate.position, self.cell_size);
            self.cells.entry(key).or_default().push(candidate.id);
        }
        self.invalidated = false;
        self.degraded = false;
        self.rebuilt = Some(RebuildMark {
            x: observer.x,
            z: observer.z,
            tick,
        });
        Ok(())
    }

    /// Union of the candidate ids in all cells within
    /// `ceil(radius / cell_size)` of the center cell, deduplicated into
    /// `out`. The cell reach is capped at `MAX_QUERY_CELL_RADIUS`. With an
    /// invalid cell size this returns the full candidate list unfiltered.
    pub fn query_ids(&self, center: DVec3, radius: f64, out: &mut HashSet<CandidateId>) {
        out.clear();
        if !(self.cell_size > 0.0) {
            out.extend(self.slab.iter().map(|c| c.id));
            return;
        }
        let reach = ((radius / self.cell_size).ceil() as i32).clamp(0, MAX_QUERY_CELL_RADIUS);
        let (cx, cz) = cell_key(center, self.cell_size);
        for dz in -reach..=reach {
            for dx in -reach..=reach {
                if let Some(bucket) = self.cells.get(&(cx + dx, cz + dz)) {
                    out.extend(bucket.iter().copied());
                }
            }
        }
    }
}

/// Grid cell of a position: floor-division of x/z by the cell size.
/// Altitude never contributes.
pub fn cell_key(position: DVec3, cell_size: f64) -> (i32, i32) {
    (
        (position.x / cell_size).floor() as i32,
        (position.z / cell_size).floor() as i32,
    )
}
