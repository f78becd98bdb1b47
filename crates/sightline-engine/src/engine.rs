//! Detection engine: per-tick orchestration and the query surface.
//!
//! `DetectionEngine` owns the spatial grid, the visibility scheduler, and
//! the persistence tracker. Each update it pulls the candidate population
//! from the host, narrows it, runs cone and visibility filtering, commits
//! the detected set, and advances the lock. Queries between updates read
//! the committed set; ranking is recomputed on demand from the captured
//! observer pose.

use std::collections::HashSet;

use glam::DVec3;

use sightline_core::config::{
    sanitize_category, sanitize_half_angle, sanitize_height_offset, sanitize_occlusion_mask,
    sanitize_range, DetectionConfig,
};
use sightline_core::constants::{
    CELL_SIZE_RATIO, GRACE_TICKS, PERSISTENCE_BONUS, SMALL_POPULATION_THRESHOLD,
};
use sightline_core::error::{DetectionError, Severity};
use sightline_core::events::DetectionEvent;
use sightline_core::report::{DetectionReport, TargetView};
use sightline_core::types::{Candidate, CandidateId, Observer, TargetLock};
use sightline_spatial::SpatialGrid;

use crate::cone::{self, ConeGeometry};
use crate::lock::PersistenceTracker;
use crate::lod::{self, VisibilityScheduler};
use crate::score::{self, ScoreRecord};
use crate::world::{PopulationProvider, VisibilityProbe};

/// Observer pose captured by the latest successful update. Ranking queries
/// replay scoring against this frame rather than a live pose, so results
/// stay consistent with the committed detected set.
#[derive(Debug, Clone, Copy)]
struct ObserverFrame {
    position: DVec3,
    /// Horizontal unit facing.
    facing: DVec3,
    tick: u64,
}

pub struct DetectionEngine {
    config: DetectionConfig,
    geometry: ConeGeometry,

    // Collaborating subsystems.
    grid: SpatialGrid,
    scheduler: VisibilityScheduler,
    tracker: PersistenceTracker,

    // Published state: `detected` is what queries see, `building` is the
    // scratch the scan fills before the swap.
    detected: Vec<Candidate>,
    building: Vec<Candidate>,
    frame: Option<ObserverFrame>,

    // Per-tick scratch, reused so steady-state updates stay allocation-free.
    population: Vec<Candidate>,
    narrowed: HashSet<CandidateId>,
    scores: Vec<ScoreRecord>,

    events: Vec<DetectionEvent>,
    last_error: Option<DetectionError>,
}

impl Default for DetectionEngine {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl DetectionEngine {
    /// Build an engine from host configuration. Invalid fields are replaced
    /// by their defaults and recorded, never rejected.
    pub fn new(config: DetectionConfig) -> Self {
        let (config, errors) = config.sanitized();
        let mut engine = Self {
            geometry: ConeGeometry::from_config(&config),
            grid: SpatialGrid::new(config.range * CELL_SIZE_RATIO),
            scheduler: VisibilityScheduler::new(),
            tracker: PersistenceTracker::new(GRACE_TICKS),
            detected: Vec::new(),
            building: Vec::new(),
            frame: None,
            population: Vec::new(),
            narrowed: HashSet::new(),
            scores: Vec::new(),
            events: Vec::new(),
            last_error: None,
            config,
        };
        for error in errors {
            engine.record_error(error);
        }
        engine
    }

    /// Run one detection pass. Call once per host tick.
    pub fn update<P, V>(&mut self, observer: Observer, tick: u64, population: &P, visibility: &V)
    where
        P: PopulationProvider + ?Sized,
        V: VisibilityProbe + ?Sized,
    {
        // 1. Events describe one update; last update's batch is gone.
        self.events.clear();

        // 2. Validate the pose. A degenerate facing leaves no usable cone,
        //    so the pass publishes an empty set and reports.
        let Some(facing) = observer.facing_horizontal() else {
            self.detected.clear();
            self.frame = None;
            self.record_error(DetectionError::DegenerateFacing);
            return;
        };

        // 3. Pull the population for the active category.
        self.population.clear();
        population.candidates_in(&self.config.category, &mut self.population);

        // 4. Narrow through the grid when it pays off. Small populations
        //    and a degraded grid fall back to the full scan.
        let use_grid = self.config.enable_spatial_partitioning
            && !self.grid.is_degraded()
            && self.population.len() >= SMALL_POPULATION_THRESHOLD;
        let mut narrow = false;
        if use_grid {
            if self.grid.needs_rebuild(observer.position, tick) {
                if let Err(err) = self.grid.rebuild(&self.population, observer.position, tick) {
                    self.record_error(DetectionError::SpatialIndexDegraded {
                        cell_size: err.cell_size,
                    });
                    self.events.push(DetectionEvent::SpatialIndexDegraded {
                        cell_size: err.cell_size,
                    });
                }
            }
            if !self.grid.is_degraded() {
                self.grid
                    .query_ids(observer.position, self.config.range, &mut self.narrowed);
                narrow = true;
            }
        }

        // 5. Cone filter, then visibility. The scheduler skips rays it can
        //    answer from cache; with LOD off or a small population every
        //    candidate is tested and the cache still records outcomes.
        let bypass_lod = !self.config.enable_visibility_lod
            || self.population.len() < SMALL_POPULATION_THRESHOLD;
        let origin = observer.position + DVec3::new(0.0, self.geometry.height_offset, 0.0);
        let mask = self.config.occlusion_mask;
        self.building.clear();
        for candidate in &self.population {
            if narrow && !self.narrowed.contains(&candidate.id) {
                continue;
            }
            let Some(hit) =
                cone::test_cone(observer.position, facing, candidate.position, &self.geometry)
            else {
                continue;
            };

            let visible = if bypass_lod {
                let visible = probe(visibility, origin, candidate, observer.body, mask);
                self.scheduler.record(candidate.id, tick, visible);
                visible
            } else {
                match self
                    .scheduler
                    .decide(candidate.id, lod::band(hit.dist_sq, &self.geometry), tick)
                {
                    lod::Decision::Cached(visible) => visible,
                    lod::Decision::Test => {
                        let visible = probe(visibility, origin, candidate, observer.body, mask);
                        self.scheduler.record(candidate.id, tick, visible);
                        visible
                    }
                }
            };
            if visible {
                self.building.push(*candidate);
            }
        }

        // 6. Commit: queries never observe a half-built set.
        std::mem::swap(&mut self.detected, &mut self.building);
        self.building.clear();
        self.scheduler.prune(tick);
        self.frame = Some(ObserverFrame {
            position: observer.position,
            facing,
            tick,
        });

        // 7. Advance the lock against the committed set.
        let (lock_detected, lock_alive) = match self.tracker.current() {
            Some(target) => (
                self.detected.iter().any(|c| c.id == target),
                population.is_alive(target),
            ),
            None => (false, false),
        };
        let change = if self.config.continuous_update {
            let mut scores = std::mem::take(&mut self.scores);
            self.score_into(&mut scores);
            let best = score::best(&scores).map(|record| record.id);
            let change = self.tracker.update(best, lock_detected, lock_alive, tick);
            self.scores = scores;
            change
        } else {
            self.tracker.maintain(lock_detected, lock_alive, tick)
        };
        if let Some(change) = change {
            log::debug!(
                "locked target changed: {:?} -> {:?}",
                change.previous,
                change.new
            );
            self.events.push(DetectionEvent::TargetChanged(change));
        }
    }

    /// Score the committed detected set into `out`, bonus applied to the
    /// freshly locked target.
    fn score_into(&self, out: &mut Vec<ScoreRecord>) {
        out.clear();
        let Some(frame) = self.frame else {
            return;
        };
        let bonus_target = self.tracker.bonus_target(frame.tick);
        for candidate in &self.detected {
            let Some(hit) =
                cone::test_cone(frame.position, frame.facing, candidate.position, &self.geometry)
            else {
                continue;
            };
            let bonus = if bonus_target == Some(candidate.id) {
                PERSISTENCE_BONUS
            } else {
                0.0
            };
            out.push(score::score_candidate(candidate.id, &hit, &self.geometry, bonus));
        }
    }

    // ---- Queries ----

    /// Snapshot of the detected set, in provider order.
    pub fn detected(&self) -> Vec<Candidate> {
        self.detected.clone()
    }

    pub fn detected_count(&self) -> usize {
        self.detected.len()
    }

    /// Highest-scored detected candidate, persistence bonus applied.
    /// Earliest detection wins ties.
    pub fn best_target(&self) -> Option<ScoreRecord> {
        let mut records = Vec::new();
        self.score_into(&mut records);
        score::best(&records).copied()
    }

    /// Every detected candidate scored and sorted best first. Ties keep
    /// detection order.
    pub fn ranked_targets(&self) -> Vec<ScoreRecord> {
        let mut records = Vec::new();
        self.score_into(&mut records);
        score::rank(&mut records);
        records
    }

    /// Identity of the locked target, if a lock is held.
    pub fn current_locked_target(&self) -> Option<CandidateId> {
        self.tracker.current()
    }

    /// Full lock state, including the tick it was last refreshed.
    pub fn current_lock(&self) -> Option<TargetLock> {
        self.tracker.lock()
    }

    /// Events raised by the latest update, plus any raised by explicit
    /// mutators called since.
    pub fn events(&self) -> &[DetectionEvent] {
        &self.events
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Most recent recorded error. Recording overwrites, never accumulates.
    pub fn last_error(&self) -> Option<&DetectionError> {
        self.last_error.as_ref()
    }

    /// Serializable view of the latest update for host-side diagnostics.
    pub fn report<P>(&self, population: &P) -> DetectionReport
    where
        P: PopulationProvider + ?Sized,
    {
        let mut records = Vec::new();
        self.score_into(&mut records);
        score::rank(&mut records);
        DetectionReport {
            tick: self.frame.map(|f| f.tick),
            detected: records
                .iter()
                .map(|record| TargetView {
                    id: record.id,
                    label: population.describe(record.id),
                    distance: record.dist_sq.sqrt(),
                    score: record.score,
                    angle_score: record.angle_score,
                })
                .collect(),
            locked_target: self.tracker.current(),
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
        }
    }

    // ---- Mutators ----

    /// Drop the lock immediately, bypassing the grace window.
    pub fn clear_lock(&mut self) {
        if let Some(change) = self.tracker.clear() {
            log::debug!("locked target cleared: {:?}", change.previous);
            self.events.push(DetectionEvent::TargetChanged(change));
        }
    }

    /// Force a grid rebuild on the next update. Hosts call this after bulk
    /// spawns, despawns, or teleports of candidates.
    pub fn invalidate_spatial_cache(&mut self) {
        self.grid.invalidate();
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Set the detection range. The cone geometry and the grid cell size
    /// both track it.
    pub fn set_range(&mut self, range: f64) {
        let (range, error) = sanitize_range(range);
        if let Some(error) = error {
            self.record_error(error);
        }
        self.config.range = range;
        self.geometry = ConeGeometry::from_config(&self.config);
        self.grid.set_cell_size(range * CELL_SIZE_RATIO);
    }

    pub fn set_half_angle(&mut self, half_angle: f64) {
        let (half_angle, error) = sanitize_half_angle(half_angle);
        if let Some(error) = error {
            self.record_error(error);
        }
        self.config.half_angle = half_angle;
        self.geometry = ConeGeometry::from_config(&self.config);
    }

    /// Set the ray origin height. Cached visibility verdicts were cast from
    /// the old height, so they all go stale.
    pub fn set_height_offset(&mut self, height_offset: f64) {
        let (height_offset, error) = sanitize_height_offset(height_offset);
        if let Some(error) = error {
            self.record_error(error);
        }
        self.config.height_offset = height_offset;
        self.geometry = ConeGeometry::from_config(&self.config);
        self.scheduler.clear();
    }

    /// Switch the candidate category. The grid indexes the old population
    /// and the verdict cache describes it, so both reset.
    pub fn set_category(&mut self, category: String) {
        let (category, error) = sanitize_category(category);
        if let Some(error) = error {
            self.record_error(error);
        }
        self.config.category = category;
        self.grid.invalidate();
        self.scheduler.clear();
    }

    /// Set the occlusion mask. Cached verdicts were cast with the old mask.
    pub fn set_occlusion_mask(&mut self, mask: u32) {
        let (mask, error) = sanitize_occlusion_mask(mask);
        if let Some(error) = error {
            self.record_error(error);
        }
        self.config.occlusion_mask = mask;
        self.scheduler.clear();
    }

    pub fn set_continuous_update(&mut self, continuous: bool) {
        self.config.continuous_update = continuous;
    }

    pub fn set_spatial_partitioning(&mut self, enabled: bool) {
        self.config.enable_spatial_partitioning = enabled;
        if enabled {
            self.grid.invalidate();
        }
    }

    pub fn set_visibility_lod(&mut self, enabled: bool) {
        self.config.enable_visibility_lod = enabled;
    }

    fn record_error(&mut self, error: DetectionError) {
        match error.severity() {
            Severity::Warning => log::warn!("{error}"),
            Severity::Critical => log::error!("{error}"),
        }
        self.last_error = Some(error);
    }

    /// Direct read of the grid, for tests.
    #[cfg(test)]
    pub(crate) fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Number of cached visibility verdicts, for tests.
    #[cfg(test)]
    pub(crate) fn cached_verdicts(&self) -> usize {
        self.scheduler.len()
    }
}

/// Visible iff the path is clear or the first obstruction is the candidate
/// itself (its own collision body catching the ray short of its center).
fn probe<V: VisibilityProbe + ?Sized>(
    visibility: &V,
    origin: DVec3,
    candidate: &Candidate,
    exclude: Option<CandidateId>,
    mask: u32,
) -> bool {
    match visibility.cast_ray(origin, candidate.position, exclude, mask) {
        None => true,
        Some(hit) => hit.entity == Some(candidate.id),
    }
}
