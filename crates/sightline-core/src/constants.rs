//! Detection constants and tuning parameters.

// --- Cone defaults ---

/// Default detection range in meters.
pub const DEFAULT_RANGE: f64 = 60.0;

/// Default half cone angle in radians (60 degrees).
pub const DEFAULT_HALF_ANGLE: f64 = std::f64::consts::FRAC_PI_3;

/// Default ray origin height above the observer position (meters).
pub const DEFAULT_HEIGHT_OFFSET: f64 = 1.5;

/// Default candidate category queried from the population.
pub const DEFAULT_CATEGORY: &str = "threats";

/// Default occlusion mask (layer 1 only).
pub const DEFAULT_OCCLUSION_MASK: u32 = 1;

/// Squared horizontal distance below which a candidate coincides with the
/// observer and is rejected before any division.
pub const COINCIDENT_DIST_SQ: f64 = 1e-8;

/// Squared horizontal facing length below which the facing is degenerate.
pub const DEGENERATE_FACING_SQ: f64 = 1e-12;

// --- Scoring ---

/// Weight of the distance sub-score in the combined score.
pub const DISTANCE_WEIGHT: f64 = 0.6;

/// Weight of the angle sub-score in the combined score.
pub const ANGLE_WEIGHT: f64 = 0.4;

/// Score bonus held by the locked target while its lock is fresh.
pub const PERSISTENCE_BONUS: f64 = 0.15;

/// Below this remap denominator the cone counts as degenerate
/// (half angle approaching zero).
pub const DEGENERATE_CONE_EPSILON: f64 = 1e-6;

/// Alignment cosine treated as a direct hit when the cone is degenerate.
pub const DIRECT_HIT_COS: f64 = 0.999;

// --- Persistence ---

/// Ticks a locked target may stay undetected before the lock clears.
pub const GRACE_TICKS: u64 = 12;

// --- Spatial index ---

/// Grid cell size as a fraction of detection range.
pub const CELL_SIZE_RATIO: f64 = 0.5;

/// Upper bound on the cell radius searched by one grid query.
pub const MAX_QUERY_CELL_RADIUS: i32 = 8;

/// Minimum ticks between movement-triggered grid rebuilds.
/// Tunable: anything in 20-60 behaves well; lower values track fast
/// observers more tightly at the cost of more rebuilds.
pub const GRID_REBUILD_COOLDOWN_TICKS: u64 = 20;

/// Below this population size the engine scans directly instead of
/// paying grid and scheduler overhead.
pub const SMALL_POPULATION_THRESHOLD: usize = 16;

// --- Visibility LOD ---

/// Fraction of range under which candidates are ray-tested every tick.
pub const LOD_CLOSE_RATIO: f64 = 0.5;

/// Fraction of range under which candidates are ray-tested on a stagger.
pub const LOD_MID_RATIO: f64 = 0.75;

/// Tick interval between staggered visibility re-tests.
pub const VISIBILITY_RETEST_INTERVAL: u64 = 2;

/// Cached visibility verdicts untouched this long are forgotten.
pub const VISIBILITY_CACHE_RETENTION_TICKS: u64 = 120;
