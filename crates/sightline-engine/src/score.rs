//! Candidate scoring and ranking.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use sightline_core::constants::{
    ANGLE_WEIGHT, COINCIDENT_DIST_SQ, DEGENERATE_CONE_EPSILON, DIRECT_HIT_COS, DISTANCE_WEIGHT,
};
use sightline_core::types::CandidateId;

use crate::cone::{ConeGeometry, ConeHit};

/// Desirability of one detected candidate. Ephemeral: ranking queries
/// recompute records from the current detected set, nothing stores them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: CandidateId,
    /// Weighted distance and angle components, plus the persistence bonus
    /// when the candidate is the freshly locked target.
    pub score: f64,
    pub dist_sq: f64,
    pub angle_score: f64,
}

/// Score one cone-passed candidate. `bonus` is zero or the persistence
/// bonus; the caller decides who earns it.
pub fn score_candidate(
    id: CandidateId,
    hit: &ConeHit,
    geometry: &ConeGeometry,
    bonus: f64,
) -> ScoreRecord {
    if hit.dist_sq < COINCIDENT_DIST_SQ {
        // On top of the observer: maximum desirability, no division.
        return ScoreRecord {
            id,
            score: 1.0 + bonus,
            dist_sq: hit.dist_sq,
            angle_score: 1.0,
        };
    }

    let distance = hit.dist_sq.sqrt();
    let distance_score = 1.0 - (distance / geometry.range).clamp(0.0, 1.0);

    let cos_angle = (hit.facing_dot / distance).clamp(-1.0, 1.0);
    let denominator = 1.0 - geometry.cos_half_angle;
    let angle_score = if denominator < DEGENERATE_CONE_EPSILON {
        // Needle cone: the remap has no width, so the verdict is binary.
        if cos_angle >= DIRECT_HIT_COS {
            1.0
        } else {
            0.0
        }
    } else {
        ((cos_angle - geometry.cos_half_angle) / denominator).clamp(0.0, 1.0)
    };

    ScoreRecord {
        id,
        score: distance_score * DISTANCE_WEIGHT + angle_score * ANGLE_WEIGHT + bonus,
        dist_sq: hit.dist_sq,
        angle_score,
    }
}

/// Single best record: maximum score, earliest record on ties.
pub fn best(records: &[ScoreRecord]) -> Option<&ScoreRecord> {
    records.iter().reduce(|held, challenger| {
        if challenger.score > held.score {
            challenger
        } else {
            held
        }
    })
}

/// Sort descending by score. Stable, so equal scores keep input order.
pub fn rank(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> ConeGeometry {
        ConeGeometry::new(60.0, std::f64::consts::FRAC_PI_3, 1.5)
    }

    /// Hit at `distance` meters with the given cosine off the facing axis.
    fn hit_at(distance: f64, cos_angle: f64) -> ConeHit {
        ConeHit {
            dist_sq: distance * distance,
            facing_dot: distance * cos_angle,
        }
    }

    #[test]
    fn test_half_range_centered_score() {
        let record = score_candidate(CandidateId(1), &hit_at(30.0, 1.0), &geometry(), 0.0);
        assert!(
            (record.score - 0.7).abs() < 1e-9,
            "0.5 * 0.6 + 1.0 * 0.4, got {}",
            record.score
        );
        assert!((record.angle_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_nearer_scores_higher_at_same_angle() {
        let geom = geometry();
        let near = score_candidate(CandidateId(1), &hit_at(10.0, 0.9), &geom, 0.0);
        let far = score_candidate(CandidateId(2), &hit_at(45.0, 0.9), &geom, 0.0);
        assert!(near.score > far.score);
    }

    #[test]
    fn test_centered_scores_higher_at_same_distance() {
        let geom = geometry();
        let centered = score_candidate(CandidateId(1), &hit_at(20.0, 0.99), &geom, 0.0);
        let offset = score_candidate(CandidateId(2), &hit_at(20.0, 0.6), &geom, 0.0);
        assert!(centered.score > offset.score);
    }

    #[test]
    fn test_angle_score_remap_bounds() {
        let geom = geometry();
        // On the cone edge the remap bottoms out at zero.
        let edge = score_candidate(CandidateId(1), &hit_at(20.0, geom.cos_half_angle), &geom, 0.0);
        assert!(edge.angle_score.abs() < 1e-9);
        // Dead center tops out at one.
        let center = score_candidate(CandidateId(2), &hit_at(20.0, 1.0), &geom, 0.0);
        assert!((center.angle_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_cone_is_binary() {
        let geom = ConeGeometry::new(60.0, 1e-9, 0.0);
        let aligned = score_candidate(CandidateId(1), &hit_at(20.0, 1.0), &geom, 0.0);
        assert!((aligned.angle_score - 1.0).abs() < 1e-9);
        let off = score_candidate(CandidateId(2), &hit_at(20.0, 0.99), &geom, 0.0);
        assert_eq!(off.angle_score, 0.0, "0.99 is under the direct-hit cosine");
    }

    #[test]
    fn test_coincident_scores_maximum() {
        let hit = ConeHit {
            dist_sq: 0.0,
            facing_dot: 0.0,
        };
        let record = score_candidate(CandidateId(1), &hit, &geometry(), 0.0);
        assert_eq!(record.score, 1.0);
        assert_eq!(record.angle_score, 1.0);
    }

    #[test]
    fn test_bonus_is_additive() {
        let geom = geometry();
        let plain = score_candidate(CandidateId(1), &hit_at(30.0, 1.0), &geom, 0.0);
        let bonused = score_candidate(CandidateId(1), &hit_at(30.0, 1.0), &geom, 0.15);
        assert!((bonused.score - plain.score - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_best_keeps_first_on_ties() {
        let geom = geometry();
        let records = vec![
            score_candidate(CandidateId(10), &hit_at(30.0, 1.0), &geom, 0.0),
            score_candidate(CandidateId(11), &hit_at(30.0, 1.0), &geom, 0.0),
        ];
        assert_eq!(best(&records).unwrap().id, CandidateId(10));
    }

    #[test]
    fn test_best_of_empty_is_none() {
        assert!(best(&[]).is_none());
    }

    #[test]
    fn test_rank_descending_stable() {
        let geom = geometry();
        let mut records = vec![
            score_candidate(CandidateId(1), &hit_at(50.0, 0.9), &geom, 0.0),
            score_candidate(CandidateId(2), &hit_at(10.0, 0.9), &geom, 0.0),
            score_candidate(CandidateId(3), &hit_at(50.0, 0.9), &geom, 0.0),
        ];
        rank(&mut records);
        assert_eq!(records[0].id, CandidateId(2));
        assert_eq!(records[1].id, CandidateId(1), "ties keep input order");
        assert_eq!(records[2].id, CandidateId(3));
    }
}
