//! Collaborator contracts the host world implements.
//!
//! The engine never walks scene graphs or physics worlds itself. It asks a
//! [`PopulationProvider`] for the current members of one category and a
//! [`VisibilityProbe`] for occlusion rays, and the host decides how those
//! are answered.

use glam::DVec3;

use sightline_core::types::{Candidate, CandidateId};

/// Source of the candidate population, one category at a time.
pub trait PopulationProvider {
    /// Fill `out` with the current members of `category`. The engine clears
    /// the buffer before calling; the provider's iteration order must be
    /// stable within a tick.
    fn candidates_in(&self, category: &str, out: &mut Vec<Candidate>);

    /// Whether the entity behind `id` still exists in the world.
    fn is_alive(&self, id: CandidateId) -> bool;

    /// Optional human-readable description for reports. Providers without
    /// the capability return `None`.
    fn describe(&self, _id: CandidateId) -> Option<String> {
        None
    }
}

/// First blocking hit of a visibility ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Identity of the struck entity, when the geometry belongs to one.
    pub entity: Option<CandidateId>,
    /// Distance from the ray origin to the hit, in meters.
    pub distance: f64,
}

/// Occlusion test against the host's static and dynamic geometry.
pub trait VisibilityProbe {
    /// Cast a ray from `origin` toward `target`, colliding with geometry on
    /// the layers of `mask` and ignoring the entity `exclude`. Returns the
    /// first hit along the segment, or `None` when the path is clear all
    /// the way to the target.
    fn cast_ray(
        &self,
        origin: DVec3,
        target: DVec3,
        exclude: Option<CandidateId>,
        mask: u32,
    ) -> Option<RayHit>;
}
