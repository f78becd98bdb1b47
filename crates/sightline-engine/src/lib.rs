//! Headless detection engine for sightline.
//!
//! Orchestrates spatial narrowing, cone filtering, visibility scheduling,
//! scoring, and target persistence over a host-supplied population, one
//! update per host tick. The host drives the loop and answers the
//! collaborator traits in [`world`]; [`host`] ships a hecs-backed
//! reference implementation.

pub mod cone;
pub mod engine;
pub mod host;
pub mod lock;
pub mod lod;
pub mod score;
pub mod world;

pub use sightline_core as core;

pub use engine::DetectionEngine;
pub use host::HostWorld;
pub use world::{PopulationProvider, RayHit, VisibilityProbe};
