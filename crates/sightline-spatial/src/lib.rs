//! Spatial partitioning for the sightline detection engine.
//!
//! A sparse hash grid over the horizontal plane: candidates are bucketed
//! by cell, rebuilt wholesale under an observer-movement policy, and
//! queried as a union of cells around a center point.

pub use sightline_core as core;

pub mod grid;

pub use grid::SpatialGrid;
