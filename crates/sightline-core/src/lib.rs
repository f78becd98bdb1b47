//! Core types and definitions for the sightline detection engine.
//!
//! This crate defines the vocabulary shared across the other crates:
//! candidate and observer types, configuration, constants, errors, and
//! events. It has no dependency on any host framework.

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod report;
pub mod types;

#[cfg(test)]
mod tests;
