//! Transit route planner.
//!
//! Builds one transfer graph per transport profile, where each vertex is a
//! line and each edge a place to walk from one line to another, then
//! answers point-to-point journey queries over those graphs.

pub mod domain;
pub mod geometry;
pub mod graph;
pub mod search;
pub mod store;

#[cfg(test)]
mod fixtures;
