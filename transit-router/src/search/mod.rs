//! Route search over the transfer graph.
//!
//! A query groups the stops around its start and end points by the
//! vertices serving them, looks for direct rides, falls back to a
//! breadth-first transfer search, turns the resulting decisions into
//! journeys in parallel, drops implausible ones and ranks the rest.

mod bfs;
mod config;
mod engine;
mod error;
mod metro;
mod path;
mod planner;
mod rank;
mod transform;


pub use bfs::BfsEngine;
pub use config::SearchConfig;
pub use engine::{EndpointGroups, SearchEngine};
pub use error::SearchError;
pub use path::{Decision, DecisionLeg, OptimalPath, PathKey, Segment};
pub use planner::RouteSearch;
pub use rank::{deduplicate, rank_paths};
pub use transform::{TransformTask, transform_in_parallel};
