//! Transfer graph construction and storage.
//!
//! Each transport profile gets one `PathGraph`: a vertex per line (all
//! metro lines share a single vertex), and an edge wherever a passenger can
//! walk from one line to another. Graphs are built once at start-up and
//! served read-only from the `GraphRegistry`.

mod builder;
mod config;
mod error;
mod path_graph;
mod registry;


pub use builder::{GraphBuilder, load_profile_data};
pub use config::BuildConfig;
pub use error::BuildError;
pub use path_graph::{Edge, PathGraph, StopRef, StopVisit, TransferPair, Vertex};
pub use registry::{GraphRegistry, InitReport};
