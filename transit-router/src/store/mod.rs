//! Access to the network data store.
//!
//! The router never owns network data: profiles, stops and lines come from
//! a `DataAccess` implementation as complete read-only snapshots.

mod error;
mod memory;

use std::future::Future;

pub use error::DataAccessError;
pub use memory::{LineRecord, MemoryStore, ProfileRecord, Snapshot};

use crate::domain::{Line, ProfileId, Stop, TransportProfile};

/// Source of network data.
///
/// This abstraction allows graphs to be built from a database, a file
/// snapshot or test fixtures.
pub trait DataAccess {
    /// All transport profiles.
    fn profiles(&self)
    -> impl Future<Output = Result<Vec<TransportProfile>, DataAccessError>> + Send;

    /// All lines of a profile, each with its route and resolved way.
    fn lines(
        &self,
        profile: ProfileId,
    ) -> impl Future<Output = Result<Vec<Line>, DataAccessError>> + Send;

    /// All stops of a profile.
    fn stops(
        &self,
        profile: ProfileId,
    ) -> impl Future<Output = Result<Vec<Stop>, DataAccessError>> + Send;
}
