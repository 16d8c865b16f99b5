//! Data access error types.

use crate::domain::{DomainError, LineId, ProfileId, RouteId, StopId};

/// Errors raised while loading network data.
#[derive(Debug, thiserror::Error)]
pub enum DataAccessError {
    /// Reading the snapshot failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot is not valid JSON for the expected shape
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// A line refers to a stop the profile does not define
    #[error("line {line} refers to unknown stop {stop}")]
    UnknownStop { line: LineId, stop: StopId },

    /// A line refers to a route the profile does not define
    #[error("line {line} refers to unknown route {route}")]
    UnknownRoute { line: LineId, route: RouteId },

    /// The profile is not present in the store
    #[error("unknown transport profile {0}")]
    UnknownProfile(ProfileId),

    /// Stored data violates a domain invariant
    #[error("invalid data: {0}")]
    Invalid(#[from] DomainError),

    /// A profile's stored data could not be resolved
    #[error("profile {profile} has malformed data: {reason}")]
    Malformed { profile: ProfileId, reason: String },

    /// Backend-specific failure
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}
