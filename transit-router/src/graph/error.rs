//! Graph construction error types.

use std::time::Duration;

use crate::domain::{ConfigurationError, LineId, ProfileId};
use crate::store::DataAccessError;

/// Errors raised while building the graph of one profile.
///
/// A build error only ever takes down its own profile.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Loading the profile's data failed
    #[error("data access failed: {0}")]
    DataAccess(#[from] DataAccessError),

    /// The profile or build settings are malformed
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Two lines of the profile share an id
    #[error("duplicate line id {0}")]
    DuplicateLine(LineId),

    /// The build did not finish in time
    #[error("graph build for profile {profile} timed out after {after:?}")]
    Timeout { profile: ProfileId, after: Duration },

    /// The build task panicked or was cancelled
    #[error("graph build task failed: {0}")]
    Worker(String),

    /// The metro subgraph can only be attached once
    #[error("metro subgraph already set")]
    MetroSubgraphAlreadySet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BuildError::Timeout {
            profile: ProfileId(3),
            after: Duration::from_secs(2),
        };
        assert_eq!(
            err.to_string(),
            "graph build for profile 3 timed out after 2s"
        );

        let err = BuildError::from(DataAccessError::UnknownProfile(ProfileId(4)));
        assert_eq!(
            err.to_string(),
            "data access failed: unknown transport profile 4"
        );

        let err = BuildError::DuplicateLine(LineId(8));
        assert_eq!(err.to_string(), "duplicate line id 8");
    }
}
