//! Query-time error types.

use std::time::Duration;

use crate::domain::{ConfigurationError, ProfileId};

/// Error from route search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// No graph is served for the profile
    #[error("route search unavailable for profile {0}")]
    ProfileUnavailable(ProfileId),

    /// No line can be boarded near the start point
    #[error("no lines found near the start point")]
    NoStartVertices,

    /// No line can be left near the end point
    #[error("no lines found near the end point")]
    NoEndVertices,

    /// The query missed its deadline
    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    /// A search task panicked or was cancelled
    #[error("search task failed: {0}")]
    Worker(String),

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// Search settings are malformed
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            SearchError::ProfileUnavailable(ProfileId(4)).to_string(),
            "route search unavailable for profile 4"
        );
        assert_eq!(
            SearchError::Timeout(Duration::from_millis(250)).to_string(),
            "search timed out after 250ms"
        );
        assert_eq!(
            SearchError::InvalidRequest("latitude out of range".into()).to_string(),
            "invalid search request: latitude out of range"
        );
    }
}
