//! Domain error types.
//!
//! These errors represent invalid network data detected while constructing
//! domain values. They are distinct from store and search errors.

use super::LineId;

/// Domain-level validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// A line must visit at least one stop
    #[error("line {0} has an empty way")]
    EmptyWay(LineId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::EmptyWay(LineId(42));
        assert_eq!(err.to_string(), "line 42 has an empty way");
    }
}
