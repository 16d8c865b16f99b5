//! Search configuration for the route planner.

use std::time::Duration;

use crate::domain::ConfigurationError;

/// Configuration parameters for route search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of transfers in one journey.
    pub max_transfers: usize,

    /// Maximum number of journeys to return.
    pub max_results: usize,

    /// Transfer search only runs when fewer direct journeys than this were
    /// found.
    pub min_direct_results: usize,

    /// Maximum number of raw decisions the transfer search may produce.
    pub max_decisions: usize,

    /// Decisions transformed per worker task.
    pub transform_chunk_size: usize,

    /// Time allowed for one query (milliseconds).
    pub deadline_ms: u64,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_transfers: usize,
        max_results: usize,
        min_direct_results: usize,
        max_decisions: usize,
        transform_chunk_size: usize,
        deadline_ms: u64,
    ) -> Self {
        Self {
            max_transfers,
            max_results,
            min_direct_results,
            max_decisions,
            transform_chunk_size,
            deadline_ms,
        }
    }

    /// Returns the query deadline as a Duration.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let zero = [
            ("max_results", self.max_results),
            ("max_decisions", self.max_decisions),
            ("transform_chunk_size", self.transform_chunk_size),
        ];
        for (name, value) in zero {
            if value == 0 {
                return Err(ConfigurationError::InvalidSetting {
                    name,
                    reason: "must be at least 1",
                });
            }
        }
        if self.deadline_ms == 0 {
            return Err(ConfigurationError::InvalidSetting {
                name: "deadline_ms",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_transfers: 2,
            max_results: 10,
            min_direct_results: 1,
            max_decisions: 5000,
            transform_chunk_size: 256,
            deadline_ms: 5000, // 5 seconds
        }
    }
}
