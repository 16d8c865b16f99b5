//! Build configuration for graph construction.

use std::time::Duration;

use crate::domain::ConfigurationError;

/// Configuration parameters for registry initialization.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Maximum number of profiles built concurrently.
    pub workers: usize,

    /// Time allowed for one profile's build (seconds).
    /// A profile exceeding it is left out of the registry.
    pub profile_timeout_secs: u64,
}

impl BuildConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(workers: usize, profile_timeout_secs: u64) -> Self {
        Self {
            workers,
            profile_timeout_secs,
        }
    }

    /// Returns the per-profile timeout as a Duration.
    pub fn profile_timeout(&self) -> Duration {
        Duration::from_secs(self.profile_timeout_secs)
    }

    /// Reject settings that would stall initialization.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.workers == 0 {
            return Err(ConfigurationError::InvalidSetting {
                name: "workers",
                reason: "must be at least 1",
            });
        }
        if self.profile_timeout_secs == 0 {
            return Err(ConfigurationError::InvalidSetting {
                name: "profile_timeout_secs",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            profile_timeout_secs: 300, // 5 minutes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = BuildConfig::default();

        assert_eq!(config.workers, 4);
        assert_eq!(config.profile_timeout_secs, 300);
        assert_eq!(config.profile_timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_workers() {
        let config = BuildConfig::new(0, 10);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidSetting { name: "workers", .. })
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = BuildConfig::new(2, 0);
        assert!(config.validate().is_err());
    }
}
