//! Transport profiles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a transport profile (one city network, one graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub u32);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error for malformed profiles and settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// Access zone radius must be strictly positive
    #[error("profile {profile}: access zone radius must be positive, got {radius}")]
    NonPositiveRadius { profile: ProfileId, radius: f64 },

    /// A tuning setting is out of range
    #[error("invalid setting {name}: {reason}")]
    InvalidSetting {
        name: &'static str,
        reason: &'static str,
    },
}

/// A transport profile: a network with its own walking radius for transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportProfile {
    pub id: ProfileId,
    pub name: String,
    /// Distance in metres within which two stops are mutually walkable.
    pub access_zone_radius: f64,
}

impl TransportProfile {
    pub fn new(id: u32, name: impl Into<String>, access_zone_radius: f64) -> Self {
        Self {
            id: ProfileId(id),
            name: name.into(),
            access_zone_radius,
        }
    }

    /// Checks the profile can be used to build a graph.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        // NaN fails this comparison too.
        if !(self.access_zone_radius > 0.0) {
            return Err(ConfigurationError::NonPositiveRadius {
                profile: self.id,
                radius: self.access_zone_radius,
            });
        }
        Ok(())
    }
}

impl fmt::Display for TransportProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] radius={}m",
            self.name, self.id, self.access_zone_radius
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_radius() {
        assert!(TransportProfile::new(1, "Minsk", 250.0).validate().is_ok());

        let err = TransportProfile::new(2, "Broken", 0.0).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "profile 2: access zone radius must be positive, got 0"
        );

        assert!(TransportProfile::new(3, "Negative", -5.0).validate().is_err());
        assert!(TransportProfile::new(4, "NaN", f64::NAN).validate().is_err());
    }
}
