//! Metric store configuration and validation
//!
//! The ranking weights are policy, so they live here rather than in the
//! scoring code.

use crate::error::MetricError;
use serde::{Deserialize, Serialize};

/// Metric store configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricStoreConfig {
    /// Incentive score of a freshly added metric
    pub initial_incentive_score: i64,
    /// Decay factor of a freshly added metric
    pub initial_decay_factor: u64,
    /// Motivation factor used when a caller does not supply one
    pub default_motivation_factor: i64,
    /// Experience changes kept per user, oldest dropped first
    pub experience_log_limit: usize,
}

impl Default for MetricStoreConfig {
    fn default() -> Self {
        Self {
            initial_incentive_score: 0,
            initial_decay_factor: 1,
            default_motivation_factor: 1,
            experience_log_limit: 100,
        }
    }
}

impl MetricStoreConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), MetricError> {
        // A zero initial decay would pin every new entity at score 0
        if self.initial_decay_factor == 0 {
            return Err(MetricError::InvalidConfig(
                "initial_decay_factor must be at least 1".into(),
            ));
        }
        if self.default_motivation_factor <= 0 {
            return Err(MetricError::InvalidConfig(format!(
                "default_motivation_factor must be positive, got {}",
                self.default_motivation_factor
            )));
        }
        if self.experience_log_limit == 0 {
            return Err(MetricError::InvalidConfig(
                "experience_log_limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MetricStoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_decay() {
        let config = MetricStoreConfig {
            initial_decay_factor: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(MetricError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_empty_experience_log() {
        let config = MetricStoreConfig {
            experience_log_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_motivation() {
        let config = MetricStoreConfig {
            default_motivation_factor: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
