//! Response cache configuration

use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest TTL an entry can be stored with (30 days)
pub const MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Response cache configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL used by `put` callers that have no policy of their own
    pub default_ttl_secs: u64,
    /// Entry bound of the in-memory backend
    pub max_entries: usize,
    /// Interval of the maintenance sweep
    pub sweep_interval_secs: u64,
    /// How long a fill ticket stays redeemable
    pub fill_guard_window_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 60,
            max_entries: 100_000,
            sweep_interval_secs: 30,
            fill_guard_window_secs: 30,
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn fill_guard_window(&self) -> Duration {
        Duration::from_secs(self.fill_guard_window_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.default_ttl_secs == 0 {
            return Err(CacheError::InvalidConfig("default_ttl_secs must be positive".into()));
        }
        if self.default_ttl_secs > MAX_TTL_SECS {
            return Err(CacheError::InvalidConfig(format!(
                "default_ttl_secs must be at most {MAX_TTL_SECS}"
            )));
        }
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig("max_entries must be positive".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "sweep_interval_secs must be positive".into(),
            ));
        }
        if self.fill_guard_window_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "fill_guard_window_secs must be positive".into(),
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
        let config = CacheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = CacheConfig {
            max_entries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CacheConfig {
            fill_guard_window_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ttl_above_cap_rejected() {
        let config = CacheConfig {
            default_ttl_secs: MAX_TTL_SECS + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
