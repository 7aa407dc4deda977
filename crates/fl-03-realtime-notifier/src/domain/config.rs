//! Notifier configuration

use crate::error::NotifierError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Realtime notifier configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Interval between ticks of every session
    pub tick_interval_ms: u64,
    /// Buffered updates per live channel
    pub channel_capacity: usize,
    /// Sample the source at least every N ticks; bus events force a sample
    /// on the next tick
    pub resample_every: u32,
    /// Concurrent live sessions allowed per user
    pub max_sessions_per_user: usize,
    /// How long `shutdown` waits for session tasks to finish
    pub shutdown_grace_ms: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            channel_capacity: 16,
            resample_every: 1,
            max_sessions_per_user: 8,
            shutdown_grace_ms: 5_000,
        }
    }
}

impl NotifierConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), NotifierError> {
        if self.tick_interval_ms == 0 {
            return Err(NotifierError::InvalidConfig(
                "tick_interval_ms must be positive".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(NotifierError::InvalidConfig(
                "channel_capacity must be positive".into(),
            ));
        }
        if self.resample_every == 0 {
            return Err(NotifierError::InvalidConfig("resample_every must be at least 1".into()));
        }
        if self.max_sessions_per_user == 0 {
            return Err(NotifierError::InvalidConfig(
                "max_sessions_per_user must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NotifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_zero_tick() {
        let config = NotifierConfig {
            tick_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
