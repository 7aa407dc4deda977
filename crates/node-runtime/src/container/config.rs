//! # Runtime Configuration
//!
//! Unified configuration for all subsystems and runtime parameters.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults of every subsystem
//! 2. TOML file named by `FL_CONFIG` (optional)
//! 3. `FL_*` environment variables for the commonly tuned values
//!
//! ```toml
//! [cache]
//! default_ttl_secs = 60
//!
//! [notifier]
//! tick_interval_ms = 1000
//!
//! [facade.ttl.per_style]
//! whisper = 10
//! ```

use std::path::Path;
use std::str::FromStr;

use fl_01_metric_store::MetricStoreConfig;
use fl_02_response_cache::CacheConfig;
use fl_03_realtime_notifier::NotifierConfig;
use fl_04_query_facade::FacadeConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming the TOML configuration file.
pub const CONFIG_PATH_VAR: &str = "FL_CONFIG";

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Metric store configuration.
    pub metric_store: MetricStoreConfig,
    /// Response cache configuration.
    pub cache: CacheConfig,
    /// Realtime notifier configuration.
    pub notifier: NotifierConfig,
    /// Query facade configuration.
    pub facade: FacadeConfig,
    /// Runtime parameters.
    pub runtime: RuntimeConfig,
}

/// Parameters of the runtime itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Per-subscriber event bus buffer.
    pub bus_capacity: usize,
    /// Physically remove tombstoned metrics during maintenance.
    pub purge_tombstones: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bus_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            purge_tombstones: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for `FeedConfig`.
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value {value:?} for {var}")]
    InvalidVar { var: &'static str, value: String },

    /// A subsystem rejected its section.
    #[error("Invalid {section} configuration: {reason}")]
    Invalid {
        section: &'static str,
        reason: String,
    },
}

impl FeedConfig {
    /// Load from `FL_CONFIG` (if set) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing sections and fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `FL_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        override_with(&lookup, "FL_CACHE_DEFAULT_TTL_SECS", &mut self.cache.default_ttl_secs)?;
        override_with(&lookup, "FL_CACHE_MAX_ENTRIES", &mut self.cache.max_entries)?;
        override_with(
            &lookup,
            "FL_CACHE_SWEEP_INTERVAL_SECS",
            &mut self.cache.sweep_interval_secs,
        )?;
        override_with(
            &lookup,
            "FL_NOTIFIER_TICK_INTERVAL_MS",
            &mut self.notifier.tick_interval_ms,
        )?;
        override_with(
            &lookup,
            "FL_NOTIFIER_MAX_SESSIONS_PER_USER",
            &mut self.notifier.max_sessions_per_user,
        )?;
        override_with(&lookup, "FL_FACADE_DEFAULT_TTL_SECS", &mut self.facade.ttl.default_secs)?;
        override_with(&lookup, "FL_FACADE_MAX_PAGE_SIZE", &mut self.facade.max_page_size)?;
        override_with(&lookup, "FL_BUS_CAPACITY", &mut self.runtime.bus_capacity)?;
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.metric_store
            .validate()
            .map_err(|e| invalid("metric_store", e))?;
        self.cache.validate().map_err(|e| invalid("cache", e))?;
        self.notifier.validate().map_err(|e| invalid("notifier", e))?;
        self.facade.validate().map_err(|e| invalid("facade", e))?;
        if self.runtime.bus_capacity == 0 {
            return Err(ConfigError::Invalid {
                section: "runtime",
                reason: "bus_capacity must be positive".into(),
            });
        }
        Ok(())
    }
}

fn invalid(section: &'static str, error: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        section,
        reason: error.to_string(),
    }
}

fn override_with<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(var) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_validate() {
        let config = FeedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.runtime.bus_capacity, shared_bus::DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FeedConfig::from_toml_str(
            r#"
            [cache]
            default_ttl_secs = 15

            [facade.ttl.per_style]
            whisper = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.default_ttl_secs, 15);
        assert_eq!(config.cache.max_entries, CacheConfig::default().max_entries);
        assert_eq!(
            config.facade.ttl.ttl_for("whisper"),
            std::time::Duration::from_secs(10)
        );
        assert_eq!(config.notifier, NotifierConfig::default());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = FeedConfig::from_toml_str("[cache]\ndefault_ttl_secs = \"soon\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[notifier]\ntick_interval_ms = 500").unwrap();

        let mut config = FeedConfig::from_file(file.path()).unwrap();
        config
            .apply_overrides(vars(&[
                ("FL_NOTIFIER_TICK_INTERVAL_MS", "250"),
                ("FL_BUS_CAPACITY", " 64 "),
            ]))
            .unwrap();

        assert_eq!(config.notifier.tick_interval_ms, 250);
        assert_eq!(config.runtime.bus_capacity, 64);
    }

    #[test]
    fn test_bad_override_names_variable() {
        let mut config = FeedConfig::default();
        let err = config
            .apply_overrides(vars(&[("FL_CACHE_MAX_ENTRIES", "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidVar {
                var: "FL_CACHE_MAX_ENTRIES",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_section_reported() {
        let mut config = FeedConfig::default();
        config.metric_store.initial_decay_factor = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                section: "metric_store",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = FeedConfig::from_file("/nonexistent/feedline.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
