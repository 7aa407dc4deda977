//! Facade configuration and TTL policy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use fl_02_response_cache::MAX_TTL_SECS;

use crate::error::QueryError;

/// How long each listing style stays cached
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    pub default_secs: u64,
    /// Overrides by query style
    pub per_style: BTreeMap<String, u64>,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            default_secs: 60,
            per_style: BTreeMap::new(),
        }
    }
}

impl TtlPolicy {
    pub fn ttl_for(&self, style: &str) -> Duration {
        Duration::from_secs(
            self.per_style
                .get(style)
                .copied()
                .unwrap_or(self.default_secs),
        )
    }

    pub fn with_style(mut self, style: impl Into<String>, secs: u64) -> Self {
        self.per_style.insert(style.into(), secs);
        self
    }
}

/// Query facade configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacadeConfig {
    pub ttl: TtlPolicy,
    pub max_page_size: u32,
    /// TTL of cached unread counters
    pub unread_ttl_secs: u64,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            ttl: TtlPolicy::default(),
            max_page_size: 100,
            unread_ttl_secs: 30,
        }
    }
}

impl FacadeConfig {
    pub fn unread_ttl(&self) -> Duration {
        Duration::from_secs(self.unread_ttl_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), QueryError> {
        check_ttl("ttl.default_secs", self.ttl.default_secs)?;
        for (style, secs) in &self.ttl.per_style {
            check_ttl(&format!("ttl for style {style}"), *secs)?;
        }
        if self.max_page_size == 0 {
            return Err(QueryError::InvalidConfig("max_page_size must be positive".into()));
        }
        check_ttl("unread_ttl_secs", self.unread_ttl_secs)
    }
}

fn check_ttl(name: &str, secs: u64) -> Result<(), QueryError> {
    if secs == 0 {
        return Err(QueryError::InvalidConfig(format!("{name} must be positive")));
    }
    if secs > MAX_TTL_SECS {
        return Err(QueryError::InvalidConfig(format!(
            "{name} must be at most {MAX_TTL_SECS}"
        )));
    }
    Ok(())
}
