//! # FL-01 Metric Store
//!
//! Engagement metrics for tweets, comments and users, and the decay-weighted
//! rank score computed from them.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): pure data and arithmetic
//!   - `rank_score`: guarded integer scoring
//!   - `ContentMetric`, `MetricDelta`, `MetricUpdate`: per-entity records and mutations
//!   - `UserMetric`: per-user activity
//! - **Ports Layer** (`ports/`): `ContentMetricApi`, `UserMetricApi`
//! - **Service Layer** (`service/`): `MetricStoreService`, a sharded arena that
//!   publishes `MetricChanged` / `ProfileChanged` after each mutation
//!
//! ## Scoring
//!
//! `score = incentive_score * motivation_factor / decay_factor`, truncated
//! toward zero. A decay factor of zero always scores 0.
//!
//! ```ignore
//! use fl_01_metric_store::{ContentMetricApi, MetricDelta, MetricStoreService};
//!
//! let store = MetricStoreService::new(bus.clone());
//! store.add_metric(EntityRef::tweet(1))?;
//! let delta = MetricDelta::incentive(100).with_decay_factor(4);
//! store.update_metric(EntityRef::tweet(1), delta.into())?;
//! assert_eq!(store.rank_score(EntityRef::tweet(1), 5)?, 125);
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{
    rank_score, CommentCounters, ContentMetric, Counter, EngagementCounters, ExperienceAction,
    ExperienceChange, MetricDelta, MetricStoreConfig, MetricUpdate, TweetCounters, UserMetric,
    UserMetricAction,
};
pub use error::MetricError;
pub use ports::{ContentMetricApi, RankedEntity, UserMetricApi};
pub use service::MetricStoreService;
