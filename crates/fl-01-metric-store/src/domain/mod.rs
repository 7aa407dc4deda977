//! Domain layer for the Metric Store
//!
//! Pure data and arithmetic, no I/O.

pub mod config;
pub mod metric;
pub mod rank;
pub mod user_metric;

pub use config::MetricStoreConfig;
pub use metric::{
    CommentCounters, ContentMetric, Counter, EngagementCounters, MetricDelta, MetricUpdate,
    TweetCounters,
};
pub use rank::rank_score;
pub use user_metric::{ExperienceAction, ExperienceChange, UserMetric, UserMetricAction};
