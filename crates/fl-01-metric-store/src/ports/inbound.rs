//! Inbound Ports (Driving Ports)
//!
//! The API request handlers and the decay scheduler use to read and mutate
//! engagement metrics. All operations are synchronous: they touch only the
//! in-memory arena and publish to the bus without waiting.

use shared_types::{ContentKind, EntityId, EntityRef, UserId, Viewer};

use crate::domain::{
    ContentMetric, ExperienceChange, MetricUpdate, UserMetric, UserMetricAction,
};
use crate::error::MetricError;

/// A scored entity in a ranked listing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankedEntity {
    pub id: EntityId,
    pub score: i64,
}

/// Content metric API (Driving Port)
pub trait ContentMetricApi: Send + Sync {
    /// Score a live entity. Zero decay yields 0.
    fn rank_score(&self, entity: EntityRef, motivation_factor: i64) -> Result<i64, MetricError>;

    /// Initialize a metric for new content.
    ///
    /// Fails with `AlreadyExists` if a live record exists. A tombstoned
    /// record is revived with fresh values.
    fn add_metric(&self, entity: EntityRef) -> Result<ContentMetric, MetricError>;

    /// Apply an update atomically and return the new snapshot.
    fn update_metric(
        &self,
        entity: EntityRef,
        update: MetricUpdate,
    ) -> Result<ContentMetric, MetricError>;

    /// Tombstone a metric.
    fn delete_metric(&self, entity: EntityRef) -> Result<(), MetricError>;

    /// Snapshot of a live metric.
    fn get_metric(&self, entity: EntityRef) -> Result<ContentMetric, MetricError>;

    /// Score the given ids, best first. Ties are ordered by id, unknown or
    /// tombstoned ids are skipped.
    fn rank_entities(
        &self,
        kind: ContentKind,
        ids: &[EntityId],
        motivation_factor: i64,
    ) -> Vec<RankedEntity>;

    /// Physically remove tombstoned records. Returns how many were removed.
    fn purge_tombstones(&self) -> usize;
}

/// User metric API (Driving Port)
pub trait UserMetricApi: Send + Sync {
    /// Create the metric on a user's first activity.
    fn add_user_metric(&self, user_id: UserId) -> Result<UserMetric, MetricError>;

    /// Record a tweet creation or deletion.
    fn update_user_metric(
        &self,
        user_id: UserId,
        action: UserMetricAction,
    ) -> Result<UserMetric, MetricError>;

    /// Add a non-negative amount of experience.
    fn grant_experience(&self, user_id: UserId, amount: i64) -> Result<UserMetric, MetricError>;

    /// Adjust experience by any delta. Admin only; floored at zero.
    fn adjust_experience(
        &self,
        viewer: &Viewer,
        user_id: UserId,
        delta: i64,
    ) -> Result<UserMetric, MetricError>;

    fn get_user_metric(&self, user_id: UserId) -> Result<UserMetric, MetricError>;

    /// Recent experience changes of a user, newest first.
    fn experience_log(&self, user_id: UserId) -> Result<Vec<ExperienceChange>, MetricError>;

    /// Remove the metric of a removed user.
    fn delete_user_metric(&self, user_id: UserId) -> Result<(), MetricError>;
}
