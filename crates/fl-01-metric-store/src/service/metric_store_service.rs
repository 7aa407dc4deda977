//! Metric Store Service
//!
//! Owns the metric arenas and publishes a change event after every
//! successful mutation.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_bus::{DomainEvent, EventPublisher};
use shared_types::{ContentKind, EntityId, EntityRef, UserId, Viewer};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::domain::{
    ContentMetric, ExperienceAction, ExperienceChange, MetricStoreConfig, MetricUpdate,
    UserMetric, UserMetricAction,
};
use crate::error::MetricError;
use crate::ports::{ContentMetricApi, RankedEntity, UserMetricApi};

/// Arena slot. Deleted metrics stay addressable until purged.
#[derive(Debug)]
struct MetricSlot {
    metric: ContentMetric,
    tombstoned: bool,
}

/// Metric Store service implementation
///
/// Records are mutated under the shard lock of their map entry, so an
/// update is atomic per entity. Events are published after the lock is
/// released.
pub struct MetricStoreService<P: EventPublisher> {
    metrics: DashMap<EntityRef, MetricSlot>,
    users: DashMap<UserId, UserMetric>,
    experience_log: DashMap<UserId, VecDeque<ExperienceChange>>,
    publisher: Arc<P>,
    config: MetricStoreConfig,
}

impl<P: EventPublisher> MetricStoreService<P> {
    /// Create a service with default configuration
    pub fn new(publisher: Arc<P>) -> Self {
        Self {
            metrics: DashMap::new(),
            users: DashMap::new(),
            experience_log: DashMap::new(),
            publisher,
            config: MetricStoreConfig::default(),
        }
    }

    /// Create a service with a validated configuration
    pub fn with_config(publisher: Arc<P>, config: MetricStoreConfig) -> Result<Self, MetricError> {
        config.validate()?;
        Ok(Self {
            metrics: DashMap::new(),
            users: DashMap::new(),
            experience_log: DashMap::new(),
            publisher,
            config,
        })
    }

    pub fn config(&self) -> &MetricStoreConfig {
        &self.config
    }

    /// Score with the configured default motivation factor
    pub fn default_rank_score(&self, entity: EntityRef) -> Result<i64, MetricError> {
        self.rank_score(entity, self.config.default_motivation_factor)
    }

    /// Number of live content metrics
    pub fn live_metrics(&self) -> usize {
        self.metrics.iter().filter(|slot| !slot.tombstoned).count()
    }

    fn metric_changed(&self, entity: EntityRef) {
        let receivers = self.publisher.publish(DomainEvent::MetricChanged(entity));
        trace!(entity = %entity, receivers, "Published metric change");
    }

    fn profile_changed(&self, user_id: UserId) {
        let receivers = self.publisher.publish(DomainEvent::ProfileChanged(user_id));
        trace!(user_id, receivers, "Published profile change");
    }

    fn mutate_user<F>(&self, user_id: UserId, mutate: F) -> Result<UserMetric, MetricError>
    where
        F: FnOnce(&mut UserMetric),
    {
        let snapshot = {
            let mut metric = self
                .users
                .get_mut(&user_id)
                .ok_or(MetricError::UserNotFound { user_id })?;
            mutate(&mut metric);
            metric.clone()
        };
        self.profile_changed(user_id);
        Ok(snapshot)
    }

    /// Move a user's experience and record the applied change. The log
    /// entry is appended under the user's entry lock so history order
    /// matches mutation order.
    fn change_experience<F>(
        &self,
        user_id: UserId,
        action: ExperienceAction,
        next: F,
    ) -> Result<UserMetric, MetricError>
    where
        F: FnOnce(i64) -> i64,
    {
        let at = now_unix();
        self.mutate_user(user_id, |metric| {
            let before = metric.experience;
            metric.experience = next(before);
            let change = ExperienceChange {
                user_id,
                action,
                amount: metric.experience.saturating_sub(before),
                experience: metric.experience,
                at,
            };
            info!(
                user_id,
                action = ?change.action,
                amount = change.amount,
                experience = change.experience,
                "Experience changed"
            );
            let mut log = self.experience_log.entry(user_id).or_default();
            if log.len() == self.config.experience_log_limit {
                log.pop_front();
            }
            log.push_back(change);
        })
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

impl<P: EventPublisher> ContentMetricApi for MetricStoreService<P> {
    fn rank_score(&self, entity: EntityRef, motivation_factor: i64) -> Result<i64, MetricError> {
        self.metrics
            .get(&entity)
            .filter(|slot| !slot.tombstoned)
            .map(|slot| slot.metric.rank_score(motivation_factor))
            .ok_or(MetricError::NotFound { entity })
    }

    fn add_metric(&self, entity: EntityRef) -> Result<ContentMetric, MetricError> {
        let fresh = ContentMetric::new(
            entity,
            self.config.initial_incentive_score,
            self.config.initial_decay_factor,
        );

        let snapshot = match self.metrics.entry(entity) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().tombstoned {
                    return Err(MetricError::AlreadyExists { entity });
                }
                // Revived records keep counting versions so stale CAS writers fail
                let version = occupied.get().metric.version + 1;
                let slot = occupied.get_mut();
                slot.metric = ContentMetric { version, ..fresh };
                slot.tombstoned = false;
                slot.metric.clone()
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MetricSlot {
                    metric: fresh.clone(),
                    tombstoned: false,
                });
                fresh
            }
        };

        debug!(entity = %entity, "Added metric");
        self.metric_changed(entity);
        Ok(snapshot)
    }

    fn update_metric(
        &self,
        entity: EntityRef,
        update: MetricUpdate,
    ) -> Result<ContentMetric, MetricError> {
        let snapshot = {
            let mut slot = self
                .metrics
                .get_mut(&entity)
                .filter(|slot| !slot.tombstoned)
                .ok_or(MetricError::NotFound { entity })?;

            match update {
                MetricUpdate::Delta(delta) => slot.metric.apply_delta(&delta)?,
                MetricUpdate::Replace {
                    metric,
                    expected_version,
                } => slot.metric.replace_with(metric, expected_version)?,
            }
            slot.metric.clone()
        };

        trace!(entity = %entity, version = snapshot.version, "Updated metric");
        self.metric_changed(entity);
        Ok(snapshot)
    }

    fn delete_metric(&self, entity: EntityRef) -> Result<(), MetricError> {
        {
            let mut slot = self
                .metrics
                .get_mut(&entity)
                .filter(|slot| !slot.tombstoned)
                .ok_or(MetricError::NotFound { entity })?;
            slot.tombstoned = true;
            slot.metric.version += 1;
        }

        debug!(entity = %entity, "Tombstoned metric");
        self.metric_changed(entity);
        Ok(())
    }

    fn get_metric(&self, entity: EntityRef) -> Result<ContentMetric, MetricError> {
        self.metrics
            .get(&entity)
            .filter(|slot| !slot.tombstoned)
            .map(|slot| slot.metric.clone())
            .ok_or(MetricError::NotFound { entity })
    }

    fn rank_entities(
        &self,
        kind: ContentKind,
        ids: &[EntityId],
        motivation_factor: i64,
    ) -> Vec<RankedEntity> {
        let mut ranked: Vec<RankedEntity> = ids
            .iter()
            .filter_map(|&id| {
                let entity = EntityRef { kind, id };
                let score = self.rank_score(entity, motivation_factor).ok()?;
                Some(RankedEntity { id, score })
            })
            .collect();

        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        ranked.dedup_by_key(|entry| entry.id);
        ranked
    }

    fn purge_tombstones(&self) -> usize {
        let before = self.metrics.len();
        self.metrics.retain(|_, slot| !slot.tombstoned);
        let purged = before.saturating_sub(self.metrics.len());
        if purged > 0 {
            debug!(purged, "Purged tombstoned metrics");
        }
        purged
    }
}

impl<P: EventPublisher> UserMetricApi for MetricStoreService<P> {
    fn add_user_metric(&self, user_id: UserId) -> Result<UserMetric, MetricError> {
        let metric = match self.users.entry(user_id) {
            Entry::Occupied(_) => return Err(MetricError::UserAlreadyExists { user_id }),
            Entry::Vacant(vacant) => vacant.insert(UserMetric::new(user_id)).clone(),
        };
        debug!(user_id, "Added user metric");
        self.profile_changed(user_id);
        Ok(metric)
    }

    fn update_user_metric(
        &self,
        user_id: UserId,
        action: UserMetricAction,
    ) -> Result<UserMetric, MetricError> {
        let now = now_unix();
        self.mutate_user(user_id, |metric| metric.apply(action, now))
    }

    fn grant_experience(&self, user_id: UserId, amount: i64) -> Result<UserMetric, MetricError> {
        if amount < 0 {
            return Err(MetricError::NegativeExperienceGrant { amount });
        }
        self.change_experience(user_id, ExperienceAction::Grant, |experience| {
            experience.saturating_add(amount)
        })
    }

    fn adjust_experience(
        &self,
        viewer: &Viewer,
        user_id: UserId,
        delta: i64,
    ) -> Result<UserMetric, MetricError> {
        if !viewer.is_admin {
            return Err(MetricError::Unauthorized {
                user_id: viewer.user_id,
            });
        }
        self.change_experience(user_id, ExperienceAction::AdminAdjustment, |experience| {
            experience.saturating_add(delta).max(0)
        })
    }

    fn get_user_metric(&self, user_id: UserId) -> Result<UserMetric, MetricError> {
        self.users
            .get(&user_id)
            .map(|metric| metric.clone())
            .ok_or(MetricError::UserNotFound { user_id })
    }

    fn experience_log(&self, user_id: UserId) -> Result<Vec<ExperienceChange>, MetricError> {
        if !self.users.contains_key(&user_id) {
            return Err(MetricError::UserNotFound { user_id });
        }
        Ok(self
            .experience_log
            .get(&user_id)
            .map(|log| log.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    fn delete_user_metric(&self, user_id: UserId) -> Result<(), MetricError> {
        self.users
            .remove(&user_id)
            .ok_or(MetricError::UserNotFound { user_id })?;
        self.experience_log.remove(&user_id);
        debug!(user_id, "Removed user metric");
        self.profile_changed(user_id);
        Ok(())
    }
}
