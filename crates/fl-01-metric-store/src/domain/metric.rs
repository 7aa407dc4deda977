//! Content metrics: the per-entity engagement record
//!
//! A `ContentMetric` holds the two numbers the rank score is built from
//! (`incentive_score`, `decay_factor`) plus informational counters whose
//! shape depends on the content kind.

use serde::{Deserialize, Serialize};
use shared_types::{ContentKind, EntityRef};

use super::rank::rank_score;
use crate::error::MetricError;

/// Engagement counters of a tweet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetCounters {
    pub comments: i64,
    pub upvotes: i64,
    pub collections: i64,
    pub shares: i64,
}

/// Engagement counters of a comment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCounters {
    pub replies: i64,
    pub thumbs_up: i64,
    pub thumbs_down: i64,
}

/// Kind-specific secondary counters. Not part of the score formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngagementCounters {
    Tweet(TweetCounters),
    Comment(CommentCounters),
}

impl EngagementCounters {
    /// Zeroed counters for a content kind
    pub fn empty(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Tweet => Self::Tweet(TweetCounters::default()),
            ContentKind::Comment => Self::Comment(CommentCounters::default()),
        }
    }

    /// The content kind these counters belong to
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Tweet(_) => ContentKind::Tweet,
            Self::Comment(_) => ContentKind::Comment,
        }
    }

    /// Add `delta` to one counter, flooring at zero.
    ///
    /// Returns `false` when the counter does not exist for this kind.
    fn apply(&mut self, counter: Counter, delta: i64) -> bool {
        let slot = match (self, counter) {
            (Self::Tweet(c), Counter::Comments) => &mut c.comments,
            (Self::Tweet(c), Counter::Upvotes) => &mut c.upvotes,
            (Self::Tweet(c), Counter::Collections) => &mut c.collections,
            (Self::Tweet(c), Counter::Shares) => &mut c.shares,
            (Self::Comment(c), Counter::Replies) => &mut c.replies,
            (Self::Comment(c), Counter::ThumbsUp) => &mut c.thumbs_up,
            (Self::Comment(c), Counter::ThumbsDown) => &mut c.thumbs_down,
            _ => return false,
        };
        *slot = slot.saturating_add(delta).max(0);
        true
    }
}

/// Names of the secondary counters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    Comments,
    Upvotes,
    Collections,
    Shares,
    Replies,
    ThumbsUp,
    ThumbsDown,
}

impl Counter {
    /// The content kind that carries this counter
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Comments | Self::Upvotes | Self::Collections | Self::Shares => {
                ContentKind::Tweet
            }
            Self::Replies | Self::ThumbsUp | Self::ThumbsDown => ContentKind::Comment,
        }
    }
}

/// Engagement metric of one piece of content
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMetric {
    /// Immutable identity
    pub entity: EntityRef,
    /// Accumulated engagement weight
    pub incentive_score: i64,
    /// Time-based attenuation divisor, recomputed by an external scheduler
    pub decay_factor: u64,
    /// Informational counters
    pub counters: EngagementCounters,
    /// Bumped on every mutation; used for compare-and-swap replacement
    pub version: u64,
}

impl ContentMetric {
    /// Fresh metric with the given initial score parameters
    pub fn new(entity: EntityRef, incentive_score: i64, decay_factor: u64) -> Self {
        Self {
            entity,
            incentive_score,
            decay_factor,
            counters: EngagementCounters::empty(entity.kind),
            version: 0,
        }
    }

    /// Decay-weighted rank score (0 when `decay_factor == 0`)
    pub fn rank_score(&self, motivation_factor: i64) -> i64 {
        rank_score(self.incentive_score, self.decay_factor, motivation_factor)
    }

    /// Apply an additive delta. Validates every counter before touching
    /// anything, so a rejected delta leaves the metric unchanged.
    pub fn apply_delta(&mut self, delta: &MetricDelta) -> Result<(), MetricError> {
        if let Some((counter, _)) = delta
            .counters
            .iter()
            .find(|(counter, _)| counter.kind() != self.entity.kind)
        {
            return Err(MetricError::CounterMismatch {
                entity: self.entity,
                counter: *counter,
            });
        }

        self.incentive_score = self.incentive_score.saturating_add(delta.incentive_score);
        for (counter, amount) in &delta.counters {
            self.counters.apply(*counter, *amount);
        }
        if let Some(decay) = delta.decay_factor {
            self.decay_factor = decay;
        }
        self.version += 1;
        Ok(())
    }

    /// Replace the whole record if `expected_version` still matches.
    pub fn replace_with(
        &mut self,
        replacement: ContentMetric,
        expected_version: u64,
    ) -> Result<(), MetricError> {
        if replacement.entity != self.entity {
            return Err(MetricError::EntityMismatch {
                expected: self.entity,
                actual: replacement.entity,
            });
        }
        if replacement.counters.kind() != self.entity.kind {
            return Err(MetricError::CounterKindMismatch {
                entity: self.entity,
                submitted: replacement.counters.kind(),
            });
        }
        if self.version != expected_version {
            return Err(MetricError::VersionConflict {
                entity: self.entity,
                expected: expected_version,
                actual: self.version,
            });
        }

        let next_version = self.version + 1;
        *self = ContentMetric {
            version: next_version,
            ..replacement
        };
        Ok(())
    }
}

/// Additive engagement delta
///
/// Deltas commute, so concurrent writers never need to read first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDelta {
    /// Added to the incentive score
    pub incentive_score: i64,
    /// Added to the named counters
    pub counters: Vec<(Counter, i64)>,
    /// Replaces the decay factor when set
    pub decay_factor: Option<u64>,
}

impl MetricDelta {
    /// Delta adjusting only the incentive score
    pub fn incentive(amount: i64) -> Self {
        Self {
            incentive_score: amount,
            ..Default::default()
        }
    }

    /// Add a counter adjustment
    pub fn with_counter(mut self, counter: Counter, amount: i64) -> Self {
        self.counters.push((counter, amount));
        self
    }

    /// Replace the decay factor
    pub fn with_decay_factor(mut self, decay_factor: u64) -> Self {
        self.decay_factor = Some(decay_factor);
        self
    }
}

/// An update submitted to the metric store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetricUpdate {
    /// Commutative additive delta
    Delta(MetricDelta),
    /// Whole-record compare-and-swap replacement
    Replace {
        metric: ContentMetric,
        expected_version: u64,
    },
}

impl From<MetricDelta> for MetricUpdate {
    fn from(delta: MetricDelta) -> Self {
        Self::Delta(delta)
    }
}
