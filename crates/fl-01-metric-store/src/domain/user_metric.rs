//! Per-user activity metrics

use serde::{Deserialize, Serialize};
use shared_types::UserId;

/// Ranking-relevant activity of a user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetric {
    pub user_id: UserId,
    /// Live tweets authored by the user, never below zero
    pub tweets_count: i64,
    /// Unix seconds of the last tweet creation (0 = never)
    pub latest_trends_on: i64,
    /// Non-decreasing except through admin adjustment
    pub experience: i64,
}

impl UserMetric {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// Apply an activity action observed at `now` (unix seconds).
    pub fn apply(&mut self, action: UserMetricAction, now: i64) {
        match action {
            UserMetricAction::CreateTweet => {
                self.tweets_count = self.tweets_count.saturating_add(1);
                self.latest_trends_on = now;
            }
            UserMetricAction::DeleteTweet => {
                self.tweets_count = (self.tweets_count - 1).max(0);
            }
        }
    }
}

/// What changed a user's experience
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceAction {
    Grant,
    AdminAdjustment,
}

/// One entry of a user's experience history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceChange {
    pub user_id: UserId,
    pub action: ExperienceAction,
    /// Change actually applied, after flooring at zero
    pub amount: i64,
    /// Experience after the change
    pub experience: i64,
    /// Unix seconds
    pub at: i64,
}

/// Activity actions that change a user metric
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMetricAction {
    CreateTweet,
    DeleteTweet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tweet_updates_trend_time() {
        let mut metric = UserMetric::new(7);
        metric.apply(UserMetricAction::CreateTweet, 1_700_000_000);
        assert_eq!(metric.tweets_count, 1);
        assert_eq!(metric.latest_trends_on, 1_700_000_000);
    }

    #[test]
    fn test_delete_tweet_keeps_trend_time_and_floors() {
        let mut metric = UserMetric::new(7);
        metric.apply(UserMetricAction::CreateTweet, 100);
        metric.apply(UserMetricAction::DeleteTweet, 200);
        metric.apply(UserMetricAction::DeleteTweet, 300);
        assert_eq!(metric.tweets_count, 0);
        assert_eq!(metric.latest_trends_on, 100);
    }
}
