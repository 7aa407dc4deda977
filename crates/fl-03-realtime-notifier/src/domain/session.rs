//! Unread counter session state and change detection

use serde::Serialize;
use shared_types::UserId;
use uuid::Uuid;

/// Unique id of one live connection
pub type SessionId = Uuid;

/// Result of comparing a fresh sample with the last observed count
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The count differs from what the client last saw
    Changed(i64),
    /// Nothing new to report
    Unchanged,
}

/// State of one live unread-counter connection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnreadCounterSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// Absent until the first successful sample
    pub last_observed: Option<i64>,
}

impl UnreadCounterSession {
    pub fn new(user_id: UserId) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            last_observed: None,
        }
    }

    /// Session that already reported `count` to its client
    pub fn with_last_observed(mut self, count: i64) -> Self {
        self.last_observed = Some(count);
        self
    }

    /// Compare a sample with the last observed count and record it.
    pub fn observe(&mut self, count: i64) -> TickOutcome {
        if self.last_observed == Some(count) {
            return TickOutcome::Unchanged;
        }
        self.last_observed = Some(count);
        TickOutcome::Changed(count)
    }
}

/// One message on a live channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveUpdate {
    /// The unread count changed
    Count { count: i64 },
    /// Transport keepalive, no payload
    Keepalive,
}

#[derive(Serialize)]
struct CountPayload {
    count: i64,
}

impl LiveUpdate {
    /// JSON payload of a count update (`{"count":n}`), `None` for keepalives
    pub fn to_json(&self) -> Option<String> {
        match self {
            Self::Count { count } => serde_json::to_string(&CountPayload { count: *count }).ok(),
            Self::Keepalive => None,
        }
    }

    /// Server-sent-events frame
    pub fn to_sse(&self) -> String {
        match self.to_json() {
            Some(data) => format!("event: message\ndata: {data}\n\n"),
            None => ": keepalive\n\n".to_owned(),
        }
    }
}

impl From<TickOutcome> for LiveUpdate {
    fn from(outcome: TickOutcome) -> Self {
        match outcome {
            TickOutcome::Changed(count) => Self::Count { count },
            TickOutcome::Unchanged => Self::Keepalive,
        }
    }
}
