//! Live session registry
//!
//! Sessions by id plus an index by user, so a user's connections can be
//! counted against the limit and cancelled together.

use dashmap::DashMap;
use shared_types::UserId;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::SessionId;
use crate::error::NotifierError;

/// Registry entry of a running session
#[derive(Debug)]
pub(crate) struct SessionEntry {
    pub user_id: UserId,
    cancel: watch::Sender<bool>,
}

impl SessionEntry {
    fn cancel(&self) {
        // The loop may already be gone; nothing to do then
        let _ = self.cancel.send(true);
    }
}

/// Shared session bookkeeping
#[derive(Clone, Debug, Default)]
pub(crate) struct SessionRegistry {
    sessions: Arc<DashMap<SessionId, SessionEntry>>,
    by_user: Arc<DashMap<UserId, Vec<SessionId>>>,
}

impl SessionRegistry {
    /// Register a session unless the user is at the limit.
    pub fn register(
        &self,
        session_id: SessionId,
        user_id: UserId,
        cancel: watch::Sender<bool>,
        max_per_user: usize,
    ) -> Result<(), NotifierError> {
        let mut user_sessions = self.by_user.entry(user_id).or_default();
        if user_sessions.len() >= max_per_user {
            return Err(NotifierError::TooManySessions {
                user_id,
                max: max_per_user,
            });
        }

        self.sessions
            .insert(session_id, SessionEntry { user_id, cancel });
        user_sessions.push(session_id);
        debug!(session_id = %session_id, user_id, "Registered live session");
        Ok(())
    }

    /// Forget a session. Returns the entry if it was still registered.
    pub fn remove(&self, session_id: &SessionId) -> Option<SessionEntry> {
        let (_, entry) = self.sessions.remove(session_id)?;
        self.by_user.remove_if_mut(&entry.user_id, |_, ids| {
            ids.retain(|id| id != session_id);
            ids.is_empty()
        });
        Some(entry)
    }

    /// Cancel and forget one session.
    pub fn cancel(&self, session_id: &SessionId) -> bool {
        match self.remove(session_id) {
            Some(entry) => {
                entry.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel and forget every session of a user.
    pub fn cancel_user(&self, user_id: UserId) -> usize {
        let Some((_, ids)) = self.by_user.remove(&user_id) else {
            return 0;
        };
        ids.iter()
            .filter_map(|id| self.sessions.remove(id))
            .map(|(_, entry)| entry.cancel())
            .count()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn user_sessions(&self, user_id: UserId) -> usize {
        self.by_user.get(&user_id).map_or(0, |ids| ids.len())
    }
}
