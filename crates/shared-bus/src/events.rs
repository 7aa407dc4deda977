//! # Domain Events
//!
//! Defines all event types that flow through the shared bus. Events are
//! transient: they exist only for the duration of dispatch and are never
//! persisted.

use serde::{Deserialize, Serialize};
use shared_types::entities::{EntityRef, UserId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainEvent {
    // =========================================================================
    // RANKING (fl-01 metric store)
    // =========================================================================
    /// Engagement counters or rank parameters of a piece of content changed.
    MetricChanged(EntityRef),

    // =========================================================================
    // MESSAGING (external store, via request handlers)
    // =========================================================================
    /// A message (whisper, reply notice, friend request) was created.
    MessageCreated {
        /// The user who caused the message.
        sender: UserId,
        /// Users whose message box received it.
        receivers: Vec<UserId>,
    },

    /// A user read one or all of their messages.
    MessageRead(UserId),

    /// The unread message count of a user changed.
    UnreadCountChanged(UserId),

    // =========================================================================
    // PROFILES
    // =========================================================================
    /// Profile-visible data of a user changed (nickname, avatar, metrics).
    ProfileChanged(UserId),
}

impl DomainEvent {
    /// Get the kind of this event (for filtering).
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MetricChanged(_) => EventKind::MetricChanged,
            Self::MessageCreated { .. } => EventKind::MessageCreated,
            Self::MessageRead(_) => EventKind::MessageRead,
            Self::UnreadCountChanged(_) => EventKind::UnreadCountChanged,
            Self::ProfileChanged(_) => EventKind::ProfileChanged,
        }
    }

    /// Users whose derived state is affected by this event.
    ///
    /// Metric events are about content, not users, and return nothing.
    #[must_use]
    pub fn affected_users(&self) -> Vec<UserId> {
        match self {
            Self::MetricChanged(_) => Vec::new(),
            Self::MessageCreated { sender, receivers } => {
                let mut users = Vec::with_capacity(receivers.len() + 1);
                users.push(*sender);
                for receiver in receivers {
                    if !users.contains(receiver) {
                        users.push(*receiver);
                    }
                }
                users
            }
            Self::MessageRead(user)
            | Self::UnreadCountChanged(user)
            | Self::ProfileChanged(user) => vec![*user],
        }
    }
}

/// Event kinds for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `DomainEvent::MetricChanged`.
    MetricChanged,
    /// `DomainEvent::MessageCreated`.
    MessageCreated,
    /// `DomainEvent::MessageRead`.
    MessageRead,
    /// `DomainEvent::UnreadCountChanged`.
    UnreadCountChanged,
    /// `DomainEvent::ProfileChanged`.
    ProfileChanged,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Kinds to include. Empty means all kinds.
    pub kinds: Vec<EventKind>,
    /// Users to include. Empty means every user (and user-less events).
    pub users: Vec<UserId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific kinds.
    #[must_use]
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            kinds,
            users: Vec::new(),
        }
    }

    /// Restrict the filter to events affecting one of `users`.
    #[must_use]
    pub fn for_users(mut self, users: Vec<UserId>) -> Self {
        self.users = users;
        self
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &DomainEvent) -> bool {
        let kind_match = self.kinds.is_empty() || self.kinds.contains(&event.kind());

        let user_match = self.users.is_empty()
            || event
                .affected_users()
                .iter()
                .any(|user| self.users.contains(user));

        kind_match && user_match
    }
}
