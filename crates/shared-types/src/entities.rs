//! # Core Domain Entities
//!
//! Identity types shared by every subsystem of the ranking and freshness core.
//!
//! ## Clusters
//!
//! - **Identity**: `UserId`, `EntityId`, `ContentKind`, `EntityRef`
//! - **Cache subjects**: `Subject` (what a cached response is about)
//! - **Request context**: `Viewer` (supplied by the authentication layer)

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Stable user identity.
pub type UserId = i64;

/// Stable identity of a piece of content inside its own id space.
pub type EntityId = i64;

/// The kind of rankable content.
///
/// Tweets and comments are stored in separate tables upstream, so their ids
/// may collide. Every cross-subsystem reference therefore carries the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// A top-level post.
    Tweet,
    /// A comment attached to a tweet.
    Comment,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tweet => f.write_str("tweet"),
            Self::Comment => f.write_str("comment"),
        }
    }
}

/// Fully qualified reference to a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    /// Content kind (selects the id space).
    pub kind: ContentKind,
    /// Id inside the kind's id space.
    pub id: EntityId,
}

impl EntityRef {
    /// Reference a tweet.
    #[must_use]
    pub const fn tweet(id: EntityId) -> Self {
        Self {
            kind: ContentKind::Tweet,
            id,
        }
    }

    /// Reference a comment.
    #[must_use]
    pub const fn comment(id: EntityId) -> Self {
        Self {
            kind: ContentKind::Comment,
            id,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

// =============================================================================
// CLUSTER B: CACHE SUBJECTS
// =============================================================================

/// What a cached response is derived from.
///
/// Rendered as the first segment of every cache key (`u42`, `t7`, `c9`) so
/// that invalidating a subject can blanket all of its paginated variants
/// with a single prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    /// A user (message boxes, profile pages, personal listings).
    User(UserId),
    /// A single tweet (comment threads, detail views).
    Tweet(EntityId),
    /// A single comment (reply threads).
    Comment(EntityId),
}

impl Subject {
    /// Key prefix covering every entry derived from this subject.
    #[must_use]
    pub fn key_prefix(&self) -> String {
        format!("{self}:")
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "u{id}"),
            Self::Tweet(id) => write!(f, "t{id}"),
            Self::Comment(id) => write!(f, "c{id}"),
        }
    }
}

impl From<EntityRef> for Subject {
    fn from(entity: EntityRef) -> Self {
        match entity.kind {
            ContentKind::Tweet => Self::Tweet(entity.id),
            ContentKind::Comment => Self::Comment(entity.id),
        }
    }
}

// =============================================================================
// CLUSTER C: REQUEST CONTEXT
// =============================================================================

/// The authenticated caller, as resolved by the session layer.
///
/// The core never inspects credentials; it only reads these two facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// The caller's user id.
    pub user_id: UserId,
    /// Whether the caller holds the admin flag.
    pub is_admin: bool,
}

impl Viewer {
    /// A regular (non-admin) caller.
    #[must_use]
    pub const fn user(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    /// An admin caller.
    #[must_use]
    pub const fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_rendering() {
        assert_eq!(Subject::User(42).to_string(), "u42");
        assert_eq!(Subject::Tweet(7).to_string(), "t7");
        assert_eq!(Subject::Comment(9).key_prefix(), "c9:");
    }

    #[test]
    fn test_entity_ref_to_subject() {
        assert_eq!(Subject::from(EntityRef::tweet(3)), Subject::Tweet(3));
        assert_eq!(Subject::from(EntityRef::comment(3)), Subject::Comment(3));
        assert_ne!(EntityRef::tweet(3), EntityRef::comment(3));
    }

    #[test]
    fn test_prefix_does_not_match_longer_ids() {
        // u4: must not cover u42:
        assert!(!"u42:list:10:0".starts_with(&Subject::User(4).key_prefix()));
        assert!("u42:list:10:0".starts_with(&Subject::User(42).key_prefix()));
    }
}
