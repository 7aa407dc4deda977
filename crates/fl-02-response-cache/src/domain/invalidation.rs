//! Event to invalidation mapping
//!
//! | Event                               | Targets                                   |
//! |-------------------------------------|-------------------------------------------|
//! | `MetricChanged(e)`                  | subject `e`, dependents of `e`            |
//! | `MessageCreated { sender, receivers }` | subject of sender and each receiver    |
//! | `MessageRead(u)`                    | subject `u`                               |
//! | `ProfileChanged(u)`                 | subject `u`, dependents of `u`            |
//! | `UnreadCountChanged(u)`             | key `u{u}:unread`                         |

use shared_bus::DomainEvent;
use shared_types::Subject;

use super::key::CacheKey;

/// What a single event invalidates
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidationTarget {
    /// Every key under the subject's prefix
    Subject(Subject),
    /// Every entry that declared the subject as a dependency
    Dependents(Subject),
    /// One exact key
    Key(CacheKey),
}

/// Map a domain event to the cache entries it makes stale.
pub fn invalidation_targets(event: &DomainEvent) -> Vec<InvalidationTarget> {
    match event {
        DomainEvent::MetricChanged(entity) => {
            let subject = Subject::from(*entity);
            vec![
                InvalidationTarget::Subject(subject),
                InvalidationTarget::Dependents(subject),
            ]
        }
        DomainEvent::MessageCreated { .. } => event
            .affected_users()
            .into_iter()
            .map(|user| InvalidationTarget::Subject(Subject::User(user)))
            .collect(),
        DomainEvent::MessageRead(user) => vec![InvalidationTarget::Subject(Subject::User(*user))],
        DomainEvent::ProfileChanged(user) => {
            let subject = Subject::User(*user);
            vec![
                InvalidationTarget::Subject(subject),
                InvalidationTarget::Dependents(subject),
            ]
        }
        DomainEvent::UnreadCountChanged(user) => {
            vec![InvalidationTarget::Key(CacheKey::unread(*user))]
        }
    }
}
