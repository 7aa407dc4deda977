//! Cache key construction
//!
//! Keys are `{subject}:{style}:{pageSize}:{offset}` for paginated listings
//! and `{subject}:{style}` for single values. The subject always comes first
//! so one prefix delete covers every variant derived from it.

use shared_types::{Subject, UserId};
use std::fmt;

/// Style segment of the unread counter key
pub const UNREAD_STYLE: &str = "unread";

/// Pagination window of a listing key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageWindow {
    pub page_size: u32,
    pub offset: u64,
}

/// Deterministic composite cache key
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    subject: Subject,
    style: String,
    window: Option<PageWindow>,
}

impl CacheKey {
    /// Key of a paginated listing
    pub fn list(subject: Subject, style: &str, page_size: u32, offset: u64) -> Self {
        Self {
            subject,
            style: escape_style(style),
            window: Some(PageWindow { page_size, offset }),
        }
    }

    /// Key of an unpaginated value
    pub fn value(subject: Subject, style: &str) -> Self {
        Self {
            subject,
            style: escape_style(style),
            window: None,
        }
    }

    /// Key of a user's cached unread message count (`u{id}:unread`)
    pub fn unread(user_id: UserId) -> Self {
        Self::value(Subject::User(user_id), UNREAD_STYLE)
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    pub fn window(&self) -> Option<PageWindow> {
        self.window
    }

    /// Rendered backend key
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.window {
            Some(PageWindow { page_size, offset }) => {
                write!(f, "{}:{}:{}:{}", self.subject, self.style, page_size, offset)
            }
            None => write!(f, "{}:{}", self.subject, self.style),
        }
    }
}

// ':' separates key segments; escaping '%' too keeps distinct styles distinct
fn escape_style(style: &str) -> String {
    style.replace('%', "%25").replace(':', "%3A")
}
