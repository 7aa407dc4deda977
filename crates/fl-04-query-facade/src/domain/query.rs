//! Query parameters and the paginated response envelope

use fl_02_response_cache::CacheKey;
use serde::{Deserialize, Serialize};
use shared_types::Subject;

use crate::error::QueryError;

/// A paginated listing request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryParams {
    /// What the listing is about (a user's inbox, a tweet's comments, ...)
    pub subject: Subject,
    /// Listing flavor; selects the TTL and the source query
    pub style: String,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

impl QueryParams {
    pub fn new(subject: Subject, style: impl Into<String>, page: u32, page_size: u32) -> Self {
        Self {
            subject,
            style: style.into(),
            page,
            page_size,
        }
    }

    /// Rows to skip: `(page - 1) * page_size`
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::list(self.subject, &self.style, self.page_size, self.offset())
    }

    pub fn validate(&self, max_page_size: u32) -> Result<(), QueryError> {
        if self.style.is_empty() {
            return Err(QueryError::InvalidParams("style must not be empty".into()));
        }
        if self.style.contains(':') {
            return Err(QueryError::InvalidParams(format!(
                "style must not contain ':', got {:?}",
                self.style
            )));
        }
        if self.page == 0 {
            return Err(QueryError::InvalidParams("page starts at 1".into()));
        }
        if self.page_size == 0 || self.page_size > max_page_size {
            return Err(QueryError::InvalidParams(format!(
                "page_size must be between 1 and {max_page_size}, got {}",
                self.page_size
            )));
        }
        Ok(())
    }
}

/// Pagination block of a response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    pub page: u32,
    pub page_size: u32,
    pub total_rows: u64,
}

/// Serialized shape of every listing response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageEnvelope {
    pub list: Vec<serde_json::Value>,
    pub pager: Pager,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_key() {
        let params = QueryParams::new(Subject::User(42), "list", 1, 10);
        assert_eq!(params.offset(), 0);
        assert_eq!(params.cache_key().render(), "u42:list:10:0");

        let params = QueryParams::new(Subject::User(42), "list", 3, 10);
        assert_eq!(params.cache_key().render(), "u42:list:10:20");
    }

    #[test]
    fn test_validation() {
        assert!(QueryParams::new(Subject::User(1), "list", 1, 10).validate(50).is_ok());
        assert!(QueryParams::new(Subject::User(1), "list", 0, 10).validate(50).is_err());
        assert!(QueryParams::new(Subject::User(1), "list", 1, 0).validate(50).is_err());
        assert!(QueryParams::new(Subject::User(1), "list", 1, 51).validate(50).is_err());
        assert!(QueryParams::new(Subject::User(1), "", 1, 10).validate(50).is_err());
        assert!(QueryParams::new(Subject::User(1), "a:b", 1, 10).validate(50).is_err());
    }

    #[test]
    fn test_envelope_shape() {
        let envelope = PageEnvelope {
            list: vec![serde_json::json!({"id": 1})],
            pager: Pager {
                page: 2,
                page_size: 1,
                total_rows: 5,
            },
        };
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"list":[{"id":1}],"pager":{"page":2,"page_size":1,"total_rows":5}}"#
        );
    }
}
