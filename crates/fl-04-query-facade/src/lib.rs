//! # FL-04 Query Facade
//!
//! Cache-first reads for paginated listings and unread counters.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): `QueryParams`, the `PageEnvelope`
//!   response shape, `FacadeConfig` with its per-style `TtlPolicy`
//! - **Ports Layer** (`ports/`): `ListingSource`, `UnreadMessageSource`
//!   (the persistent store)
//! - **Service Layer** (`service/`)
//!   - `QueryFacade`: check cache, fill on miss, return
//!   - `UnreadCounter`: cached unread counts; the notifier's sample source
//!
//! Responses are `{"list":[...],"pager":{"page","page_size","total_rows"}}`.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{FacadeConfig, PageEnvelope, Pager, QueryParams, TtlPolicy};
pub use error::QueryError;
pub use ports::{FetchedPage, ListingSource, UnreadMessageSource};
pub use service::{QueryFacade, QueryResponse, UnreadCounter};
