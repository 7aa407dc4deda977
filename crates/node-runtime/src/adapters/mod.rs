//! # Adapter Implementations
//!
//! Concrete implementations of the subsystems' outbound ports that the
//! runtime wires in when no external store is configured.
//!
//! ```text
//! ┌───────────────┐  ListingSource        ┌──────────────────────┐
//! │ Query Facade  │ ────────────────────→ │                      │
//! ├───────────────┤  UnreadMessageSource  │ InMemoryContentStore │ ──→ Event Bus
//! │ UnreadCounter │ ────────────────────→ │                      │
//! └───────────────┘                       └──────────────────────┘
//! ```

pub mod memory_store;

pub use memory_store::InMemoryContentStore;
