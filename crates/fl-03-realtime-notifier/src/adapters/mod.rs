//! Adapters layer for the Realtime Notifier

pub mod sse;

pub use sse::{sse_frames, SSE_CONTENT_TYPE};
