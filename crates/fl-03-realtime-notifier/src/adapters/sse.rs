//! Server-sent-events rendering of a live channel
//!
//! The HTTP layer writes these frames verbatim to a `text/event-stream`
//! response body and flushes after each one.

use futures::Stream;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::domain::LiveUpdate;
use crate::service::LiveChannel;

/// Content type of the rendered stream
pub const SSE_CONTENT_TYPE: &str = "text/event-stream";

/// Frames of a live channel, one per tick, ending when the session ends
pub fn sse_frames(channel: LiveChannel) -> impl Stream<Item = String> + Send + 'static {
    ReceiverStream::new(channel.into_receiver()).map(|update: LiveUpdate| update.to_sse())
}

