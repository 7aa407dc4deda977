//! Per-connection detection loop
//!
//! ```text
//! Connected ──tick──▶ sample ──▶ send {count} | keepalive ──▶ tick ...
//!     │                 │                 │
//!     └──── cancel / shutdown / receiver dropped ────▶ Disconnected
//! ```
//!
//! Every await point races against the three termination signals, so a
//! slow sample never keeps a closed connection alive. Ticks are sequential;
//! ticks missed while a sample is in flight are skipped.

use shared_bus::{Subscription, SubscriptionError};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::domain::{LiveUpdate, NotifierConfig, UnreadCounterSession};
use crate::metrics::NotifierMetrics;
use crate::ports::UnreadCountSource;

/// Why a session loop ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionExit {
    /// `unsubscribe` or `disconnect_user`
    Cancelled,
    /// Server shutdown
    Shutdown,
    /// The client's receiver was dropped
    Closed,
}

pub(crate) struct SessionLoop<S: UnreadCountSource> {
    pub session: UnreadCounterSession,
    pub source: Arc<S>,
    pub updates: mpsc::Sender<LiveUpdate>,
    pub events: Subscription,
    pub cancel: watch::Receiver<bool>,
    pub shutdown: watch::Receiver<bool>,
    pub config: NotifierConfig,
    pub metrics: Arc<NotifierMetrics>,
}

impl<S: UnreadCountSource> SessionLoop<S> {
    pub async fn run(self) -> SessionExit {
        let SessionLoop {
            mut session,
            source,
            updates,
            mut events,
            mut cancel,
            mut shutdown,
            config,
            metrics,
        } = self;

        // A receiver subscribed after the signal never sees it change
        if *shutdown.borrow() {
            return SessionExit::Shutdown;
        }

        let mut ticker = interval(config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut events_open = true;
        // Start dirty so the first tick reports the current count
        let mut dirty = true;
        let mut ticks_since_sample: u32 = 0;

        loop {
            tokio::select! {
                biased;

                _ = cancel.changed() => return SessionExit::Cancelled,
                _ = shutdown.changed() => return SessionExit::Shutdown,
                _ = updates.closed() => return SessionExit::Closed,

                received = events.recv(), if events_open => match received {
                    Ok(event) => {
                        trace!(
                            session_id = %session.session_id,
                            kind = ?event.kind(),
                            "Unread state touched"
                        );
                        dirty = true;
                    }
                    Err(SubscriptionError::Lagged { .. }) => dirty = true,
                    Err(SubscriptionError::Closed) => events_open = false,
                },

                _ = ticker.tick() => {
                    NotifierMetrics::incr(&metrics.ticks);
                    ticks_since_sample = ticks_since_sample.saturating_add(1);

                    let update = if dirty || ticks_since_sample >= config.resample_every {
                        dirty = false;
                        ticks_since_sample = 0;

                        let sampled = tokio::select! {
                            biased;

                            _ = cancel.changed() => return SessionExit::Cancelled,
                            _ = shutdown.changed() => return SessionExit::Shutdown,
                            _ = updates.closed() => return SessionExit::Closed,
                            result = source.unread_count(session.user_id) => result,
                        };

                        match sampled {
                            Ok(count) => LiveUpdate::from(session.observe(count)),
                            Err(e) => {
                                NotifierMetrics::incr(&metrics.sample_failures);
                                warn!(
                                    session_id = %session.session_id,
                                    error = %e,
                                    "Unread count sample failed"
                                );
                                dirty = true;
                                LiveUpdate::Keepalive
                            }
                        }
                    } else {
                        LiveUpdate::Keepalive
                    };

                    tokio::select! {
                        biased;

                        _ = cancel.changed() => return SessionExit::Cancelled,
                        _ = shutdown.changed() => return SessionExit::Shutdown,
                        sent = updates.send(update) => {
                            if sent.is_err() {
                                return SessionExit::Closed;
                            }
                        }
                    }

                    match update {
                        LiveUpdate::Count { count } => {
                            NotifierMetrics::incr(&metrics.updates_sent);
                            debug!(
                                session_id = %session.session_id,
                                user_id = session.user_id,
                                count,
                                "Pushed unread count"
                            );
                        }
                        LiveUpdate::Keepalive => NotifierMetrics::incr(&metrics.keepalives_sent),
                    }
                }
            }
        }
    }
}
