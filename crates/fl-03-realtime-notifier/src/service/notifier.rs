//! Realtime Notifier Service
//!
//! Opens one detection loop per live connection and tears them down on
//! unsubscribe, user disconnect or server shutdown.

use parking_lot::Mutex;
use shared_bus::{EventFilter, EventKind, InMemoryEventBus};
use shared_types::UserId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::registry::SessionRegistry;
use super::session_loop::SessionLoop;
use crate::domain::{LiveUpdate, NotifierConfig, SessionId, UnreadCounterSession};
use crate::error::NotifierError;
use crate::metrics::NotifierMetrics;
use crate::ports::UnreadCountSource;

/// The receiving end of one live connection
///
/// Dropping it closes the connection; the session loop notices within one
/// tick.
#[derive(Debug)]
pub struct LiveChannel {
    pub session_id: SessionId,
    pub user_id: UserId,
    receiver: mpsc::Receiver<LiveUpdate>,
}

impl LiveChannel {
    /// Next update, `None` once the session has ended
    pub async fn recv(&mut self) -> Option<LiveUpdate> {
        self.receiver.recv().await
    }

    /// Next update if one is buffered
    pub fn try_recv(&mut self) -> Option<LiveUpdate> {
        self.receiver.try_recv().ok()
    }

    pub fn into_receiver(self) -> mpsc::Receiver<LiveUpdate> {
        self.receiver
    }
}

/// Live unread-counter push service
pub struct RealtimeNotifier<S: UnreadCountSource> {
    source: Arc<S>,
    bus: Arc<InMemoryEventBus>,
    config: NotifierConfig,
    registry: SessionRegistry,
    tasks: Mutex<JoinSet<()>>,
    shutdown_tx: watch::Sender<bool>,
    closing: AtomicBool,
    metrics: Arc<NotifierMetrics>,
}

impl<S: UnreadCountSource + 'static> RealtimeNotifier<S> {
    pub fn new(
        source: Arc<S>,
        bus: Arc<InMemoryEventBus>,
        config: NotifierConfig,
    ) -> Result<Self, NotifierError> {
        config.validate()?;
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            source,
            bus,
            config,
            registry: SessionRegistry::default(),
            tasks: Mutex::new(JoinSet::new()),
            shutdown_tx,
            closing: AtomicBool::new(false),
            metrics: Arc::new(NotifierMetrics::new()),
        })
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<NotifierMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Open a live session for `user_id`. Must be called within a tokio
    /// runtime.
    pub fn subscribe(&self, user_id: UserId) -> Result<LiveChannel, NotifierError> {
        // Held across the spawn: shutdown either drains this session or
        // refuses it
        let mut tasks = self.tasks.lock();
        if self.closing.load(Ordering::SeqCst) {
            return Err(NotifierError::ShuttingDown);
        }

        let session = UnreadCounterSession::new(user_id);
        let session_id = session.session_id;
        let (cancel_tx, cancel_rx) = watch::channel(false);

        if let Err(e) = self.registry.register(
            session_id,
            user_id,
            cancel_tx,
            self.config.max_sessions_per_user,
        ) {
            NotifierMetrics::incr(&self.metrics.sessions_rejected);
            return Err(e);
        }

        let (updates_tx, updates_rx) = mpsc::channel(self.config.channel_capacity);
        let events = self.bus.subscribe(
            EventFilter::kinds(vec![
                EventKind::MessageCreated,
                EventKind::MessageRead,
                EventKind::UnreadCountChanged,
            ])
            .for_users(vec![user_id]),
        );

        let session_loop = SessionLoop {
            session,
            source: Arc::clone(&self.source),
            updates: updates_tx,
            events,
            cancel: cancel_rx,
            shutdown: self.shutdown_tx.subscribe(),
            config: self.config.clone(),
            metrics: Arc::clone(&self.metrics),
        };

        let registry = self.registry.clone();
        let metrics = Arc::clone(&self.metrics);
        NotifierMetrics::incr(&metrics.sessions_opened);

        // Reap sessions that already ended
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            let exit = session_loop.run().await;
            registry.remove(&session_id);
            NotifierMetrics::incr(&metrics.sessions_closed);
            debug!(session_id = %session_id, user_id, ?exit, "Live session ended");
        });

        info!(session_id = %session_id, user_id, "Live session opened");
        Ok(LiveChannel {
            session_id,
            user_id,
            receiver: updates_rx,
        })
    }

    /// Cancel one session. Returns whether it was running.
    pub fn unsubscribe(&self, session_id: &SessionId) -> bool {
        self.registry.cancel(session_id)
    }

    /// Cancel every session of a user. Returns how many were cancelled.
    pub fn disconnect_user(&self, user_id: UserId) -> usize {
        let cancelled = self.registry.cancel_user(user_id);
        if cancelled > 0 {
            info!(user_id, cancelled, "Disconnected user sessions");
        }
        cancelled
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    pub fn user_sessions(&self, user_id: UserId) -> usize {
        self.registry.user_sessions(user_id)
    }

    /// Stop accepting sessions, signal every loop and wait for them to end.
    ///
    /// Loops still running after the grace period are aborted. Returns the
    /// number of loops that were drained.
    pub async fn shutdown(&self) -> usize {
        let mut tasks = {
            let mut guard = self.tasks.lock();
            self.closing.store(true, Ordering::SeqCst);
            std::mem::take(&mut *guard)
        };
        if self.shutdown_tx.send(true).is_err() {
            debug!("No live session was listening for shutdown");
        }

        let grace = self.config.shutdown_grace();
        let mut drained = 0;

        let drain = async {
            while tasks.join_next().await.is_some() {
                drained += 1;
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            warn!(remaining = tasks.len(), "Live sessions did not stop in time, aborting");
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        info!(drained, "Realtime notifier stopped");
        drained
    }
}
