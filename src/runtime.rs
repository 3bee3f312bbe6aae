//! Runtime for executing form sessions
//!
//! Every session (one user in one chat) gets a single worker task fed by its
//! own queue, so its events are applied strictly in arrival order while other
//! sessions proceed independently.

mod executor;
pub mod traits;


pub use executor::SessionRuntime;
pub use traits::*;

use crate::session::{SessionKey, SessionStore};
use crate::state_machine::Event;
use crate::submission::{FileSubmissionSink, SubmissionError, SubmissionSink};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Queue depth per session; a user can't usefully get further ahead
const EVENT_QUEUE_DEPTH: usize = 32;

/// Type alias for production manager with concrete implementations
pub type ProductionManager = RuntimeManager<TelegramTransport, FileSubmissionSink>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error("Submission task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Session worker for chat {} user {} is gone", .0.chat_id, .0.user_id)]
    WorkerClosed(SessionKey),
}

/// Handle to a running session worker
struct WorkerHandle {
    event_tx: mpsc::Sender<Event>,
    last_used: Instant,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Workers {
    active: HashMap<SessionKey, WorkerHandle>,
    /// Workers whose queue was closed; they exit once it is drained
    retired: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Close the queue of `key`'s worker, keeping its task for shutdown
    fn retire(&mut self, key: SessionKey) {
        if let Some(handle) = self.active.remove(&key) {
            self.retired.push(handle.task);
        }
    }

    fn prune_retired(&mut self) {
        self.retired.retain(|task| !task.is_finished());
    }
}

/// What a sweep removed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub workers: usize,
    pub sessions: usize,
}

/// Manager for all session workers
pub struct RuntimeManager<T, S>
where
    T: ChatTransport + 'static,
    S: SubmissionSink + 'static,
{
    store: Arc<SessionStore>,
    transport: Arc<T>,
    sink: Arc<S>,
    idle_timeout: Duration,
    max_workers: usize,
    workers: Mutex<Workers>,
}

impl<T, S> RuntimeManager<T, S>
where
    T: ChatTransport + 'static,
    S: SubmissionSink + 'static,
{
    pub fn new(
        store: Arc<SessionStore>,
        transport: Arc<T>,
        sink: Arc<S>,
        idle_timeout: Duration,
        max_workers: usize,
    ) -> Self {
        Self {
            store,
            transport,
            sink,
            idle_timeout,
            max_workers: max_workers.max(1),
            workers: Mutex::new(Workers::default()),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Queue an event for a session, starting its worker if needed
    pub async fn send_event(&self, key: SessionKey, event: Event) -> Result<(), RuntimeError> {
        let event_tx = {
            let mut workers = self.workers.lock().await;
            self.worker_for(&mut workers, key)
        };
        event_tx
            .send(event)
            .await
            .map_err(|_| RuntimeError::WorkerClosed(key))
    }

    /// Get or spawn the worker for `key`. Caller holds the workers lock.
    fn worker_for(&self, workers: &mut Workers, key: SessionKey) -> mpsc::Sender<Event> {
        let now = Instant::now();
        if let Some(handle) = workers.active.get_mut(&key) {
            if !handle.event_tx.is_closed() {
                handle.last_used = now;
                return handle.event_tx.clone();
            }
        }

        if !workers.active.contains_key(&key) && workers.active.len() >= self.max_workers {
            let oldest = workers
                .active
                .iter()
                .min_by_key(|(_, handle)| handle.last_used)
                .map(|(key, _)| *key);
            if let Some(oldest) = oldest {
                // Dropping the sender lets the worker drain and exit
                workers.retire(oldest);
                tracing::info!(
                    chat_id = oldest.chat_id,
                    user_id = oldest.user_id,
                    "Dropped least recently used session worker"
                );
            }
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let runtime = SessionRuntime::new(
            key,
            self.store.clone(),
            self.transport.clone(),
            self.sink.clone(),
            event_rx,
        );
        let task = tokio::spawn(async move {
            runtime.run().await;
            tracing::debug!(
                chat_id = key.chat_id,
                user_id = key.user_id,
                "Session worker finished"
            );
        });

        // A closed handle for `key` belongs to a worker that already exited
        workers.active.insert(
            key,
            WorkerHandle {
                event_tx: event_tx.clone(),
                last_used: now,
                task,
            },
        );
        event_tx
    }

    /// Drop idle workers and expired sessions
    pub async fn sweep(&self) -> SweepStats {
        let workers = {
            let mut workers = self.workers.lock().await;
            workers.prune_retired();
            let idle: Vec<SessionKey> = workers
                .active
                .iter()
                .filter(|(_, handle)| {
                    handle.event_tx.is_closed() || handle.last_used.elapsed() >= self.idle_timeout
                })
                .map(|(key, _)| *key)
                .collect();
            for key in &idle {
                workers.retire(*key);
            }
            idle.len()
        };
        let sessions = self.store.evict_expired();

        let stats = SweepStats { workers, sessions };
        if stats != SweepStats::default() {
            tracing::info!(
                workers = stats.workers,
                sessions = stats.sessions,
                "Swept idle sessions"
            );
        }
        stats
    }

    /// Close every queue and wait up to `grace` for the workers to finish
    /// what they already received.
    ///
    /// Returns false if the grace period ran out first.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let tasks: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock().await;
            let keys: Vec<SessionKey> = workers.active.keys().copied().collect();
            for key in keys {
                workers.retire(key);
            }
            std::mem::take(&mut workers.retired)
        };
        let pending = tasks.len();
        tracing::info!(workers = pending, "Draining session workers");

        let drain = async {
            for task in tasks {
                if let Err(e) = task.await {
                    tracing::error!(error = %e, "Session worker failed");
                }
            }
        };
        let drained = tokio::time::timeout(grace, drain).await.is_ok();
        if !drained {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "Session workers still busy at shutdown"
            );
        }
        drained
    }

    /// Number of live workers
    #[allow(dead_code)] // Used in tests
    pub async fn worker_count(&self) -> usize {
        self.workers.lock().await.active.len()
    }
}
