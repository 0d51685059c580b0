//! Refresh listeners.
//!
//! Listeners are notified once per completed cycle, in registration order.
//! Each callback runs in its own task under a time budget, so one slow
//! consumer cannot stall the polling cadence. A callback that overruns is
//! abandoned and dispatch moves on.

use async_trait::async_trait;
use keepstat_core::RefreshOutcome;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

// ============================================================================
// Listener Trait
// ============================================================================

/// A consumer of per-cycle outcomes.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Called after each cycle's outcome has been recorded.
    async fn on_refresh(&self, outcome: &RefreshOutcome);
}

/// Adapts a plain closure into a [`Listener`].
///
/// The closure may block; it runs on the blocking thread pool.
pub struct FnListener<F>(Arc<F>);

impl<F> FnListener<F>
where
    F: Fn(&RefreshOutcome) + Send + Sync + 'static,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[async_trait]
impl<F> Listener for FnListener<F>
where
    F: Fn(&RefreshOutcome) + Send + Sync + 'static,
{
    async fn on_refresh(&self, outcome: &RefreshOutcome) {
        let f = Arc::clone(&self.0);
        let outcome = outcome.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || f(&outcome)).await {
            warn!(error = %e, "Listener callback panicked");
        }
    }
}

/// Handle returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Ordered set of registered listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: Mutex<Vec<(ListenerId, Arc<dyn Listener>)>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener at the end of the dispatch order.
    pub fn add(&self, listener: Arc<dyn Listener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        debug!(%id, "Listener registered");
        id
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if removed {
            debug!(%id, "Listener removed");
        }
        removed
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notifies every listener in registration order.
    ///
    /// Each callback runs in a spawned task. The wait for it is bounded by
    /// `budget`; on overrun the task is aborted and the next listener runs.
    /// Listeners registered or removed while a dispatch is running take
    /// effect from the next dispatch.
    pub async fn notify(&self, outcome: &RefreshOutcome, budget: Duration) {
        let entries: Vec<(ListenerId, Arc<dyn Listener>)> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (id, listener) in entries {
            let outcome = outcome.clone();
            let mut task = tokio::spawn(async move { listener.on_refresh(&outcome).await });

            match tokio::time::timeout(budget, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(%id, error = %e, "Listener task failed"),
                Err(_) => {
                    task.abort();
                    warn!(
                        %id,
                        budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
                        "Listener exceeded its time budget, skipping"
                    );
                }
            }
        }
    }
}
