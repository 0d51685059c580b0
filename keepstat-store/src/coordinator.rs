//! Update coordinator.
//!
//! Owns the poll timer, runs at most one fetch at a time, keeps the last
//! good snapshot and the last error, and notifies listeners after every
//! cycle.
//!
//! ## Cycle
//!
//! `Idle -> Fetching -> Updated -> Idle`. A cycle runs in its own task so a
//! caller that gives up waiting never leaves the single-flight slot taken.
//! Callers that ask for a refresh while a cycle is in flight join it and
//! receive its outcome.
//!
//! The health endpoint is queried alongside the stats. Its result is kept
//! for [`UpdateCoordinator::last_health`] but never fails the cycle.
//!
//! ## Stop
//!
//! [`UpdateCoordinator::stop`] aborts the timer and bumps the epoch. A fetch
//! already in flight runs to completion, but its outcome is discarded
//! because its start epoch no longer matches. A restart that joined such a
//! cycle fetches again as soon as it ends.

use chrono::{DateTime, Utc};
use keepstat_core::{
    ConfigError, ConnectionConfig, ErrorRecord, HealthStatus, RefreshOutcome, StatsSnapshot,
};
use keepstat_fetch::{ClientError, StatsFetcher};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::CoordinatorError;
use crate::listener::{Listener, ListenerId, ListenerRegistry};

/// Default time budget for a single listener callback.
pub const DEFAULT_LISTENER_BUDGET: Duration = Duration::from_secs(5);

// ============================================================================
// Phase & Lifecycle
// ============================================================================

/// Where the coordinator is within a poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No fetch in flight.
    Idle,
    /// One fetch in flight.
    Fetching,
    /// Outcome recorded, listeners being notified.
    Updated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::Updated => write!(f, "updated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Running,
    Stopped,
}

/// Result published to joiners. `None` means the outcome was discarded.
type CycleResult = Option<RefreshOutcome>;

/// What a caller of [`Shared::refresh`] got back.
enum Joined {
    Applied(RefreshOutcome),
    /// Stopped before or during the cycle.
    Discarded,
    /// The cycle task ended without publishing.
    Lost,
}

// ============================================================================
// Shared State
// ============================================================================

struct CoordinatorState {
    config: ConnectionConfig,
    phase: Phase,
    lifecycle: Lifecycle,
    epoch: u64,
    in_flight: Option<watch::Receiver<Option<CycleResult>>>,
    last_snapshot: Option<StatsSnapshot>,
    last_success_at: Option<DateTime<Utc>>,
    last_error: Option<ErrorRecord>,
    last_health: Option<HealthStatus>,
    listener_budget: Duration,
}

impl CoordinatorState {
    fn apply(&mut self, result: Result<StatsSnapshot, ClientError>) -> RefreshOutcome {
        self.phase = Phase::Updated;
        match result {
            Ok(snapshot) => {
                self.last_snapshot = Some(snapshot);
                self.last_success_at = Some(Utc::now());
                self.last_error = None;
                info!(bookmarks = snapshot.bookmarks, "Stats updated");
                RefreshOutcome::Success { snapshot }
            }
            Err(err) => {
                let record = err.to_record();
                warn!(
                    kind = %record.kind,
                    transient = record.kind.is_transient(),
                    error = %err,
                    stale = self.last_snapshot.is_some(),
                    "Stats refresh failed"
                );
                self.last_error = Some(record.clone());
                RefreshOutcome::Failure { error: record }
            }
        }
    }

    fn apply_health(&mut self, result: Result<Option<HealthStatus>, ClientError>) {
        match result {
            Ok(Some(health)) => {
                if health.is_problem() {
                    warn!(
                        status_code = health.status_code,
                        status = %health.status,
                        "Service reports a problem"
                    );
                }
                self.last_health = Some(health);
            }
            Ok(None) => {}
            Err(err) => {
                debug!(error = %err, "Health check failed");
                self.last_health = None;
            }
        }
    }
}

struct Shared {
    state: Mutex<CoordinatorState>,
    listeners: ListenerRegistry,
    fetcher: Arc<dyn StatsFetcher>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a cycle, or joins the one in flight, and waits for its result.
    async fn refresh(self: &Arc<Self>) -> Joined {
        let mut rx = {
            let mut state = self.lock();
            if state.lifecycle == Lifecycle::Stopped {
                debug!("Refresh requested on stopped coordinator");
                return Joined::Discarded;
            }

            if let Some(rx) = &state.in_flight {
                debug!("Joining in-flight refresh");
                rx.clone()
            } else {
                let (tx, rx) = watch::channel(None);
                state.in_flight = Some(rx.clone());
                state.phase = Phase::Fetching;

                let config = state.config.clone();
                let epoch = state.epoch;
                let shared = Arc::clone(self);
                tokio::spawn(async move { shared.run_cycle(config, epoch, tx).await });
                rx
            }
        };

        let result = match rx.wait_for(Option::is_some).await {
            Ok(result) => result.clone().flatten(),
            // Runtime shutdown.
            Err(_) => return Joined::Lost,
        };
        match result {
            Some(outcome) => Joined::Applied(outcome),
            None => Joined::Discarded,
        }
    }

    #[instrument(skip(self, config, tx))]
    async fn run_cycle(
        self: Arc<Self>,
        config: ConnectionConfig,
        epoch: u64,
        tx: watch::Sender<Option<CycleResult>>,
    ) {
        let guard = InFlightGuard(&self);
        debug!(base_url = %config.base_url(), "Refresh cycle started");

        let (result, health) = tokio::join!(
            self.fetcher.fetch_stats(&config),
            self.fetcher.fetch_health(&config)
        );

        let applied = {
            let mut state = self.lock();
            if state.epoch == epoch {
                state.apply_health(health);
                Some((state.apply(result), state.listener_budget))
            } else {
                info!("Coordinator stopped during fetch, discarding outcome");
                None
            }
        };

        let outcome = match applied {
            Some((outcome, budget)) => {
                self.listeners.notify(&outcome, budget).await;
                Some(outcome)
            }
            None => None,
        };

        drop(guard);
        // Joiners may all have gone away.
        let _ = tx.send(Some(outcome));
    }
}

/// Returns the coordinator to `Idle` when a cycle ends, even if it panics.
struct InFlightGuard<'a>(&'a Shared);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        state.in_flight = None;
        state.phase = Phase::Idle;
    }
}

async fn run_timer(shared: Arc<Shared>) {
    loop {
        let joined = shared.refresh().await;
        if shared.lock().lifecycle == Lifecycle::Stopped {
            break;
        }
        if matches!(joined, Joined::Discarded) {
            // Joined a cycle from before a restart; its slot is free now.
            debug!("Joined cycle was discarded, fetching again");
            continue;
        }

        let interval = shared.lock().config.poll_interval();
        debug!(secs = interval.as_secs(), "Sleeping until next refresh");
        tokio::time::sleep(interval).await;
    }
}

// ============================================================================
// Update Coordinator
// ============================================================================

/// Polls the stats endpoint on a fixed cadence and publishes the latest
/// snapshot.
///
/// Read accessors never wait on the network: they take a short lock on the
/// recorded state and return copies.
pub struct UpdateCoordinator {
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl UpdateCoordinator {
    /// Creates a coordinator. Nothing runs until [`start`] or
    /// [`request_refresh`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` does not validate.
    ///
    /// [`start`]: UpdateCoordinator::start
    /// [`request_refresh`]: UpdateCoordinator::request_refresh
    pub fn new(
        config: ConnectionConfig,
        fetcher: Arc<dyn StatsFetcher>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(?config, "Creating update coordinator");

        let state = CoordinatorState {
            config,
            phase: Phase::Idle,
            lifecycle: Lifecycle::Created,
            epoch: 0,
            in_flight: None,
            last_snapshot: None,
            last_success_at: None,
            last_error: None,
            last_health: None,
            listener_budget: DEFAULT_LISTENER_BUDGET,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                listeners: ListenerRegistry::new(),
                fetcher,
            }),
            timer: Mutex::new(None),
        })
    }

    /// Sets the per-listener time budget.
    #[must_use]
    pub fn with_listener_budget(self, budget: Duration) -> Self {
        self.set_listener_budget(budget);
        self
    }

    /// Changes the per-listener time budget.
    pub fn set_listener_budget(&self, budget: Duration) {
        self.shared.lock().listener_budget = budget;
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Arms the poll timer and runs the first fetch immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::AlreadyRunning`] if already started, or
    /// [`CoordinatorError::NoRuntime`] outside a Tokio runtime.
    pub fn start(&self) -> Result<(), CoordinatorError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| CoordinatorError::NoRuntime)?;
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);

        {
            let mut state = self.shared.lock();
            if state.lifecycle == Lifecycle::Running {
                return Err(CoordinatorError::AlreadyRunning);
            }
            state.lifecycle = Lifecycle::Running;
            info!(
                interval_secs = state.config.poll_interval_secs(),
                "Starting update coordinator"
            );
        }

        *timer = Some(runtime.spawn(run_timer(Arc::clone(&self.shared))));
        Ok(())
    }

    /// Disarms the timer. An in-flight fetch completes but is discarded.
    ///
    /// Read accessors keep returning the last known values.
    pub fn stop(&self) {
        let handle = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        {
            let mut state = self.shared.lock();
            state.lifecycle = Lifecycle::Stopped;
            state.epoch += 1;
        }

        if let Some(handle) = handle {
            handle.abort();
        }
        info!("Update coordinator stopped");
    }

    /// Returns true between [`start`](UpdateCoordinator::start) and
    /// [`stop`](UpdateCoordinator::stop).
    pub fn is_running(&self) -> bool {
        self.shared.lock().lifecycle == Lifecycle::Running
    }

    /// Runs a refresh now, or joins the one already in flight.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Stopped`] after [`stop`], including when
    /// the joined cycle was discarded by it.
    ///
    /// [`stop`]: UpdateCoordinator::stop
    pub async fn request_refresh(&self) -> Result<RefreshOutcome, CoordinatorError> {
        match self.shared.refresh().await {
            Joined::Applied(outcome) => Ok(outcome),
            Joined::Discarded | Joined::Lost => Err(CoordinatorError::Stopped),
        }
    }

    /// Replaces the connection config from the next cycle on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] and keeps the current config if `config`
    /// does not validate.
    pub fn update_config(&self, config: ConnectionConfig) -> Result<(), ConfigError> {
        config.validate()?;
        info!(?config, "Connection config updated");
        self.shared.lock().config = config;
        Ok(())
    }

    // ========================================================================
    // Readers
    // ========================================================================

    /// Latest successful snapshot; `None` until the first success.
    pub fn last_snapshot(&self) -> Option<StatsSnapshot> {
        self.shared.lock().last_snapshot
    }

    /// Error of the last cycle; `None` if it succeeded.
    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.shared.lock().last_error.clone()
    }

    /// When the last successful cycle finished.
    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.shared.lock().last_success_at
    }

    /// Health seen by the last cycle; `None` before the first answer or
    /// after a health request failed.
    pub fn last_health(&self) -> Option<HealthStatus> {
        self.shared.lock().last_health.clone()
    }

    /// Returns true if a snapshot exists and the last cycle succeeded.
    pub fn last_update_success(&self) -> bool {
        let state = self.shared.lock();
        state.last_snapshot.is_some() && state.last_error.is_none()
    }

    /// Current cycle phase.
    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    /// Config the next cycle will use.
    pub fn config(&self) -> ConnectionConfig {
        self.shared.lock().config.clone()
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Registers a listener notified after every cycle.
    pub fn add_listener<L: Listener + 'static>(&self, listener: L) -> ListenerId {
        self.shared.listeners.add(Arc::new(listener))
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }
}

impl Drop for UpdateCoordinator {
    fn drop(&mut self) {
        let handle = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(Result<StatsSnapshot, ClientError>);

    #[async_trait]
    impl StatsFetcher for Fixed {
        async fn fetch_stats(
            &self,
            _config: &ConnectionConfig,
        ) -> Result<StatsSnapshot, ClientError> {
            self.0.clone()
        }
    }

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("https://api.example.com", "tok123", 30).unwrap()
    }

    #[tokio::test]
    async fn test_initial_state() {
        let coordinator =
            UpdateCoordinator::new(config(), Arc::new(Fixed(Ok(StatsSnapshot::default()))))
                .unwrap();
        assert!(coordinator.last_snapshot().is_none());
        assert!(coordinator.last_error().is_none());
        assert!(!coordinator.last_update_success());
        assert_eq!(coordinator.phase(), Phase::Idle);
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn test_phase_returns_to_idle() {
        let coordinator = UpdateCoordinator::new(
            config(),
            Arc::new(Fixed(Err(ClientError::Api(500)))),
        )
        .unwrap();
        let outcome = coordinator.request_refresh().await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(coordinator.phase(), Phase::Idle);
    }

    #[test]
    fn test_start_without_runtime() {
        let coordinator =
            UpdateCoordinator::new(config(), Arc::new(Fixed(Ok(StatsSnapshot::default()))))
                .unwrap();
        assert_eq!(coordinator.start(), Err(CoordinatorError::NoRuntime));
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn test_update_config_rejects_invalid() {
        let coordinator =
            UpdateCoordinator::new(config(), Arc::new(Fixed(Ok(StatsSnapshot::default()))))
                .unwrap();
        let bad: ConnectionConfig = serde_json::from_str(
            r#"{"base_url":"https://other.example","token":"t","poll_interval_secs":1}"#,
        )
        .unwrap();
        assert!(coordinator.update_config(bad).is_err());
        assert_eq!(coordinator.config(), config());
    }
}
