//! Update coordinator behavior under a paused clock.
//!
//! A scripted fetcher stands in for the API client so cycles, timing and
//! concurrency can be observed exactly.

use async_trait::async_trait;
use keepstat_core::{ConnectionConfig, ErrorKind, HealthStatus, RefreshOutcome, StatsSnapshot};
use keepstat_fetch::{ClientError, StatsFetcher};
use keepstat_store::{CoordinatorError, FnListener, Listener, Phase, UpdateCoordinator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};

// ============================================================================
// Scripted Fetcher
// ============================================================================

/// Returns scripted results in order, then default snapshots.
#[derive(Default)]
struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<StatsSnapshot, ClientError>>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    configs: Mutex<Vec<ConnectionConfig>>,
    health: Option<Result<HealthStatus, ClientError>>,
}

impl ScriptedFetcher {
    fn new(script: impl IntoIterator<Item = Result<StatsSnapshot, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        })
    }

    fn with_delay(
        delay: Duration,
        script: impl IntoIterator<Item = Result<StatsSnapshot, ClientError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            delay,
            ..Self::default()
        })
    }

    fn with_health(
        health: Result<HealthStatus, ClientError>,
        script: impl IntoIterator<Item = Result<StatsSnapshot, ClientError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            health: Some(health),
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn configs(&self) -> Vec<ConnectionConfig> {
        self.configs.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatsFetcher for ScriptedFetcher {
    async fn fetch_stats(&self, config: &ConnectionConfig) -> Result<StatsSnapshot, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.configs.lock().unwrap().push(config.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(StatsSnapshot::default()))
    }

    async fn fetch_health(
        &self,
        _config: &ConnectionConfig,
    ) -> Result<Option<HealthStatus>, ClientError> {
        self.health.clone().transpose()
    }
}

// ============================================================================
// Helpers
// ============================================================================

const FIRST: StatsSnapshot = StatsSnapshot::new(10, 2, 1, 0, 3, 7);

fn config() -> ConnectionConfig {
    ConnectionConfig::new("https://api.example.com", "tok123", 30).unwrap()
}

fn coordinator(fetcher: &Arc<ScriptedFetcher>) -> UpdateCoordinator {
    UpdateCoordinator::new(config(), fetcher.clone()).unwrap()
}

fn count_notifications(coordinator: &UpdateCoordinator) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();
    coordinator.add_listener(FnListener::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    count
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_success_then_timeout_keeps_snapshot() {
    let fetcher = ScriptedFetcher::new([
        Ok(FIRST),
        Err(ClientError::Timeout(Duration::from_secs(10))),
    ]);
    let coordinator = coordinator(&fetcher);

    let outcome = coordinator.request_refresh().await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Success { snapshot: FIRST });
    assert_eq!(coordinator.last_snapshot(), Some(FIRST));
    assert!(coordinator.last_error().is_none());
    assert!(coordinator.last_update_success());
    let first_success = coordinator.last_success_at().unwrap();

    let outcome = coordinator.request_refresh().await.unwrap();
    assert!(!outcome.is_success());
    assert_eq!(coordinator.last_snapshot(), Some(FIRST));
    assert_eq!(coordinator.last_error().unwrap().kind, ErrorKind::Timeout);
    assert_eq!(coordinator.last_success_at(), Some(first_success));
    assert!(!coordinator.last_update_success());
}

#[tokio::test(start_paused = true)]
async fn test_invalid_response_leaves_snapshot_unchanged() {
    let fetcher = ScriptedFetcher::new([
        Ok(FIRST),
        Err(ClientError::InvalidResponse("missing field `numTags`".to_string())),
    ]);
    let coordinator = coordinator(&fetcher);

    coordinator.request_refresh().await.unwrap();
    coordinator.request_refresh().await.unwrap();

    assert_eq!(coordinator.last_snapshot(), Some(FIRST));
    let error = coordinator.last_error().unwrap();
    assert_eq!(error.kind, ErrorKind::InvalidResponse);
    assert!(error.message.contains("numTags"));
}

#[tokio::test(start_paused = true)]
async fn test_auth_error_cleared_by_next_success() {
    let fetcher = ScriptedFetcher::new([Err(ClientError::Auth(401)), Ok(FIRST)]);
    let coordinator = coordinator(&fetcher);

    coordinator.request_refresh().await.unwrap();
    assert!(coordinator.last_snapshot().is_none());
    assert_eq!(coordinator.last_error().unwrap().kind, ErrorKind::Auth);

    let corrected = ConnectionConfig::new("https://api.example.com", "tok456", 30).unwrap();
    coordinator.update_config(corrected.clone()).unwrap();
    coordinator.request_refresh().await.unwrap();

    assert_eq!(coordinator.last_snapshot(), Some(FIRST));
    assert!(coordinator.last_error().is_none());
    assert_eq!(fetcher.configs()[1], corrected);
}

#[tokio::test(start_paused = true)]
async fn test_last_snapshot_is_latest_success() {
    let snap = |n| StatsSnapshot::new(n, 0, 0, 0, 0, 0);
    let script = vec![
        Ok(snap(1)),
        Err(ClientError::Api(502)),
        Ok(snap(2)),
        Ok(snap(3)),
        Err(ClientError::Connection("refused".to_string())),
        Err(ClientError::Timeout(Duration::from_secs(10))),
        Ok(snap(4)),
        Err(ClientError::NotFound("https://api.example.com/x".to_string())),
    ];
    let fetcher = ScriptedFetcher::new(script.clone());
    let coordinator = coordinator(&fetcher);

    let mut expected = None;
    for step in script {
        if let Ok(snapshot) = step {
            expected = Some(snapshot);
        }
        coordinator.request_refresh().await.unwrap();
        assert_eq!(coordinator.last_snapshot(), expected);
    }
}

// ============================================================================
// Single Flight
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_share_one_fetch() {
    let fetcher = ScriptedFetcher::with_delay(Duration::from_secs(1), [Ok(FIRST)]);
    let coordinator = coordinator(&fetcher);
    let notifications = count_notifications(&coordinator);

    let outcomes =
        futures::future::join_all((0..10).map(|_| coordinator.request_refresh())).await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
    for outcome in outcomes {
        assert_eq!(outcome.unwrap(), RefreshOutcome::Success { snapshot: FIRST });
    }
}

#[tokio::test(start_paused = true)]
async fn test_phase_during_fetch() {
    let fetcher = ScriptedFetcher::with_delay(Duration::from_secs(5), [Ok(FIRST)]);
    let coordinator = Arc::new(coordinator(&fetcher));

    let pending = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.request_refresh().await }
    });
    sleep(Duration::from_secs(1)).await;
    assert_eq!(coordinator.phase(), Phase::Fetching);

    pending.await.unwrap().unwrap();
    assert_eq!(coordinator.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_timer_and_manual_refresh_never_overlap() {
    let fetcher = ScriptedFetcher::with_delay(Duration::from_secs(20), []);
    let coordinator = coordinator(&fetcher);
    coordinator.start().unwrap();

    sleep(Duration::from_secs(1)).await;
    coordinator.request_refresh().await.unwrap();
    sleep(Duration::from_secs(120)).await;

    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
    coordinator.stop();
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_fetches_immediately_then_on_interval() {
    let fetcher = ScriptedFetcher::new([]);
    let coordinator = coordinator(&fetcher);
    coordinator.start().unwrap();
    assert!(coordinator.is_running());

    sleep(Duration::from_millis(1)).await;
    assert_eq!(fetcher.calls(), 1);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(fetcher.calls(), 2);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(fetcher.calls(), 4);

    coordinator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_failures_do_not_stop_polling() {
    let fetcher = ScriptedFetcher::new((0..3).map(|_| Err(ClientError::Api(500))));
    let coordinator = coordinator(&fetcher);
    coordinator.start().unwrap();

    sleep(Duration::from_secs(91)).await;
    assert_eq!(fetcher.calls(), 4);
    assert!(coordinator.last_error().is_none());
    coordinator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_fetches_and_notifications() {
    let fetcher = ScriptedFetcher::new([Ok(FIRST)]);
    let coordinator = coordinator(&fetcher);
    let notifications = count_notifications(&coordinator);
    coordinator.start().unwrap();

    sleep(Duration::from_secs(1)).await;
    coordinator.stop();
    assert!(!coordinator.is_running());
    let calls = fetcher.calls();
    let notified = notifications.load(Ordering::SeqCst);

    sleep(Duration::from_secs(600)).await;
    assert_eq!(fetcher.calls(), calls);
    assert_eq!(notifications.load(Ordering::SeqCst), notified);
    assert_eq!(
        coordinator.request_refresh().await,
        Err(CoordinatorError::Stopped)
    );
    assert_eq!(fetcher.calls(), calls);

    assert_eq!(coordinator.last_snapshot(), Some(FIRST));
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_in_flight_result() {
    let fetcher = ScriptedFetcher::with_delay(Duration::from_secs(10), [Ok(FIRST)]);
    let coordinator = coordinator(&fetcher);
    let notifications = count_notifications(&coordinator);
    coordinator.start().unwrap();

    sleep(Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls(), 1);
    coordinator.stop();

    sleep(Duration::from_secs(100)).await;
    assert_eq!(fetcher.calls(), 1);
    assert!(coordinator.last_snapshot().is_none());
    assert_eq!(notifications.load(Ordering::SeqCst), 0);
    assert_eq!(coordinator.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_joiner_of_discarded_cycle_sees_stopped() {
    let fetcher = ScriptedFetcher::with_delay(Duration::from_secs(10), [Ok(FIRST)]);
    let coordinator = Arc::new(coordinator(&fetcher));

    let pending = tokio::spawn({
        let coordinator = coordinator.clone();
        async move { coordinator.request_refresh().await }
    });
    sleep(Duration::from_secs(1)).await;
    coordinator.stop();

    assert_eq!(pending.await.unwrap(), Err(CoordinatorError::Stopped));
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_is_rejected() {
    let fetcher = ScriptedFetcher::new([]);
    let coordinator = coordinator(&fetcher);

    coordinator.start().unwrap();
    assert_eq!(coordinator.start(), Err(CoordinatorError::AlreadyRunning));
    coordinator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop() {
    let fetcher = ScriptedFetcher::new([Ok(FIRST), Ok(StatsSnapshot::new(11, 2, 1, 0, 3, 7))]);
    let coordinator = coordinator(&fetcher);

    coordinator.start().unwrap();
    sleep(Duration::from_secs(1)).await;
    coordinator.stop();
    assert_eq!(fetcher.calls(), 1);

    coordinator.start().unwrap();
    sleep(Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(coordinator.last_snapshot().unwrap().bookmarks, 11);
    coordinator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_restart_while_discarded_fetch_in_flight() {
    let fetcher = ScriptedFetcher::with_delay(
        Duration::from_secs(10),
        [Ok(FIRST), Ok(StatsSnapshot::new(11, 2, 1, 0, 3, 7))],
    );
    let coordinator = coordinator(&fetcher);

    coordinator.start().unwrap();
    sleep(Duration::from_secs(1)).await;
    coordinator.stop();
    coordinator.start().unwrap();

    // The first fetch ends at t=10 and is discarded; the restart fetches
    // right away instead of waiting out a full interval.
    sleep(Duration::from_secs(15)).await;
    assert_eq!(fetcher.calls(), 2);

    sleep(Duration::from_secs(6)).await;
    assert_eq!(coordinator.last_snapshot().unwrap().bookmarks, 11);
    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
    coordinator.stop();
}

#[tokio::test(start_paused = true)]
async fn test_update_config_applies_at_next_cycle() {
    let fetcher = ScriptedFetcher::with_delay(Duration::from_secs(5), []);
    let coordinator = coordinator(&fetcher);
    coordinator.start().unwrap();

    sleep(Duration::from_secs(1)).await;
    let updated = ConnectionConfig::new("https://keep.example.org", "tok789", 60).unwrap();
    coordinator.update_config(updated.clone()).unwrap();
    assert_eq!(coordinator.config(), updated);

    // First cycle ends at t=5, then waits the new 60s interval.
    sleep(Duration::from_secs(39)).await;
    assert_eq!(fetcher.calls(), 1);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(fetcher.calls(), 2);

    let configs = fetcher.configs();
    assert_eq!(configs[0], config());
    assert_eq!(configs[1], updated);
    coordinator.stop();
}

// ============================================================================
// Listeners
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_listeners_in_order_and_removal() {
    let fetcher = ScriptedFetcher::new([Ok(FIRST), Err(ClientError::Auth(403))]);
    let coordinator = coordinator(&fetcher);
    let log = Arc::new(Mutex::new(Vec::new()));

    let ids: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            let log = log.clone();
            coordinator.add_listener(FnListener::new(move |outcome: &RefreshOutcome| {
                log.lock().unwrap().push((name, outcome.is_success()));
            }))
        })
        .collect();
    assert_eq!(coordinator.listener_count(), 3);

    coordinator.request_refresh().await.unwrap();
    assert!(coordinator.remove_listener(ids[1]));
    coordinator.request_refresh().await.unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("a", true),
            ("b", true),
            ("c", true),
            ("a", false),
            ("c", false),
        ]
    );
}

struct SlowListener;

#[async_trait]
impl Listener for SlowListener {
    async fn on_refresh(&self, _outcome: &RefreshOutcome) {
        sleep(Duration::from_secs(60)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_listener_is_bounded_by_budget() {
    let fetcher = ScriptedFetcher::new([Ok(FIRST)]);
    let coordinator = coordinator(&fetcher).with_listener_budget(Duration::from_secs(1));
    coordinator.add_listener(SlowListener);
    let notifications = count_notifications(&coordinator);

    let started = Instant::now();
    coordinator.request_refresh().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listener_sees_recorded_state() {
    let fetcher = ScriptedFetcher::new([Ok(FIRST)]);
    let coordinator = Arc::new(coordinator(&fetcher));
    let seen = Arc::new(Mutex::new(None));

    let weak = Arc::downgrade(&coordinator);
    let slot = seen.clone();
    coordinator.add_listener(FnListener::new(move |_| {
        if let Some(coordinator) = weak.upgrade() {
            *slot.lock().unwrap() = coordinator.last_snapshot();
        }
    }));

    coordinator.request_refresh().await.unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(FIRST));
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_problem_health_is_recorded_without_failing_cycle() {
    let fetcher = ScriptedFetcher::with_health(Ok(HealthStatus::new(503, "unknown")), [Ok(FIRST)]);
    let coordinator = coordinator(&fetcher);
    assert!(coordinator.last_health().is_none());

    let outcome = coordinator.request_refresh().await.unwrap();
    assert!(outcome.is_success());
    assert!(coordinator.last_update_success());

    let health = coordinator.last_health().unwrap();
    assert_eq!(health.status_code, 503);
    assert!(health.is_problem());
}

#[tokio::test(start_paused = true)]
async fn test_failed_health_check_leaves_no_health() {
    let fetcher = ScriptedFetcher::with_health(
        Err(ClientError::Connection("refused".to_string())),
        [Ok(FIRST)],
    );
    let coordinator = coordinator(&fetcher);

    let outcome = coordinator.request_refresh().await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Success { snapshot: FIRST });
    assert!(coordinator.last_health().is_none());
    assert!(coordinator.last_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_fetcher_without_health_source_records_none() {
    let fetcher = ScriptedFetcher::new([Ok(FIRST)]);
    let coordinator = coordinator(&fetcher);

    coordinator.request_refresh().await.unwrap();
    assert!(coordinator.last_health().is_none());
}
