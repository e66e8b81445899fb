//! End-to-end session and navigation flows through [`Dashboard`].

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;

use arsafety_core::catalog::RunStatus;
use arsafety_core::detection::{DetectionState, SafetyClass};
use arsafety_core::error::CoreError;
use arsafety_core::routing::Route;
use arsafety_core::session::{FileBackend, MemoryBackend};
use arsafety_events::{DashboardEvent, EventBus, EventHistory};
use arsafety_monitor::{Dashboard, MonitorConfig};

fn config() -> MonitorConfig {
    MonitorConfig {
        seed: Some(2024),
        ..MonitorConfig::default()
    }
}

fn dashboard(backend: MemoryBackend) -> Dashboard<MemoryBackend> {
    Dashboard::new(&config(), backend, Arc::new(EventBus::default())).expect("valid config")
}

#[tokio::test(start_paused = true)]
async fn demo_login_opens_dashboard_and_survives_restart() {
    let backend = MemoryBackend::new();
    let mut first = dashboard(backend.clone());

    assert_eq!(first.boot(), Route::Landing);
    assert!(first.login("demo@arsafety.space", "demo123"));
    assert_eq!(first.route(), Route::Dashboard);
    assert!(first.metrics().is_running());
    first.teardown().await;

    let mut restarted = dashboard(backend);
    assert_eq!(restarted.boot(), Route::Dashboard);
    assert_eq!(
        restarted.session().map(|s| s.email.as_str()),
        Some("demo@arsafety.space")
    );
    restarted.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn empty_identifier_stays_on_login() {
    let mut dash = dashboard(MemoryBackend::new());
    dash.boot();
    assert_eq!(dash.navigate(Route::Login), Route::Login);

    assert!(!dash.login("", "x"));
    assert_eq!(dash.route(), Route::Login);
    assert!(dash.session().is_none());
    assert!(!dash.metrics().is_running());
}

#[tokio::test(start_paused = true)]
async fn dashboard_without_session_redirects_to_login() {
    let mut dash = dashboard(MemoryBackend::new());
    assert_eq!(dash.navigate(Route::Dashboard), Route::Login);
    assert_matches!(dash.toggle_detection(true), Err(CoreError::Unauthorized(_)));
    assert_matches!(
        dash.trigger_retrain(SafetyClass::OxygenTank, 100),
        Err(CoreError::Unauthorized(_))
    );
}

#[tokio::test(start_paused = true)]
async fn logout_stops_timers_and_lands_on_landing() {
    let backend = MemoryBackend::new();
    let mut dash = dashboard(backend.clone());
    assert!(dash.login("demo@arsafety.space", "demo123"));
    assert_eq!(dash.toggle_detection(true).ok(), Some(DetectionState::Armed));

    tokio::time::sleep(Duration::from_millis(4100)).await;
    let tick_at_logout = dash.metrics().current().tick;
    assert_eq!(tick_at_logout, 2);

    dash.logout();
    assert_eq!(dash.route(), Route::Landing);
    assert!(dash.session().is_none());
    assert_eq!(dash.detection().state(), DetectionState::Idle);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(dash.metrics().current().tick, tick_at_logout);

    // Idempotent, and the restart sees no session.
    dash.logout();
    let mut restarted = dashboard(backend);
    assert_eq!(restarted.boot(), Route::Landing);
}

#[tokio::test(start_paused = true)]
async fn relogin_restarts_metrics_from_defaults() {
    let mut dash = dashboard(MemoryBackend::new());
    assert!(dash.login("a@arsafety.space", "pw"));
    tokio::time::sleep(Duration::from_millis(6100)).await;
    dash.logout();

    assert!(dash.login("b@arsafety.space", "pw"));
    let snapshot = dash.metrics().current();
    assert_eq!(snapshot.tick, 0);
    assert_eq!(snapshot.accuracy, 95.7);
    dash.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn relogin_on_open_dashboard_resets_metrics() {
    let mut dash = dashboard(MemoryBackend::new());
    assert!(dash.login("a@arsafety.space", "pw"));
    tokio::time::sleep(Duration::from_millis(4100)).await;
    assert_eq!(dash.metrics().current().tick, 2);

    assert!(dash.login("b@arsafety.space", "pw"));
    assert_eq!(dash.route(), Route::Dashboard);
    assert_eq!(dash.session().map(|s| s.email.as_str()), Some("b@arsafety.space"));
    let snapshot = dash.metrics().current();
    assert_eq!(snapshot.tick, 0);
    assert_eq!(snapshot.accuracy, 95.7);

    // The ticker keeps running from the fresh defaults.
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert_eq!(dash.metrics().current().tick, 1);
    dash.teardown().await;
}

#[test]
fn zero_simulator_period_is_rejected() {
    let zero_metrics = MonitorConfig {
        metrics_interval: Duration::ZERO,
        ..config()
    };
    assert_matches!(
        Dashboard::new(&zero_metrics, MemoryBackend::new(), Arc::new(EventBus::default())),
        Err(CoreError::Validation(_))
    );

    let zero_detection = MonitorConfig {
        detection_interval: Duration::ZERO,
        ..config()
    };
    assert_matches!(
        Dashboard::new(&zero_detection, MemoryBackend::new(), Arc::new(EventBus::default())),
        Err(CoreError::Validation(_))
    );
}

#[tokio::test(start_paused = true)]
async fn retrain_records_run_and_lifts_accuracy() {
    let mut dash = dashboard(MemoryBackend::new());
    assert!(dash.login("demo@arsafety.space", "demo123"));

    let run = dash
        .trigger_retrain(SafetyClass::FireExtinguisher, 100)
        .expect("signed in")
        .clone();
    assert_eq!(run.id, 5);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.trigger, "Manual Trigger");

    let metrics = run.metrics.expect("completed run has metrics");
    // Seed log's latest completed run ended at 94.7 mAP.
    assert_eq!(metrics.map.before, 94.7);
    assert_eq!(dash.metrics().current().accuracy, metrics.map.after);
    assert_eq!(dash.training().runs().len(), 5);

    let failed = dash
        .trigger_retrain(SafetyClass::FireAlarm, 0)
        .expect("signed in")
        .clone();
    assert_eq!(failed.status, RunStatus::Failed);
    assert_eq!(failed.id, 6);
    assert_eq!(dash.metrics().current().accuracy, metrics.map.after);

    dash.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn alert_dismissal_is_local_to_the_dashboard() {
    let mut dash = dashboard(MemoryBackend::new());
    assert!(dash.login("demo@arsafety.space", "demo123"));

    assert_eq!(dash.alerts().active_count(), 4);
    dash.dismiss_alert(3).expect("alert exists");
    assert_eq!(dash.alerts().active_count(), 3);
    assert_matches!(dash.dismiss_alert(99), Err(CoreError::NotFound { .. }));

    let other = dashboard(MemoryBackend::new());
    assert_eq!(other.alerts().active_count(), 4);
    dash.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn ingest_requires_session_and_returns_six_objects() {
    let mut dash = dashboard(MemoryBackend::new());
    assert_matches!(dash.ingest_image(b"jpeg?").await, Err(CoreError::Unauthorized(_)));

    assert!(dash.login("demo@arsafety.space", "demo123"));
    let result = dash.ingest_image(b"jpeg?").await.expect("signed in");
    assert_eq!(result.detections.len(), 6);
    dash.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn events_reach_the_history_recorder() {
    let bus = Arc::new(EventBus::default());
    let history = Arc::new(EventHistory::default());
    let recorder = tokio::spawn(EventHistory::run(Arc::clone(&history), bus.subscribe()));

    let mut dash = Dashboard::new(&config(), MemoryBackend::new(), Arc::clone(&bus)).expect("valid config");
    assert!(dash.login("demo@arsafety.space", "demo123"));
    tokio::time::sleep(Duration::from_millis(6100)).await;
    dash.logout();
    dash.teardown().await;

    drop(dash);
    drop(bus);
    recorder.await.expect("recorder exits when the bus closes");

    let ticks: Vec<u64> = history.metrics_series().iter().map(|s| s.tick).collect();
    // The reset on entry publishes tick 0, then three timer ticks.
    assert_eq!(ticks, vec![0, 1, 2, 3]);
    assert_eq!(history.count_of("session.started"), 1);
    assert_eq!(history.count_of("session.ended"), 1);
    assert!(history
        .recent(1)
        .iter()
        .all(|r| !matches!(r.event, DashboardEvent::Metrics(_))));
}

#[tokio::test(start_paused = true)]
async fn file_backed_session_round_trips() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("session.json");

    let mut first = Dashboard::new(&config(), FileBackend::new(&path), Arc::new(EventBus::default())).expect("valid config");
    assert!(first.login("demo@arsafety.space", "demo123"));
    first.teardown().await;

    let mut second = Dashboard::new(&config(), FileBackend::new(&path), Arc::new(EventBus::default())).expect("valid config");
    assert_eq!(second.boot(), Route::Dashboard);
    second.logout();
    assert!(!path.exists());
}
