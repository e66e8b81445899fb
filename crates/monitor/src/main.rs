//! `arsafety-monitor` -- headless AR safety monitoring dashboard.
//!
//! Restores the stored session (or signs in with demo credentials), runs
//! the telemetry and detection simulators and renders every dashboard event
//! to the log until interrupted.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default                  | Description                         |
//! |-------------------------|----------|--------------------------|-------------------------------------|
//! | `METRICS_INTERVAL_MS`   | no       | `2000`                   | Telemetry tick period               |
//! | `DETECTION_INTERVAL_MS` | no       | `500`                    | Detection jitter period while armed |
//! | `INGEST_DELAY_MS`       | no       | `1500`                   | Simulated image analysis time       |
//! | `SIM_SEED`              | no       | --                       | Seed for reproducible runs          |
//! | `SESSION_STORE_PATH`    | no       | `.arsafety/session.json` | Durable session record              |
//! | `DEMO_EMAIL`            | no       | --                       | Sign in at startup with this id...  |
//! | `DEMO_PASSWORD`         | no       | --                       | ...and this secret                  |
//! | `INGEST_FILE`           | no       | --                       | Image to analyse once signed in     |

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arsafety_core::routing::Route;
use arsafety_core::session::FileBackend;
use arsafety_events::{EventBus, EventHistory};
use arsafety_monitor::{view, Dashboard, MonitorConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arsafety_monitor=info,arsafety_core=info,arsafety_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::from_env();
    tracing::info!(
        metrics_interval_ms = config.metrics_interval.as_millis() as u64,
        detection_interval_ms = config.detection_interval.as_millis() as u64,
        seeded = config.seed.is_some(),
        session_store = %config.session_store_path.display(),
        "Starting arsafety-monitor",
    );

    // --- Event services ---
    let event_bus = Arc::new(EventBus::default());

    let history = Arc::new(EventHistory::default());
    let history_handle = tokio::spawn(EventHistory::run(Arc::clone(&history), event_bus.subscribe()));

    let view_cancel = CancellationToken::new();
    let view_handle = tokio::spawn(view::run(event_bus.subscribe(), view_cancel.clone()));

    // --- Dashboard ---
    let backend = FileBackend::new(&config.session_store_path);
    let mut dashboard = match Dashboard::new(&config, backend, Arc::clone(&event_bus)) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            tracing::error!(error = %e, "Invalid monitor configuration");
            std::process::exit(1);
        }
    };

    let mut route = dashboard.boot();
    if route != Route::Dashboard {
        if let Some((email, password)) = &config.demo_credentials {
            if dashboard.login(email, password) {
                route = dashboard.route();
            } else {
                tracing::warn!("Demo credentials were rejected");
            }
        }
    }
    tracing::info!(route = route.path(), "Dashboard ready");

    if route == Route::Dashboard {
        if let Err(e) = dashboard.toggle_detection(true) {
            tracing::warn!(error = %e, "Could not arm detection feed");
        }

        if let Some(path) = &config.ingest_file {
            match tokio::fs::read(path).await {
                Ok(bytes) => match dashboard.ingest_image(bytes).await {
                    Ok(result) => tracing::info!(
                        file = %path.display(),
                        detections = result.detections.len(),
                        "Ingested image",
                    ),
                    Err(e) => tracing::warn!(error = %e, "Image ingest refused"),
                },
                Err(e) => tracing::error!(file = %path.display(), error = %e, "Failed to read ingest file"),
            }
        }
    } else {
        tracing::info!("No session; set DEMO_EMAIL and DEMO_PASSWORD to sign in");
    }

    shutdown_signal().await;

    // --- Shutdown ---
    dashboard.teardown().await;
    view_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), view_handle).await;

    // Dropping every bus handle closes the channel and stops the recorder.
    drop(dashboard);
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), history_handle).await;

    tracing::info!(
        events = history.len(),
        metrics_ticks = history.metrics_series().len(),
        lagged = history.lagged(),
        "Shutdown complete",
    );
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
