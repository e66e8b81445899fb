//! Composition root for one dashboard instance.
//!
//! [`Dashboard`] owns every component: the session store, both simulators,
//! the alert board and the training log. Nothing is process-global, so tests
//! can run several dashboards side by side.

use std::sync::Arc;
use std::time::Duration;

use arsafety_core::catalog::{AlertBoard, TrainingLog, TrainingRun};
use arsafety_core::detection::{DetectionState, SafetyClass};
use arsafety_core::error::CoreError;
use arsafety_core::random::{sim_rng, SimRng};
use arsafety_core::retrain::{generate_synthetic_data, simulate_retrain};
use arsafety_core::routing::{self, Route};
use arsafety_core::session::{Session, SessionBackend, SessionStore};
use arsafety_core::types::AlertId;
use arsafety_events::{DashboardEvent, EventBus};

use crate::config::MonitorConfig;
use crate::detection::{DetectionResult, DetectionSimulator};
use crate::metrics::{MetricsHandle, MetricsSimulator};

/// Random stream indices, so seeded runs stay reproducible per component.
const METRICS_STREAM: u64 = 0;
const DETECTION_STREAM: u64 = 1;
const RETRAIN_STREAM: u64 = 2;

/// How long teardown waits for the metrics ticker to exit.
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Trigger label recorded on user-initiated retraining runs.
pub const MANUAL_TRIGGER: &str = "Manual Trigger";

pub struct Dashboard<B> {
    session: SessionStore<B>,
    bus: Arc<EventBus>,
    metrics: MetricsSimulator,
    metrics_handle: Option<MetricsHandle>,
    detection: DetectionSimulator,
    alerts: AlertBoard,
    training: TrainingLog,
    route: Route,
    retrain_rng: SimRng,
}

impl<B> std::fmt::Debug for Dashboard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard").field("route", &self.route).finish_non_exhaustive()
    }
}

impl<B: SessionBackend> Dashboard<B> {
    /// Build a dashboard from `config`. Fails when a simulator period is zero.
    pub fn new(config: &MonitorConfig, backend: B, bus: Arc<EventBus>) -> Result<Self, CoreError> {
        let now = chrono::Utc::now();
        let metrics = MetricsSimulator::new(
            config.metrics_interval,
            sim_rng(config.seed, METRICS_STREAM),
            Some(Arc::clone(&bus)),
        )?;
        let detection = DetectionSimulator::new(
            config.detection_interval,
            config.ingest_delay,
            sim_rng(config.seed, DETECTION_STREAM),
            Some(Arc::clone(&bus)),
        )?;
        Ok(Self {
            session: SessionStore::new(backend),
            metrics,
            metrics_handle: None,
            detection,
            bus,
            alerts: AlertBoard::new(now),
            training: TrainingLog::new(now),
            route: Route::Landing,
            retrain_rng: sim_rng(config.seed, RETRAIN_STREAM),
        })
    }

    /// Restore any stored session and land on the matching destination.
    pub fn boot(&mut self) -> Route {
        match self.session.restore_session() {
            Some(session) => {
                self.bus.publish(DashboardEvent::SessionStarted {
                    email: session.email,
                });
                self.navigate(Route::Dashboard)
            }
            None => self.navigate(Route::Landing),
        }
    }

    /// Go to `requested`, subject to the session gate. Returns where the
    /// dashboard actually landed.
    pub fn navigate(&mut self, requested: Route) -> Route {
        let target = routing::resolve(requested, self.session.current());
        if target != requested {
            tracing::debug!(requested = requested.path(), target = target.path(), "Redirected");
        }

        match (self.route == Route::Dashboard, target == Route::Dashboard) {
            (false, true) => self.enter_dashboard(),
            (true, false) => self.leave_dashboard(),
            _ => {}
        }
        self.route = target;
        target
    }

    /// Sign in and, on success, open the dashboard.
    ///
    /// Every new session starts from the default metrics, including a
    /// re-login while the dashboard is already open.
    pub fn login(&mut self, identifier: &str, secret: &str) -> bool {
        if !self.session.login(identifier, secret) {
            return false;
        }
        self.bus.publish(DashboardEvent::SessionStarted {
            email: identifier.to_string(),
        });
        if self.route == Route::Dashboard {
            self.metrics.reset();
        }
        self.navigate(Route::Dashboard);
        true
    }

    /// Sign out and return to the landing page. Idempotent.
    pub fn logout(&mut self) {
        let was_authenticated = self.session.is_authenticated();
        self.session.logout();
        if was_authenticated {
            self.bus.publish(DashboardEvent::SessionEnded);
        }
        self.navigate(Route::Landing);
    }

    /// Arm or disarm the live detection overlay.
    pub fn toggle_detection(&mut self, running: bool) -> Result<DetectionState, CoreError> {
        routing::require_session(self.session.current())?;
        Ok(self.detection.toggle(running))
    }

    /// Run the simulated analysis over an uploaded image.
    pub async fn ingest_image(&self, bytes: impl AsRef<[u8]>) -> Result<DetectionResult, CoreError> {
        routing::require_session(self.session.current())?;
        Ok(self.detection.ingest_image(bytes).await)
    }

    pub fn dismiss_alert(&mut self, id: AlertId) -> Result<(), CoreError> {
        routing::require_session(self.session.current())?;
        self.alerts.dismiss(id)
    }

    /// Generate a synthetic batch for `class`, simulate a retraining run on
    /// it and record the outcome.
    ///
    /// A completed run moves the live accuracy to the new mAP.
    pub fn trigger_retrain(&mut self, class: SafetyClass, samples: u32) -> Result<&TrainingRun, CoreError> {
        routing::require_session(self.session.current())?;

        let previous_map = self
            .training
            .latest_completed()
            .and_then(|run| run.metrics)
            .map_or_else(|| self.metrics.current().accuracy, |m| m.map.after);

        let batch = generate_synthetic_data(&mut self.retrain_rng, class, samples);
        let run = simulate_retrain(&mut self.retrain_rng, previous_map, &batch, MANUAL_TRIGGER);
        self.metrics.apply_retrain(&run);

        let recorded = self.training.record(run).clone();
        tracing::info!(
            run_id = recorded.id,
            class = %class,
            samples,
            status = ?recorded.status,
            improvement = recorded.improvement,
            "Retraining run recorded",
        );
        self.bus.publish(DashboardEvent::TrainingRecorded(Arc::new(recorded)));

        self.training
            .runs()
            .first()
            .ok_or_else(|| CoreError::Validation("training log is empty".into()))
    }

    /// Stop every timer and wait briefly for the metrics ticker to exit.
    pub async fn teardown(&mut self) {
        let handle = self.metrics_handle.take();
        if let Some(handle) = handle {
            self.metrics.stop(&handle);
            if tokio::time::timeout(TEARDOWN_TIMEOUT, handle.join()).await.is_err() {
                tracing::warn!("Metrics ticker did not stop within the teardown timeout");
            }
        }
        if self.detection.state() == DetectionState::Armed {
            self.detection.toggle(false);
        }
        tracing::info!("Dashboard torn down");
    }

    fn enter_dashboard(&mut self) {
        self.metrics.reset();
        if let Some(previous) = self.metrics_handle.replace(self.metrics.start()) {
            self.metrics.stop(&previous);
        }
        tracing::info!("Entered dashboard");
    }

    fn leave_dashboard(&mut self) {
        if let Some(handle) = self.metrics_handle.take() {
            self.metrics.stop(&handle);
        }
        if self.detection.state() == DetectionState::Armed {
            self.detection.toggle(false);
        }
        tracing::info!("Left dashboard");
    }

    // -- Accessors --

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.current()
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn metrics(&self) -> &MetricsSimulator {
        &self.metrics
    }

    pub fn detection(&self) -> &DetectionSimulator {
        &self.detection
    }

    pub fn alerts(&self) -> &AlertBoard {
        &self.alerts
    }

    pub fn training(&self) -> &TrainingLog {
        &self.training
    }
}
