//! Console rendering of dashboard events.
//!
//! The binary has no graphical surface; this subscriber turns each event
//! into a one-line summary and writes it to the log.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use arsafety_events::DashboardEvent;

/// One-line summary of `event`.
pub fn render(event: &DashboardEvent) -> String {
    match event {
        DashboardEvent::Metrics(s) => format!(
            "accuracy {:.1}% | confidence {:.1}% | {:.0} fps | {} objects | {} alerts today",
            s.accuracy, s.confidence, s.fps, s.objects_detected, s.alerts_today
        ),
        DashboardEvent::Detections(frame) => {
            let labels: Vec<String> = frame
                .detections
                .iter()
                .map(|d| format!("{} {:.0}%", d.class, d.confidence * 100.0))
                .collect();
            if labels.is_empty() {
                "no detections".to_string()
            } else {
                format!(
                    "{} detections, avg {:.1}%: {}",
                    labels.len(),
                    frame.average_confidence() * 100.0,
                    labels.join(", ")
                )
            }
        }
        DashboardEvent::DetectionState { state } => format!("detection feed {state:?}").to_lowercase(),
        DashboardEvent::ImageIngested {
            detections,
            average_confidence,
            format,
        } => format!(
            "analysed {} image: {} objects, avg {:.1}%",
            format.as_deref().unwrap_or("unrecognized"),
            detections,
            average_confidence * 100.0
        ),
        DashboardEvent::SessionStarted { email } => format!("signed in as {email}"),
        DashboardEvent::SessionEnded => "signed out".to_string(),
        DashboardEvent::TrainingRecorded(run) => format!(
            "training run #{} {:?} after {} ({:+.1} mAP)",
            run.id,
            run.status,
            run.duration_label(),
            run.improvement
        ),
    }
}

/// Render events until `cancel` fires or the bus closes.
pub async fn run(mut receiver: broadcast::Receiver<DashboardEvent>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Console view cancelled");
                break;
            }
            received = receiver.recv() => match received {
                Ok(event) => {
                    tracing::info!(event = event.event_type(), "{}", render(&event));
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "Console view skipped stale events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arsafety_core::detection::{DetectionFeed, DetectionState};
    use arsafety_core::metrics::MetricsSnapshot;

    #[test]
    fn renders_metrics_panel() {
        let line = render(&DashboardEvent::Metrics(Arc::new(MetricsSnapshot::initial())));
        assert_eq!(
            line,
            "accuracy 95.7% | confidence 87.3% | 24 fps | 12 objects | 3 alerts today"
        );
    }

    #[test]
    fn renders_detection_frames() {
        let mut feed = DetectionFeed::default();
        let armed = render(&DashboardEvent::Detections(Arc::new(feed.toggle(true).clone())));
        assert!(armed.starts_with("6 detections"));
        assert!(armed.contains("Fire Extinguisher 94%"));

        let idle = render(&DashboardEvent::Detections(Arc::new(feed.toggle(false).clone())));
        assert_eq!(idle, "no detections");

        let state = render(&DashboardEvent::DetectionState {
            state: DetectionState::Armed,
        });
        assert_eq!(state, "detection feed armed");
    }

    #[test]
    fn renders_unrecognized_ingest() {
        let line = render(&DashboardEvent::ImageIngested {
            detections: 6,
            average_confidence: 0.9,
            format: None,
        });
        assert_eq!(line, "analysed unrecognized image: 6 objects, avg 90.0%");
    }
}
