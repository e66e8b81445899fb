//! System alert catalog and the caller-local dismissal board.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{AlertId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub id: AlertId,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub timestamp: Timestamp,
    /// Flipped by [`AlertBoard::dismiss`]; never reset.
    pub dismissed: bool,
}

struct AlertSeed {
    id: AlertId,
    kind: AlertKind,
    title: &'static str,
    message: &'static str,
    minutes_ago: i64,
}

const ALERT_SEEDS: [AlertSeed; 4] = [
    AlertSeed {
        id: 1,
        kind: AlertKind::Warning,
        title: "Low Confidence Detection",
        message: "Fire Extinguisher detection confidence dropped to 67%",
        minutes_ago: 5,
    },
    AlertSeed {
        id: 2,
        kind: AlertKind::Success,
        title: "Model Retrained",
        message: "AI model successfully retrained with new synthetic data",
        minutes_ago: 15,
    },
    AlertSeed {
        id: 3,
        kind: AlertKind::Error,
        title: "Object Missing",
        message: "Emergency Phone not detected for 2 minutes",
        minutes_ago: 2,
    },
    AlertSeed {
        id: 4,
        kind: AlertKind::Info,
        title: "System Update",
        message: "Detection accuracy improved to 95.7%",
        minutes_ago: 30,
    },
];

/// The seed alerts, timestamped relative to `now`.
pub fn seed_alerts(now: Timestamp) -> Vec<AlertEntry> {
    ALERT_SEEDS
        .iter()
        .map(|seed| AlertEntry {
            id: seed.id,
            kind: seed.kind,
            title: seed.title.to_string(),
            message: seed.message.to_string(),
            timestamp: now - Duration::minutes(seed.minutes_ago),
            dismissed: false,
        })
        .collect()
}

/// A caller's working copy of the alert list.
///
/// Dismissals live only in this copy; a fresh board always starts with
/// every alert active.
#[derive(Debug, Clone)]
pub struct AlertBoard {
    alerts: Vec<AlertEntry>,
}

impl AlertBoard {
    pub fn new(now: Timestamp) -> Self {
        Self::from_entries(seed_alerts(now))
    }

    pub fn from_entries(alerts: Vec<AlertEntry>) -> Self {
        Self { alerts }
    }

    pub fn all(&self) -> &[AlertEntry] {
        &self.alerts
    }

    /// Non-dismissed alerts, in catalog order.
    pub fn active(&self) -> impl Iterator<Item = &AlertEntry> {
        self.alerts.iter().filter(|a| !a.dismissed)
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Non-dismissed alerts, most recent first.
    pub fn active_newest_first(&self) -> Vec<&AlertEntry> {
        let mut active: Vec<&AlertEntry> = self.active().collect();
        active.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        active
    }

    /// Mark an alert dismissed. Dismissing twice is a no-op.
    pub fn dismiss(&mut self, id: AlertId) -> Result<(), CoreError> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(CoreError::NotFound { entity: "alert", id })?;
        alert.dismissed = true;
        Ok(())
    }
}

/// Coarse "time ago" label: `Just now`, `5m ago`, `2h ago`, `3d ago`.
pub fn format_relative(timestamp: Timestamp, now: Timestamp) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}
