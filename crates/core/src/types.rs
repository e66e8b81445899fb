/// Stable identifier of a detection instance in the fixed catalog.
pub type DetectionId = u32;

/// Identifier of an entry in the alert catalog.
pub type AlertId = u32;

/// Identifier of a training run in the retraining log.
pub type RunId = u32;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
