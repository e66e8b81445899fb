//! Live camera input.
//!
//! Frames are opaque bytes. Nothing here decodes them; the detection
//! simulator only hands them on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use arsafety_core::types::Timestamp;

/// One captured frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: Arc<[u8]>,
    pub captured_at: Timestamp,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameSourceError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read frame from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that can produce camera frames on demand.
pub trait FrameSource: Send + Sync {
    fn capture(&self) -> Result<Frame, FrameSourceError>;
}

/// Source that returns the same still image every time.
#[derive(Debug, Clone)]
pub struct StillFrameSource {
    bytes: Arc<[u8]>,
}

impl StillFrameSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FrameSourceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| FrameSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(bytes))
    }
}

impl FrameSource for StillFrameSource {
    fn capture(&self) -> Result<Frame, FrameSourceError> {
        Ok(Frame {
            bytes: Arc::clone(&self.bytes),
            captured_at: Utc::now(),
        })
    }
}

/// Stand-in for a host without a camera; every capture fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

impl FrameSource for NoCamera {
    fn capture(&self) -> Result<Frame, FrameSourceError> {
        Err(FrameSourceError::Unavailable("no camera attached".into()))
    }
}
