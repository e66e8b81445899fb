//! Client-local session state.
//!
//! A [`Session`] exists exactly when a token is present in the durable
//! store. [`SessionStore::restore_session`] trusts a stored token without
//! re-validating anything (trust-on-presence). That is only acceptable
//! because there is no backend to validate against; it is not production
//! authentication.
//!
//! Storage failures never escape as fatal errors: reads degrade to
//! "unauthenticated" and a failed logout still clears the in-memory session.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Prefix of every generated session token.
pub const TOKEN_PREFIX: &str = "demo_token_";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token, `demo_token_<unix millis>`.
    pub token: String,
    /// The identifier the user signed in with.
    pub email: String,
}

/// On-disk shape of the session record.
///
/// Keys match the browser storage keys the dashboard has always used, so a
/// record exported from a browser profile loads unchanged.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ar_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ar_email: Option<String>,
}

impl StoredRecord {
    fn into_session(self) -> Option<Session> {
        let token = self.ar_token.filter(|t| !t.is_empty())?;
        Some(Session {
            token,
            email: self.ar_email.unwrap_or_default(),
        })
    }
}

impl From<&Session> for StoredRecord {
    fn from(session: &Session) -> Self {
        Self {
            ar_token: Some(session.token.clone()),
            ar_email: Some(session.email.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The durable session store could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Session store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Why a login attempt did not produce a session.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Identifier and secret must both be non-empty")]
    EmptyCredentials,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Durable key-value storage for the session record.
pub trait SessionBackend: Send {
    /// Read the stored session, if any.
    fn load(&self) -> Result<Option<Session>, StorageError>;

    /// Replace the stored session.
    fn save(&mut self, session: &Session) -> Result<(), StorageError>;

    /// Remove the stored session. Removing an absent record is not an error.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// JSON file backend.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// record, so a crash mid-write never leaves a half-written token behind.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionBackend for FileBackend {
    fn load(&self) -> Result<Option<Session>, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let record: StoredRecord = serde_json::from_str(&raw)?;
        Ok(record.into_session())
    }

    fn save(&mut self, session: &Session) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(&StoredRecord::from(session))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// In-memory backend.
///
/// Clones share the same slot, which lets tests model a process restart by
/// handing a clone to a fresh [`SessionStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<Session>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut Option<Session>) -> T) -> Result<T, StorageError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StorageError::Unavailable("memory slot poisoned".into()))?;
        Ok(f(&mut slot))
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Session>, StorageError> {
        self.with_slot(|slot| slot.clone())
    }

    fn save(&mut self, session: &Session) -> Result<(), StorageError> {
        self.with_slot(|slot| *slot = Some(session.clone()))
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.with_slot(|slot| *slot = None)
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// In-memory session plus its durable backing record.
pub struct SessionStore<B> {
    backend: B,
    current: Option<Session>,
}

impl<B: SessionBackend> SessionStore<B> {
    /// Create an unauthenticated store. Call [`restore_session`] to pick up
    /// a record left by a previous process.
    ///
    /// [`restore_session`]: SessionStore::restore_session
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// Rebuild the session from the durable store.
    ///
    /// An unreadable store is logged and treated as "no session".
    pub fn restore_session(&mut self) -> Option<Session> {
        self.current = match self.backend.load() {
            Ok(Some(session)) => {
                tracing::info!(email = %session.email, "Restored session from stored token");
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Session store unreadable, continuing unauthenticated");
                None
            }
        };
        self.current.clone()
    }

    /// Sign in, distinguishing rejected credentials from storage failures.
    ///
    /// Any non-empty identifier and secret is accepted. On error the
    /// in-memory session is left as it was.
    pub fn try_login(&mut self, identifier: &str, secret: &str) -> Result<Session, LoginError> {
        if identifier.is_empty() || secret.is_empty() {
            return Err(LoginError::EmptyCredentials);
        }

        let session = Session {
            token: generate_token(Utc::now()),
            email: identifier.to_string(),
        };
        self.backend.save(&session)?;
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Sign in. Returns `false` for empty input or when the record could not
    /// be persisted.
    pub fn login(&mut self, identifier: &str, secret: &str) -> bool {
        match self.try_login(identifier, secret) {
            Ok(session) => {
                tracing::info!(email = %session.email, "Login succeeded");
                true
            }
            Err(LoginError::EmptyCredentials) => {
                tracing::debug!("Login rejected: empty identifier or secret");
                false
            }
            Err(LoginError::Storage(e)) => {
                tracing::warn!(error = %e, "Login failed: session could not be persisted");
                false
            }
        }
    }

    /// Clear the session. Idempotent; the in-memory session is dropped even
    /// when the durable record cannot be removed.
    pub fn logout(&mut self) {
        if let Err(e) = self.backend.clear() {
            tracing::warn!(error = %e, "Failed to remove stored session record");
        }
        if let Some(session) = self.current.take() {
            tracing::info!(email = %session.email, "Logged out");
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}

fn generate_token(now: Timestamp) -> String {
    format!("{TOKEN_PREFIX}{}", now.timestamp_millis())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
