//! Session state attached to a request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lifetime of a session cookie in seconds; 0 means "until the browser closes".
const DEFAULT_LIFETIME: u64 = 0;

/// Session bookkeeping timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// When the session was first started.
    pub created: DateTime<Utc>,
    /// When the session was last used.
    pub last_used: DateTime<Utc>,
    /// Cookie lifetime in seconds.
    pub lifetime: u64,
}

impl SessionMetadata {
    fn now() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            last_used: now,
            lifetime: DEFAULT_LIFETIME,
        }
    }
}

#[derive(Debug)]
struct SessionState {
    started: bool,
    attributes: BTreeMap<String, Value>,
    flashes: BTreeMap<String, Vec<String>>,
    metadata: SessionMetadata,
}

/// A user session: attributes, flash messages and metadata.
///
/// Shared between requests through `Arc`; every accessor locks internally.
#[derive(Debug)]
pub struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    /// A session that has not been started.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState {
                started: false,
                attributes: BTreeMap::new(),
                flashes: BTreeMap::new(),
                metadata: SessionMetadata::now(),
            }),
        }
    }

    /// A session that is already started.
    pub fn started() -> Self {
        let session = Self::new();
        session.start();
        session
    }

    /// Replace the metadata (restoring a persisted session).
    pub fn with_metadata(self, metadata: SessionMetadata) -> Self {
        self.lock().metadata = metadata;
        self
    }

    /// Start the session. Starting an already started session only touches it.
    pub fn start(&self) {
        let mut state = self.lock();
        if state.started {
            state.metadata.last_used = Utc::now();
        } else {
            state.started = true;
            state.metadata = SessionMetadata::now();
        }
    }

    /// Whether the session has been started.
    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    /// Get an attribute.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.lock().attributes.get(name).cloned()
    }

    /// Set an attribute.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.lock().attributes.insert(name.into(), value.into());
    }

    /// Whether an attribute is present.
    pub fn has(&self, name: &str) -> bool {
        self.lock().attributes.contains_key(name)
    }

    /// Remove an attribute, returning it.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.lock().attributes.remove(name)
    }

    /// A copy of every attribute.
    pub fn all(&self) -> BTreeMap<String, Value> {
        self.lock().attributes.clone()
    }

    /// Queue a flash message of the given kind.
    pub fn add_flash(&self, kind: impl Into<String>, message: impl Into<String>) {
        self.lock()
            .flashes
            .entry(kind.into())
            .or_default()
            .push(message.into());
    }

    /// Every queued flash message, without consuming them.
    pub fn peek_all_flashes(&self) -> BTreeMap<String, Vec<String>> {
        self.lock().flashes.clone()
    }

    /// Session metadata.
    pub fn metadata(&self) -> SessionMetadata {
        self.lock().metadata
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
