//! Testing utilities.
//!
//! Re-exports the recording hooks of `keel-std` and adds collaborators for
//! observing listeners from the outside.

pub use keel_std::testing::{CountingHook, OrderHook, RecordingHook};

use crate::routing::RoutingContext;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// A [`RoutingContext`] that records every write.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    writes: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(name, value)` written, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    /// Values written to `name`, in order.
    pub fn values(&self, name: &str) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(written, _)| written == name)
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Forget every write.
    pub fn clear(&self) {
        self.writes.lock().unwrap().clear();
    }
}

impl RoutingContext for RecordingContext {
    fn set_parameter(&self, name: &str, value: &str) {
        self.writes
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string()));
    }

    fn parameter(&self, name: &str) -> Option<String> {
        let current: BTreeMap<_, _> = self.writes.lock().unwrap().iter().cloned().collect();
        current.get(name).cloned()
    }
}
