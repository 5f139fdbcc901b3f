//! Stack of in-flight requests.

use super::Request;
use std::sync::{Arc, Mutex, PoisonError};

/// LIFO stack of the requests currently being handled.
///
/// The main request sits at the bottom; each nested sub-request is pushed on
/// top and popped once it completes, so the parent is always the entry
/// directly below the current one.
#[derive(Debug, Default)]
pub struct RequestStack {
    requests: Mutex<Vec<Arc<Request>>>,
}

impl RequestStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a request that is starting.
    pub fn push(&self, request: Arc<Request>) {
        self.lock().push(request);
    }

    /// Pop the request that just finished.
    pub fn pop(&self) -> Option<Arc<Request>> {
        self.lock().pop()
    }

    /// The request currently being handled.
    pub fn current(&self) -> Option<Arc<Request>> {
        self.lock().last().cloned()
    }

    /// The request that issued the current one, if it is nested.
    pub fn parent(&self) -> Option<Arc<Request>> {
        let requests = self.lock();
        let len = requests.len();
        if len < 2 {
            return None;
        }
        requests.get(len - 2).cloned()
    }

    /// The outermost request.
    pub fn main(&self) -> Option<Arc<Request>> {
        self.lock().first().cloned()
    }

    /// Number of in-flight requests.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no request is in flight.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<Request>>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
