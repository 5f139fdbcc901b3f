//! Hooks for observing dispatch in tests.
//!
//! - [`RecordingHook`] keeps a copy of every event it sees
//! - [`CountingHook`] counts invocations
//! - [`OrderHook`] writes its id into a shared log, to check priorities
//!
//! All of them answer with a fixed [`HookResult`], so they can also stand in
//! for a hook that stops propagation.

use keel_core::{BoxError, Hook, HookResult, Message};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records the events it receives. Clones share the recording.
///
/// ```rust,ignore
/// let recorder = RecordingHook::<RequestEvent>::new();
/// builder.on_request("recorder", 0, recorder.clone());
/// // ... handle a request ...
/// assert_eq!(recorder.count(), 1);
/// ```
pub struct RecordingHook<E> {
    seen: Arc<Mutex<Vec<E>>>,
    answer: HookResult,
}

impl<E: Clone> RecordingHook<E> {
    /// Record and continue.
    pub fn new() -> Self {
        Self::answering(HookResult::Next)
    }

    /// Record and answer `answer`.
    pub fn answering(answer: HookResult) -> Self {
        Self {
            seen: Arc::default(),
            answer,
        }
    }

    /// The recorded events, oldest first.
    pub fn events(&self) -> Vec<E> {
        self.seen.lock().unwrap().clone()
    }

    /// Number of recorded events.
    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Forget the recorded events.
    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

impl<E: Clone> Default for RecordingHook<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RecordingHook<E> {
    fn clone(&self) -> Self {
        Self {
            seen: Arc::clone(&self.seen),
            answer: self.answer,
        }
    }
}

impl<E: Message + Clone> Hook<E> for RecordingHook<E> {
    async fn on_event(&self, event: &E) -> Result<HookResult, BoxError> {
        self.seen.lock().unwrap().push(event.clone());
        Ok(self.answer)
    }
}

/// Counts invocations. Clones share the counter.
#[derive(Clone)]
pub struct CountingHook {
    calls: Arc<AtomicUsize>,
    answer: HookResult,
}

impl CountingHook {
    /// Count and continue.
    pub fn new() -> Self {
        Self::with_result(HookResult::Next)
    }

    /// Count and answer `answer`.
    pub fn with_result(answer: HookResult) -> Self {
        Self {
            calls: Arc::default(),
            answer,
        }
    }

    /// Invocations so far.
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Reset to zero.
    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

impl Default for CountingHook {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Message> Hook<E> for CountingHook {
    async fn on_event(&self, _event: &E) -> Result<HookResult, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer)
    }
}

/// Pushes `id` into a shared log on every event.
pub struct OrderHook {
    id: usize,
    log: Arc<Mutex<Vec<usize>>>,
}

impl OrderHook {
    /// A hook logging `id` into `log`.
    pub fn new(id: usize, log: Arc<Mutex<Vec<usize>>>) -> Self {
        Self { id, log }
    }
}

impl<E: Message> Hook<E> for OrderHook {
    async fn on_event(&self, _event: &E) -> Result<HookResult, BoxError> {
        self.log.lock().unwrap().push(self.id);
        Ok(HookResult::Next)
    }
}
