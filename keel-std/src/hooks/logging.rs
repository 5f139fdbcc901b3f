//! Stage tracing.

use keel_core::{BoxError, Hook, HookResult, Message};
use std::borrow::Cow;
use std::fmt::Debug;

/// Traces every event of a stage at `debug` level and lets it through.
///
/// Without the `tracing` feature the hook only passes events on.
///
/// ```rust,ignore
/// builder.on_request("log.request", 1024, LoggingHook::for_stage("kernel.request"));
/// ```
#[derive(Debug, Clone)]
pub struct LoggingHook {
    stage: Cow<'static, str>,
}

impl LoggingHook {
    /// Trace events of `stage`.
    pub fn for_stage(stage: impl Into<Cow<'static, str>>) -> Self {
        Self {
            stage: stage.into(),
        }
    }

    /// Stage name attached to each trace.
    pub fn stage(&self) -> &str {
        &self.stage
    }
}

impl Default for LoggingHook {
    fn default() -> Self {
        Self::for_stage("event")
    }
}

impl<E> Hook<E> for LoggingHook
where
    E: Message + Debug,
{
    async fn on_event(&self, event: &E) -> Result<HookResult, BoxError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(stage = %self.stage, ?event, "kernel event");
        #[cfg(not(feature = "tracing"))]
        let _ = event;

        Ok(HookResult::Next)
    }
}
