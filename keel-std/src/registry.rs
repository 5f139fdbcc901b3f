//! Priority-ordered hook registries.
//!
//! A [`RegistryBuilder`] collects named hooks, each with a priority, and
//! freezes them into a [`Registry`]. Dispatch visits hooks from the highest
//! priority down; hooks sharing a priority run in registration order.

use keel_core::{DispatchError, DynHook, Hook, HookResult, Message};
use std::{borrow::Cow, cmp::Reverse};

/// Name and priority of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationMeta {
    /// Name used in logs and errors (e.g. `"locale.on_kernel_request"`).
    pub name: Cow<'static, str>,
    /// Higher runs earlier. Defaults to 0.
    pub priority: i32,
}

impl RegistrationMeta {
    /// A registration at priority 0.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            priority: 0,
        }
    }

    /// Same registration at another priority.
    pub fn with_priority(self, priority: i32) -> Self {
        Self { priority, ..self }
    }
}

/// A type-erased hook and its registration.
pub struct HookEntry<E: Message> {
    hook: Box<dyn DynHook<E>>,
    meta: RegistrationMeta,
}

impl<E: Message> HookEntry<E> {
    /// Erase `hook` and attach `meta`.
    pub fn new<H: Hook<E>>(hook: H, meta: RegistrationMeta) -> Self {
        Self {
            hook: Box::new(hook),
            meta,
        }
    }

    /// The hook.
    pub fn hook(&self) -> &dyn DynHook<E> {
        self.hook.as_ref()
    }

    /// The registration.
    pub fn meta(&self) -> &RegistrationMeta {
        &self.meta
    }

    /// Registration name.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Registration priority.
    pub fn priority(&self) -> i32 {
        self.meta.priority
    }
}

/// Collects registrations for one event type.
///
/// ```rust,ignore
/// let registry = RegistryBuilder::new()
///     .register_with_priority("locale.set_default_locale", default_hook, 100)
///     .register_with_priority("locale.on_kernel_request", request_hook, 16)
///     .build();
/// ```
pub struct RegistryBuilder<E: Message> {
    pending: Vec<HookEntry<E>>,
}

impl<E: Message> RegistryBuilder<E> {
    /// No registrations yet.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Register at priority 0.
    pub fn register<H: Hook<E>>(mut self, name: impl Into<Cow<'static, str>>, hook: H) -> Self {
        self.register_mut(name, hook);
        self
    }

    /// Register at priority 0, in place.
    pub fn register_mut<H: Hook<E>>(&mut self, name: impl Into<Cow<'static, str>>, hook: H) {
        self.register_with_meta_mut(hook, RegistrationMeta::new(name));
    }

    /// Register at `priority`.
    pub fn register_with_priority<H: Hook<E>>(
        mut self,
        name: impl Into<Cow<'static, str>>,
        hook: H,
        priority: i32,
    ) -> Self {
        self.register_with_meta_mut(hook, RegistrationMeta::new(name).with_priority(priority));
        self
    }

    /// Register with a prepared [`RegistrationMeta`], in place.
    pub fn register_with_meta_mut<H: Hook<E>>(&mut self, hook: H, meta: RegistrationMeta) {
        self.pending.push(HookEntry::new(hook, meta));
    }

    /// Sort by descending priority (stable) and freeze.
    pub fn build(self) -> Registry<E> {
        let mut entries = self.pending;
        entries.sort_by_key(|entry| Reverse(entry.priority()));
        Registry { entries }
    }

    /// Registrations so far.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<E: Message> Default for RegistryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen, priority-sorted hooks for one event type.
pub struct Registry<E: Message> {
    entries: Vec<HookEntry<E>>,
}

impl<E: Message> Registry<E> {
    /// A registry without hooks; dispatch always continues.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Run the hooks in order until one answers [`HookResult::Stop`].
    ///
    /// The first failing hook aborts the dispatch with
    /// [`DispatchError::Hook`] carrying its registration name.
    pub async fn dispatch(&self, event: &E) -> Result<HookResult, DispatchError> {
        for entry in &self.entries {
            #[cfg(feature = "tracing")]
            tracing::trace!(hook = %entry.name(), priority = entry.priority(), "dispatching");

            let answer = entry.hook().on_event_dyn(event).await.map_err(|source| {
                DispatchError::Hook {
                    name: entry.name().to_string(),
                    source,
                }
            })?;

            if answer == HookResult::Stop {
                #[cfg(feature = "tracing")]
                tracing::debug!(hook = %entry.name(), "propagation stopped");
                return Ok(answer);
            }
        }
        Ok(HookResult::Next)
    }

    /// `(name, priority)` in execution order.
    pub fn listeners(&self) -> Vec<(&str, i32)> {
        self.entries
            .iter()
            .map(|entry| (entry.name(), entry.priority()))
            .collect()
    }

    /// Number of hooks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is no hook.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in execution order.
    pub fn entries(&self) -> &[HookEntry<E>] {
        &self.entries
    }
}

impl<E: Message> Default for Registry<E> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingHook, OrderHook};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_higher_priority_runs_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = RegistryBuilder::<String>::new()
            .register_with_priority("low", OrderHook::new(1, log.clone()), -10)
            .register_with_priority("high", OrderHook::new(2, log.clone()), 100)
            .register("zero", OrderHook::new(3, log.clone()))
            .build();

        registry.dispatch(&"/".to_string()).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec![2, 3, 1]);
        assert_eq!(
            registry.listeners(),
            vec![("high", 100), ("zero", 0), ("low", -10)]
        );
    }

    #[tokio::test]
    async fn test_ties_keep_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = RegistryBuilder::<String>::new()
            .register_with_priority("a", OrderHook::new(1, log.clone()), 5)
            .register_with_priority("b", OrderHook::new(2, log.clone()), 5)
            .register_with_priority("c", OrderHook::new(3, log.clone()), 5)
            .build();

        registry.dispatch(&String::new()).await.unwrap();

        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stop_skips_lower_priorities() {
        let first = CountingHook::with_result(HookResult::Stop);
        let second = CountingHook::new();
        let registry = RegistryBuilder::<String>::new()
            .register_with_priority("first", first.clone(), 10)
            .register("second", second.clone())
            .build();

        let answer = registry.dispatch(&String::new()).await.unwrap();

        assert_eq!(answer, HookResult::Stop);
        assert_eq!((first.count(), second.count()), (1, 0));
    }

    #[tokio::test]
    async fn test_failure_carries_hook_name() {
        let registry = RegistryBuilder::<String>::new()
            .register(
                "failing",
                crate::hooks::from_fn(|_: &String| Err("broken".into())),
            )
            .build();

        let DispatchError::Hook { name, source } =
            registry.dispatch(&String::new()).await.unwrap_err();
        assert_eq!(name, "failing");
        assert_eq!(source.to_string(), "broken");
    }

    #[tokio::test]
    async fn test_empty_registry_continues() {
        let registry = Registry::<String>::default();
        assert!(registry.is_empty());
        assert_eq!(
            registry.dispatch(&String::new()).await.unwrap(),
            HookResult::Next
        );
    }

    #[test]
    fn test_builder_counts_registrations() {
        let mut builder = RegistryBuilder::<String>::new();
        assert!(builder.is_empty());
        builder.register_mut("one", CountingHook::new());
        builder.register_with_meta_mut(
            CountingHook::new(),
            RegistrationMeta::new("two").with_priority(3),
        );
        assert_eq!(builder.len(), 2);

        let registry = builder.build();
        assert_eq!(registry.entries()[0].meta().name, "two");
        assert_eq!(registry.len(), 2);
    }
}
