//! # keel-std
//!
//! Standard implementations for the Keel request lifecycle kernel.
//!
//! This crate provides:
//! - **Priority registry**: [`Registry`], [`RegistryBuilder`], [`RegistrationMeta`]
//! - **Standard hooks**: [`FnHook`](hooks::FnHook), [`LoggingHook`](hooks::LoggingHook)
//! - **Testing utilities**: recording and counting hooks

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use keel_core;

// Modules
pub mod hooks;
pub mod registry;
pub mod testing;

pub use registry::{HookEntry, Registry, RegistryBuilder, RegistrationMeta};
