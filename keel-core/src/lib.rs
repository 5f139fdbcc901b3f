//! # keel-core
//!
//! Core traits for the Keel request lifecycle kernel.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! listeners and extensions that don't need the full `keel` kernel.
//!
//! # Building Blocks
//!
//! ## [`Message`]
//!
//! Marker for anything that can travel through the pipeline. Kernel events
//! (request, controller, response, finish-request) are messages.
//!
//! ## [`Hook`]
//!
//! The unit of event processing: receives an event by reference, returns
//! [`HookResult::Next`] to let lower-priority hooks run or
//! [`HookResult::Stop`] to stop propagation.
//!
//! Hooks use native `async fn` for static dispatch. Registries store them
//! type-erased through [`DynHook`].
//!
//! # Error Types
//!
//! - [`KeelError`] - Top-level error type
//! - [`DispatchError`] - Errors raised while dispatching a stage
//! - [`BoxError`] - What hooks and controllers fail with

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod hook;
mod message;

// Re-exports
pub use error::{BoxError, DispatchError, KeelError};
pub use hook::{DynHook, Hook, HookFuture, HookResult};
pub use message::Message;
