//! Cache maintenance: clearing cache pools and warming up the cache
//! directory.
//!
//! - [`PoolClearer`] clears named [`CachePool`]s, one by one or all at once
//! - [`WarmerAggregate`] runs [`CacheWarmer`]s in registration order

mod clearer;
mod warmer;

pub use clearer::{CacheClearer, CachePool, MemoryPool, PoolClearer};
pub use warmer::{CacheWarmer, WarmerAggregate, write_cache_file};

use keel_core::BoxError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by cache pool operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// No pool is registered under this name.
    #[error("cache pool not found: {0}")]
    PoolNotFound(String),
}

/// Errors raised while warming up the cache.
#[derive(Error, Debug)]
pub enum WarmupError {
    /// A cache file could not be written.
    #[error("unable to write cache file \"{}\"", path.display())]
    Write {
        /// Target file.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// A warmer failed for another reason.
    #[error("cache warmer `{name}` failed")]
    Warmer {
        /// Warmer name.
        name: String,
        /// Underlying error.
        #[source]
        source: BoxError,
    },
}
