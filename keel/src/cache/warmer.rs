//! Cache warm-up.

use super::WarmupError;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::Builder;

/// Pre-computes cache files in a cache directory.
pub trait CacheWarmer: Send + Sync {
    /// Whether this warmer may be skipped.
    ///
    /// Optional warmers only run when the aggregate enables them.
    fn is_optional(&self) -> bool;

    /// Warm up `cache_dir`, returning files worth preloading.
    fn warm_up(&self, cache_dir: &Path) -> Result<Vec<PathBuf>, WarmupError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Runs several warmers as one.
#[derive(Default)]
pub struct WarmerAggregate {
    warmers: Vec<Arc<dyn CacheWarmer>>,
    optional_enabled: bool,
}

impl WarmerAggregate {
    /// An aggregate over `warmers`, in order.
    pub fn new(warmers: impl IntoIterator<Item = Arc<dyn CacheWarmer>>) -> Self {
        Self {
            warmers: warmers.into_iter().collect(),
            optional_enabled: false,
        }
    }

    /// Build from configuration.
    pub fn from_config(
        config: &crate::config::WarmupConfig,
        warmers: impl IntoIterator<Item = Arc<dyn CacheWarmer>>,
    ) -> Self {
        let mut aggregate = Self::new(warmers);
        if config.enable_optional {
            aggregate.enable_optional_warmers();
        }
        aggregate
    }

    /// Append a warmer.
    pub fn add(&mut self, warmer: Arc<dyn CacheWarmer>) {
        self.warmers.push(warmer);
    }

    /// Replace every warmer.
    pub fn set_warmers(&mut self, warmers: impl IntoIterator<Item = Arc<dyn CacheWarmer>>) {
        self.warmers = warmers.into_iter().collect();
    }

    /// Run optional warmers too.
    pub fn enable_optional_warmers(&mut self) {
        self.optional_enabled = true;
    }

    /// Number of registered warmers.
    pub fn len(&self) -> usize {
        self.warmers.len()
    }

    /// Whether no warmer is registered.
    pub fn is_empty(&self) -> bool {
        self.warmers.is_empty()
    }
}

impl CacheWarmer for WarmerAggregate {
    fn is_optional(&self) -> bool {
        false
    }

    fn warm_up(&self, cache_dir: &Path) -> Result<Vec<PathBuf>, WarmupError> {
        tracing::info!(
            cache_dir = %cache_dir.display(),
            warmers = self.warmers.len(),
            optional = self.optional_enabled,
            "warming up cache"
        );

        let mut preload = Vec::new();
        for warmer in &self.warmers {
            if warmer.is_optional() && !self.optional_enabled {
                tracing::debug!(warmer = warmer.name(), "skipping optional warmer");
                continue;
            }
            preload.extend(warmer.warm_up(cache_dir)?);
        }
        Ok(preload)
    }

    fn name(&self) -> &str {
        "aggregate"
    }
}

/// Write a cache file atomically.
///
/// The content goes to a temporary file in the target directory which is then
/// renamed over `path`, so readers never observe a partial file. On unix the
/// file gets mode `0666` minus the process umask, like any file created with
/// [`std::fs::File::create`].
pub fn write_cache_file(path: &Path, content: impl AsRef<[u8]>) -> Result<(), WarmupError> {
    let write_error = |source| WarmupError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        // open(2) applies the umask to this mode.
        builder.permissions(Permissions::from_mode(0o666));
    }

    let mut file = builder.tempfile_in(dir).map_err(write_error)?;
    file.write_all(content.as_ref()).map_err(write_error)?;
    file.persist(path).map_err(|err| write_error(err.error))?;

    tracing::debug!(path = %path.display(), "wrote cache file");
    Ok(())
}
