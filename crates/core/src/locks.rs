//! In-process mutual exclusion scoped to a shared directory.
//!
//! Resolution and extraction each serialize on the directory they mutate (the
//! local repository, the cache root) instead of on one global lock, so work on
//! unrelated roots proceeds in parallel. These locks do not protect against
//! other processes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// A set of mutexes keyed by directory.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    /// Create an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex for `key`, created on first use.
    #[must_use]
    pub fn mutex_for(&self, key: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.to_path_buf()).or_default())
    }

    /// Run `f` while holding the mutex for `key`.
    ///
    /// A poisoned mutex is recovered: it guards no data, only exclusivity.
    pub fn with_lock<T>(&self, key: &Path, f: impl FnOnce() -> T) -> T {
        let lock = self.mutex_for(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}
