use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::PressError;

/// Per-key async locks.
///
/// Lazily creates one lock per key and returns the same lock for repeated
/// lookups. Used to serialise chapter writes within a story so that the
/// duplicate-number check and the insert cannot interleave in one process.
#[derive(Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &str) -> Result<Arc<AsyncMutex<()>>, PressError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| PressError::LockPoisoned("keyed lock lookup"))?;
        // Drop entries nobody is holding or waiting on.
        locks.retain(|k, lock| k == key || Arc::strong_count(lock) > 1);
        Ok(locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    /// Wait for and hold the lock for `key` until the guard drops.
    pub(crate) async fn acquire(&self, key: &str) -> Result<OwnedMutexGuard<()>, PressError> {
        let lock = self.lock_for(key)?;
        Ok(lock.lock_owned().await)
    }
}
