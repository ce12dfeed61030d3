// State management module
//
// SharedConfig wraps the live SyncConfig with thread-safe access. The file-open
// hook reads it on the game's threads while commands and the config window
// mutate it.

use crate::models::SyncConfig;
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe handle to the active configuration.
///
/// Cloning the handle shares the same configuration. A poisoned lock is
/// recovered rather than propagated: the hook must keep answering even if a
/// writer panicked.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<SyncConfig>>,
}

impl SharedConfig {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Clone of the current configuration, e.g. for saving to disk.
    pub fn snapshot(&self) -> SyncConfig {
        self.read(SyncConfig::clone)
    }

    /// Execute a function with read access to the configuration
    ///
    /// # Example
    /// ```ignore
    /// let main = shared.read(|config| config.main_character());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SyncConfig) -> R,
    {
        let config = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&config)
    }

    /// Mutate the configuration in place.
    pub fn update<F, R>(&self, update_fn: F) -> R
    where
        F: FnOnce(&mut SyncConfig) -> R,
    {
        let mut config = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        update_fn(&mut config)
    }

    /// Replace the whole configuration, e.g. after reloading it from disk.
    pub fn replace(&self, config: SyncConfig) {
        self.update(|current| *current = config);
    }

    /// Set the main character, logging the change.
    pub fn set_main_character(&self, character_id: u64) {
        let previous = self.update(|config| {
            std::mem::replace(&mut config.main_character_id, character_id)
        });
        tracing::info!(
            "Main character changed from {:016X} to {:016X}",
            previous,
            character_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clones_share_state() {
        let shared = SharedConfig::default();
        let other = shared.clone();

        other.set_main_character(42);
        assert_eq!(shared.read(|c| c.main_character_id), 42);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let shared = SharedConfig::default();
        let mut snapshot = shared.snapshot();
        snapshot.sync.card_sets = true;

        assert!(!shared.read(|c| c.sync.card_sets));
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let shared = SharedConfig::default();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        if i == 0 {
                            shared.update(|c| c.main_character_id += 1);
                        } else {
                            let _ = shared.read(|c| c.main_character());
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.read(|c| c.main_character_id), 100);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let shared = SharedConfig::default();
        let poisoner = shared.clone();

        let _ = thread::spawn(move || {
            poisoner.update(|_| panic!("writer failed"));
        })
        .join();

        shared.replace(SyncConfig {
            main_character_id: 7,
            ..SyncConfig::default()
        });
        assert_eq!(shared.read(|c| c.main_character()), Some(7));
    }
}
