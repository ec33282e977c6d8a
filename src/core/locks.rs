//! Keyed async locks.
//!
//! Used for two things: serializing request creation per (guild, owner), and
//! serializing every mutation and announcement render of a single request.
//! Unused keys are pruned whenever a new lock is taken.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A set of independent mutexes addressed by string key.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Creates an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and takes the lock for `key`.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Only the map holds a reference: nobody is waiting on or holding it
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of keys currently tracked
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Whether no keys are tracked
    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}

/// Proof that the caller holds the lock for one LFG request.
///
/// Every squad mutation takes a guard, so membership changes, resource attachment and
/// announcement renders for the same request cannot interleave.
#[derive(Debug)]
pub struct RequestGuard {
    request_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl RequestGuard {
    pub(crate) const fn new(request_id: String, guard: OwnedMutexGuard<()>) -> Self {
        Self {
            request_id,
            _guard: guard,
        }
    }

    /// ID of the locked request
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock("r1").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("r1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should acquire after release")
            .expect("waiter task panicked");
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("r1").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("r2")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_keys_are_pruned() {
        let locks = KeyedLocks::new();
        drop(locks.lock("r1").await);
        drop(locks.lock("r2").await);
        // Taking r3 prunes r1 and r2
        let _guard = locks.lock("r3").await;
        assert_eq!(locks.len().await, 1);
    }
}
