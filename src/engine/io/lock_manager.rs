//! Hands out one exclusive lock per collection so that writers and deleters of the
//! same collection take turns while different collections proceed in parallel.
//!
//! The map itself is guarded by an RwLock that is only held long enough to find or
//! insert an entry, never while the collection lock is in use. Entries are never
//! removed, the map grows with the number of distinct collection names seen.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

#[derive(Clone, Debug, Default)]
pub struct LockManager {
    locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
}

impl LockManager {
    pub fn new() -> LockManager {
        LockManager {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the lock for the collection, creating it on first use.
    pub async fn get_lock(&self, collection: &str) -> Arc<Mutex<()>> {
        let lm = self.locks.read().await;

        match lm.get(collection) {
            Some(s) => s.clone(),
            None => {
                //Need the write side to insert
                drop(lm);
                self.insert_key(collection).await
            }
        }
    }

    /// Waits for exclusive access to the collection, held until the guard is dropped.
    pub async fn lock(&self, collection: &str) -> OwnedMutexGuard<()> {
        self.get_lock(collection).await.lock_owned().await
    }

    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }

    async fn insert_key(&self, collection: &str) -> Arc<Mutex<()>> {
        let mut lm = self.locks.write().await;

        //Someone may have beaten us here between dropping the read guard and getting the write one
        lm.entry(collection.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::join_all;
    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn test_same_collection_same_lock() -> Result<(), Box<dyn std::error::Error>> {
        let lm = LockManager::new();

        let first = lm.get_lock("users").await;
        let second = lm.get_lock("users").await;
        assert!(Arc::ptr_eq(&first, &second));

        let other = lm.get_lock("orders").await;
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(lm.len().await, 2);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creation() -> Result<(), Box<dyn std::error::Error>> {
        let lm = LockManager::new();

        let mut tasks = vec![];
        for _ in 0..32 {
            let lm = lm.clone();
            tasks.push(tokio::spawn(async move { lm.get_lock("users").await }));
        }

        let mut locks = vec![];
        for t in join_all(tasks).await {
            locks.push(t?);
        }

        for l in locks.iter() {
            assert!(Arc::ptr_eq(&locks[0], l));
        }
        assert_eq!(lm.len().await, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_exclusion() -> Result<(), Box<dyn std::error::Error>> {
        let lm = LockManager::new();

        let guard = lm.lock("users").await;

        //Same collection has to wait
        assert!(timeout(Duration::from_millis(50), lm.lock("users"))
            .await
            .is_err());

        //A different collection doesn't
        let _other = timeout(Duration::from_millis(50), lm.lock("orders")).await?;

        drop(guard);
        let _again = timeout(Duration::from_millis(50), lm.lock("users")).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_independent_managers() -> Result<(), Box<dyn std::error::Error>> {
        let lm1 = LockManager::new();
        let lm2 = LockManager::new();

        let _guard = lm1.lock("users").await;
        let _other = timeout(Duration::from_millis(50), lm2.lock("users")).await?;

        Ok(())
    }
}
