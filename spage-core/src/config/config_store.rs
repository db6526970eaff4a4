//! Versioned config cell shared between the reload handler and its readers.
//!
//! `ConfigStore<T>` wraps `Arc<RwLock<T>>` and counts replacements, so a
//! long-lived reader (the broadcast engine, a socket task) always sees the
//! latest value on its next read and a reload can be observed in logs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard};

/// A shared, versioned configuration value.
pub struct ConfigStore<T> {
    inner: Arc<ConfigStoreInner<T>>,
}

struct ConfigStoreInner<T> {
    data: RwLock<T>,
    version: AtomicU64,
}

impl<T> ConfigStore<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(ConfigStoreInner {
                data: RwLock::new(initial),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Replace the stored value. Returns the new version.
    pub async fn update(&self, value: T) -> u64 {
        let mut guard = self.inner.data.write().await;
        *guard = value;
        self.inner.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.data.read().await
    }
}

impl<T> Clone for ConfigStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_is_visible_through_clones() {
        let store = ConfigStore::new(1u32);
        let reader = store.clone();
        assert_eq!(*reader.read().await, 1);

        assert_eq!(store.update(7).await, 1);
        assert_eq!(*reader.read().await, 7);
        assert_eq!(reader.update(9).await, 2);
        assert_eq!(*store.read().await, 9);
    }
}
