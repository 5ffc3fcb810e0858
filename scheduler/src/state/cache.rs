use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio::time::Instant;

/// A cached value and the instant it stops being visible, if any.
#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    deadline: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.is_none_or(|d| now < d)
    }
}

/// String keyed store behind a single lock with an optional per-entry expiry.
///
/// With `ttl = None` entries live until deleted.
#[derive(Debug)]
pub struct Cache<V> {
    ttl: Option<Duration>,
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> Cache<V> {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl: ttl.filter(|t| !t.is_zero()),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or replaces `key`, restarting its expiry.
    pub async fn set(&self, key: &str, value: V) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if self.ttl.is_some() {
            entries.retain(|_, e| e.is_live(now));
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                deadline: self.ttl.map(|t| now + t),
            },
        );
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }

    /// Removes `key` and returns its value if it was still live.
    pub async fn take(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.entries
            .write()
            .await
            .remove(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Live keys in lexicographic order.
    pub async fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    /// Holds the read lock until the view is dropped, so a whole loop over the
    /// cache sees one consistent state. Writers wait meanwhile.
    pub async fn view(&self) -> CacheView<'_, V> {
        CacheView {
            now: Instant::now(),
            guard: self.entries.read().await,
        }
    }
}

/// Read-locked view returned by [`Cache::view`].
pub struct CacheView<'a, V> {
    now: Instant,
    guard: RwLockReadGuard<'a, HashMap<String, Entry<V>>>,
}

impl<V> CacheView<'_, V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.guard
            .get(key)
            .filter(|e| e.is_live(self.now))
            .map(|e| &e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.guard
            .iter()
            .filter(|(_, e)| e.is_live(self.now))
            .map(|(k, e)| (k, &e.value))
    }
}
