use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::debug;

pub struct Config {
    pub enabled: bool,
    pub ttl: Duration,
}

struct Entry<V> {
    created: Instant,
    value: Arc<V>,
}

/// String-keyed cache whose entries expire `ttl` after they were written.
///
/// Expiry is checked on read; an expired entry is evicted by the `get` that
/// finds it. Concurrent misses on the same key all run their producer and the
/// last write wins.
pub struct Cache<V> {
    enabled: bool,
    inner: RwLock<HashMap<String, Entry<V>>>,
    ttl: Duration,
}

impl<V> Cache<V>
where
    V: Send + Sync,
{
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.enabled,
            ttl: config.ttl,
            inner: Default::default(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        if !self.enabled {
            return None;
        }

        {
            let inner = self.inner.read().await;
            let entry = inner.get(key)?;
            if entry.created.elapsed() <= self.ttl {
                return Some(Arc::clone(&entry.value));
            }
        }

        let mut inner = self.inner.write().await;
        if inner
            .get(key)
            .is_some_and(|entry| entry.created.elapsed() > self.ttl)
        {
            debug!(key, "evicting expired cache entry");
            inner.remove(key);
        }

        None
    }

    pub async fn insert(&self, key: String, value: V) -> Arc<V> {
        let arcd = Arc::new(value);
        if !self.enabled {
            return arcd;
        }

        self.inner.write().await.insert(
            key,
            Entry {
                created: Instant::now(),
                value: Arc::clone(&arcd),
            },
        );

        arcd
    }

    /// Returns the live entry for `key`, or runs `producer` and stores its
    /// result. Errors are passed through and never stored.
    pub async fn memoize<F, Fut, E>(&self, key: String, producer: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            debug!(key = %key, "cache hit");
            return Ok(value);
        }

        debug!(key = %key, "cache miss");
        let value = producer().await?;
        Ok(self.insert(key, value).await)
    }

    /// Like [`Cache::memoize`], but a producer yielding `None` leaves the key
    /// unset so the next call tries again.
    pub async fn memoize_some<F, Fut, E>(
        &self,
        key: String,
        producer: F,
    ) -> Result<Option<Arc<V>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        if let Some(value) = self.get(&key).await {
            debug!(key = %key, "cache hit");
            return Ok(Some(value));
        }

        debug!(key = %key, "cache miss");
        match producer().await? {
            Some(value) => Ok(Some(self.insert(key, value).await)),
            None => Ok(None),
        }
    }
}
