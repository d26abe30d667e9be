//! TTL cache for discovered pay parameters.
//!
//! Owned by the [`crate::resolver::EndpointResolver`] and shared by handle. Entries are
//! replaced as a whole, so concurrent fetches of the same address end with the last
//! writer's entry and never with a partially written one.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use tokio::time::Instant;
use zapdesk_core::primitives::PayParameters;

#[derive(Debug, Clone)]
struct CacheEntry {
    params: Arc<PayParameters>,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct PayParametersCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl PayParametersCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached parameters unless the entry is missing or stale.
    pub fn get(&self, key: &str) -> Option<Arc<PayParameters>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.params.clone())
    }

    /// Stores `params` under `key`. Stale entries of any key are evicted on the way.
    pub fn insert(&self, key: String, params: Arc<PayParameters>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        entries.insert(
            key,
            CacheEntry {
                params,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use pretty_assertions::assert_eq;
    use url::Url;
    use zapdesk_core::{amount::Millisats, primitives::PayParameters};

    use super::PayParametersCache;

    fn params(max: u64) -> anyhow::Result<Arc<PayParameters>> {
        Ok(Arc::new(PayParameters {
            callback: Url::parse("https://example.com/cb")?,
            min_sendable: Millisats(1_000),
            max_sendable: Millisats(max),
            metadata: "[]".to_owned(),
            comment_allowed: 0,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() -> anyhow::Result<()> {
        let cache = PayParametersCache::new(Duration::from_secs(300));
        cache.insert("agent@example.com".to_owned(), params(2_000)?);
        assert!(cache.get("agent@example.com").is_some());

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(cache.get("agent@example.com").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("agent@example.com").is_none());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_evicts_stale_entries() -> anyhow::Result<()> {
        let cache = PayParametersCache::new(Duration::from_secs(300));
        for i in 0..1_000 {
            cache.insert(format!("agent{i}@example.com"), params(2_000)?);
            tokio::time::advance(Duration::from_secs(301)).await;
        }
        assert_eq!(1, cache.len());

        cache.insert("fresh@example.com".to_owned(), params(2_000)?);
        cache.insert("other@example.com".to_owned(), params(2_000)?);
        assert_eq!(2, cache.len());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_replaces_whole_entry() -> anyhow::Result<()> {
        let cache = PayParametersCache::new(Duration::from_secs(300));
        cache.insert("agent@example.com".to_owned(), params(2_000)?);
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.insert("agent@example.com".to_owned(), params(3_000)?);
        tokio::time::advance(Duration::from_secs(200)).await;

        let cached = cache.get("agent@example.com").expect("entry is fresh");
        assert_eq!(Millisats(3_000), cached.max_sendable);
        assert_eq!(1, cache.len());
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_writers_leave_one_entry() -> anyhow::Result<()> {
        let cache = Arc::new(PayParametersCache::new(Duration::from_secs(300)));
        let mut handles = Vec::new();
        for max in 2_000..2_050u64 {
            let cache = cache.clone();
            let params = params(max)?;
            handles.push(tokio::spawn(async move {
                cache.insert("agent@example.com".to_owned(), params);
            }));
        }
        for handle in handles {
            handle.await?;
        }

        assert_eq!(1, cache.len());
        let cached = cache.get("agent@example.com").expect("entry exists");
        assert!((2_000..2_050).contains(&cached.max_sendable.0));
        Ok(())
    }
}
