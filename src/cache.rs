use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::storage::{CachedPayload, Storage};
use crate::types::Dataset;
use crate::warehouse::DataSource;

/// Default dataset time-to-live: 12 hours.
pub const DEFAULT_TTL_SECS: i64 = 12 * 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: i64,
    pub ttl_secs: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, fetched_at: i64, ttl_secs: i64) -> Self {
        Self { value, fetched_at, ttl_secs }
    }

    pub fn expires_at(&self) -> i64 { self.fetched_at.saturating_add(self.ttl_secs) }

    /// Stale once `ttl_secs` have elapsed since the fetch.
    pub fn is_stale(&self, now: i64) -> bool { now >= self.expires_at() }
}

/// Read-through cache for the catalogue table: memory first, then the optional
/// persisted snapshot store, then the upstream source.
pub struct DatasetCache {
    entry: Option<CacheEntry<Arc<Dataset>>>,
    ttl_secs: i64,
    store: Option<Arc<dyn Storage>>,
}

impl DatasetCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self { entry: None, ttl_secs, store: None }
    }

    pub fn with_store(mut self, store: Arc<dyn Storage>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn entry(&self) -> Option<&CacheEntry<Arc<Dataset>>> { self.entry.as_ref() }

    pub async fn get_or_fetch<S>(&mut self, source: &S, now: i64, refresh: bool) -> Result<Arc<Dataset>>
    where
        S: DataSource + ?Sized,
    {
        if !refresh {
            if let Some(entry) = self.entry.as_ref().filter(|e| !e.is_stale(now)) {
                debug!(fetched_at = entry.fetched_at, "dataset served from memory");
                return Ok(entry.value.clone());
            }
            if let Some(entry) = self.load_snapshot(source, now).await {
                let value = entry.value.clone();
                self.entry = Some(entry);
                return Ok(value);
            }
        }

        let dataset = Arc::new(source.fetch_dataset().await?);
        let entry = CacheEntry::new(dataset.clone(), now, self.ttl_secs);
        self.save_snapshot(source, &entry).await;
        self.entry = Some(entry);
        Ok(dataset)
    }

    async fn load_snapshot<S>(&self, source: &S, now: i64) -> Option<CacheEntry<Arc<Dataset>>>
    where
        S: DataSource + ?Sized,
    {
        let store = self.store.as_ref()?;
        let key = source.cache_key();
        let cached = match store.get_snapshot(&key, now).await {
            Ok(hit) => hit?,
            Err(e) => {
                warn!(error = %e, "snapshot lookup failed; fetching upstream");
                return None;
            }
        };
        match serde_json::from_str::<Dataset>(&cached.payload) {
            Ok(dataset) => {
                let ttl = cached.expires_at - cached.fetched_at;
                let entry = CacheEntry::new(Arc::new(dataset), cached.fetched_at, ttl);
                if entry.is_stale(now) { return None; }
                info!(rows = entry.value.len(), fetched_at = entry.fetched_at, "dataset loaded from snapshot");
                Some(entry)
            }
            Err(e) => {
                warn!(error = %e, key = %key, "discarding undecodable snapshot");
                None
            }
        }
    }

    async fn save_snapshot<S>(&self, source: &S, entry: &CacheEntry<Arc<Dataset>>)
    where
        S: DataSource + ?Sized,
    {
        let Some(store) = self.store.as_ref() else { return };
        let payload = match serde_json::to_string(entry.value.as_ref()) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to encode dataset snapshot");
                return;
            }
        };
        let cached = CachedPayload {
            key: source.cache_key(),
            payload,
            fetched_at: entry.fetched_at,
            expires_at: entry.expires_at(),
        };
        if let Err(e) = store.put_snapshot(&cached).await {
            warn!(error = %e, "failed to persist dataset snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::record;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new() -> Self { Self { calls: AtomicUsize::new(0), fail: false } }
        fn failing() -> Self { Self { calls: AtomicUsize::new(0), fail: true } }
        fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
    }

    #[async_trait]
    impl DataSource for CountingSource {
        fn cache_key(&self) -> String { "dataset|test".into() }
        async fn fetch_dataset(&self) -> Result<Dataset> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail { return Err(anyhow!("warehouse unreachable")); }
            Ok(Dataset::new(vec![record("t1", "Netflix", "2024-04-01")]))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        entries: Mutex<HashMap<String, CachedPayload>>,
    }

    #[async_trait]
    impl Storage for MemoryStore {
        async fn get_snapshot(&self, key: &str, now: i64) -> Result<Option<CachedPayload>> {
            let map = self.entries.lock().unwrap();
            Ok(map.get(key).filter(|e| e.expires_at > now).cloned())
        }
        async fn put_snapshot(&self, entry: &CachedPayload) -> Result<()> {
            self.entries.lock().unwrap().insert(entry.key.clone(), entry.clone());
            Ok(())
        }
    }

    #[test]
    fn entry_goes_stale_exactly_at_ttl() {
        let entry = CacheEntry::new((), 1_000, DEFAULT_TTL_SECS);
        assert!(!entry.is_stale(1_000));
        assert!(!entry.is_stale(1_000 + DEFAULT_TTL_SECS - 1));
        assert!(entry.is_stale(1_000 + DEFAULT_TTL_SECS));
    }

    #[tokio::test]
    async fn fresh_entry_is_not_refetched() {
        let source = CountingSource::new();
        let mut cache = DatasetCache::new(100);
        cache.get_or_fetch(&source, 0, false).await.unwrap();
        cache.get_or_fetch(&source, 99, false).await.unwrap();
        assert_eq!(source.calls(), 1);
        cache.get_or_fetch(&source, 100, false).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.entry().unwrap().fetched_at, 100);
    }

    #[tokio::test]
    async fn refresh_forces_fetch() {
        let source = CountingSource::new();
        let mut cache = DatasetCache::new(100);
        cache.get_or_fetch(&source, 0, false).await.unwrap();
        cache.get_or_fetch(&source, 1, true).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn persisted_snapshot_is_adopted_across_caches() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::default());
        let source = CountingSource::new();

        let mut first = DatasetCache::new(100).with_store(store.clone());
        first.get_or_fetch(&source, 10, false).await.unwrap();

        let mut second = DatasetCache::new(100).with_store(store.clone());
        let ds = second.get_or_fetch(&source, 50, false).await.unwrap();
        assert_eq!(source.calls(), 1);
        assert_eq!(ds.len(), 1);
        assert_eq!(second.entry().unwrap().fetched_at, 10);

        let mut third = DatasetCache::new(100).with_store(store);
        third.get_or_fetch(&source, 110, false).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn undecodable_snapshot_falls_back_to_source() {
        let store = Arc::new(MemoryStore::default());
        store
            .put_snapshot(&CachedPayload { key: "dataset|test".into(), payload: "not json".into(), fetched_at: 0, expires_at: 100 })
            .await
            .unwrap();
        let source = CountingSource::new();
        let mut cache = DatasetCache::new(100).with_store(store);
        cache.get_or_fetch(&source, 5, false).await.unwrap();
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let source = CountingSource::failing();
        let mut cache = DatasetCache::new(100);
        let err = cache.get_or_fetch(&source, 0, false).await.unwrap_err();
        assert!(err.to_string().contains("unreachable"));
        assert!(cache.entry().is_none());
    }
}
