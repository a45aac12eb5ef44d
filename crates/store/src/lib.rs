#![deny(unused)]
//! Query result cache for SportsQuery.
//!
//! This crate provides tiered storage for resolved query results: a hot
//! in-memory tier answering every lookup, and an optional SQLite tier that
//! keeps the voice history across restarts.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;

use sports_query_core::{
    config::CacheConfig, Action, CacheEntry, CacheKey, CacheStore, Domain, QueryOption, Result,
};

pub use memory::InMemoryCacheStore;
pub use sqlite::SqliteCacheStore;

/// Tiered cache store.
///
/// Lookups never leave the hot tier; the durable tier is loaded into it at
/// open time and written through for voice entries only.
pub struct TieredCacheStore {
    /// Hot tier (in-memory).
    hot: Arc<InMemoryCacheStore>,
    /// Durable tier (SQLite) - optional.
    durable: Option<Arc<SqliteCacheStore>>,
}

impl TieredCacheStore {
    /// Create a store with only the hot tier.
    pub fn new(hot: Arc<InMemoryCacheStore>) -> Self {
        Self { hot, durable: None }
    }

    /// Add the durable tier.
    pub fn with_durable(mut self, durable: Arc<SqliteCacheStore>) -> Self {
        self.durable = Some(durable);
        self
    }

    /// Build the configured tiers and load persisted history.
    pub async fn open(config: &CacheConfig) -> Result<Self> {
        let hot = Arc::new(InMemoryCacheStore::new(config.default_ttl()));
        let store = match &config.database_path {
            Some(path) => Self::new(hot).with_durable(Arc::new(SqliteCacheStore::open(
                path,
                config.default_ttl(),
            )?)),
            None => Self::new(hot),
        };
        store.preload().await?;
        Ok(store)
    }

    /// Copy every durable entry into the hot tier, oldest first.
    pub async fn preload(&self) -> Result<usize> {
        let Some(durable) = &self.durable else {
            return Ok(0);
        };
        let entries = durable.load_all().await?;
        let count = entries.len();
        for entry in entries {
            self.hot.insert(entry);
        }
        tracing::info!(entries = count, "Loaded voice history");
        Ok(count)
    }

    /// Hot tier handle.
    pub fn hot(&self) -> &Arc<InMemoryCacheStore> {
        &self.hot
    }

    async fn persist(&self, entry: &CacheEntry) {
        if let Some(durable) = &self.durable {
            if let Err(e) = durable.upsert(entry).await {
                tracing::warn!(key = %entry.key, error = %e, "Failed to persist history entry");
            }
        }
    }

    async fn forget(&self, key: &CacheKey) {
        if let Some(durable) = &self.durable {
            if let Err(e) = durable.remove(key).await {
                tracing::warn!(key = %key, error = %e, "Failed to drop history entry");
            }
        }
    }
}

#[async_trait]
impl CacheStore for TieredCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        self.hot.get(key).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<CacheEntry>> {
        self.hot.get_by_id(id).await
    }

    async fn put(
        &self,
        key: CacheKey,
        payload: serde_json::Value,
        source_text: Option<String>,
    ) -> Result<CacheEntry> {
        let entry = self.hot.put(key, payload, source_text).await?;
        tracing::debug!(
            key = %entry.key,
            voice = entry.is_voice(),
            durable = self.durable.is_some(),
            "Storing cache entry"
        );
        if entry.is_voice() {
            self.persist(&entry).await;
        } else {
            // A typed refresh replaces a voice entry, so its history row goes too.
            self.forget(&entry.key).await;
        }
        Ok(entry)
    }

    async fn promote(&self, entry: CacheEntry, source_text: String) -> Result<CacheEntry> {
        let entry = self.hot.promote(entry, source_text).await?;
        self.persist(&entry).await;
        Ok(entry)
    }

    async fn put_failure(&self, key: CacheKey, message: &str, source_text: String) -> Result<bool> {
        if !self.hot.put_failure(key.clone(), message, source_text).await? {
            return Ok(false);
        }
        if let Some(entry) = self.hot.get(&key).await? {
            self.persist(&entry).await;
        }
        Ok(true)
    }

    async fn list_options(&self, domain: Domain, action: Action) -> Result<Vec<QueryOption>> {
        self.hot.list_options(domain, action).await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let removed = self.hot.remove(key).await?;
        if let Some(durable) = &self.durable {
            durable.remove(key).await?;
        }
        Ok(removed)
    }

    async fn evict_expired(&self) -> Result<usize> {
        // The durable tier holds voice entries only, which never expire.
        self.hot.evict_expired().await
    }

    async fn clear(&self, domain: Option<Domain>) -> Result<usize> {
        let removed = self.hot.clear(domain).await?;
        if let Some(durable) = &self.durable {
            durable.clear(domain).await?;
        }
        tracing::info!(domain = ?domain, removed, "Cache cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn config(path: &std::path::Path) -> CacheConfig {
        CacheConfig {
            default_ttl_secs: 3600,
            database_path: Some(path.to_string_lossy().into_owned()),
        }
    }

    fn schedule(team: &str) -> CacheKey {
        CacheKey::new(Domain::Basketball, Action::TeamSchedule, [("team", team)])
    }

    #[tokio::test]
    async fn test_only_voice_entries_survive_restart() {
        let dir = tempdir().unwrap();
        let cfg = config(&dir.path().join("query_cache.db"));

        {
            let store = TieredCacheStore::open(&cfg).await.unwrap();
            store.put(schedule("Lakers"), json!({"events": []}), Some("湖人队赛程".into())).await.unwrap();
            store.put(schedule("Celtics"), json!({"events": []}), None).await.unwrap();
        }

        let store = TieredCacheStore::open(&cfg).await.unwrap();
        assert!(store.get(&schedule("Lakers")).await.unwrap().is_some());
        assert!(store.get(&schedule("Celtics")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_promotion_keeps_fetch_time_and_persists() {
        let dir = tempdir().unwrap();
        let cfg = config(&dir.path().join("query_cache.db"));
        let fetched_at = chrono::Utc::now() - chrono::Duration::minutes(50);

        {
            let store = TieredCacheStore::open(&cfg).await.unwrap();
            let typed = CacheEntry::success(schedule("Lakers"), json!({"events": []}), Some(Duration::from_secs(3600)), None)
                .with_created_at(fetched_at);
            store.hot().insert(typed.clone());

            let promoted = store.promote(typed, "湖人队赛程".into()).await.unwrap();
            assert_eq!(promoted.created_at, fetched_at);
            assert_eq!(promoted.ttl_secs, None);
            assert!(promoted.is_voice());
        }

        let store = TieredCacheStore::open(&cfg).await.unwrap();
        let entry = store.get(&schedule("Lakers")).await.unwrap().unwrap();
        assert_eq!(entry.created_at.timestamp(), fetched_at.timestamp());
        assert_eq!(entry.source_text.as_deref(), Some("湖人队赛程"));
    }

    #[tokio::test]
    async fn test_typed_refresh_drops_history_row() {
        let dir = tempdir().unwrap();
        let cfg = config(&dir.path().join("query_cache.db"));
        let store = TieredCacheStore::open(&cfg).await.unwrap();

        store.put(schedule("Lakers"), json!(1), Some("湖人队赛程".into())).await.unwrap();
        store.put(schedule("Lakers"), json!(2), None).await.unwrap();
        drop(store);

        let reopened = TieredCacheStore::open(&cfg).await.unwrap();
        assert!(reopened.get(&schedule("Lakers")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failures_persist_but_stay_out_of_options() {
        let dir = tempdir().unwrap();
        let cfg = config(&dir.path().join("query_cache.db"));
        {
            let store = TieredCacheStore::open(&cfg).await.unwrap();
            store
                .put_failure(schedule("Knicks"), "HTTP 502", "尼克斯赛程".into())
                .await
                .unwrap();
        }

        let store = TieredCacheStore::open(&cfg).await.unwrap();
        let entry = store.get(&schedule("Knicks")).await.unwrap().unwrap();
        assert!(!entry.success);
        assert!(store
            .list_options(Domain::Basketball, Action::TeamSchedule)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_hot_only_store() {
        let store = TieredCacheStore::new(Arc::new(InMemoryCacheStore::new(Duration::ZERO)));
        assert_eq!(store.preload().await.unwrap(), 0);
        store.put(schedule("Heat"), json!({}), None).await.unwrap();
        assert_eq!(store.evict_expired().await.unwrap(), 1);
        assert!(store.hot().is_empty());
    }
}
