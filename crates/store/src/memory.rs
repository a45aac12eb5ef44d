//! In-memory cache store using DashMap.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use sports_query_core::{
    Action, CacheEntry, CacheKey, CacheStore, Domain, QueryOption, Result,
};

/// Entry plus its first-insertion sequence number.
#[derive(Debug, Clone)]
struct Slot {
    entry: CacheEntry,
    seq: u64,
}

/// In-memory cache store.
///
/// This is the hot tier: every lookup is served from here. Keys are
/// independent, so concurrent writers to different keys never contend
/// beyond DashMap's shard locks.
#[derive(Debug)]
pub struct InMemoryCacheStore {
    entries: DashMap<CacheKey, Slot>,
    /// Fingerprint to key, for point lookup by external id.
    ids: DashMap<String, CacheKey>,
    next_seq: AtomicU64,
    default_ttl: Duration,
}

impl InMemoryCacheStore {
    /// Create a store giving typed entries `default_ttl`.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ids: DashMap::new(),
            next_seq: AtomicU64::new(0),
            default_ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// TTL applied to entries without source text.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Insert a prebuilt entry, replacing any existing one.
    /// A replaced key keeps its original position in option lists.
    pub fn insert(&self, entry: CacheEntry) {
        let id = entry.key.fingerprint();
        match self.entries.entry(entry.key.clone()) {
            Entry::Occupied(mut occupied) => {
                occupied.get_mut().entry = entry;
            }
            Entry::Vacant(vacant) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                self.ids.insert(id, vacant.key().clone());
                vacant.insert(Slot { entry, seq });
            }
        }
    }

    fn remove_key(&self, key: &CacheKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.ids.remove(&key.fingerprint());
        }
        removed
    }

    fn remove_where(&self, pred: impl Fn(&CacheEntry) -> bool) -> usize {
        let doomed: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|slot| pred(&slot.value().entry))
            .map(|slot| slot.key().clone())
            .collect();
        doomed.iter().filter(|key| self.remove_key(key)).count()
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        Ok(self.entries.get(key).map(|slot| slot.entry.clone()))
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<CacheEntry>> {
        let key = match self.ids.get(id) {
            Some(key) => key.value().clone(),
            None => return Ok(None),
        };
        self.get(&key).await
    }

    async fn put(
        &self,
        key: CacheKey,
        payload: serde_json::Value,
        source_text: Option<String>,
    ) -> Result<CacheEntry> {
        let ttl = match source_text {
            Some(_) => None,
            None => Some(self.default_ttl),
        };
        let entry = CacheEntry::success(key, payload, ttl, source_text);
        self.insert(entry.clone());
        tracing::trace!(key = %entry.key, voice = entry.is_voice(), "Cache entry stored");
        Ok(entry)
    }

    async fn promote(&self, entry: CacheEntry, source_text: String) -> Result<CacheEntry> {
        let entry = CacheEntry {
            ttl_secs: None,
            source_text: Some(source_text),
            ..entry
        };
        self.insert(entry.clone());
        Ok(entry)
    }

    async fn put_failure(&self, key: CacheKey, message: &str, source_text: String) -> Result<bool> {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                self.ids.insert(key.fingerprint(), key.clone());
                let entry = CacheEntry::failure(key, message, Some(source_text));
                vacant.insert(Slot { entry, seq });
                Ok(true)
            }
        }
    }

    async fn list_options(&self, domain: Domain, action: Action) -> Result<Vec<QueryOption>> {
        let now = Utc::now();
        let mut matching: Vec<(u64, QueryOption)> = self
            .entries
            .iter()
            .filter(|slot| {
                let entry = &slot.value().entry;
                entry.key.domain == domain
                    && entry.key.action == action
                    && entry.success
                    && !entry.is_expired_at(now)
            })
            .map(|slot| (slot.seq, QueryOption::from_entry(&slot.entry)))
            .collect();
        matching.sort_by_key(|(seq, _)| *seq);
        Ok(matching.into_iter().map(|(_, option)| option).collect())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.remove_key(key))
    }

    async fn evict_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let evicted = self.remove_where(|entry| entry.is_expired_at(now));
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.entries.len(), "Evicted expired cache entries");
        }
        Ok(evicted)
    }

    async fn clear(&self, domain: Option<Domain>) -> Result<usize> {
        let removed = match domain {
            Some(domain) => self.remove_where(|entry| entry.key.domain == domain),
            None => self.remove_where(|_| true),
        };
        if self.entries.is_empty() {
            self.next_seq.store(0, Ordering::SeqCst);
        }
        Ok(removed)
    }
}
