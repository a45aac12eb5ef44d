//! Cache store traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Action, CacheEntry, CacheKey, Domain, QueryOption};

/// Content-addressed store of resolved query results.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Point lookup. Expired entries are returned; freshness is the caller's call.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Point lookup by key fingerprint.
    async fn get_by_id(&self, id: &str) -> Result<Option<CacheEntry>>;

    /// Store a successful result, replacing any existing entry (last write wins).
    /// Entries with `source_text` are voice history and never expire.
    async fn put(
        &self,
        key: CacheKey,
        payload: serde_json::Value,
        source_text: Option<String>,
    ) -> Result<CacheEntry>;

    /// Move an existing successful entry into the voice history, keeping its
    /// payload and fetch time. The promoted entry never expires.
    async fn promote(&self, entry: CacheEntry, source_text: String) -> Result<CacheEntry>;

    /// Record a failed voice query unless an entry already exists for the key.
    /// Returns whether a record was written.
    async fn put_failure(&self, key: CacheKey, message: &str, source_text: String) -> Result<bool>;

    /// Distinct slot-value combinations of successful entries for an action,
    /// in order of first insertion.
    async fn list_options(&self, domain: Domain, action: Action) -> Result<Vec<QueryOption>>;

    /// Remove a single entry.
    async fn remove(&self, key: &CacheKey) -> Result<bool>;

    /// Remove expired entries. Returns the number removed.
    async fn evict_expired(&self) -> Result<usize>;

    /// Remove every entry, or every entry of one domain. Returns the number removed.
    async fn clear(&self, domain: Option<Domain>) -> Result<usize>;
}
