//! SQLite-backed cache store for the durable voice history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sports_query_core::{
    Action, CacheEntry, CacheKey, CacheStore, Domain, Error, QueryOption, Result,
};

const COLUMNS: &str =
    "id, domain, action, params, payload, created_at, ttl_secs, source_text, success";

/// Raw row as read from the table, before validation.
struct StoredRow {
    id: String,
    domain: String,
    action: String,
    params: String,
    payload: String,
    created_at: String,
    ttl_secs: Option<i64>,
    source_text: Option<String>,
    success: bool,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            domain: row.get(1)?,
            action: row.get(2)?,
            params: row.get(3)?,
            payload: row.get(4)?,
            created_at: row.get(5)?,
            ttl_secs: row.get(6)?,
            source_text: row.get(7)?,
            success: row.get(8)?,
        })
    }

    /// Validate and decode into an entry.
    fn decode(self) -> Result<CacheEntry> {
        let corrupt = |what: &str, detail: String| {
            Error::corrupt(format!("row {}: bad {}: {}", self.id, what, detail))
        };
        let domain: Domain = self
            .domain
            .parse()
            .map_err(|e: Error| corrupt("domain", e.to_string()))?;
        let action: Action = self
            .action
            .parse()
            .map_err(|e: Error| corrupt("action", e.to_string()))?;
        let params: BTreeMap<String, String> =
            serde_json::from_str(&self.params).map_err(|e| corrupt("params", e.to_string()))?;
        let payload: serde_json::Value =
            serde_json::from_str(&self.payload).map_err(|e| corrupt("payload", e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt("created_at", e.to_string()))?
            .with_timezone(&Utc);

        let key = CacheKey::new(domain, action, params);
        if key.fingerprint() != self.id {
            return Err(corrupt("id", "fingerprint mismatch".into()));
        }

        Ok(CacheEntry {
            key,
            payload,
            created_at,
            ttl_secs: self.ttl_secs.map(|secs| secs.max(0) as u64),
            source_text: self.source_text,
            success: self.success,
        })
    }
}

/// Decode a row, logging and skipping entries that cannot be read.
fn decode_or_skip(row: StoredRow) -> Option<CacheEntry> {
    match row.decode() {
        Ok(entry) => Some(entry),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping unreadable cache row");
            None
        }
    }
}

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> Error + '_ {
    move |e| Error::storage(format!("{}: {}", context, e))
}

/// SQLite cache store.
///
/// Rows carry an autoincrement sequence that survives overwrites, so option
/// lists keep first-insertion order across restarts.
pub struct SqliteCacheStore {
    conn: Arc<tokio::sync::Mutex<Connection>>,
    default_ttl: Duration,
}

impl SqliteCacheStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>, default_ttl: Duration) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::storage(format!("Cannot create {}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path).map_err(db_err("Open error"))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS query_cache (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                domain TEXT NOT NULL,
                action TEXT NOT NULL,
                params TEXT NOT NULL,      -- JSON object
                payload TEXT NOT NULL,     -- JSON
                created_at TEXT NOT NULL,  -- RFC 3339
                ttl_secs INTEGER,
                source_text TEXT,
                success INTEGER NOT NULL
            )",
            [],
        )
        .map_err(db_err("Schema error"))?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_query_cache_action ON query_cache (domain, action)",
            [],
        )
        .map_err(db_err("Index error"))?;

        tracing::debug!(path = %path.display(), "Opened cache database");
        Ok(Self {
            conn: Arc::new(tokio::sync::Mutex::new(conn)),
            default_ttl,
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| Error::internal(e.to_string()))?
    }

    /// Insert or replace an entry. Replacing keeps the row's sequence.
    pub async fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        let id = entry.key.fingerprint();
        let domain = entry.key.domain.as_str();
        let action = entry.key.action.as_str();
        let params = serde_json::to_string(&entry.key.params)?;
        let payload = serde_json::to_string(&entry.payload)?;
        let created_at = entry.created_at.to_rfc3339();
        let ttl_secs = entry.ttl_secs.map(|secs| secs as i64);
        let source_text = entry.source_text.clone();
        let success = entry.success;

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO query_cache (id, domain, action, params, payload, created_at, ttl_secs, source_text, success)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    payload = excluded.payload,
                    created_at = excluded.created_at,
                    ttl_secs = excluded.ttl_secs,
                    source_text = excluded.source_text,
                    success = excluded.success",
                params![id, domain, action, params, payload, created_at, ttl_secs, source_text, success],
            )
            .map_err(db_err("Insert error"))?;
            Ok(())
        })
        .await
    }

    /// Every readable entry in first-insertion order.
    pub async fn load_all(&self) -> Result<Vec<CacheEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {} FROM query_cache ORDER BY seq", COLUMNS))
                .map_err(db_err("Prepare error"))?;
            let rows = stmt
                .query_map([], StoredRow::from_row)
                .map_err(db_err("Query error"))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(db_err("Result error"))?;
            Ok(rows.into_iter().filter_map(decode_or_skip).collect())
        })
        .await
    }

    async fn select_one(&self, id: String) -> Result<Option<CacheEntry>> {
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM query_cache WHERE id = ?1", COLUMNS),
                    params![id],
                    StoredRow::from_row,
                )
                .optional()
                .map_err(db_err("Query error"))?;
            Ok(row.and_then(decode_or_skip))
        })
        .await
    }

    async fn delete_where(&self, sql: &'static str, args: Vec<String>) -> Result<usize> {
        self.with_conn(move |conn| {
            conn.execute(sql, rusqlite::params_from_iter(args.iter()))
                .map_err(db_err("Delete error"))
        })
        .await
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        self.select_one(key.fingerprint()).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<CacheEntry>> {
        self.select_one(id.to_string()).await
    }

    async fn put(
        &self,
        key: CacheKey,
        payload: serde_json::Value,
        source_text: Option<String>,
    ) -> Result<CacheEntry> {
        let ttl = source_text.is_none().then_some(self.default_ttl);
        let entry = CacheEntry::success(key, payload, ttl, source_text);
        self.upsert(&entry).await?;
        Ok(entry)
    }

    async fn promote(&self, entry: CacheEntry, source_text: String) -> Result<CacheEntry> {
        let entry = CacheEntry {
            ttl_secs: None,
            source_text: Some(source_text),
            ..entry
        };
        self.upsert(&entry).await?;
        Ok(entry)
    }

    async fn put_failure(&self, key: CacheKey, message: &str, source_text: String) -> Result<bool> {
        if self.get(&key).await?.is_some() {
            return Ok(false);
        }
        let entry = CacheEntry::failure(key, message, Some(source_text));
        self.upsert(&entry).await?;
        Ok(true)
    }

    async fn list_options(&self, domain: Domain, action: Action) -> Result<Vec<QueryOption>> {
        let now = Utc::now();
        let entries = self
            .with_conn(move |conn| {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT {} FROM query_cache WHERE domain = ?1 AND action = ?2 AND success = 1 ORDER BY seq",
                        COLUMNS
                    ))
                    .map_err(db_err("Prepare error"))?;
                let rows = stmt
                    .query_map(params![domain.as_str(), action.as_str()], StoredRow::from_row)
                    .map_err(db_err("Query error"))?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(db_err("Result error"))?;
                Ok(rows.into_iter().filter_map(decode_or_skip).collect::<Vec<_>>())
            })
            .await?;

        Ok(entries
            .iter()
            .filter(|entry| !entry.is_expired_at(now))
            .map(QueryOption::from_entry)
            .collect())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let removed = self
            .delete_where("DELETE FROM query_cache WHERE id = ?1", vec![key.fingerprint()])
            .await?;
        Ok(removed > 0)
    }

    async fn evict_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let expired: Vec<String> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.key.fingerprint())
            .collect();

        let mut evicted = 0;
        for id in expired {
            evicted += self
                .delete_where("DELETE FROM query_cache WHERE id = ?1", vec![id])
                .await?;
        }
        Ok(evicted)
    }

    async fn clear(&self, domain: Option<Domain>) -> Result<usize> {
        match domain {
            Some(domain) => {
                self.delete_where(
                    "DELETE FROM query_cache WHERE domain = ?1",
                    vec![domain.as_str().to_string()],
                )
                .await
            }
            None => self.delete_where("DELETE FROM query_cache", Vec::new()).await,
        }
    }
}
