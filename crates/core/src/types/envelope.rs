use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cache::CacheEntry;
use super::intent::Intent;

// =============================================================================
// Result Envelope (Gateway Output)
// =============================================================================

/// Caller-facing error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AmbiguousDomain,
    UnresolvedIntent,
    Network,
    Upstream,
    RateLimitTimeout,
    Timeout,
    CacheCorrupt,
    Internal,
}

/// Serializable, cloneable failure carried by envelopes and shared
/// between callers waiting on the same upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Provenance of an answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    /// Cache key fingerprint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Resolved intent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Served from the cache without an upstream call.
    #[serde(default)]
    pub cached: bool,
    /// Served from an expired entry after a network failure.
    #[serde(default)]
    pub stale: bool,
    /// When the served data was fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

/// The only shape ever returned to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
    #[serde(default)]
    pub meta: EnvelopeMeta,
}

impl ResultEnvelope {
    /// Successful envelope.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: EnvelopeMeta::default(),
        }
    }

    /// Failed envelope.
    pub fn err(failure: Failure) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(failure),
            meta: EnvelopeMeta::default(),
        }
    }

    /// Successful envelope describing a cache entry.
    pub fn from_entry(entry: &CacheEntry) -> Self {
        let mut envelope = Self::ok(entry.payload.clone());
        envelope.meta.key = Some(entry.key.fingerprint());
        envelope.meta.fetched_at = Some(entry.created_at);
        envelope
    }

    /// Attach the resolved intent.
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.meta.intent = Some(intent);
        self
    }

    /// Attach the cache key fingerprint.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.meta.key = Some(key.into());
        self
    }

    /// Mark as served from cache.
    pub fn cached(mut self) -> Self {
        self.meta.cached = true;
        self
    }

    /// Mark as served from an expired entry.
    pub fn stale(mut self) -> Self {
        self.meta.cached = true;
        self.meta.stale = true;
        self
    }

    /// Failure kind, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
