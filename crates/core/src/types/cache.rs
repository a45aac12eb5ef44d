use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::domain::{Action, Domain};
use super::intent::Intent;

// =============================================================================
// Cache Key
// =============================================================================

/// Deterministic identity of a resolved query.
///
/// Parameters live in a `BTreeMap`, so two keys built from the same slot
/// values compare equal regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub domain: Domain,
    pub action: Action,
    pub params: BTreeMap<String, String>,
}

impl CacheKey {
    /// Build a key from raw parameters. Parameter names are case-folded.
    pub fn new<K, V>(domain: Domain, action: Action, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params = params
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v.as_ref().trim().to_string()))
            .collect();
        Self {
            domain,
            action,
            params,
        }
    }

    /// Derive the key of a resolved intent.
    pub fn from_intent(intent: &Intent) -> Self {
        Self::new(intent.domain, intent.action, &intent.slots)
    }

    /// Canonical text encoding, e.g. `football/standings?league=PL`.
    pub fn canonical(&self) -> String {
        let mut out = format!("{}/{}", self.domain, self.action);
        for (i, (k, v)) in self.params.iter().enumerate() {
            out.push(if i == 0 { '?' } else { '&' });
            out.push_str(k);
            out.push('=');
            out.push_str(v);
        }
        out
    }

    /// Stable external identifier (hex SHA-256 of the canonical encoding).
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Human label for option lists, e.g. `2023 driver standings`.
    pub fn label(&self) -> String {
        if self.params.is_empty() {
            return format!("{} {}", self.domain, self.action.title());
        }
        let values: Vec<&str> = self.params.values().map(String::as_str).collect();
        format!("{} {}", values.join(" "), self.action.title())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

// =============================================================================
// Cache Entry
// =============================================================================

/// Stored result of a resolved query. Replaced, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    /// Provider payload, or `{"error": ...}` for recorded failures.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Lifetime in seconds. `None` means kept until cleared.
    pub ttl_secs: Option<u64>,
    /// Original utterance for voice-originated entries.
    pub source_text: Option<String>,
    pub success: bool,
}

impl CacheEntry {
    /// Create a successful entry.
    pub fn success(
        key: CacheKey,
        payload: serde_json::Value,
        ttl: Option<Duration>,
        source_text: Option<String>,
    ) -> Self {
        Self {
            key,
            payload,
            created_at: Utc::now(),
            ttl_secs: ttl.map(|d| d.as_secs()),
            source_text,
            success: true,
        }
    }

    /// Create a failed history entry.
    pub fn failure(key: CacheKey, message: impl Into<String>, source_text: Option<String>) -> Self {
        Self {
            key,
            payload: serde_json::json!({ "error": message.into() }),
            created_at: Utc::now(),
            ttl_secs: None,
            source_text,
            success: false,
        }
    }

    /// Override the creation time.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Time after which the entry is stale.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.ttl_secs
            .map(|secs| self.created_at + chrono::Duration::seconds(secs as i64))
    }

    /// Whether the entry is stale at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|at| now >= at).unwrap_or(false)
    }

    /// Whether the entry is stale now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the entry belongs to the voice history.
    pub fn is_voice(&self) -> bool {
        self.source_text.is_some()
    }

    /// Whether the entry can answer a query without a refresh.
    pub fn is_fresh(&self) -> bool {
        self.success && !self.is_expired()
    }
}

// =============================================================================
// Browsable Options
// =============================================================================

/// Previously resolved query surfaced as a browsable choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOption {
    /// Fingerprint for point lookup.
    pub key: String,
    /// Canonical slot values.
    pub slots: BTreeMap<String, String>,
    pub label: String,
    pub source_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QueryOption {
    /// Build the option describing an entry.
    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            key: entry.key.fingerprint(),
            slots: entry.key.params.clone(),
            label: entry.key.label(),
            source_text: entry.source_text.clone(),
            created_at: entry.created_at,
        }
    }

    /// Slot values joined with `/`, e.g. `PL` or `2023/5`.
    pub fn value(&self) -> String {
        self.slots
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_is_order_independent() {
        let a = CacheKey::new(Domain::Motorsport, Action::RaceResults, [("year", "2023"), ("round", "5")]);
        let b = CacheKey::new(Domain::Motorsport, Action::RaceResults, [("round", "5"), ("Year ", "2023")]);
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.canonical(), "motorsport/race_results?round=5&year=2023");
    }

    #[test]
    fn test_key_distinguishes_actions() {
        let a = CacheKey::new(Domain::Football, Action::Standings, [("league", "PL")]);
        let b = CacheKey::new(Domain::Football, Action::TopScorers, [("league", "PL")]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_expiry() {
        let key = CacheKey::new(Domain::Basketball, Action::Teams, Vec::<(&str, &str)>::new());
        let entry = CacheEntry::success(key.clone(), json!([]), Some(Duration::from_secs(60)), None);
        let now = entry.created_at;
        assert!(!entry.is_expired_at(now));
        assert!(entry.is_expired_at(now + chrono::Duration::seconds(60)));

        let voice = CacheEntry::success(key, json!([]), None, Some("nba球队".into()));
        assert!(voice.is_voice());
        assert!(!voice.is_expired_at(now + chrono::Duration::days(365)));
    }

    #[test]
    fn test_zero_ttl_is_immediately_stale() {
        let key = CacheKey::new(Domain::Football, Action::LiveMatches, Vec::<(&str, &str)>::new());
        let entry = CacheEntry::success(key, json!({}), Some(Duration::ZERO), None);
        assert!(entry.is_expired());
        assert!(!entry.is_fresh());
    }

    #[test]
    fn test_option_value_and_label() {
        let key = CacheKey::new(Domain::Motorsport, Action::DriverStandings, [("year", "2023")]);
        let entry = CacheEntry::success(key, json!({}), None, Some("2023年F1车手积分榜".into()));
        let option = QueryOption::from_entry(&entry);
        assert_eq!(option.value(), "2023");
        assert_eq!(option.label, "2023 driver standings");
        assert_eq!(option.key, entry.key.fingerprint());
    }
}
