use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::domain::{Action, Domain};

// =============================================================================
// Intent Types (Resolver Output)
// =============================================================================

/// Canonical slot values keyed by slot name.
///
/// A `BTreeMap` keeps iteration order independent of insertion order.
pub type Slots = BTreeMap<String, String>;

/// Structured request resolved from free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Sport the query is about.
    pub domain: Domain,
    /// Requested operation.
    pub action: Action,
    /// Canonical slot values, defaults already substituted.
    pub slots: Slots,
}

impl Intent {
    /// Create an intent without slots.
    pub fn new(domain: Domain, action: Action) -> Self {
        Self {
            domain,
            action,
            slots: Slots::new(),
        }
    }

    /// Add a slot value.
    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(name.into(), value.into());
        self
    }

    /// Look up a slot value.
    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }
}

// =============================================================================
// Query Types (Gateway Input)
// =============================================================================

/// Where a query's text came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOrigin {
    /// Typed or machine-issued lookup. Cached with a TTL.
    #[default]
    Typed,
    /// Transcribed from speech. Kept as browsable history.
    Voice,
}

/// Text query submitted to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Normalized utterance.
    pub text: String,
    /// Origin of the text.
    #[serde(default)]
    pub origin: QueryOrigin,
}

impl Query {
    /// Create a typed query.
    pub fn typed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: QueryOrigin::Typed,
        }
    }

    /// Create a voice-originated query.
    pub fn voice(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: QueryOrigin::Voice,
        }
    }

    /// Whether the query came from speech.
    pub fn is_voice(&self) -> bool {
        self.origin == QueryOrigin::Voice
    }
}
