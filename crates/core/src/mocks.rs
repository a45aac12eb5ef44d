//! Mock implementations of core traits for testing.
//!
//! Shared by the source, store and gateway crates so their tests can script
//! provider behaviour and count upstream calls without touching the network.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    error::SourceError,
    traits::{IntentResolver, RawResult, SourceClient, Transport},
    types::{Action, Domain, Intent, SourceRequest},
    Error, Result,
};

// =============================================================================
// Mock Transport
// =============================================================================

/// Scripted transport. Each fetch pops the next scripted outcome and falls
/// back to the default outcome once the script is exhausted.
pub struct MockTransport {
    script: Mutex<VecDeque<std::result::Result<Value, SourceError>>>,
    default: Mutex<std::result::Result<Value, SourceError>>,
    requests: Mutex<Vec<SourceRequest>>,
    calls: AtomicUsize,
}

impl MockTransport {
    /// Transport that always answers with `payload`.
    pub fn ok(payload: Value) -> Self {
        Self::with_default(Ok(payload))
    }

    /// Transport that always fails with `err`.
    pub fn failing(err: SourceError) -> Self {
        Self::with_default(Err(err))
    }

    fn with_default(default: std::result::Result<Value, SourceError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default: Mutex::new(default),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue outcomes returned before the default one.
    pub fn with_script(
        self,
        outcomes: impl IntoIterator<Item = std::result::Result<Value, SourceError>>,
    ) -> Self {
        self.script.lock().unwrap().extend(outcomes);
        self
    }

    /// Number of fetches performed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<SourceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: &SourceRequest) -> std::result::Result<RawResult, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome,
            None => self.default.lock().unwrap().clone(),
        }
    }
}

// =============================================================================
// Mock Source Client
// =============================================================================

/// Source client with a settable outcome, optional latency and a call counter.
pub struct MockSourceClient {
    outcome: Mutex<std::result::Result<Value, SourceError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSourceClient {
    /// Client answering every call with `payload`.
    pub fn new(payload: Value) -> Self {
        Self {
            outcome: Mutex::new(Ok(payload)),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering. Uses tokio time, so paused tests stay deterministic.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer subsequent calls with `payload`.
    pub fn set_payload(&self, payload: Value) {
        *self.outcome.lock().unwrap() = Ok(payload);
    }

    /// Fail subsequent calls with `err`.
    pub fn set_error(&self, err: SourceError) {
        *self.outcome.lock().unwrap() = Err(err);
    }

    /// Number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceClient for MockSourceClient {
    async fn call(&self, _request: &SourceRequest) -> Result<RawResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.outcome.lock().unwrap().clone();
        outcome.map_err(Error::from)
    }
}

// =============================================================================
// Mock Resolver
// =============================================================================

/// Resolver backed by a fixed text-to-intent table.
#[derive(Default)]
pub struct MockResolver {
    table: HashMap<String, Intent>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the intent returned for `text`.
    pub fn with(mut self, text: &str, intent: Intent) -> Self {
        self.table.insert(text.to_string(), intent);
        self
    }
}

impl IntentResolver for MockResolver {
    fn resolve(&self, text: &str) -> Result<Intent> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| Error::unresolved(format!("no intent for '{}'", text)))
    }

    fn actions(&self) -> Vec<(Domain, Action)> {
        let mut actions: Vec<_> = self.table.values().map(|i| (i.domain, i.action)).collect();
        actions.sort();
        actions.dedup();
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provider;
    use serde_json::json;

    #[tokio::test]
    async fn test_transport_script_then_default() {
        let transport = MockTransport::ok(json!({"ok": true}))
            .with_script([Err(SourceError::network(Provider::Espn, "reset"))]);
        let req = SourceRequest::new(Provider::Espn, "teams");

        assert!(transport.fetch(&req).await.is_err());
        assert_eq!(transport.fetch(&req).await.unwrap(), json!({"ok": true}));
        assert_eq!(transport.call_count(), 2);
        assert_eq!(transport.requests()[0].endpoint, "teams");
    }

    #[tokio::test]
    async fn test_source_client_outcome_switch() {
        let client = MockSourceClient::new(json!(1));
        let req = SourceRequest::new(Provider::Ergast, "2023.json");
        assert_eq!(client.call(&req).await.unwrap(), json!(1));

        client.set_error(SourceError::upstream(Provider::Ergast, "404"));
        assert!(client.call(&req).await.is_err());
        assert_eq!(client.call_count(), 2);
    }
}
