//! Query gateway: resolve, check the cache, call upstream once per key.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use sports_query_core::{
    Action, CacheEntry, CacheKey, CacheStore, Domain, ErrorKind, Failure, Intent, IntentResolver,
    Query, QueryOption, Result, ResultEnvelope, SourceClient, SourceRequest,
};

use crate::dispatcher::Dispatcher;
use crate::inflight::{self, InflightRegistry, Join, Outcome, Ticket};
use crate::vocabulary::Vocabulary;

/// Default bound on waiting for an in-flight call.
const DEFAULT_INFLIGHT_TIMEOUT: Duration = Duration::from_secs(180);

/// Attempts to join a call before giving up on leaders that vanish.
const MAX_JOINS: usize = 3;

/// Orchestrates resolver, dispatcher, source client and cache store.
///
/// Every request walks `Resolving -> CacheCheck -> (Hit | Dispatching ->
/// Calling -> Storing) -> Done`, and can end in `Failed` from any step.
/// Failures are returned inside the envelope, never as `Err`.
pub struct QueryGateway {
    resolver: Arc<dyn IntentResolver>,
    dispatcher: Arc<Dispatcher>,
    source: Arc<dyn SourceClient>,
    store: Arc<dyn CacheStore>,
    vocabulary: Arc<Vocabulary>,
    inflight: InflightRegistry,
    inflight_timeout: Duration,
}

impl QueryGateway {
    /// Wire the gateway. Fails when the resolver can produce an action the
    /// dispatcher has no route for.
    pub fn new(
        resolver: Arc<dyn IntentResolver>,
        dispatcher: Arc<Dispatcher>,
        source: Arc<dyn SourceClient>,
        store: Arc<dyn CacheStore>,
        vocabulary: Arc<Vocabulary>,
    ) -> Result<Self> {
        dispatcher.validate(&resolver.actions())?;
        Ok(Self {
            resolver,
            dispatcher,
            source,
            store,
            vocabulary,
            inflight: InflightRegistry::new(),
            inflight_timeout: DEFAULT_INFLIGHT_TIMEOUT,
        })
    }

    /// Bound waits on in-flight calls.
    pub fn with_inflight_timeout(mut self, timeout: Duration) -> Self {
        self.inflight_timeout = timeout;
        self
    }

    /// Keys with an upstream call in flight.
    pub fn inflight_calls(&self) -> usize {
        self.inflight.len()
    }

    // =========================================================================
    // Query path
    // =========================================================================

    /// Answer a query.
    pub async fn ask(&self, query: &Query) -> ResultEnvelope {
        // Resolving
        let intent = match self.resolver.resolve(&query.text) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::info!(text = %query.text, error = %e, "Query not resolved");
                return ResultEnvelope::err(e.to_failure());
            }
        };
        let key = CacheKey::from_intent(&intent);
        tracing::debug!(key = %key, voice = query.is_voice(), "Intent resolved, checking cache");

        // CacheCheck
        let cached = self.lookup_entry(&key).await;
        if let Some(entry) = cached.as_ref().filter(|e| e.is_fresh()) {
            tracing::debug!(key = %key, "Cache hit");
            let entry = self.remember(query, entry.clone()).await;
            return ResultEnvelope::from_entry(&entry).cached().with_intent(intent);
        }

        // Dispatching
        tracing::debug!(key = %key, entry_present = cached.is_some(), "Cache miss");
        let request = match self.dispatcher.build(&intent) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Dispatch failed");
                return ResultEnvelope::err(e.to_failure()).with_intent(intent);
            }
        };

        // Calling & Storing
        let source_text = query.is_voice().then(|| query.text.clone());
        match self.fetch(&key, request, source_text).await {
            Ok(entry) => {
                let entry = self.remember(query, entry).await;
                ResultEnvelope::from_entry(&entry).with_intent(intent)
            }
            Err(failure) => self.on_failure(query, intent, key, failure).await,
        }
    }

    /// Resolve text without calling anything.
    pub fn parse(&self, text: &str) -> Result<Intent> {
        self.resolver.resolve(text)
    }

    /// Build the provider request a text would trigger.
    pub fn plan(&self, text: &str) -> Result<(Intent, SourceRequest)> {
        let intent = self.resolver.resolve(text)?;
        let request = self.dispatcher.build(&intent)?;
        Ok((intent, request))
    }

    async fn lookup_entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.store.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Single upstream call per key; late arrivals wait for the leader.
    async fn fetch(
        &self,
        key: &CacheKey,
        request: SourceRequest,
        source_text: Option<String>,
    ) -> Outcome {
        for _ in 0..MAX_JOINS {
            let receiver = match self.inflight.join(key) {
                Join::Follower(receiver) => {
                    tracing::debug!(key = %key, "Joining in-flight call");
                    receiver
                }
                Join::Leader(ticket) => {
                    let receiver = ticket.subscribe();
                    self.spawn_call(ticket, request.clone(), source_text.clone());
                    receiver
                }
            };
            match inflight::wait(receiver, self.inflight_timeout).await {
                Some(outcome) => return outcome,
                None => tracing::warn!(key = %key, "In-flight call ended without a result, rejoining"),
            }
        }
        Err(Failure::new(
            ErrorKind::Internal,
            "in-flight call ended without a result",
        ))
    }

    /// Run the upstream call for a leader on its own task.
    ///
    /// Nothing may await between joining as leader and this spawn, otherwise a
    /// cancelled caller would release the key without publishing an outcome.
    fn spawn_call(&self, ticket: Ticket, request: SourceRequest, source_text: Option<String>) {
        let source = self.source.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            let key = ticket.key().clone();

            // The previous leader may have finished between our cache check and join.
            match store.get(&key).await {
                Ok(Some(entry)) if entry.is_fresh() => {
                    tracing::debug!(key = %key, "Entry stored by previous call");
                    ticket.complete(Ok(entry));
                    return;
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(key = %key, error = %e, "Cache read failed, calling source"),
            }

            tracing::debug!(key = %key, request = %request, "Calling source");
            let outcome = match source.call(&request).await {
                Ok(payload) => store
                    .put(key.clone(), payload, source_text)
                    .await
                    .map_err(|e| e.to_failure()),
                Err(e) => Err(e.to_failure()),
            };
            match &outcome {
                Ok(_) => tracing::debug!(key = %key, "Result stored"),
                Err(failure) => {
                    tracing::debug!(key = %key, kind = ?failure.kind, "Source call failed")
                }
            }
            ticket.complete(outcome);
        });
    }

    /// Record voice provenance for an entry served to a voice query.
    async fn remember(&self, query: &Query, entry: CacheEntry) -> CacheEntry {
        if !query.is_voice() || entry.is_voice() {
            return entry;
        }
        match self.store.promote(entry.clone(), query.text.clone()).await {
            Ok(promoted) => {
                tracing::debug!(key = %promoted.key, "Entry promoted into voice history");
                promoted
            }
            Err(e) => {
                tracing::warn!(key = %entry.key, error = %e, "Failed to promote entry");
                entry
            }
        }
    }

    async fn on_failure(
        &self,
        query: &Query,
        intent: Intent,
        key: CacheKey,
        failure: Failure,
    ) -> ResultEnvelope {
        if failure.kind == ErrorKind::Network {
            if let Some(stale) = self.lookup_entry(&key).await.filter(|e| e.success) {
                tracing::warn!(key = %key, error = %failure, "Serving stale entry after network failure");
                return ResultEnvelope::from_entry(&stale).stale().with_intent(intent);
            }
        }

        tracing::warn!(key = %key, kind = ?failure.kind, error = %failure, "Query failed");
        if query.is_voice() {
            if let Err(e) = self
                .store
                .put_failure(key.clone(), &failure.message, query.text.clone())
                .await
            {
                tracing::warn!(key = %key, error = %e, "Failed to record failed voice query");
            }
        }
        ResultEnvelope::err(failure)
            .with_key(key.fingerprint())
            .with_intent(intent)
    }

    // =========================================================================
    // History browsing & maintenance
    // =========================================================================

    /// Previously answered queries for an action, with display labels.
    pub async fn options(&self, domain: Domain, action: Action) -> Result<Vec<QueryOption>> {
        let mut options = self.store.list_options(domain, action).await?;
        for option in &mut options {
            option.label = self.label(domain, action, option);
        }
        Ok(options)
    }

    fn label(&self, domain: Domain, action: Action, option: &QueryOption) -> String {
        let mut values: Vec<&str> = option
            .slots
            .iter()
            .map(|(slot_name, value)| {
                self.vocabulary
                    .display_name(domain, slot_name, value)
                    .unwrap_or(value)
            })
            .collect();
        if domain == Domain::Motorsport {
            values.push("F1");
        }
        if values.is_empty() {
            format!("{} {}", domain, action.title())
        } else {
            format!("{} {}", values.join(" "), action.title())
        }
    }

    /// Point lookup by key fingerprint.
    pub async fn lookup(&self, id: &str) -> Result<Option<CacheEntry>> {
        self.store.get_by_id(id).await
    }

    /// Envelope for a stored entry, as served from history.
    pub async fn replay(&self, id: &str) -> ResultEnvelope {
        match self.lookup(id).await {
            Ok(Some(entry)) if entry.success => {
                let envelope = ResultEnvelope::from_entry(&entry);
                if entry.is_expired() {
                    envelope.stale()
                } else {
                    envelope.cached()
                }
            }
            Ok(Some(entry)) => {
                let message = entry
                    .payload
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("recorded failure")
                    .to_string();
                ResultEnvelope::err(Failure::new(ErrorKind::Upstream, message)).with_key(id)
            }
            Ok(None) => ResultEnvelope::err(Failure::new(
                ErrorKind::UnresolvedIntent,
                format!("no cached entry '{}'", id),
            )),
            Err(e) => ResultEnvelope::err(e.to_failure()),
        }
    }

    pub async fn evict_expired(&self) -> Result<usize> {
        self.store.evict_expired().await
    }

    pub async fn clear(&self, domain: Option<Domain>) -> Result<usize> {
        self.store.clear(domain).await
    }

    /// Periodically evict expired entries.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let gateway = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match gateway.evict_expired().await {
                    Ok(0) => {}
                    Ok(evicted) => tracing::debug!(evicted, "Sweeper evicted expired entries"),
                    Err(e) => tracing::warn!(error = %e, "Sweeper failed"),
                }
            }
        })
    }
}
