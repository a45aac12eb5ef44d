use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use sports_query_core::mocks::MockSourceClient;
use sports_query_core::{
    Action, CacheEntry, CacheKey, CacheStore, Domain, ErrorKind, Provider, Query, QueryOption,
    Result, SourceError,
};
use sports_query_gateway::{Dispatcher, KeywordResolver, QueryGateway, Vocabulary};
use sports_query_store::InMemoryCacheStore;

struct Harness {
    gateway: QueryGateway,
    source: Arc<MockSourceClient>,
    store: Arc<InMemoryCacheStore>,
}

fn harness(source: MockSourceClient, ttl: Duration) -> Harness {
    let store = Arc::new(InMemoryCacheStore::new(ttl));
    harness_with_store(source, store.clone(), store)
}

fn harness_with_store(
    source: MockSourceClient,
    backing: Arc<dyn CacheStore>,
    store: Arc<InMemoryCacheStore>,
) -> Harness {
    let vocabulary = Arc::new(Vocabulary::standard());
    let resolver = KeywordResolver::new(vocabulary.clone())
        .with_reference_date(NaiveDate::from_ymd_opt(2024, 5, 18).unwrap());
    let dispatcher = Arc::new(Dispatcher::new(vocabulary.clone()));
    let source = Arc::new(source);
    let gateway = QueryGateway::new(
        Arc::new(resolver),
        dispatcher,
        source.clone(),
        backing,
        vocabulary,
    )
    .unwrap();
    Harness {
        gateway,
        source,
        store,
    }
}

/// Store whose reads take a second, to widen the window between the cache
/// check and the upstream call.
struct SlowReads(Arc<InMemoryCacheStore>);

#[async_trait]
impl CacheStore for SlowReads {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        tokio::time::sleep(Duration::from_secs(1)).await;
        self.0.get(key).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<CacheEntry>> {
        self.0.get_by_id(id).await
    }

    async fn put(
        &self,
        key: CacheKey,
        payload: serde_json::Value,
        source_text: Option<String>,
    ) -> Result<CacheEntry> {
        self.0.put(key, payload, source_text).await
    }

    async fn promote(&self, entry: CacheEntry, source_text: String) -> Result<CacheEntry> {
        self.0.promote(entry, source_text).await
    }

    async fn put_failure(&self, key: CacheKey, message: &str, source_text: String) -> Result<bool> {
        self.0.put_failure(key, message, source_text).await
    }

    async fn list_options(&self, domain: Domain, action: Action) -> Result<Vec<QueryOption>> {
        self.0.list_options(domain, action).await
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool> {
        self.0.remove(key).await
    }

    async fn evict_expired(&self) -> Result<usize> {
        self.0.evict_expired().await
    }

    async fn clear(&self, domain: Option<Domain>) -> Result<usize> {
        self.0.clear(domain).await
    }
}

fn standings() -> serde_json::Value {
    json!({"standings": [{"team": "Arsenal", "points": 89}]})
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_asks_share_one_call() {
    let h = harness(
        MockSourceClient::new(standings()).with_delay(Duration::from_secs(2)),
        Duration::from_secs(3600),
    );
    let query = Query::typed("英超积分榜");

    let envelopes = join_all((0..8).map(|_| h.gateway.ask(&query))).await;

    assert_eq!(h.source.call_count(), 1);
    assert!(envelopes.iter().all(|e| e.success));
    assert!(envelopes.iter().all(|e| e.data == Some(standings())));
    assert_eq!(h.gateway.inflight_calls(), 0);

    let again = h.gateway.ask(&query).await;
    assert!(again.meta.cached);
    assert_eq!(h.source.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_leader_still_answers_followers() {
    let memory = Arc::new(InMemoryCacheStore::new(Duration::from_secs(3600)));
    let h = harness_with_store(
        MockSourceClient::new(standings()),
        Arc::new(SlowReads(memory.clone())),
        memory,
    );
    let query = Query::typed("英超积分榜");

    // The leader's caller gives up while the upstream call is still pending.
    let leader = tokio::time::timeout(Duration::from_millis(1800), h.gateway.ask(&query));
    let follower = async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        h.gateway.ask(&query).await
    };
    let (leader, follower) = tokio::join!(leader, follower);

    assert!(leader.is_err());
    assert!(follower.success, "follower failed: {:?}", follower.error);
    assert_eq!(follower.data, Some(standings()));
    assert_eq!(h.source.call_count(), 1);
    assert!(h.store.get(&CacheKey::new(Domain::Football, Action::Standings, [("league", "PL")]))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_team_spellings_share_a_key() {
    let h = harness(MockSourceClient::new(json!({"events": []})), Duration::from_secs(3600));

    let first = h.gateway.ask(&Query::typed("Lakers schedule")).await;
    let second = h.gateway.ask(&Query::typed("LAL schedule")).await;
    let third = h.gateway.ask(&Query::typed("lakers schedule")).await;

    assert!(first.success && second.success && third.success);
    assert_eq!(first.meta.key, second.meta.key);
    assert_eq!(second.meta.key, third.meta.key);
    assert!(second.meta.cached && third.meta.cached);
    assert_eq!(h.source.call_count(), 1);
}

#[tokio::test]
async fn test_network_failure_serves_stale_entry() {
    let h = harness(MockSourceClient::new(standings()), Duration::ZERO);
    let query = Query::typed("英超积分榜");

    let fresh = h.gateway.ask(&query).await;
    assert!(fresh.success);
    assert!(!fresh.meta.stale);

    h.source
        .set_error(SourceError::network(Provider::FootballData, "connection reset"));
    let stale = h.gateway.ask(&query).await;

    assert_eq!(h.source.call_count(), 2);
    assert!(stale.success);
    assert!(stale.meta.stale);
    assert_eq!(stale.data, Some(standings()));
}

#[tokio::test]
async fn test_upstream_failure_is_not_masked() {
    let h = harness(MockSourceClient::new(standings()), Duration::ZERO);
    let query = Query::typed("英超积分榜");
    assert!(h.gateway.ask(&query).await.success);

    h.source
        .set_error(SourceError::upstream(Provider::FootballData, "unknown competition").with_status(404));
    let envelope = h.gateway.ask(&query).await;

    assert!(!envelope.success);
    assert_eq!(envelope.error_kind(), Some(ErrorKind::Upstream));
    assert!(envelope.data.is_none());
}

#[tokio::test]
async fn test_unresolved_text_never_calls_upstream() {
    let h = harness(MockSourceClient::new(json!({})), Duration::from_secs(3600));

    let envelope = h.gateway.ask(&Query::typed("what's the weather")).await;
    assert_eq!(envelope.error_kind(), Some(ErrorKind::UnresolvedIntent));

    let envelope = h.gateway.ask(&Query::typed("足球和篮球")).await;
    assert_eq!(envelope.error_kind(), Some(ErrorKind::AmbiguousDomain));

    assert_eq!(h.source.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_call_times_out() {
    let h = harness(
        MockSourceClient::new(standings()).with_delay(Duration::from_secs(30)),
        Duration::from_secs(3600),
    );
    let gateway = h.gateway.with_inflight_timeout(Duration::from_secs(5));

    let envelope = gateway.ask(&Query::typed("英超积分榜")).await;
    assert_eq!(envelope.error_kind(), Some(ErrorKind::Timeout));
}

#[tokio::test]
async fn test_options_list_answered_queries() {
    let h = harness(MockSourceClient::new(standings()), Duration::from_secs(3600));

    h.gateway.ask(&Query::typed("足球积分榜")).await;
    h.gateway.ask(&Query::voice("西甲积分榜")).await;
    h.gateway.ask(&Query::typed("英超射手榜")).await;

    let options = h.gateway.options(Domain::Football, Action::Standings).await.unwrap();
    let values: Vec<String> = options.iter().map(|o| o.value()).collect();
    assert_eq!(values, vec!["PL", "PD"]);
    assert_eq!(options[0].label, "Premier League standings");
    assert_eq!(options[1].source_text.as_deref(), Some("西甲积分榜"));

    let entry = h.gateway.lookup(&options[1].key).await.unwrap().unwrap();
    assert!(entry.is_voice());
    assert_eq!(entry.ttl_secs, None);
}

#[tokio::test]
async fn test_voice_hit_promotes_entry() {
    let h = harness(MockSourceClient::new(standings()), Duration::from_secs(3600));

    let typed = h.gateway.ask(&Query::typed("英超积分榜")).await;
    let key = CacheKey::new(Domain::Football, Action::Standings, [("league", "PL")]);
    assert!(!h.store.get(&key).await.unwrap().unwrap().is_voice());

    let voice = h.gateway.ask(&Query::voice("英超积分榜")).await;
    assert!(voice.meta.cached);
    assert_eq!(voice.meta.key, typed.meta.key);
    assert_eq!(voice.meta.fetched_at, typed.meta.fetched_at);
    assert_eq!(h.source.call_count(), 1);

    let entry = h.store.get(&key).await.unwrap().unwrap();
    assert_eq!(entry.source_text.as_deref(), Some("英超积分榜"));
    assert_eq!(Some(entry.created_at), typed.meta.fetched_at);
    assert_eq!(entry.ttl_secs, None);
}

#[tokio::test]
async fn test_failed_voice_query_is_recorded() {
    let h = harness(
        MockSourceClient::new(json!({})),
        Duration::from_secs(3600),
    );
    h.source
        .set_error(SourceError::upstream(Provider::Espn, "team not found").with_status(404));

    let envelope = h.gateway.ask(&Query::voice("湖人队赛程")).await;
    assert!(!envelope.success);
    let id = envelope.meta.key.clone().unwrap();

    let entry = h.gateway.lookup(&id).await.unwrap().unwrap();
    assert!(!entry.success);
    assert_eq!(entry.source_text.as_deref(), Some("湖人队赛程"));

    let options = h
        .gateway
        .options(Domain::Basketball, Action::TeamSchedule)
        .await
        .unwrap();
    assert!(options.is_empty());

    let replayed = h.gateway.replay(&id).await;
    assert_eq!(replayed.error_kind(), Some(ErrorKind::Upstream));
}

#[tokio::test]
async fn test_clear_and_evict() {
    let h = harness(MockSourceClient::new(standings()), Duration::ZERO);

    h.gateway.ask(&Query::typed("英超积分榜")).await;
    h.gateway.ask(&Query::voice("西甲积分榜")).await;
    assert_eq!(h.store.len(), 2);

    // Only the typed entry carries a TTL.
    assert_eq!(h.gateway.evict_expired().await.unwrap(), 1);
    assert_eq!(h.gateway.clear(Some(Domain::Football)).await.unwrap(), 1);
    assert!(h.store.is_empty());
}

#[test]
fn test_parse_and_plan() {
    let h = harness(MockSourceClient::new(json!({})), Duration::from_secs(3600));
    let intent = h.gateway.parse("2023年F1车手积分榜").unwrap();
    assert_eq!(intent.slot("year"), Some("2023"));

    let (_, request) = h.gateway.plan("2023年F1车手积分榜").unwrap();
    assert_eq!(request.provider, Provider::Ergast);
}
