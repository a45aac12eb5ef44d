//! End-to-end query path: keyword resolution, dispatch, rate-limited
//! provider channel and the SQLite-backed tiered cache.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use sports_query_core::config::CacheConfig;
use sports_query_core::mocks::MockTransport;
use sports_query_core::{Action, Domain, Provider, Query, SourceError};
use sports_query_gateway::{Dispatcher, KeywordResolver, QueryGateway, Vocabulary};
use sports_query_source::{ProviderChannel, RateLimitedSourceClient, RateLimiter, RetryPolicy};
use sports_query_store::TieredCacheStore;

async fn gateway(
    transport: Arc<MockTransport>,
    retry: RetryPolicy,
    cache: &CacheConfig,
) -> (QueryGateway, Arc<RateLimitedSourceClient>) {
    let vocabulary = Arc::new(Vocabulary::standard());
    let source = Arc::new(RateLimitedSourceClient::new());
    source.register(ProviderChannel::new(
        Provider::FootballData,
        transport,
        RateLimiter::new(Provider::FootballData, 10, Duration::from_secs(60)),
        retry,
    ));
    let store = Arc::new(TieredCacheStore::open(cache).await.unwrap());
    let gateway = QueryGateway::new(
        Arc::new(KeywordResolver::new(vocabulary.clone())),
        Arc::new(Dispatcher::new(vocabulary.clone())),
        source.clone(),
        store,
        vocabulary,
    )
    .unwrap();
    (gateway, source)
}

fn cache_config(dir: &tempfile::TempDir) -> CacheConfig {
    CacheConfig {
        default_ttl_secs: 3600,
        database_path: Some(dir.path().join("query_cache.db").to_string_lossy().into_owned()),
    }
}

#[tokio::test]
async fn test_voice_history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let cache = cache_config(&dir);

    let transport = Arc::new(MockTransport::ok(json!({"standings": [{"team": "Real Madrid"}]})));
    let (first, _) = gateway(transport.clone(), RetryPolicy::none(), &cache).await;

    let voice = first.ask(&Query::voice("西甲积分榜")).await;
    assert!(voice.success);
    let typed = first.ask(&Query::typed("英超积分榜")).await;
    assert!(typed.success);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].endpoint, "competitions/PD/standings");
    assert_eq!(requests[1].endpoint, "competitions/PL/standings");
    drop(first);

    let restarted_transport = Arc::new(MockTransport::ok(json!({})));
    let (second, _) = gateway(restarted_transport.clone(), RetryPolicy::none(), &cache).await;

    let replay = second.ask(&Query::typed("西甲积分榜")).await;
    assert!(replay.meta.cached);
    assert_eq!(replay.data, voice.data);
    assert_eq!(restarted_transport.call_count(), 0);

    // Only the voice entry was persisted.
    let options = second
        .options(Domain::Football, Action::Standings)
        .await
        .unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].value(), "PD");
    assert_eq!(options[0].label, "La Liga standings");
    assert_eq!(options[0].source_text.as_deref(), Some("西甲积分榜"));
}

#[tokio::test]
async fn test_transient_failure_is_retried_within_budget() {
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(MockTransport::ok(json!({"scorers": []})).with_script([Err(
        SourceError::network(Provider::FootballData, "connection reset"),
    )]));
    let retry = RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    };
    let (gateway, source) = gateway(transport.clone(), retry, &cache_config(&dir)).await;

    let envelope = gateway.ask(&Query::typed("英超射手榜")).await;

    assert!(envelope.success);
    assert_eq!(transport.call_count(), 2);
    let channel = source.channel(Provider::FootballData).unwrap();
    assert_eq!(channel.limiter().used().await, 2);
}

#[tokio::test]
async fn test_in_memory_only_cache() {
    let cache = CacheConfig {
        default_ttl_secs: 3600,
        database_path: None,
    };
    let transport = Arc::new(MockTransport::ok(json!({"matches": []})));
    let (gateway, _) = gateway(transport.clone(), RetryPolicy::none(), &cache).await;

    assert!(gateway.ask(&Query::voice("今天的足球比赛")).await.success);
    let again = gateway.ask(&Query::voice("今天的足球比赛")).await;
    assert!(again.meta.cached);
    assert_eq!(transport.call_count(), 1);
}
