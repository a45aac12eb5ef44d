//! Provider registry and the rate-limited source client.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sports_query_core::{
    config::AppConfig, Error, Provider, RawResult, Result, SourceClient, SourceRequest, Transport,
};

use crate::http::HttpTransport;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;

/// Attempt counters for one provider.
#[derive(Debug, Default)]
pub struct ProviderStats {
    /// Attempts issued, retries included.
    pub attempts: AtomicU64,
    /// Attempts that failed.
    pub failures: AtomicU64,
}

impl ProviderStats {
    fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of attempts that failed.
    pub fn failure_rate(&self) -> f64 {
        let attempts = self.attempts.load(Ordering::Relaxed);
        if attempts == 0 {
            0.0
        } else {
            self.failures.load(Ordering::Relaxed) as f64 / attempts as f64
        }
    }
}

/// Everything needed to talk to one provider.
pub struct ProviderChannel {
    provider: Provider,
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    stats: ProviderStats,
}

impl ProviderChannel {
    pub fn new(
        provider: Provider,
        transport: Arc<dyn Transport>,
        limiter: RateLimiter,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            transport,
            limiter,
            retry,
            stats: ProviderStats::default(),
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn stats(&self) -> &ProviderStats {
        &self.stats
    }

    /// Run a request: one rate-limit slot per attempt, backoff between attempts.
    pub async fn execute(&self, request: &SourceRequest) -> Result<RawResult> {
        let mut attempt = 0;
        loop {
            self.limiter.acquire().await?;
            self.stats.record_attempt();

            match self.transport.fetch(request).await {
                Ok(raw) => {
                    tracing::debug!(provider = %self.provider, request = %request, attempt, "Source call succeeded");
                    return Ok(raw);
                }
                Err(err) => {
                    self.stats.record_failure();
                    if !self.retry.should_retry(attempt, &err) {
                        tracing::warn!(
                            provider = %self.provider,
                            request = %request,
                            attempt,
                            failure_rate = self.stats.failure_rate(),
                            error = %err,
                            "Source call failed"
                        );
                        return Err(err.into());
                    }
                    let delay = self.retry.delay_for(attempt);
                    tracing::info!(
                        provider = %self.provider,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying source call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Source client dispatching each request to its provider's channel.
#[derive(Default)]
pub struct RateLimitedSourceClient {
    channels: DashMap<Provider, Arc<ProviderChannel>>,
}

impl RateLimitedSourceClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP channels for every provider from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = Self::new();
        let retry = RetryPolicy::from_config(&config.retry);
        for provider in Provider::ALL {
            let settings = config.providers.get(provider);
            let transport = Arc::new(HttpTransport::new(provider, settings)?);
            let limiter = RateLimiter::new(
                provider,
                settings.requests_per_minute,
                config.rate_limit.window(),
            )
            .with_max_wait(config.rate_limit.max_wait());
            client.register(ProviderChannel::new(provider, transport, limiter, retry));
            tracing::debug!(
                provider = %provider,
                base_url = %settings.base_url,
                requests_per_minute = settings.requests_per_minute,
                "Registered source"
            );
        }
        Ok(client)
    }

    /// Register or replace a provider channel.
    pub fn register(&self, channel: ProviderChannel) {
        self.channels.insert(channel.provider, Arc::new(channel));
    }

    /// Channel for a provider.
    pub fn channel(&self, provider: Provider) -> Option<Arc<ProviderChannel>> {
        self.channels.get(&provider).map(|c| c.value().clone())
    }
}

#[async_trait]
impl SourceClient for RateLimitedSourceClient {
    async fn call(&self, request: &SourceRequest) -> Result<RawResult> {
        // No map guard may be held across the await.
        let channel = self
            .channel(request.provider)
            .ok_or_else(|| Error::internal(format!("No source registered for {}", request.provider)))?;
        channel.execute(request).await
    }
}
