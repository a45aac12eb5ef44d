use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use crate::types::Provider;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub cache: CacheConfig,
    pub retry: RetryConfig,
    pub rate_limit: RateLimitConfig,
    pub providers: ProvidersConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    /// Upper bound on waiting for another caller's in-flight call.
    /// Derived from the rate-limit window when unset.
    pub inflight_timeout_secs: Option<u64>,
    /// Period of the background expiry sweep; 0 disables it.
    pub sweep_interval_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            inflight_timeout_secs: None,
            sweep_interval_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL of machine-resolved entries.
    pub default_ttl_secs: u64,
    /// SQLite file holding the voice history. In-memory only when unset.
    pub database_path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 3600,
            database_path: Some("cache/query_cache.db".into()),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Rolling window length. Provider limits are counted per window.
    pub window_secs: u64,
    /// How many window rollovers a caller may wait before giving up.
    pub max_wait_windows: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_wait_windows: 2,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn max_wait(&self) -> Duration {
        self.window() * self.max_wait_windows
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_token: Option<Secret<String>>,
}

impl ProviderSettings {
    fn new(base_url: &str, requests_per_minute: u32) -> Self {
        Self {
            base_url: base_url.into(),
            requests_per_minute,
            timeout_secs: 30,
            api_token: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub ergast: ProviderSettings,
    pub football_data: ProviderSettings,
    pub espn: ProviderSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            ergast: ProviderSettings::new("https://api.jolpi.ca/ergast/f1", 60),
            football_data: ProviderSettings::new("https://api.football-data.org/v4", 10),
            espn: ProviderSettings::new(
                "https://site.api.espn.com/apis/site/v2/sports/basketball/nba",
                60,
            ),
        }
    }
}

impl ProvidersConfig {
    pub fn get(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::Ergast => &self.ergast,
            Provider::FootballData => &self.football_data,
            Provider::Espn => &self.espn,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("SPORTSQUERY_ENV").unwrap_or_else(|_| "development".into());

        let s = provider_defaults(Config::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__CACHE__DEFAULT_TTL_SECS=600 to cache.default_ttl_secs
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Bound on in-flight waits: every rate-limit wait plus one window for the call itself.
    pub fn inflight_timeout(&self) -> Duration {
        match self.gateway.inflight_timeout_secs {
            Some(secs) => Duration::from_secs(secs),
            None => self.rate_limit.max_wait() + self.rate_limit.window(),
        }
    }
}

/// Seed per-provider defaults so sources may override single fields.
fn provider_defaults(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = ProvidersConfig::default();
    for provider in Provider::ALL {
        let settings = defaults.get(provider);
        let prefix = format!("providers.{}", provider.as_str());
        builder = builder
            .set_default(format!("{}.base_url", prefix), settings.base_url.clone())?
            .set_default(
                format!("{}.requests_per_minute", prefix),
                settings.requests_per_minute as i64,
            )?
            .set_default(format!("{}.timeout_secs", prefix), settings.timeout_secs as i64)?;
    }
    Ok(builder)
}
