//! HTTP transport for the sports data providers.

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use secrecy::{ExposeSecret, Secret};
use url::Url;

use sports_query_core::{
    config::ProviderSettings, Error, Provider, RawResult, Result, SourceError, SourceRequest,
    Transport,
};

/// Header carrying the football-data.org API token.
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Single-attempt reqwest transport bound to one provider.
pub struct HttpTransport {
    provider: Provider,
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<Secret<String>>,
}

impl HttpTransport {
    /// Build a transport from provider settings.
    pub fn new(provider: Provider, settings: &ProviderSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("sportsquery/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            provider,
            client,
            base_url: parse_base_url(&settings.base_url)?,
            api_token: settings.api_token.clone(),
        })
    }

    /// Full URL for a request, query parameters in request order.
    pub fn url_for(&self, request: &SourceRequest) -> std::result::Result<Url, SourceError> {
        let mut url = self
            .base_url
            .join(request.endpoint.trim_start_matches('/'))
            .map_err(|e| SourceError::upstream(self.provider, format!("invalid endpoint: {}", e)))?;
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(request.params.iter());
        }
        Ok(url)
    }
}

/// Parse a base URL, making sure relative joins append to its path.
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| Error::internal(format!("Invalid base URL '{}': {}", raw, e)))
}

/// Classify a non-success HTTP status.
pub fn classify_status(provider: Provider, status: StatusCode, body: &str) -> SourceError {
    let snippet: String = body.chars().take(200).collect();
    let message = format!("HTTP {}: {}", status.as_u16(), snippet);
    let err = if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        SourceError::network(provider, message)
    } else {
        SourceError::upstream(provider, message)
    };
    err.with_status(status.as_u16())
}

fn classify_transport(provider: Provider, err: reqwest::Error) -> SourceError {
    if err.is_decode() {
        SourceError::upstream(provider, format!("malformed payload: {}", err))
    } else {
        SourceError::network(provider, err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: &SourceRequest) -> std::result::Result<RawResult, SourceError> {
        let url = self.url_for(request)?;
        tracing::debug!(provider = %self.provider, url = %url, "Fetching");

        let mut builder = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.api_token {
            builder = builder.header(AUTH_TOKEN_HEADER, token.expose_secret().as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_transport(self.provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(self.provider, status, &body));
        }

        response
            .json::<RawResult>()
            .await
            .map_err(|e| classify_transport(self.provider, e))
    }
}
