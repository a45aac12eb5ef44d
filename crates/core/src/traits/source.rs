//! Data source traits.

use async_trait::async_trait;

use crate::error::{Result, SourceError};
use crate::types::SourceRequest;

/// Raw provider payload.
pub type RawResult = serde_json::Value;

/// Wire-level access to a provider. One call, no retries, no rate limiting.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a single request.
    async fn fetch(&self, request: &SourceRequest) -> std::result::Result<RawResult, SourceError>;
}

/// Rate-limited, retrying access to every provider.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Execute a request, waiting for rate budget and retrying transient failures.
    async fn call(&self, request: &SourceRequest) -> Result<RawResult>;
}
