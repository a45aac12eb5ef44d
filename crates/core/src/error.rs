//! Error types for SportsQuery.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Action, Domain, ErrorKind, Failure, Provider};

/// Result type alias using SportsQuery's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorKind {
    /// Transport-level failure (connect, timeout, 429, 5xx). Retried.
    Network,
    /// Well-formed rejection or malformed payload. Never retried.
    Upstream,
}

/// Normalized failure reported by a data provider.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{provider} {kind:?} error: {message}")]
pub struct SourceError {
    /// Provider that produced the failure.
    pub provider: Provider,
    /// Failure class.
    pub kind: SourceErrorKind,
    /// Human-readable description.
    pub message: String,
    /// HTTP status, when the provider answered at all.
    pub status: Option<u16>,
}

impl SourceError {
    /// Create a network-class error.
    pub fn network(provider: Provider, msg: impl Into<String>) -> Self {
        Self {
            provider,
            kind: SourceErrorKind::Network,
            message: msg.into(),
            status: None,
        }
    }

    /// Create an upstream-class error.
    pub fn upstream(provider: Provider, msg: impl Into<String>) -> Self {
        Self {
            provider,
            kind: SourceErrorKind::Upstream,
            message: msg.into(),
            status: None,
        }
    }

    /// Attach the HTTP status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind == SourceErrorKind::Network
    }
}

/// Core error type for SportsQuery.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Resolution Errors
    // =========================================================================
    #[error("Ambiguous domain: {}", display_domains(.0))]
    AmbiguousDomain(Vec<Domain>),

    #[error("Unresolved intent: {0}")]
    UnresolvedIntent(String),

    // =========================================================================
    // Dispatch Errors
    // =========================================================================
    #[error("No route for {domain}/{action}")]
    NoRoute { domain: Domain, action: Action },

    #[error("Vocabulary mismatch: {0}")]
    VocabularyMismatch(String),

    // =========================================================================
    // Source Errors
    // =========================================================================
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Rate limit wait for {provider} exceeded {waited_ms}ms")]
    RateLimitTimeout { provider: Provider, waited_ms: u64 },

    // =========================================================================
    // Store Errors
    // =========================================================================
    #[error("Cache entry corrupt: {0}")]
    CacheCorrupt(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn display_domains(domains: &[Domain]) -> String {
    domains
        .iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Create an unresolved intent error.
    pub fn unresolved(msg: impl Into<String>) -> Self {
        Self::UnresolvedIntent(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a corrupt cache entry error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::CacheCorrupt(msg.into())
    }

    /// Create a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Map onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AmbiguousDomain(_) => ErrorKind::AmbiguousDomain,
            Self::UnresolvedIntent(_) => ErrorKind::UnresolvedIntent,
            Self::Source(e) => match e.kind {
                SourceErrorKind::Network => ErrorKind::Network,
                SourceErrorKind::Upstream => ErrorKind::Upstream,
            },
            Self::RateLimitTimeout { .. } => ErrorKind::RateLimitTimeout,
            Self::CacheCorrupt(_) => ErrorKind::CacheCorrupt,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::NoRoute { .. }
            | Self::VocabularyMismatch(_)
            | Self::Storage(_)
            | Self::Config(_)
            | Self::Serialization(_)
            | Self::Internal(_)
            | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Convert into the serializable failure carried by envelopes.
    pub fn to_failure(&self) -> Failure {
        Failure::new(self.kind(), self.to_string())
    }
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        err.to_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let net: Error = SourceError::network(Provider::Espn, "reset").into();
        assert_eq!(net.kind(), ErrorKind::Network);

        let up: Error = SourceError::upstream(Provider::FootballData, "403").into();
        assert_eq!(up.kind(), ErrorKind::Upstream);

        let ambiguous = Error::AmbiguousDomain(vec![Domain::Football, Domain::Basketball]);
        assert_eq!(ambiguous.kind(), ErrorKind::AmbiguousDomain);
        assert!(ambiguous.to_string().contains("football, basketball"));

        assert_eq!(Error::internal("x").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_only_network_is_retryable() {
        assert!(SourceError::network(Provider::Ergast, "timeout").is_retryable());
        assert!(!SourceError::upstream(Provider::Ergast, "bad json").is_retryable());
    }
}
