use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::Provider;

// =============================================================================
// Source Request Types (Dispatcher Output)
// =============================================================================

/// Fully resolved, provider-addressable call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRequest {
    /// Provider to call.
    pub provider: Provider,
    /// Endpoint path relative to the provider base URL.
    pub endpoint: String,
    /// Query parameters in the order the provider expects them.
    pub params: Vec<(String, String)>,
}

impl SourceRequest {
    /// Create a request without parameters.
    pub fn new(provider: Provider, endpoint: impl Into<String>) -> Self {
        Self {
            provider,
            endpoint: endpoint.into(),
            params: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }
}

impl fmt::Display for SourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.endpoint)?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, k, v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_param_order() {
        let req = SourceRequest::new(Provider::FootballData, "matches")
            .with_param("dateFrom", "2024-05-01")
            .with_param("dateTo", "2024-05-01");
        assert_eq!(
            req.to_string(),
            "football_data:matches?dateFrom=2024-05-01&dateTo=2024-05-01"
        );
    }
}
