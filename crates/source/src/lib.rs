#![deny(unused)]
//! Rate-limited source client for SportsQuery.
//!
//! This crate provides:
//! - Per-provider rolling-window rate limiting with bounded waits
//! - A shared exponential backoff policy for transient failures
//! - The reqwest transport speaking to the sports data providers

pub mod client;
pub mod http;
pub mod rate_limit;
pub mod retry;

pub use client::{ProviderChannel, ProviderStats, RateLimitedSourceClient};
pub use http::HttpTransport;
pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;
