#![deny(unused)]
//! Query gateway for SportsQuery.
//!
//! This crate turns free-text sports questions into provider calls:
//! keyword intent resolution, request dispatch, single-flight
//! deduplication, and the cache-first query path.

pub mod dispatcher;
pub mod gateway;
pub mod inflight;
pub mod resolver;
pub mod tracing_layer;
pub mod vocabulary;

pub use dispatcher::Dispatcher;
pub use gateway::QueryGateway;
pub use inflight::InflightRegistry;
pub use resolver::KeywordResolver;
pub use tracing_layer::configure_tracing;
pub use vocabulary::Vocabulary;
