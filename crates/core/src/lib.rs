#![deny(unused)]
//! Core types, traits, and error definitions for SportsQuery.
//!
//! This crate provides the building blocks shared by the source client,
//! the cache store and the gateway: intents, source requests, cache keys
//! and entries, the result envelope, and the error taxonomy.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result, SourceError, SourceErrorKind};
pub use traits::*;
pub use types::*;
