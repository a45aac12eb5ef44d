//! Core type definitions for SportsQuery.
//!
//! This module contains the data structures passed between the resolver,
//! dispatcher, source client, cache store and gateway.

pub mod cache;
pub mod domain;
pub mod envelope;
pub mod intent;
pub mod request;

pub use cache::*;
pub use domain::*;
pub use envelope::*;
pub use intent::*;
pub use request::*;
