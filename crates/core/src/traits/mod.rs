//! Core traits for SportsQuery.
//!
//! Traits are organized by component:
//! - `resolver`: free text to intent (IntentResolver)
//! - `source`: provider access (Transport, SourceClient)
//! - `store`: result cache (CacheStore)

pub mod resolver;
pub mod source;
pub mod store;

pub use resolver::*;
pub use source::*;
pub use store::*;
