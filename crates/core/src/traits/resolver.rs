//! Intent resolution traits.

use crate::error::Result;
use crate::types::{Action, Domain, Intent};

/// Resolver turning normalized text into a canonical intent.
pub trait IntentResolver: Send + Sync {
    /// Resolve free text into an intent with defaults substituted.
    fn resolve(&self, text: &str) -> Result<Intent>;

    /// Every `(domain, action)` pair this resolver can produce.
    fn actions(&self) -> Vec<(Domain, Action)>;
}
