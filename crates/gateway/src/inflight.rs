//! Single in-flight upstream call per cache key.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use sports_query_core::{CacheEntry, CacheKey, ErrorKind, Failure};

/// Result shared with every caller waiting on a key.
pub type Outcome = std::result::Result<CacheEntry, Failure>;

type Calls = DashMap<CacheKey, watch::Receiver<Option<Outcome>>>;

/// Per-key coordination point for upstream calls.
///
/// The first caller for a key becomes the leader and receives a
/// [`Ticket`]; later callers get a receiver for the leader's outcome.
/// Entries are removed as soon as the leader completes or drops its ticket.
#[derive(Default)]
pub struct InflightRegistry {
    calls: Arc<Calls>,
}

/// Role of a caller for one key.
pub enum Join {
    Leader(Ticket),
    Follower(watch::Receiver<Option<Outcome>>),
}

/// Leader's obligation to publish an outcome.
pub struct Ticket {
    key: CacheKey,
    sender: watch::Sender<Option<Outcome>>,
    calls: Arc<Calls>,
}

impl Ticket {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Receiver the leader itself can wait on.
    pub fn subscribe(&self) -> watch::Receiver<Option<Outcome>> {
        self.sender.subscribe()
    }

    /// Publish the outcome to every waiter and release the key.
    pub fn complete(self, outcome: Outcome) {
        // Publishing can only fail when nobody is waiting, which is fine.
        let _ = self.sender.send(Some(outcome));
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.calls.remove(&self.key);
    }
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `key`.
    pub fn join(&self, key: &CacheKey) -> Join {
        match self.calls.entry(key.clone()) {
            Entry::Occupied(occupied) => Join::Follower(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let (sender, receiver) = watch::channel(None);
                vacant.insert(receiver);
                Join::Leader(Ticket {
                    key: key.clone(),
                    sender,
                    calls: self.calls.clone(),
                })
            }
        }
    }

    /// Keys with a call in flight.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Wait for a leader's outcome, at most `timeout`.
///
/// Returns `None` when the leader released the key without publishing,
/// in which case the caller should join again.
pub async fn wait(
    mut receiver: watch::Receiver<Option<Outcome>>,
    timeout: Duration,
) -> Option<Outcome> {
    let waited = tokio::time::timeout(timeout, async {
        receiver
            .wait_for(Option::is_some)
            .await
            .map(|value| value.clone())
    })
    .await;

    match waited {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) => None,
        Err(_) => Some(Err(Failure::new(
            ErrorKind::Timeout,
            format!("no result within {}s", timeout.as_secs()),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sports_query_core::{Action, Domain};

    fn key() -> CacheKey {
        CacheKey::new(Domain::Football, Action::Standings, [("league", "PL")])
    }

    #[tokio::test]
    async fn test_followers_share_leader_outcome() {
        let registry = InflightRegistry::new();
        let Join::Leader(ticket) = registry.join(&key()) else {
            panic!("first caller must lead");
        };
        let Join::Follower(follower) = registry.join(&key()) else {
            panic!("second caller must follow");
        };
        assert_eq!(registry.len(), 1);

        let entry = CacheEntry::success(key(), json!({"table": []}), None, None);
        ticket.complete(Ok(entry.clone()));

        let outcome = wait(follower, Duration::from_secs(1)).await.unwrap();
        assert_eq!(outcome.unwrap(), entry);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_ticket_releases_key() {
        let registry = InflightRegistry::new();
        let Join::Leader(ticket) = registry.join(&key()) else {
            panic!("first caller must lead");
        };
        let Join::Follower(follower) = registry.join(&key()) else {
            panic!("second caller must follow");
        };
        drop(ticket);

        assert!(wait(follower, Duration::from_secs(1)).await.is_none());
        assert!(matches!(registry.join(&key()), Join::Leader(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_bounded() {
        let registry = InflightRegistry::new();
        let Join::Leader(ticket) = registry.join(&key()) else {
            panic!("first caller must lead");
        };

        let failure = wait(ticket.subscribe(), Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Timeout);
    }
}
