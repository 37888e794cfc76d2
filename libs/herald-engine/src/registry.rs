use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One subscription as seen by a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub name: String,
    pub endpoint: String,
}

/// Topic name → (subscription name → endpoint).
///
/// Registrations and fan-out lookups share one lock. Lookups hand out an
/// owned snapshot, so a fan-out never iterates the live map.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    topics: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` under `topic` to `endpoint`. Last writer wins.
    ///
    /// Returns the endpoint that was replaced, if any.
    pub fn register(&self, topic: &str, name: &str, endpoint: &str) -> Option<String> {
        let mut guard = self.write();
        guard
            .entry(topic.to_string())
            .or_default()
            .insert(name.to_string(), endpoint.to_string())
    }

    /// Current subscribers of `topic`, ordered by subscription name.
    /// Unknown topics have none.
    pub fn subscribers_for(&self, topic: &str) -> Vec<Subscriber> {
        let guard = self.read();
        let mut subs: Vec<Subscriber> = guard
            .get(topic)
            .map(|subs| {
                subs.iter()
                    .map(|(name, endpoint)| Subscriber {
                        name: name.clone(),
                        endpoint: endpoint.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        subs.sort_by(|a, b| a.name.cmp(&b.name));
        subs
    }

    /// Total number of subscriptions across all topics.
    pub fn len(&self) -> usize {
        self.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, HashMap<String, String>>> {
        match self.topics.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("subscription registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, HashMap<String, String>>> {
        match self.topics.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("subscription registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
