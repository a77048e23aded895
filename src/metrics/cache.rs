use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// A cached value together with how long it stays fresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Fresh<V> {
    pub value: V,
    pub remaining: Duration,
}

struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// In-process cache whose entries go stale a fixed time after they are stored.
///
/// Stale entries are not evicted eagerly; `get` simply stops returning them.
/// Concurrent misses may both recompute, the last `set` wins.
pub struct TtlCache<V> {
    ttl: Duration,
    clock: SharedClock,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the entry if its age is below the TTL.
    pub fn get(&self, key: &str) -> Option<Fresh<V>> {
        let now = self.clock.utc();
        let entries = self.lock();
        let entry = entries.get(key)?;
        // A clock that moved backwards yields a negative age; treat that as stale.
        let age = (now - entry.stored_at).to_std().ok()?;
        let remaining = self.ttl.checked_sub(age).filter(|r| !r.is_zero())?;
        Some(Fresh {
            value: entry.value.clone(),
            remaining,
        })
    }

    pub fn set(&self, key: &str, value: V) -> Fresh<V> {
        let stored_at = self.clock.utc();
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                stored_at,
            },
        );
        Fresh {
            value,
            remaining: self.ttl,
        }
    }

    /// Drop the entry; returns whether one existed.
    pub fn expire(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }
}
