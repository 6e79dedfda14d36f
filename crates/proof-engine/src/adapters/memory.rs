use crate::domain::errors::StoreError;
use crate::ports::outbound::KeyValueStore;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Minimum time between sweeps of expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    /// `None` never expires.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-memory key-value store with lazy expiry.
///
/// Expiry is checked on read against `tokio::time::Instant`, so paused-time
/// tests can advance past a TTL without sleeping. Writes also sweep out
/// expired entries, at most once per `SWEEP_INTERVAL`.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    data: RwLock<HashMap<String, Entry>>,
    /// Earliest time the next write sweeps; `None` before the first write.
    next_sweep: Mutex<Option<Instant>>,
    unavailable: AtomicBool,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value that never expires. Used to seed subscriptions.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.write().insert(
            key.into(),
            Entry {
                value: value.into(),
                expires_at: None,
            },
        );
    }

    /// Remaining lifetime of `key`, or `None` if absent, expired or
    /// persistent.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let expires_at = self.data.read().get(key)?.expires_at?;
        (expires_at > now).then(|| expires_at - now)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data
            .read()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simulate an outage: every operation fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Entries held in memory, expired or not.
    #[cfg(test)]
    fn held(&self) -> usize {
        self.data.read().len()
    }

    fn sweep_due(&self, now: Instant) -> bool {
        let mut next_sweep = self.next_sweep.lock();
        if next_sweep.map_or(false, |at| now < at) {
            return false;
        }
        *next_sweep = Some(now + SWEEP_INTERVAL);
        true
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        self.check_available()?;
        let now = Instant::now();
        let entry = Entry {
            value,
            expires_at: Some(now + ttl),
        };

        let mut data = self.data.write();
        if self.sweep_due(now) {
            data.retain(|_, entry| entry.is_live(now));
        }
        data.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_available()?;
        let now = Instant::now();
        let mut data = self.data.write();
        match data.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                data.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
