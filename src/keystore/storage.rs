use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session-scoped key/value storage.
///
/// Everything written here is expected to vanish when the session ends;
/// the in-memory implementation below models a browser's session storage.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Returns the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Option<String>;
    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String);
    /// Removes `key`. Missing keys are ignored.
    async fn remove(&self, key: &str);
}

/// An in-memory, session-scoped storage backend.
#[derive(Clone, Default)]
pub struct MemorySessionStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStorage {
    /// Creates a new empty `MemorySessionStorage`.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }
}

/// A time source, injectable so expiry can be tested with simulated time.
pub trait Clock: Send + Sync {
    /// The current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
