//! Local session store.
//!
//! The signed-in user's minimal profile lives in the client's key/value
//! storage under a single key. Every function takes the store explicitly;
//! there is no ambient session.

use std::collections::HashMap;

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Storage key holding the serialized [`Session`].
pub const SESSION_KEY: &str = "user";

/// Synchronous key/value persistence scoped to one client.
pub trait KeyValueStore: Send + Sync {
    fn set(&self, key: &str, value: String);
    fn get(&self, key: &str) -> Option<String>;
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn set(&self, key: &str, value: String) {
        self.values.write().insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

/// Identity of the signed-in user as cached on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub email: String,
    #[serde(rename = "uid")]
    pub user_id: String,
}

impl Session {
    pub fn new(email: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            user_id: user_id.into(),
        }
    }
}

pub fn save_session(store: &dyn KeyValueStore, session: &Session) -> Result<()> {
    let raw = serde_json::to_string(session)?;
    store.set(SESSION_KEY, raw);
    Ok(())
}

/// Absent or unreadable entries both mean "guest".
pub fn load_session(store: &dyn KeyValueStore) -> Option<Session> {
    let raw = store.get(SESSION_KEY)?;
    match serde_json::from_str::<Session>(&raw) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring unreadable session entry");
            None
        }
    }
}

pub fn clear_session(store: &dyn KeyValueStore) {
    store.remove(SESSION_KEY);
}
