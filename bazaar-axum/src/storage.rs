use std::collections::HashMap;
use std::sync::Arc;

use bazaar_core::MemoryKeyValueStore;
use parking_lot::RwLock;
use uuid::Uuid;

/// Cookie naming the browser's server-side storage.
pub const SESSION_COOKIE: &str = "bazaar_sid";

/// One browser's storage, as resolved for a request.
pub struct BrowserStorage {
    pub id: String,
    pub store: Arc<MemoryKeyValueStore>,
    /// `true` when the id was made up for this request and is not known
    /// to the browser yet.
    pub issued: bool,
}

impl BrowserStorage {
    pub fn set_cookie(&self) -> String {
        format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id)
    }
}

/// Per-browser key/value stores, keyed by the session cookie.
///
/// Only stores holding data are kept: a request that leaves its store
/// empty leaves nothing behind in the registry.
#[derive(Default)]
pub struct StorageRegistry {
    stores: RwLock<HashMap<String, Arc<MemoryKeyValueStore>>>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage for `id`, or a fresh, unregistered one when the id is
    /// missing or unknown.
    pub fn resolve(&self, id: Option<&str>) -> BrowserStorage {
        if let Some(id) = id {
            if let Some(store) = self.stores.read().get(id) {
                return BrowserStorage {
                    id: id.to_string(),
                    store: Arc::clone(store),
                    issued: false,
                };
            }
        }

        BrowserStorage {
            id: Uuid::new_v4().simple().to_string(),
            store: Arc::new(MemoryKeyValueStore::new()),
            issued: true,
        }
    }

    /// Settle `browser` once its request is done. Non-empty stores are
    /// kept, empty ones dropped.
    ///
    /// Returns `true` when the browser must be sent the cookie.
    pub fn commit(&self, browser: &BrowserStorage) -> bool {
        let mut stores = self.stores.write();

        if browser.store.is_empty() {
            let ours = stores
                .get(&browser.id)
                .is_some_and(|kept| Arc::ptr_eq(kept, &browser.store));
            if ours {
                stores.remove(&browser.id);
                tracing::debug!(storage = %browser.id, "dropped empty browser storage");
            }
            return false;
        }

        stores
            .entry(browser.id.clone())
            .or_insert_with(|| Arc::clone(&browser.store));
        if browser.issued {
            tracing::debug!(storage = %browser.id, "issued browser storage");
        }
        browser.issued
    }

    pub fn get(&self, id: &str) -> Option<Arc<MemoryKeyValueStore>> {
        self.stores.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.read().is_empty()
    }
}
