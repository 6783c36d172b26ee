use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::bail_bazaar;
use crate::errors::{BazaarError, ErrorKind};

/// A stored document together with its identity and revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub data: Value,
}

/// Hosted document database, addressed by collection name + document id.
///
/// - `list`    → every document of a collection
/// - `get`     → one document by id
/// - `insert`  → store assigns the id
/// - `replace` → full overwrite, optionally guarded by a version
/// - `delete`  → remove by id
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> Result<Document>;

    /// Returns the id assigned to the new document.
    async fn insert(&self, collection: &str, data: Value) -> Result<String>;

    /// Overwrite the whole document.
    ///
    /// With `expected_version` set, the write only happens when the stored
    /// version still matches, otherwise it fails with `Conflict`. Returns
    /// the new version.
    async fn replace(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        expected_version: Option<u64>,
    ) -> Result<u64>;

    async fn delete(&self, collection: &str, id: &str) -> Result<()>;
}

/// Read, mutate and write back a document with compare-and-swap.
///
/// A concurrent writer makes `replace` fail with `Conflict`; the document
/// is then re-read and `mutate` applied again, up to `retries` extra times.
pub async fn update_document<F>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    retries: usize,
    mut mutate: F,
) -> Result<Document>
where
    F: FnMut(Value) -> Result<Value> + Send,
{
    let mut attempt = 0;
    loop {
        let current = store.get(collection, id).await?;
        let data = mutate(current.data)?;

        match store
            .replace(collection, id, data.clone(), Some(current.version))
            .await
        {
            Ok(version) => {
                return Ok(Document {
                    id: id.to_string(),
                    version,
                    data,
                })
            }
            Err(err) if ErrorKind::of(&err) == ErrorKind::Conflict && attempt < retries => {
                attempt += 1;
                tracing::debug!(collection, id, attempt, "version conflict, retrying update");
            }
            Err(err) => return Err(err),
        }
    }
}

struct StoredDocument {
    seq: u64,
    version: u64,
    data: Value,
}

#[derive(Default)]
struct Collections {
    next_seq: u64,
    by_name: HashMap<String, HashMap<String, StoredDocument>>,
}

/// In-process document store.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Collections>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(collection: &str, id: &str) -> anyhow::Error {
        BazaarError::not_found(format!("No document '{id}' in '{collection}'")).into_anyhow()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let inner = self.inner.read().await;
        let Some(docs) = inner.by_name.get(collection) else {
            return Ok(vec![]);
        };

        let mut stored: Vec<(&String, &StoredDocument)> = docs.iter().collect();
        stored.sort_by_key(|(_, d)| d.seq);

        Ok(stored
            .into_iter()
            .map(|(id, d)| Document {
                id: id.clone(),
                version: d.version,
                data: d.data.clone(),
            })
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document> {
        let inner = self.inner.read().await;
        inner
            .by_name
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|d| Document {
                id: id.to_string(),
                version: d.version,
                data: d.data.clone(),
            })
            .ok_or_else(|| Self::not_found(collection, id))
    }

    async fn insert(&self, collection: &str, data: Value) -> Result<String> {
        if !data.is_object() {
            bail_bazaar!(bad_request, "Documents must be JSON objects");
        }

        let id = Uuid::new_v4().simple().to_string();

        let mut inner = self.inner.write().await;
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.by_name.entry(collection.to_string()).or_default().insert(
            id.clone(),
            StoredDocument {
                seq,
                version: 1,
                data,
            },
        );

        Ok(id)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        data: Value,
        expected_version: Option<u64>,
    ) -> Result<u64> {
        if !data.is_object() {
            bail_bazaar!(bad_request, "Documents must be JSON objects");
        }

        let mut inner = self.inner.write().await;
        let stored = inner
            .by_name
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| Self::not_found(collection, id))?;

        if let Some(expected) = expected_version {
            if stored.version != expected {
                return Err(BazaarError::conflict(format!(
                    "Document '{id}' changed (expected version {expected}, found {})",
                    stored.version
                ))
                .into_anyhow());
            }
        }

        stored.version += 1;
        stored.data = data;
        Ok(stored.version)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .by_name
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| Self::not_found(collection, id))
    }
}
