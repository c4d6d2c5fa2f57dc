//! In-memory document store

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{DocumentStore, PersistenceError, Result};

/// Thread-safe in-memory document store, used by tests and the default wiring
#[derive(Debug, Default, Clone)]
pub struct MemoryDocumentStore {
    docs: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_doc(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.docs.read().await.get(key).cloned())
    }

    async fn store_doc(&self, key: &str, doc: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(PersistenceError::invalid_key(key));
        }
        self.docs.write().await.insert(key.to_string(), doc.to_vec());
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let docs = self.docs.read().await;
        Ok(docs
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
