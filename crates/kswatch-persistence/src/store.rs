//! Document store trait

use async_trait::async_trait;

use crate::Result;

/// Key/value document backend
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document; `Ok(None)` when the key is absent
    async fn get_doc(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Create or overwrite a document
    async fn store_doc(&self, key: &str, doc: &[u8]) -> Result<()>;

    /// All stored keys starting with `prefix`, sorted
    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
