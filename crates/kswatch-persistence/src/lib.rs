//! kswatch persistence layer
//!
//! Byte-oriented key/value document backends. The detector serializes its
//! fingerprints itself and only needs `get_doc`, `store_doc` and prefix
//! listing from a backend.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        DocumentStore         │
//! ├───────────────┬──────────────┤
//! │ MemoryDocument│ DiskDocument │
//! │ Store         │ Store        │
//! └───────────────┴──────────────┘
//! ```
//!
//! ```ignore
//! use kswatch_persistence::{DiskDocumentStore, DocumentStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn DocumentStore> = Arc::new(DiskDocumentStore::new("./data"));
//! store.store_doc("1h_1m.kstest.cpu", b"[]").await?;
//! ```

pub mod di;
pub mod disk;
pub mod error;
pub mod memory;
pub mod store;

pub use disk::DiskDocumentStore;
pub use error::{PersistenceError, Result};
pub use memory::MemoryDocumentStore;
pub use store::DocumentStore;
