//! Command implementations

use std::sync::Arc;

use kswatch_common::di::{collect_all_services, resolve};
use kswatch_config::StorageBackend;
use kswatch_persistence::{DiskDocumentStore, DocumentStore, MemoryDocumentStore};

pub mod replay;
pub mod show;

pub use replay::{ReplayOptions, ReplayReport, WindowVerdict};

/// Open the configured document backend.
///
/// The memory backend comes from the registered services when available.
pub fn open_store(backend: &StorageBackend) -> Arc<dyn DocumentStore> {
    match backend {
        StorageBackend::Memory => resolve::<MemoryDocumentStore>(&collect_all_services())
            .map(|store| store as Arc<dyn DocumentStore>)
            .unwrap_or_else(|| Arc::new(MemoryDocumentStore::new())),
        StorageBackend::Disk { path } => Arc::new(DiskDocumentStore::new(path)),
    }
}
