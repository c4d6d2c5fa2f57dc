//! Service registration for kswatch-persistence

use std::sync::Arc;

use kswatch_common::di::{ServiceEntry, ServiceFactory};

use crate::MemoryDocumentStore;

inventory::submit! {
    ServiceFactory::with_priority("persistence", create_persistence_services, 10)
}

fn create_persistence_services() -> Vec<ServiceEntry> {
    vec![ServiceEntry::new::<MemoryDocumentStore>(Arc::new(
        MemoryDocumentStore::new(),
    ))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use kswatch_common::di::{collect_all_services, list_discovered_factories, resolve};

    #[test]
    fn test_persistence_factory_registered() {
        let factories = list_discovered_factories();
        assert!(factories.contains(&"persistence"), "Factory should be registered");
    }

    #[test]
    fn test_default_store_resolves() {
        let services = collect_all_services();
        assert!(resolve::<MemoryDocumentStore>(&services).is_some());
    }
}
