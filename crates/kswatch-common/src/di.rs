//! Service registration for auto-discovery
//!
//! Each crate creates its default services and returns them as
//! [`ServiceEntry`] items from a factory submitted with `inventory::submit!`.
//! Hosts call [`collect_all_services`] once and pick what they need with
//! [`resolve`].
//!
//! ```rust,ignore
//! use kswatch_common::di::{ServiceEntry, ServiceFactory};
//! use std::sync::Arc;
//!
//! inventory::submit! {
//!     ServiceFactory::new("persistence", create_persistence_services)
//! }
//!
//! fn create_persistence_services() -> Vec<ServiceEntry> {
//!     vec![ServiceEntry::new::<MemoryDocumentStore>(Arc::new(MemoryDocumentStore::new()))]
//! }
//! ```

use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::{debug, info};

/// A type-erased service instance
pub struct ServiceEntry {
    /// Registration key
    pub type_id: TypeId,

    /// Human-readable type name for debugging
    pub type_name: &'static str,

    pub instance: Arc<dyn Any + Send + Sync>,
}

impl ServiceEntry {
    /// Create a new service entry for a concrete type
    pub fn new<T: Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            instance: instance as Arc<dyn Any + Send + Sync>,
        }
    }
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("type_id", &self.type_id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A factory that creates the services of one crate
pub struct ServiceFactory {
    /// Name of the service group (e.g. "persistence")
    pub name: &'static str,

    pub factory_fn: fn() -> Vec<ServiceEntry>,

    /// Registration order (lower = earlier, default = 100)
    pub priority: u32,
}

impl ServiceFactory {
    /// Create a new service factory with default priority
    pub const fn new(name: &'static str, factory_fn: fn() -> Vec<ServiceEntry>) -> Self {
        Self {
            name,
            factory_fn,
            priority: 100,
        }
    }

    /// Create a new service factory with custom priority
    pub const fn with_priority(
        name: &'static str,
        factory_fn: fn() -> Vec<ServiceEntry>,
        priority: u32,
    ) -> Self {
        Self {
            name,
            factory_fn,
            priority,
        }
    }
}

inventory::collect!(ServiceFactory);

/// Run every discovered factory in priority order and gather the services
pub fn collect_all_services() -> Vec<ServiceEntry> {
    let mut factories: Vec<&ServiceFactory> = inventory::iter::<ServiceFactory>().collect();

    // stable: equal priorities keep link order
    factories.sort_by_key(|f| f.priority);

    info!("Discovered {} service factories", factories.len());

    let mut all_services = Vec::new();
    for factory in factories {
        let services = (factory.factory_fn)();
        debug!(
            "Factory '{}' (priority {}) created {} services",
            factory.name,
            factory.priority,
            services.len()
        );
        all_services.extend(services);
    }

    all_services
}

/// Find the first service of type `T` among collected entries
pub fn resolve<T: Send + Sync + 'static>(services: &[ServiceEntry]) -> Option<Arc<T>> {
    services
        .iter()
        .filter(|entry| entry.type_id == TypeId::of::<T>())
        .find_map(|entry| entry.instance.clone().downcast::<T>().ok())
}

/// List all discovered service factory names
pub fn list_discovered_factories() -> Vec<&'static str> {
    inventory::iter::<ServiceFactory>().map(|f| f.name).collect()
}
