//! Host-provided collaborators

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kswatch_persistence::DocumentStore;

use crate::error::ReaderError;
use crate::metric::{DataPoint, MetricId};

/// Time-bucketing context supplied by the host scheduler.
///
/// Only its prefix matters here: every persisted key is namespaced with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rotation {
    prefix: String,
}

impl Rotation {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Source of raw points for a metric window
#[async_trait]
pub trait SampleReader: Send + Sync {
    /// Points with `start <= timestamp < stop`, in any order, possibly none
    async fn get_data(
        &self,
        rotation: &Rotation,
        metric: &MetricId,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>, ReaderError>;
}

/// Collaborators the host hands to [`KsDetector::initialize`](crate::KsDetector::initialize)
pub trait AppContext: Send + Sync {
    fn reader(&self) -> Option<Arc<dyn SampleReader>>;
    fn document_store(&self) -> Option<Arc<dyn DocumentStore>>;
}

/// [`AppContext`] built from explicit collaborators
#[derive(Clone, Default)]
pub struct StaticContext {
    reader: Option<Arc<dyn SampleReader>>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl StaticContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reader(mut self, reader: Arc<dyn SampleReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }
}

impl AppContext for StaticContext {
    fn reader(&self) -> Option<Arc<dyn SampleReader>> {
        self.reader.clone()
    }

    fn document_store(&self) -> Option<Arc<dyn DocumentStore>> {
        self.store.clone()
    }
}
