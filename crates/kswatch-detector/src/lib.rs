//! kswatch KS fingerprint detector
//!
//! Keeps, for every metric, a bounded list of previously seen value
//! distributions ("fingerprints"). A new window is normal only when a
//! two-sample Kolmogorov-Smirnov test matches it to a fingerprint that has
//! already recurred often enough; everything else is reported as anomalous
//! and, capacity permitting, learned.
//!
//! ```ignore
//! use std::sync::Arc;
//! use kswatch_config::DetectorConfig;
//! use kswatch_detector::{KsDetector, MemorySampleReader, Rotation, StaticContext};
//! use kswatch_persistence::MemoryDocumentStore;
//!
//! let context = StaticContext::new()
//!     .with_reader(Arc::new(MemorySampleReader::new()))
//!     .with_store(Arc::new(MemoryDocumentStore::new()));
//! let detector =
//!     KsDetector::initialize(&context, Rotation::new("1h_1m."), DetectorConfig::default()).await?;
//! let anomalous = detector.detect(&"cpu".into(), start, stop).await?;
//! detector.save_all().await;
//! ```

pub mod archive;
pub mod capacity;
pub mod context;
pub mod detector;
pub mod error;
pub mod fingerprint;
pub mod ks;
pub mod learner;
pub mod metric;
pub mod reader;

pub use archive::FingerprintArchive;
pub use capacity::{strategy_for, CapacityOutcome, CapacityStrategy, Discard, ReplaceWeakest};
pub use context::{AppContext, Rotation, SampleReader, StaticContext};
pub use detector::{AutosaveHandle, KsDetector};
pub use error::{DetectorError, ReaderError, Result};
pub use fingerprint::{Fingerprint, FingerprintSet};
pub use ks::{compare, critical_value, ks_statistic, ks_statistic_merge_scan, KsComparison};
pub use learner::{LearnAction, Learner, MatchScore, Verdict};
pub use metric::{empirical_sample, DataPoint, MetricId};
pub use reader::MemorySampleReader;
