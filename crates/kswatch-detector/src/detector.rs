//! Detector lifecycle: initialize, detect, save

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use kswatch_common::format_error;
use kswatch_config::DetectorConfig;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::archive::FingerprintArchive;
use crate::capacity::CapacityStrategy;
use crate::context::{AppContext, Rotation, SampleReader};
use crate::error::{DetectorError, Result};
use crate::fingerprint::{Fingerprint, FingerprintSet};
use crate::learner::{Learner, Verdict};
use crate::metric::{empirical_sample, DataPoint, MetricId};

/// Shortest autosave period; `tokio::time::interval` rejects zero
const MIN_AUTOSAVE_INTERVAL: Duration = Duration::from_millis(1);

/// One metric's fingerprints and the lock that orders its saves
#[derive(Default)]
struct MetricSlot {
    fingerprints: Mutex<Vec<Fingerprint>>,
    // held from snapshot to write, so documents land in snapshot order
    save_lock: tokio::sync::Mutex<()>,
}

impl MetricSlot {
    fn new(fingerprints: Vec<Fingerprint>) -> Self {
        Self {
            fingerprints: Mutex::new(fingerprints),
            save_lock: tokio::sync::Mutex::new(()),
        }
    }
}

type Slot = Arc<MetricSlot>;

/// KS fingerprint anomaly detector for one rotation.
///
/// Each metric's fingerprints sit behind their own mutex, so calls for the
/// same metric are serialized while different metrics run in parallel.
/// Saves of one metric are serialized as well, so a newer snapshot is never
/// overwritten by an older one. Persistence never happens implicitly; call
/// [`save`](Self::save), [`save_all`](Self::save_all) or start
/// [`spawn_autosave`](Self::spawn_autosave).
pub struct KsDetector {
    rotation: Rotation,
    reader: Arc<dyn SampleReader>,
    archive: FingerprintArchive,
    learner: Learner,
    fingerprints: DashMap<MetricId, Slot>,
}

impl KsDetector {
    /// Wire collaborators from the host and load persisted fingerprints.
    ///
    /// Fails only when a collaborator is missing or the configuration is
    /// unusable; persisted data problems degrade to an empty store.
    pub async fn initialize(
        app: &dyn AppContext,
        rotation: Rotation,
        config: DetectorConfig,
    ) -> Result<Self> {
        if config.max_fingerprints == 0 {
            return Err(DetectorError::InvalidConfig(
                "max_fingerprints must be greater than 0".to_string(),
            ));
        }
        let reader = app
            .reader()
            .ok_or(DetectorError::MissingCollaborator("sample reader"))?;
        let store = app
            .document_store()
            .ok_or(DetectorError::MissingCollaborator("document store"))?;

        let archive = FingerprintArchive::new(store, rotation.clone());
        let loaded = archive.load(config.max_fingerprints).await;

        let fingerprints = DashMap::new();
        for (metric, sequence) in loaded {
            fingerprints.insert(metric, Arc::new(MetricSlot::new(sequence)));
        }

        let learner = Learner::new(&config);
        info!(
            prefix = rotation.prefix(),
            metrics = fingerprints.len(),
            ?learner,
            "KS detector initialized"
        );

        Ok(Self {
            rotation,
            reader,
            archive,
            learner,
            fingerprints,
        })
    }

    /// Use a custom strategy for full fingerprint sequences
    pub fn with_capacity_strategy(mut self, strategy: Arc<dyn CapacityStrategy>) -> Self {
        self.learner = self.learner.with_strategy(strategy);
        self
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    /// Classify the window `[start, stop)` of a metric; `true` means anomalous.
    ///
    /// The only error is a failure of the sample reader itself.
    pub async fn detect(
        &self,
        metric: &MetricId,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<bool> {
        let points: Vec<DataPoint> = self
            .reader
            .get_data(&self.rotation, metric, start, stop)
            .await?;
        let sample = empirical_sample(&points);
        Ok(self.detect_sample(metric, sample).anomalous)
    }

    /// Classify window values the host already holds, in any order.
    ///
    /// A window with no finite values is anomalous and leaves the store
    /// untouched, including for metrics not seen before.
    pub fn detect_sample(&self, metric: &MetricId, mut values: Vec<f64>) -> Verdict {
        values.retain(|v| v.is_finite());
        if values.is_empty() {
            warn!(%metric, "Empty sample window, reporting anomalous without learning");
            return Verdict::skipped();
        }
        values.sort_by(f64::total_cmp);

        let slot = self.slot(metric);
        let mut fingerprints = slot.fingerprints.lock();
        let verdict = self.learner.observe(&mut fingerprints, values);
        debug!(
            prefix = self.rotation.prefix(),
            %metric,
            anomalous = verdict.anomalous,
            action = ?verdict.action,
            fingerprints = fingerprints.len(),
            "Classified window"
        );
        verdict
    }

    fn slot(&self, metric: &MetricId) -> Slot {
        if let Some(slot) = self.fingerprints.get(metric) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.fingerprints.entry(metric.clone()).or_default().value())
    }

    /// Copy of a metric's fingerprints in insertion order
    pub fn fingerprints(&self, metric: &MetricId) -> Vec<Fingerprint> {
        self.fingerprints
            .get(metric)
            .map(|slot| Arc::clone(slot.value()))
            .map(|slot| slot.fingerprints.lock().clone())
            .unwrap_or_default()
    }

    /// Copy of every metric's fingerprints
    pub fn snapshot(&self) -> FingerprintSet {
        self.slots()
            .into_iter()
            .map(|(metric, slot)| {
                let sequence = slot.fingerprints.lock().clone();
                (metric, sequence)
            })
            .collect()
    }

    fn slots(&self) -> Vec<(MetricId, Slot)> {
        self.fingerprints
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }

    /// Persist one metric. Failures are logged, not returned; the result
    /// says whether the document was written.
    pub async fn save(&self, metric: &MetricId) -> bool {
        let Some(slot) = self.fingerprints.get(metric).map(|s| Arc::clone(s.value())) else {
            debug!(%metric, "No fingerprints to save");
            return false;
        };
        self.persist(metric, &slot).await
    }

    /// Persist every metric; returns how many documents were written
    pub async fn save_all(&self) -> usize {
        let mut saved = 0;
        for (metric, slot) in self.slots() {
            if self.persist(&metric, &slot).await {
                saved += 1;
            }
        }
        debug!(prefix = self.rotation.prefix(), saved, "Saved all fingerprints");
        saved
    }

    async fn persist(&self, metric: &MetricId, slot: &MetricSlot) -> bool {
        let _ordered = slot.save_lock.lock().await;
        let sequence = slot.fingerprints.lock().clone();
        match self.archive.save(metric, &sequence).await {
            Ok(()) => true,
            Err(e) => {
                error!(%metric, "Could not save fingerprints: {}", format_error(&e));
                false
            }
        }
    }

    /// Save every metric on a fixed interval until the handle is stopped or
    /// dropped; a final save runs on shutdown. Intervals below one
    /// millisecond are raised to one millisecond.
    pub fn spawn_autosave(self: &Arc<Self>, interval: Duration) -> AutosaveHandle {
        let interval = if interval < MIN_AUTOSAVE_INTERVAL {
            warn!(?interval, "Autosave interval too short, using {:?}", MIN_AUTOSAVE_INTERVAL);
            MIN_AUTOSAVE_INTERVAL
        } else {
            interval
        };
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let detector = Arc::clone(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        detector.save_all().await;
                    }
                    _ = shutdown_rx.recv() => {
                        detector.save_all().await;
                        info!("Fingerprint autosave stopped");
                        break;
                    }
                }
            }
        });

        AutosaveHandle {
            shutdown_tx,
            task,
        }
    }
}

/// Running autosave task
pub struct AutosaveHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    /// Signal shutdown and wait for the final save
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            error!("Autosave task failed: {}", e);
        }
    }
}
