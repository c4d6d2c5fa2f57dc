//! Fingerprint persistence on top of a [`DocumentStore`]
//!
//! Key layout, with `<p>` the rotation prefix:
//!
//! - `<p>kstest.<metric>`: JSON array of `{"data": [...], "count": n}` in
//!   insertion order. Written by [`FingerprintArchive::save`].
//! - `<p>kstest`: legacy JSON object `metric -> array`. Only read; any
//!   per-metric document overrides the aggregate entry for that metric.

use std::sync::Arc;

use kswatch_persistence::{DocumentStore, PersistenceError};
use tracing::{debug, error, info, warn};

use crate::context::Rotation;
use crate::fingerprint::{sanitize, Fingerprint, FingerprintSet};
use crate::metric::MetricId;

const NAMESPACE: &str = "kstest";

/// Loads and saves fingerprints for one rotation
#[derive(Clone)]
pub struct FingerprintArchive {
    store: Arc<dyn DocumentStore>,
    rotation: Rotation,
}

impl FingerprintArchive {
    pub fn new(store: Arc<dyn DocumentStore>, rotation: Rotation) -> Self {
        Self { store, rotation }
    }

    /// Document key holding one metric's fingerprints
    pub fn metric_key(&self, metric: &MetricId) -> String {
        format!("{}{}.{}", self.rotation.prefix(), NAMESPACE, metric)
    }

    /// Legacy document key holding every metric at once
    pub fn aggregate_key(&self) -> String {
        format!("{}{}", self.rotation.prefix(), NAMESPACE)
    }

    /// Read every persisted fingerprint for this rotation.
    ///
    /// Never fails: unreadable or malformed documents are logged and
    /// skipped, so the worst case is an empty set.
    pub async fn load(&self, max_fingerprints: usize) -> FingerprintSet {
        let mut raw = self.load_aggregate().await;

        let metric_prefix = format!("{}.", self.aggregate_key());
        let keys = match self.store.keys(&metric_prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                error!(backend = self.store.name(), "Could not list fingerprint documents: {}", e);
                Vec::new()
            }
        };

        for key in keys {
            let Some(metric) = key.strip_prefix(metric_prefix.as_str()).map(MetricId::new) else {
                warn!(%key, backend = self.store.name(), "Skipping key outside the fingerprint namespace");
                continue;
            };
            match self.store.get_doc(&key).await {
                Ok(Some(bytes)) => match serde_json::from_slice::<Vec<Fingerprint>>(&bytes) {
                    Ok(fingerprints) => raw.insert(metric, fingerprints),
                    Err(e) => error!(%key, "Could not decode fingerprints: {}", e),
                },
                Ok(None) => debug!(%key, "Fingerprint document vanished during load"),
                Err(e) => error!(%key, "Could not read fingerprints: {}", e),
            }
        }

        let set: FingerprintSet = raw
            .into_iter()
            .map(|(metric, fingerprints)| {
                let kept = sanitize(&metric, fingerprints, max_fingerprints);
                (metric, kept)
            })
            .collect();

        info!(
            prefix = self.rotation.prefix(),
            metrics = set.len(),
            "Loaded fingerprints"
        );
        set
    }

    async fn load_aggregate(&self) -> FingerprintSet {
        let key = self.aggregate_key();
        match self.store.get_doc(&key).await {
            Ok(Some(bytes)) if !bytes.is_empty() => {
                match serde_json::from_slice::<FingerprintSet>(&bytes) {
                    Ok(set) => {
                        debug!(%key, metrics = set.len(), "Read aggregate fingerprint document");
                        set
                    }
                    Err(e) => {
                        error!(%key, "Could not decode aggregate fingerprints: {}", e);
                        FingerprintSet::new()
                    }
                }
            }
            Ok(_) => FingerprintSet::new(),
            Err(e) => {
                warn!(%key, "Could not read aggregate fingerprints: {}", e);
                FingerprintSet::new()
            }
        }
    }

    /// Write one metric's fingerprints under its own key
    pub async fn save(
        &self,
        metric: &MetricId,
        fingerprints: &[Fingerprint],
    ) -> Result<(), PersistenceError> {
        let doc = serde_json::to_vec(fingerprints)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        let key = self.metric_key(metric);
        self.store.store_doc(&key, &doc).await?;
        debug!(%key, fingerprints = fingerprints.len(), "Saved fingerprints");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kswatch_persistence::MemoryDocumentStore;

    use super::*;

    fn archive() -> (FingerprintArchive, MemoryDocumentStore) {
        let store = MemoryDocumentStore::new();
        let archive = FingerprintArchive::new(Arc::new(store.clone()), Rotation::new("1h_1m."));
        (archive, store)
    }

    fn fp(data: &[f64], count: u64) -> Fingerprint {
        Fingerprint {
            data: data.to_vec(),
            count,
        }
    }

    #[test]
    fn test_key_layout() {
        let (archive, _) = archive();
        assert_eq!(archive.metric_key(&"cpu".into()), "1h_1m.kstest.cpu");
        assert_eq!(archive.aggregate_key(), "1h_1m.kstest");
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (archive, store) = archive();
        let cpu = vec![fp(&[1.0, 2.0], 3), fp(&[5.0], 1)];
        archive.save(&"cpu".into(), &cpu).await.unwrap();

        let raw = store.get_doc("1h_1m.kstest.cpu").await.unwrap().unwrap();
        assert_eq!(
            String::from_utf8(raw).unwrap(),
            r#"[{"data":[1.0,2.0],"count":3},{"data":[5.0],"count":1}]"#
        );

        let loaded = archive.load(10).await;
        assert_eq!(loaded.get(&"cpu".into()), Some(cpu.as_slice()));
    }

    #[tokio::test]
    async fn test_empty_store_loads_nothing() {
        let (archive, _) = archive();
        assert!(archive.load(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_document_is_skipped() {
        let (archive, store) = archive();
        store.store_doc("1h_1m.kstest.bad", b"{not json").await.unwrap();
        archive.save(&"good".into(), &[fp(&[1.0], 1)]).await.unwrap();

        let loaded = archive.load(10).await;
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get(&"bad".into()).is_none());
    }

    #[tokio::test]
    async fn test_legacy_aggregate_document() {
        let (archive, store) = archive();
        store
            .store_doc(
                "1h_1m.kstest",
                br#"{"cpu":[{"Data":[1,2],"Count":2}],"mem":[{"Data":[9],"Count":1}]}"#,
            )
            .await
            .unwrap();
        archive.save(&"mem".into(), &[fp(&[4.0], 7)]).await.unwrap();

        let loaded = archive.load(10).await;
        assert_eq!(loaded.get(&"cpu".into()), Some(&[fp(&[1.0, 2.0], 2)][..]));
        assert_eq!(loaded.get(&"mem".into()), Some(&[fp(&[4.0], 7)][..]));
    }

    #[tokio::test]
    async fn test_malformed_aggregate_is_ignored() {
        let (archive, store) = archive();
        store.store_doc("1h_1m.kstest", b"[1,2,3]").await.unwrap();
        assert!(archive.load(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_other_rotations_are_not_loaded() {
        let (archive, store) = archive();
        store
            .store_doc("1d_1h.kstest.cpu", br#"[{"data":[1.0],"count":1}]"#)
            .await
            .unwrap();
        assert!(archive.load(10).await.is_empty());
    }

    /// Backend whose prefix listing ignores the prefix
    struct UnfilteredStore(MemoryDocumentStore);

    #[async_trait::async_trait]
    impl DocumentStore for UnfilteredStore {
        async fn get_doc(&self, key: &str) -> kswatch_persistence::Result<Option<Vec<u8>>> {
            self.0.get_doc(key).await
        }
        async fn store_doc(&self, key: &str, doc: &[u8]) -> kswatch_persistence::Result<()> {
            self.0.store_doc(key, doc).await
        }
        async fn keys(&self, _prefix: &str) -> kswatch_persistence::Result<Vec<String>> {
            let mut keys = self.0.keys("").await?;
            keys.push("x".to_string());
            Ok(keys)
        }
        fn name(&self) -> &str {
            "unfiltered"
        }
    }

    #[tokio::test]
    async fn test_foreign_keys_are_skipped() {
        let store = MemoryDocumentStore::new();
        store.store_doc("other", b"[]").await.unwrap();
        let archive = FingerprintArchive::new(
            Arc::new(UnfilteredStore(store.clone())),
            Rotation::new("1h_1m."),
        );
        archive.save(&"cpu".into(), &[fp(&[1.0], 2)]).await.unwrap();

        let loaded = archive.load(10).await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get(&"cpu".into()), Some(&[fp(&[1.0], 2)][..]));
    }

    #[tokio::test]
    async fn test_load_enforces_capacity() {
        let (archive, _) = archive();
        let many: Vec<Fingerprint> = (0..5).map(|i| fp(&[i as f64], 1)).collect();
        archive.save(&"cpu".into(), &many).await.unwrap();

        let loaded = archive.load(3).await;
        assert_eq!(loaded.get(&"cpu".into()), Some(&many[..3]));
    }
}
