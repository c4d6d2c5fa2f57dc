//! Fingerprints and the per-metric fingerprint set

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metric::MetricId;

/// A previously accepted distribution shape and how often it recurred
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Sample values, sorted ascending
    #[serde(alias = "Data")]
    pub data: Vec<f64>,
    /// Number of windows attributed to this shape
    #[serde(alias = "Count")]
    pub count: u64,
}

impl Fingerprint {
    /// A freshly learned shape, observed once
    pub fn new(data: Vec<f64>) -> Self {
        Self { data, count: 1 }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Ordered fingerprint sequences keyed by metric
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintSet(BTreeMap<MetricId, Vec<Fingerprint>>);

impl FingerprintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: &MetricId) -> Option<&[Fingerprint]> {
        self.0.get(metric).map(Vec::as_slice)
    }

    /// Replace the sequence of a metric
    pub fn insert(&mut self, metric: MetricId, fingerprints: Vec<Fingerprint>) {
        self.0.insert(metric, fingerprints);
    }

    pub fn metrics(&self) -> impl Iterator<Item = &MetricId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricId, &Vec<Fingerprint>)> {
        self.0.iter()
    }

    /// Number of metrics
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for FingerprintSet {
    type Item = (MetricId, Vec<Fingerprint>);
    type IntoIter = std::collections::btree_map::IntoIter<MetricId, Vec<Fingerprint>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(MetricId, Vec<Fingerprint>)> for FingerprintSet {
    fn from_iter<I: IntoIterator<Item = (MetricId, Vec<Fingerprint>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Bring a loaded sequence back within the store invariants.
///
/// Empty fingerprints and ones holding non-finite values are dropped,
/// unsorted data is sorted, and the sequence is cut to `max_fingerprints`
/// keeping the earliest entries.
pub fn sanitize(
    metric: &MetricId,
    fingerprints: Vec<Fingerprint>,
    max_fingerprints: usize,
) -> Vec<Fingerprint> {
    let loaded = fingerprints.len();
    let mut kept: Vec<Fingerprint> = fingerprints
        .into_iter()
        .filter(|fp| !fp.is_empty() && fp.data.iter().all(|v| v.is_finite()))
        .map(|mut fp| {
            if !fp.data.windows(2).all(|w| w[0] <= w[1]) {
                fp.data.sort_by(f64::total_cmp);
            }
            fp
        })
        .collect();

    if kept.len() < loaded {
        tracing::warn!(
            %metric,
            dropped = loaded - kept.len(),
            "Dropped empty or non-finite fingerprints"
        );
    }
    if kept.len() > max_fingerprints {
        tracing::warn!(
            %metric,
            loaded = kept.len(),
            max_fingerprints,
            "Truncating fingerprints to capacity"
        );
        kept.truncate(max_fingerprints);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(data: &[f64], count: u64) -> Fingerprint {
        Fingerprint {
            data: data.to_vec(),
            count,
        }
    }

    #[test]
    fn test_record_format() {
        let json = serde_json::to_string(&fp(&[1.0, 2.5], 3)).unwrap();
        assert_eq!(json, r#"{"data":[1.0,2.5],"count":3}"#);
    }

    #[test]
    fn test_capitalized_fields_accepted() {
        let parsed: Fingerprint = serde_json::from_str(r#"{"Data":[1,2],"Count":4}"#).unwrap();
        assert_eq!(parsed, fp(&[1.0, 2.0], 4));
    }

    #[test]
    fn test_set_serializes_as_map() {
        let set: FingerprintSet = [(MetricId::from("cpu"), vec![fp(&[1.0], 1)])]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"cpu":[{"data":[1.0],"count":1}]}"#);
        assert_eq!(serde_json::from_str::<FingerprintSet>(&json).unwrap(), set);
    }

    #[test]
    fn test_sanitize() {
        let metric = MetricId::from("cpu");
        let loaded = vec![
            fp(&[], 2),
            fp(&[3.0, 1.0, 2.0], 5),
            fp(&[f64::NAN], 1),
            fp(&[1.0], 1),
            fp(&[2.0], 1),
        ];

        let kept = sanitize(&metric, loaded, 2);
        assert_eq!(kept, vec![fp(&[1.0, 2.0, 3.0], 5), fp(&[1.0], 1)]);
    }
}
