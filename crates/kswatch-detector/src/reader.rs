//! In-memory [`SampleReader`] for tests and offline replay

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::context::{Rotation, SampleReader};
use crate::error::ReaderError;
use crate::metric::{DataPoint, MetricId};

/// Holds every point in memory, keyed by metric.
///
/// Each series is kept ordered by timestamp, so a window read is two
/// binary searches plus a copy of the matching points.
#[derive(Debug, Default)]
pub struct MemorySampleReader {
    points: RwLock<HashMap<MetricId, Vec<DataPoint>>>,
}

impl MemorySampleReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, metric: MetricId, point: DataPoint) {
        let mut points = self.points.write();
        let series = points.entry(metric).or_default();
        // after any equal timestamps, so arrival order is kept
        let at = series.partition_point(|p| p.timestamp <= point.timestamp);
        series.insert(at, point);
    }

    pub fn extend(&self, metric: MetricId, points: impl IntoIterator<Item = DataPoint>) {
        let mut all = self.points.write();
        let series = all.entry(metric).or_default();
        series.extend(points);
        series.sort_by_key(|p| p.timestamp);
    }

    /// Known metrics, sorted
    pub fn metrics(&self) -> Vec<MetricId> {
        let mut metrics: Vec<MetricId> = self.points.read().keys().cloned().collect();
        metrics.sort();
        metrics
    }

    /// Earliest and latest timestamp recorded for a metric
    pub fn time_span(&self, metric: &MetricId) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let points = self.points.read();
        let series = points.get(metric)?;
        Some((series.first()?.timestamp, series.last()?.timestamp))
    }

    /// Timestamps of a metric in ascending order
    pub fn timestamps(&self, metric: &MetricId) -> Vec<DateTime<Utc>> {
        self.points
            .read()
            .get(metric)
            .map(|series| series.iter().map(|p| p.timestamp).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SampleReader for MemorySampleReader {
    async fn get_data(
        &self,
        _rotation: &Rotation,
        metric: &MetricId,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>, ReaderError> {
        let points = self.points.read();
        let Some(series) = points.get(metric) else {
            return Ok(Vec::new());
        };
        let from = series.partition_point(|p| p.timestamp < start);
        let to = series.partition_point(|p| p.timestamp < stop).max(from);
        Ok(series[from..to].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_window_is_half_open() {
        let reader = MemorySampleReader::new();
        let metric = MetricId::from("cpu");
        reader.extend(
            metric.clone(),
            (0..10).map(|s| DataPoint::new(ts(s), s as f64)),
        );

        let rotation = Rotation::new("r.");
        let window = reader
            .get_data(&rotation, &metric, ts(2), ts(5))
            .await
            .unwrap();
        let values: Vec<f64> = window.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);

        assert_eq!(reader.time_span(&metric), Some((ts(0), ts(9))));
    }

    #[tokio::test]
    async fn test_out_of_order_points_are_found() {
        let reader = MemorySampleReader::new();
        let metric = MetricId::from("cpu");
        for s in [7, 1, 5, 3, 9] {
            reader.push(metric.clone(), DataPoint::new(ts(s), s as f64));
        }
        reader.extend(
            metric.clone(),
            [DataPoint::new(ts(4), 4.0), DataPoint::new(ts(0), 0.0)],
        );

        assert_eq!(
            reader.timestamps(&metric),
            [0, 1, 3, 4, 5, 7, 9].map(ts).to_vec()
        );
        let window = reader
            .get_data(&Rotation::new(""), &metric, ts(3), ts(7))
            .await
            .unwrap();
        let values: Vec<f64> = window.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![3.0, 4.0, 5.0]);

        // an inverted range is empty rather than a panic
        assert!(reader
            .get_data(&Rotation::new(""), &metric, ts(7), ts(3))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_metric_is_empty() {
        let reader = MemorySampleReader::new();
        let window = reader
            .get_data(&Rotation::new(""), &MetricId::from("nope"), ts(0), ts(10))
            .await
            .unwrap();
        assert!(window.is_empty());
        assert!(reader.metrics().is_empty());
    }
}
