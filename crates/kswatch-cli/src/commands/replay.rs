//! Replay recorded samples through the detector

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use kswatch_config::AppConfig;
use kswatch_detector::{KsDetector, MemorySampleReader, MetricId, Rotation, StaticContext};
use kswatch_persistence::DocumentStore;
use tracing::info;

use crate::samples::read_samples;

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub input: PathBuf,
    pub prefix: String,
    pub window_secs: u64,
}

/// Classification of one replayed window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowVerdict {
    pub metric: MetricId,
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    pub anomalous: bool,
}

#[derive(Debug, Default)]
pub struct ReplayReport {
    pub rows: usize,
    pub verdicts: Vec<WindowVerdict>,
    /// Metrics written to the store at the end of the replay
    pub saved: usize,
}

impl ReplayReport {
    pub fn anomalies(&self) -> usize {
        self.verdicts.iter().filter(|v| v.anomalous).count()
    }
}

/// `[start, stop)` windows of `width`, aligned to the first timestamp, that
/// hold at least one of the ascending `timestamps`. Gaps produce no windows.
pub fn occupied_windows(
    timestamps: &[DateTime<Utc>],
    width: TimeDelta,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let step = width.num_milliseconds();
    let Some(&first) = timestamps.first() else {
        return Vec::new();
    };
    if step <= 0 {
        return Vec::new();
    }
    let mut windows: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    let mut last_index = None;
    for ts in timestamps {
        let index = (*ts - first).num_milliseconds() / step;
        if last_index == Some(index) {
            continue;
        }
        last_index = Some(index);
        let start = first + TimeDelta::milliseconds(index * step);
        windows.push((start, start + width));
    }
    windows
}

pub async fn run(
    options: &ReplayOptions,
    config: &AppConfig,
    store: Arc<dyn DocumentStore>,
) -> Result<ReplayReport> {
    let file = File::open(&options.input)
        .with_context(|| format!("cannot open {}", options.input.display()))?;
    let reader = Arc::new(MemorySampleReader::new());
    let rows = read_samples(file, &reader)?;

    let context = StaticContext::new()
        .with_reader(reader.clone())
        .with_store(store);
    let detector = Arc::new(
        KsDetector::initialize(
            &context,
            Rotation::new(options.prefix.clone()),
            config.detector.clone(),
        )
        .await?,
    );
    let autosave = config
        .persistence
        .autosave_secs
        .map(|secs| detector.spawn_autosave(Duration::from_secs(secs)));

    anyhow::ensure!(options.window_secs > 0, "window width must be positive");
    let width = TimeDelta::seconds(i64::try_from(options.window_secs)?);
    let mut verdicts = Vec::new();
    for metric in reader.metrics() {
        for (start, stop) in occupied_windows(&reader.timestamps(&metric), width) {
            let anomalous = detector.detect(&metric, start, stop).await?;
            verdicts.push(WindowVerdict {
                metric: metric.clone(),
                start,
                stop,
                anomalous,
            });
        }
    }

    if let Some(handle) = autosave {
        handle.stop().await;
    }
    let saved = detector.save_all().await;

    let report = ReplayReport {
        rows,
        verdicts,
        saved,
    };
    info!(
        rows,
        windows = report.verdicts.len(),
        anomalies = report.anomalies(),
        saved,
        "Replay finished"
    );
    Ok(report)
}

pub fn print(report: &ReplayReport) {
    for verdict in &report.verdicts {
        println!(
            "{}  {}  {:<24} {}",
            verdict.start.to_rfc3339(),
            verdict.stop.to_rfc3339(),
            verdict.metric,
            if verdict.anomalous { "ANOMALY" } else { "normal" }
        );
    }
    println!(
        "{} windows, {} anomalous, {} metrics saved",
        report.verdicts.len(),
        report.anomalies(),
        report.saved
    );
}
