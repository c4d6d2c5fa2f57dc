//! Print persisted fingerprints

use std::sync::Arc;

use kswatch_config::AppConfig;
use kswatch_detector::{FingerprintArchive, FingerprintSet, Rotation};
use kswatch_persistence::DocumentStore;

/// Load the fingerprints of a rotation, optionally for one metric only
pub async fn run(
    prefix: &str,
    metric: Option<&str>,
    config: &AppConfig,
    store: Arc<dyn DocumentStore>,
) -> FingerprintSet {
    let archive = FingerprintArchive::new(store, Rotation::new(prefix));
    let loaded = archive.load(config.detector.max_fingerprints).await;
    match metric {
        Some(metric) => loaded
            .into_iter()
            .filter(|(id, _)| id.as_str() == metric)
            .collect(),
        None => loaded,
    }
}

pub fn print(set: &FingerprintSet) {
    if set.is_empty() {
        println!("No fingerprints stored");
        return;
    }
    for (metric, fingerprints) in set.iter() {
        println!("{} ({} fingerprints)", metric, fingerprints.len());
        for (index, fp) in fingerprints.iter().enumerate() {
            let min = fp.data.first().copied().unwrap_or(f64::NAN);
            let max = fp.data.last().copied().unwrap_or(f64::NAN);
            println!(
                "  #{:<3} count={:<6} values={:<6} range=[{}, {}]",
                index,
                fp.count,
                fp.len(),
                min,
                max
            );
        }
    }
}
