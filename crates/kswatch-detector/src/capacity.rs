//! What happens to an unmatched window once a metric is full

use std::sync::Arc;

use kswatch_config::CapacityPolicy;

use crate::fingerprint::Fingerprint;

/// Result of handing a sample to a [`CapacityStrategy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityOutcome {
    /// The fingerprint at `index` was overwritten with the sample
    Replaced { index: usize },
    /// The sample was dropped
    Discarded,
}

/// Learning policy for a full fingerprint sequence.
///
/// The sequence is handed over as a slice, so a strategy can rewrite
/// entries but never grow past the configured capacity.
pub trait CapacityStrategy: Send + Sync {
    fn on_full(&self, fingerprints: &mut [Fingerprint], sample: Vec<f64>) -> CapacityOutcome;

    /// Strategy name for logging
    fn name(&self) -> &str;
}

/// Overwrite the least observed fingerprint; the earliest one wins ties
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplaceWeakest;

impl CapacityStrategy for ReplaceWeakest {
    fn on_full(&self, fingerprints: &mut [Fingerprint], sample: Vec<f64>) -> CapacityOutcome {
        let weakest = fingerprints
            .iter()
            .enumerate()
            .min_by_key(|(_, fp)| fp.count)
            .map(|(index, _)| index);

        match weakest {
            Some(index) => {
                fingerprints[index] = Fingerprint::new(sample);
                CapacityOutcome::Replaced { index }
            }
            None => CapacityOutcome::Discarded,
        }
    }

    fn name(&self) -> &str {
        "replace_weakest"
    }
}

/// Leave a full sequence untouched
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl CapacityStrategy for Discard {
    fn on_full(&self, _fingerprints: &mut [Fingerprint], _sample: Vec<f64>) -> CapacityOutcome {
        CapacityOutcome::Discarded
    }

    fn name(&self) -> &str {
        "discard"
    }
}

/// Built-in strategy for a configured policy
pub fn strategy_for(policy: CapacityPolicy) -> Arc<dyn CapacityStrategy> {
    match policy {
        CapacityPolicy::ReplaceWeakest => Arc::new(ReplaceWeakest),
        CapacityPolicy::Discard => Arc::new(Discard),
    }
}
