//! Fingerprint matching and adaptation
//!
//! A window is compared against every stored fingerprint of its metric.
//! The closest fingerprint is the one with the most negative normalized
//! excess `(D - T) / T`. A match only counts as normal once the matched
//! shape has been seen `normal_count` times; unmatched windows are always
//! anomalous and are learned while capacity remains.

use std::sync::Arc;

use kswatch_config::{Confidence, DetectorConfig, DistanceMethod};
use tracing::debug;

use crate::capacity::{strategy_for, CapacityOutcome, CapacityStrategy};
use crate::fingerprint::Fingerprint;
use crate::ks::{self, KsComparison};

/// Score of one stored fingerprint against the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    /// Position in the metric's fingerprint sequence
    pub index: usize,
    pub comparison: KsComparison,
}

impl MatchScore {
    pub fn is_match(&self) -> bool {
        self.comparison.is_match()
    }

    pub fn excess(&self) -> f64 {
        self.comparison.excess()
    }
}

/// How the fingerprint sequence changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnAction {
    /// A stored shape matched; `count` is its value after the increment
    Reinforced { index: usize, count: u64 },
    /// A new shape was appended
    Inserted { index: usize },
    /// The capacity strategy overwrote a shape
    Replaced { index: usize },
    /// The sequence was full and the shape was dropped
    Discarded,
    /// The window was empty; nothing was compared or stored
    Skipped,
}

/// Outcome of classifying one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub anomalous: bool,
    /// Closest fingerprint, matched or not
    pub best: Option<MatchScore>,
    pub action: LearnAction,
}

impl Verdict {
    /// Fail-closed result for a window without values
    pub fn skipped() -> Self {
        Self {
            anomalous: true,
            best: None,
            action: LearnAction::Skipped,
        }
    }
}

/// Classifies windows and updates a metric's fingerprints
#[derive(Clone)]
pub struct Learner {
    confidence: Confidence,
    normal_count: u64,
    max_fingerprints: usize,
    method: DistanceMethod,
    strategy: Arc<dyn CapacityStrategy>,
}

impl Learner {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            confidence: config.confidence,
            normal_count: config.normal_count,
            max_fingerprints: config.max_fingerprints,
            method: config.distance_method,
            strategy: strategy_for(config.capacity_policy),
        }
    }

    /// Replace the configured capacity strategy
    pub fn with_strategy(mut self, strategy: Arc<dyn CapacityStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn max_fingerprints(&self) -> usize {
        self.max_fingerprints
    }

    /// Score every fingerprint against a sorted sample.
    ///
    /// Fingerprints for which the statistic is undefined are left out.
    pub fn score(&self, fingerprints: &[Fingerprint], sample: &[f64]) -> Vec<MatchScore> {
        fingerprints
            .iter()
            .enumerate()
            .filter_map(|(index, fp)| {
                let comparison = ks::compare(&fp.data, sample, self.confidence, self.method)?;
                debug!(
                    index,
                    statistic = comparison.statistic,
                    critical = comparison.critical,
                    "Scored fingerprint"
                );
                Some(MatchScore { index, comparison })
            })
            .collect()
    }

    /// Classify a sorted sample and adapt `fingerprints` to it
    pub fn observe(&self, fingerprints: &mut Vec<Fingerprint>, sample: Vec<f64>) -> Verdict {
        if sample.is_empty() {
            tracing::warn!("Empty sample window, reporting anomalous without learning");
            return Verdict::skipped();
        }

        let best = best_score(&self.score(fingerprints, &sample));

        // the lowest excess is negative whenever any fingerprint matched
        if let Some(score) = best.filter(MatchScore::is_match) {
            let fingerprint = &mut fingerprints[score.index];
            let anomalous = fingerprint.count < self.normal_count;
            fingerprint.count = fingerprint.count.saturating_add(1);
            return Verdict {
                anomalous,
                best,
                action: LearnAction::Reinforced {
                    index: score.index,
                    count: fingerprint.count,
                },
            };
        }

        let action = if fingerprints.len() < self.max_fingerprints {
            fingerprints.push(Fingerprint::new(sample));
            LearnAction::Inserted {
                index: fingerprints.len() - 1,
            }
        } else {
            debug!(strategy = self.strategy.name(), "Reached max fingerprints");
            match self.strategy.on_full(fingerprints.as_mut_slice(), sample) {
                CapacityOutcome::Replaced { index } => LearnAction::Replaced { index },
                CapacityOutcome::Discarded => LearnAction::Discarded,
            }
        };

        Verdict {
            anomalous: true,
            best,
            action,
        }
    }
}

impl std::fmt::Debug for Learner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Learner")
            .field("confidence", &self.confidence)
            .field("normal_count", &self.normal_count)
            .field("max_fingerprints", &self.max_fingerprints)
            .field("method", &self.method)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

/// Lowest excess; strict comparison keeps the earliest index on ties
fn best_score(scores: &[MatchScore]) -> Option<MatchScore> {
    let mut best: Option<MatchScore> = None;
    for score in scores {
        if best.map_or(true, |b| score.excess() < b.excess()) {
            best = Some(*score);
        }
    }
    best
}
