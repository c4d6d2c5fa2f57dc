//! Two-sample Kolmogorov–Smirnov statistic and critical values
//!
//! Both samples must be sorted ascending and free of NaN. Empirical CDF
//! heights are taken as `count / len` at each step instead of summing
//! `1 / len`, so long samples do not accumulate rounding drift.

use kswatch_config::{Confidence, DistanceMethod};

/// Sup-distance between the empirical CDFs of `f1` and `f2`.
///
/// Walks the merged support once, consuming every copy of the current value
/// from both samples before measuring, so ties are handled exactly and the
/// result is symmetric in its arguments. Returns `None` when either sample
/// is empty.
pub fn ks_statistic(f1: &[f64], f2: &[f64]) -> Option<f64> {
    let (n, m) = (f1.len(), f2.len());
    if n == 0 || m == 0 {
        return None;
    }

    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    // once either side is exhausted the gap can only shrink
    while i < n && j < m {
        let x = f1[i].min(f2[j]);
        while i < n && f1[i] <= x {
            i += 1;
        }
        while j < m && f2[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n as f64 - j as f64 / m as f64).abs());
    }
    Some(d)
}

/// Single-cursor merge scan over `f1`.
///
/// For each element of `f1` the cursor into `f2` advances past every value
/// `<=` it and the gap is measured; the scan stops once `f2` is exhausted.
/// This only samples the CDF gap at points of `f1`, so it can miss gaps
/// where `f2` leads and it over-counts runs of equal values in `f1`.
pub fn ks_statistic_merge_scan(f1: &[f64], f2: &[f64]) -> Option<f64> {
    let (n, m) = (f1.len(), f2.len());
    if n == 0 || m == 0 {
        return None;
    }

    let mut d: f64 = 0.0;
    let mut j = 0;
    for (i, &x1) in f1.iter().enumerate() {
        while j < m && f2[j] <= x1 {
            j += 1;
        }
        d = d.max(((i + 1) as f64 / n as f64 - j as f64 / m as f64).abs());
        if j == m {
            break;
        }
    }
    Some(d)
}

/// Critical distance `c(α) · sqrt((n + m) / (n · m))`; `None` if a size is 0
pub fn critical_value(n: usize, m: usize, confidence: Confidence) -> Option<f64> {
    if n == 0 || m == 0 {
        return None;
    }
    let (n, m) = (n as f64, m as f64);
    Some(confidence.coefficient() * ((n + m) / (n * m)).sqrt())
}

/// Outcome of testing one sample against another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsComparison {
    /// KS distance D
    pub statistic: f64,
    /// Critical distance for the sample sizes
    pub critical: f64,
}

impl KsComparison {
    /// Same distribution at the configured confidence
    pub fn is_match(&self) -> bool {
        self.statistic < self.critical
    }

    /// `(D - T) / T`; negative for a match, more negative is a closer fit
    pub fn excess(&self) -> f64 {
        (self.statistic - self.critical) / self.critical
    }
}

/// Compare two sorted samples; `None` when either is empty
pub fn compare(
    f1: &[f64],
    f2: &[f64],
    confidence: Confidence,
    method: DistanceMethod,
) -> Option<KsComparison> {
    let statistic = match method {
        DistanceMethod::Exact => ks_statistic(f1, f2)?,
        DistanceMethod::MergeScan => ks_statistic_merge_scan(f1, f2)?,
    };
    let critical = critical_value(f1.len(), f2.len(), confidence)?;
    Some(KsComparison {
        statistic,
        critical,
    })
}
