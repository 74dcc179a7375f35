//! Outlier-trimmed latency statistics.
//!
//! Latencies are sorted and only the fastest 95% are summarised, so scheduler
//! jitter and allocator stalls in the slow tail do not dominate the reported
//! figures. The result depends only on the multiset of inputs, never their
//! order.

use crate::error::HarnessError;
use std::fmt;

/// Share of the sorted series that is kept, in percent.
pub const KEPT_PERCENT: usize = 95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimmedStats {
    /// Number of samples kept after trimming.
    pub count: usize,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub sum: i64,
}

/// `floor(len * 0.95)` without going through floating point.
#[must_use]
pub fn kept_len(len: usize) -> usize {
    (len as u128 * KEPT_PERCENT as u128 / 100) as usize
}

impl TrimmedStats {
    /// Summarises the fastest 95% of `latencies` (nanoseconds).
    ///
    /// Fails with [`HarnessError::InvalidInput`] when nothing survives the
    /// trim, which covers an empty series.
    pub fn from_latencies(latencies: &[i64]) -> Result<Self, HarnessError> {
        if latencies.is_empty() {
            return Err(HarnessError::InvalidInput(
                "latency series is empty".into(),
            ));
        }
        let kept = kept_len(latencies.len());
        if kept == 0 {
            return Err(HarnessError::InvalidInput(format!(
                "{} samples leave nothing after trimming to {KEPT_PERCENT}%",
                latencies.len()
            )));
        }

        let mut sorted = latencies.to_vec();
        sorted.sort_unstable();
        let prefix = &sorted[..kept];

        let sum: i64 = prefix.iter().sum();
        Ok(Self {
            count: kept,
            min: prefix[0],
            max: prefix[kept - 1],
            mean: sum as f64 / kept as f64,
            sum,
        })
    }

    #[must_use]
    pub fn mean_millis(&self) -> f64 {
        self.mean / 1_000_000.0
    }
}

impl fmt::Display for TrimmedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:10.2}ms, {:15}ns, {:15}ns]",
            self.mean_millis(),
            self.min,
            self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn drops_top_five_percent() {
        let series: Vec<i64> = (1..=100).map(|i| i * 10).collect();
        let stats = TrimmedStats::from_latencies(&series).unwrap();
        assert_eq!(stats.count, 95);
        assert_eq!(stats.min, 10);
        assert_eq!(stats.max, 950);
        assert_eq!(stats.sum, 45_600);
        assert!((stats.mean - 480.0).abs() < f64::EPSILON);
    }

    #[test]
    fn input_order_is_irrelevant() {
        let mut series: Vec<i64> = (1..=100).map(|i| i * 10).collect();
        series.reverse();
        series.swap(3, 77);
        let stats = TrimmedStats::from_latencies(&series).unwrap();
        assert_eq!(stats.max, 950);
    }

    #[test]
    fn empty_series_is_invalid_input() {
        assert!(matches!(
            TrimmedStats::from_latencies(&[]),
            Err(HarnessError::InvalidInput(_))
        ));
    }

    #[test]
    fn single_sample_trims_to_nothing() {
        assert!(matches!(
            TrimmedStats::from_latencies(&[42]),
            Err(HarnessError::InvalidInput(_))
        ));
        let stats = TrimmedStats::from_latencies(&[5, 1]).unwrap();
        assert_eq!((stats.count, stats.min, stats.max), (1, 1, 1));
    }

    #[test]
    fn kept_len_floors() {
        assert_eq!(kept_len(0), 0);
        assert_eq!(kept_len(19), 18);
        assert_eq!(kept_len(20), 19);
        assert_eq!(kept_len(100), 95);
        assert_eq!(kept_len(101), 95);
    }

    #[test]
    fn display_matches_report_columns() {
        let stats = TrimmedStats {
            count: 1,
            min: 1_000,
            max: 2_000,
            mean: 1_500_000.0,
            sum: 1_500_000,
        };
        assert_eq!(
            stats.to_string(),
            "[      1.50ms,            1000ns,            2000ns]"
        );
    }

    proptest! {
        #[test]
        fn trimmed_bounds_hold(mut series in prop::collection::vec(0i64..1_000_000_000, 2..500)) {
            let stats = TrimmedStats::from_latencies(&series).unwrap();
            series.sort_unstable();
            prop_assert_eq!(stats.count, series.len() * 95 / 100);
            prop_assert_eq!(stats.min, series[0]);
            prop_assert!(stats.max <= *series.last().unwrap());
            prop_assert!(stats.mean >= stats.min as f64);
            prop_assert!(stats.mean <= stats.max as f64);
        }

        #[test]
        fn order_independent(series in prop::collection::vec(0i64..1_000_000, 2..200), seed in any::<u64>()) {
            let mut shuffled = series.clone();
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            prop_assert_eq!(
                TrimmedStats::from_latencies(&series).unwrap(),
                TrimmedStats::from_latencies(&shuffled).unwrap()
            );
        }
    }
}
