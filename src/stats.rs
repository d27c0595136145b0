//! Tracking latency statistics.

use std::fmt;
use std::time::Duration;

/// Ordered record of per-frame tracking latencies, in seconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LatencyLog {
    samples: Vec<f64>,
}

impl LatencyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, latency: Duration) {
        self.samples.push(latency.as_secs_f64());
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in the order they were recorded.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Median and mean. Returns `None` when nothing was tracked.
    ///
    /// The median is the element at index `n / 2` of the sorted samples; for
    /// even `n` that is the upper middle element, not the interpolated midpoint.
    pub fn summary(&self) -> Option<LatencySummary> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);
        let total: f64 = sorted.iter().sum();
        Some(LatencySummary {
            count: sorted.len(),
            median: sorted[sorted.len() / 2],
            mean: total / sorted.len() as f64,
        })
    }
}

impl FromIterator<Duration> for LatencyLog {
    fn from_iter<I: IntoIterator<Item = Duration>>(iter: I) -> Self {
        let mut log = LatencyLog::new();
        for latency in iter {
            log.push(latency);
        }
        log
    }
}

/// End-of-run latency summary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatencySummary {
    pub count: usize,
    pub median: f64,
    pub mean: f64,
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "median tracking time: {}", self.median)?;
        write!(f, "mean tracking time: {}", self.mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_of(secs: &[f64]) -> LatencyLog {
        secs.iter().map(|s| Duration::from_secs_f64(*s)).collect()
    }

    #[test]
    fn even_length_median_is_upper_middle_element() {
        let log = log_of(&[0.02, 0.05, 0.01, 0.03]);
        let summary = log.summary().unwrap();
        assert_eq!(summary.count, 4);
        assert!((summary.median - 0.03).abs() < 1e-12);
        assert!((summary.mean - 0.0275).abs() < 1e-12);
    }

    #[test]
    fn odd_length_median_is_middle_element() {
        let log = log_of(&[0.5, 0.1, 0.3]);
        let summary = log.summary().unwrap();
        assert!((summary.median - 0.3).abs() < 1e-12);
        assert!((summary.mean - 0.3).abs() < 1e-12);
    }

    #[test]
    fn single_sample() {
        let summary = log_of(&[0.04]).summary().unwrap();
        assert!((summary.median - 0.04).abs() < 1e-12);
        assert!((summary.mean - 0.04).abs() < 1e-12);
    }

    #[test]
    fn empty_log_has_no_summary() {
        assert!(LatencyLog::new().summary().is_none());
    }

    #[test]
    fn samples_keep_insertion_order() {
        let log = log_of(&[0.02, 0.05, 0.01]);
        assert_eq!(log.len(), 3);
        assert!(log.samples()[0] > log.samples()[2]);
        assert!(log.samples().iter().all(|s| *s >= 0.0));
    }

    #[test]
    fn summary_display_lists_median_and_mean() {
        let text = log_of(&[0.25, 0.5]).summary().unwrap().to_string();
        assert!(text.contains("median tracking time: 0.5"));
        assert!(text.contains("mean tracking time: 0.375"));
    }
}
