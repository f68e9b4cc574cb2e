//! Swing timing classification
//!
//! A swing is judged by how far the interval between two detected peaks
//! strays from the expected interval. Only the size of the miss matters,
//! early and late are treated alike.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;

/// Three-level timing verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccuracyClass {
    /// Deviation under the perfect tolerance (50 ms by default)
    Perfect,
    /// Deviation under the good tolerance (100 ms by default)
    Good,
    NeedsWork,
}

impl AccuracyClass {
    pub const ALL: [AccuracyClass; 3] = [
        AccuracyClass::Perfect,
        AccuracyClass::Good,
        AccuracyClass::NeedsWork,
    ];
}

/// Upper bounds (exclusive) for Perfect and Good.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub perfect_secs: f64,
    pub good_secs: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            perfect_secs: 0.05,
            good_secs: 0.10,
        }
    }
}

impl From<&AnalyzerConfig> for Tolerances {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            perfect_secs: config.perfect_tolerance_secs,
            good_secs: config.good_tolerance_secs,
        }
    }
}

/// Classifies an absolute deviation in seconds.
///
/// # Example
/// ```
/// use golf_tempo_trainer::analysis::{classify, AccuracyClass, Tolerances};
///
/// let t = Tolerances::default();
/// assert_eq!(classify(0.01, &t), AccuracyClass::Perfect);
/// assert_eq!(classify(0.07, &t), AccuracyClass::Good);
/// assert_eq!(classify(0.20, &t), AccuracyClass::NeedsWork);
/// ```
pub fn classify(deviation_secs: f64, tolerances: &Tolerances) -> AccuracyClass {
    let deviation = deviation_secs.abs();
    if deviation < tolerances.perfect_secs {
        AccuracyClass::Perfect
    } else if deviation < tolerances.good_secs {
        AccuracyClass::Good
    } else {
        AccuracyClass::NeedsWork
    }
}

/// One judged swing, emitted for every peak after the first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwingObservation {
    pub accuracy: AccuracyClass,
    /// `|measured - expected|` in seconds
    pub deviation_secs: f64,
    pub measured_interval_secs: f64,
    /// Sample-clock time of the peak since analysis started
    pub timestamp_secs: f64,
}

/// Bounded window of the most recent deviations, oldest evicted first.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingTimingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingTimingWindow {
    pub const DEFAULT_CAPACITY: usize = 3;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, deviation_secs: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(deviation_secs);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }

    /// Oldest to newest.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

impl Default for RollingTimingWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_boundaries() {
        let t = Tolerances::default();
        assert_eq!(classify(0.0, &t), AccuracyClass::Perfect);
        assert_eq!(classify(0.049, &t), AccuracyClass::Perfect);
        assert_eq!(classify(0.05, &t), AccuracyClass::Good);
        assert_eq!(classify(0.099, &t), AccuracyClass::Good);
        assert_eq!(classify(0.10, &t), AccuracyClass::NeedsWork);
        assert_eq!(classify(-0.02, &t), AccuracyClass::Perfect);
    }

    #[test]
    fn test_tolerances_follow_config() {
        let config = AnalyzerConfig {
            perfect_tolerance_secs: 0.02,
            good_tolerance_secs: 0.04,
            ..AnalyzerConfig::default()
        };
        let t = Tolerances::from(&config);
        assert_eq!(classify(0.03, &t), AccuracyClass::Good);
        assert_eq!(classify(0.05, &t), AccuracyClass::NeedsWork);
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let mut window = RollingTimingWindow::default();
        for i in 0..10 {
            window.push(i as f64);
            assert!(window.len() <= 3);
        }
        assert_eq!(window.to_vec(), vec![7.0, 8.0, 9.0]);
        assert_eq!(window.latest(), Some(9.0));
        assert_eq!(window.mean(), Some(8.0));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut window = RollingTimingWindow::new(0);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.to_vec(), vec![2.0]);
    }
}
