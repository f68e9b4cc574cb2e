use std::collections::VecDeque;

use crate::config::AnalyzerConfig;

use super::accuracy::{classify, RollingTimingWindow, SwingObservation, Tolerances};

/// Energy-threshold swing peak detector.
///
/// Keeps a bounded rolling buffer of recent samples and, after every block,
/// measures the RMS of the newest `window_size` samples (nothing is detected
/// until a full window has been buffered). Crossing above the
/// threshold marks one peak; the detector re-arms only after the RMS falls
/// back to or below the threshold, so a sustained burst counts once.
///
/// Peak timestamps come from the sample clock (samples consumed divided by
/// sample rate), never from wall time, so results do not depend on how
/// promptly blocks are delivered.
#[derive(Debug)]
pub struct SwingDetector {
    buffer: VecDeque<f32>,
    capacity: usize,
    window_size: usize,
    threshold: f64,
    sample_rate: u32,
    samples_consumed: u64,
    in_peak: bool,
    last_peak_secs: Option<f64>,
    expected_interval_secs: f64,
    tolerances: Tolerances,
    history: RollingTimingWindow,
    peaks_detected: u64,
}

impl SwingDetector {
    pub fn new(config: &AnalyzerConfig, sample_rate: u32, expected_interval_secs: f64) -> Self {
        let sample_rate = sample_rate.max(1);
        let window_size = config.window_size.max(1);
        let capacity = config.history_capacity(sample_rate).max(window_size);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            window_size,
            threshold: config.rms_threshold as f64,
            sample_rate,
            samples_consumed: 0,
            in_peak: false,
            last_peak_secs: None,
            expected_interval_secs,
            tolerances: Tolerances::from(config),
            history: RollingTimingWindow::new(config.deviation_history_len),
            peaks_detected: 0,
        }
    }

    /// Clears buffer, clock, peak state and history.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.samples_consumed = 0;
        self.in_peak = false;
        self.last_peak_secs = None;
        self.history.clear();
        self.peaks_detected = 0;
    }

    /// Consumes one block. Returns an observation when the block completes a
    /// peak that has a predecessor.
    pub fn process_block(&mut self, block: &[f32]) -> Option<SwingObservation> {
        if block.is_empty() {
            return None;
        }
        self.push_samples(block);
        self.samples_consumed += block.len() as u64;

        let rms = self.window_rms();
        if rms <= self.threshold {
            self.in_peak = false;
            return None;
        }
        if self.in_peak {
            return None;
        }

        self.in_peak = true;
        self.peaks_detected += 1;
        let now = self.elapsed_secs();
        let previous = self.last_peak_secs.replace(now);

        let last = previous?;
        let measured_interval_secs = now - last;
        let deviation_secs = (measured_interval_secs - self.expected_interval_secs).abs();
        self.history.push(deviation_secs);
        Some(SwingObservation {
            accuracy: classify(deviation_secs, &self.tolerances),
            deviation_secs,
            measured_interval_secs,
            timestamp_secs: now,
        })
    }

    fn push_samples(&mut self, block: &[f32]) {
        // Only the newest `capacity` samples of an oversized block matter
        let fresh = if block.len() > self.capacity {
            &block[block.len() - self.capacity..]
        } else {
            block
        };
        let overflow = (self.buffer.len() + fresh.len()).saturating_sub(self.capacity);
        self.buffer.drain(..overflow.min(self.buffer.len()));
        self.buffer.extend(fresh.iter().copied());
    }

    /// RMS of the newest `window_size` samples; 0 until a full window exists.
    pub fn window_rms(&self) -> f64 {
        let n = self.window_size;
        if self.buffer.len() < n {
            return 0.0;
        }
        let sum_squares: f64 = self
            .buffer
            .iter()
            .rev()
            .take(n)
            .map(|&x| (x as f64) * (x as f64))
            .sum();
        (sum_squares / n as f64).sqrt()
    }

    /// Sample-clock time since the last reset.
    pub fn elapsed_secs(&self) -> f64 {
        self.samples_consumed as f64 / self.sample_rate as f64
    }

    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    pub fn history(&self) -> &RollingTimingWindow {
        &self.history
    }

    pub fn peaks_detected(&self) -> u64 {
        self.peaks_detected
    }

    pub fn expected_interval_secs(&self) -> f64 {
        self.expected_interval_secs
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Runs a whole recording through a fresh detector in `block_size` blocks.
pub fn analyze_samples(
    samples: &[f32],
    sample_rate: u32,
    block_size: usize,
    config: &AnalyzerConfig,
    expected_interval_secs: f64,
) -> Vec<SwingObservation> {
    let mut detector = SwingDetector::new(config, sample_rate, expected_interval_secs);
    samples
        .chunks(block_size.max(1))
        .filter_map(|block| detector.process_block(block))
        .collect()
}
