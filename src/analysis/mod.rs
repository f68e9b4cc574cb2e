// Swing analysis - microphone blocks in, timing verdicts out
//
// The capture callback copies each block into a pooled buffer and hands it
// over a lock-free queue (see audio::buffer_pool). A dedicated analysis
// thread drains the queue through a SwingDetector and forwards every
// observation, once and in order, to the session's subscriber channel.
//
// Nothing on the capture callback path allocates or locks.

pub mod accuracy;
pub mod detector;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::audio::buffer_pool::{AnalysisChannels, BufferPool};
use crate::audio::capture::{AudioCapture, BlockHandler};
use crate::config::{AnalyzerConfig, AudioConfig};
use crate::error::AudioError;

pub use accuracy::{classify, AccuracyClass, RollingTimingWindow, SwingObservation, Tolerances};
pub use detector::{analyze_samples, SwingDetector};

/// Receives observations on the session's control timeline.
pub type ObservationSender = mpsc::UnboundedSender<SwingObservation>;

/// Counters shared between the analysis thread and its owner.
#[derive(Debug, Default)]
struct AnalyzerCounters {
    blocks_processed: AtomicU64,
    peaks_detected: AtomicU64,
    observations_emitted: AtomicU64,
    dropped_blocks: AtomicU64,
}

/// Snapshot of analyzer activity since the last start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct AnalyzerStats {
    pub blocks_processed: u64,
    pub peaks_detected: u64,
    pub observations_emitted: u64,
    pub dropped_blocks: u64,
}

impl AnalyzerCounters {
    fn reset(&self) {
        self.blocks_processed.store(0, Ordering::Relaxed);
        self.peaks_detected.store(0, Ordering::Relaxed);
        self.observations_emitted.store(0, Ordering::Relaxed);
        self.dropped_blocks.store(0, Ordering::Relaxed);
    }

    fn snapshot(&self) -> AnalyzerStats {
        AnalyzerStats {
            blocks_processed: self.blocks_processed.load(Ordering::Relaxed),
            peaks_detected: self.peaks_detected.load(Ordering::Relaxed),
            observations_emitted: self.observations_emitted.load(Ordering::Relaxed),
            dropped_blocks: self.dropped_blocks.load(Ordering::Relaxed),
        }
    }
}

struct AnalysisWorker {
    channels: AnalysisChannels,
    detector: SwingDetector,
    subscriber: ObservationSender,
    running: Arc<AtomicBool>,
    counters: Arc<AnalyzerCounters>,
    log_every_n_blocks: u64,
}

impl AnalysisWorker {
    fn run(mut self) {
        tracing::info!(
            "[AnalysisThread] Starting analysis loop ({} Hz, expected interval {:.3}s)",
            self.detector.sample_rate(),
            self.detector.expected_interval_secs()
        );

        let mut reported_drops = 0u64;
        loop {
            let buffer = match self.channels.pop_block() {
                Some(buffer) => buffer,
                None => {
                    // Drain everything queued before honouring shutdown
                    if !self.running.load(Ordering::SeqCst) {
                        tracing::info!("[AnalysisThread] Shutdown requested and queue empty, exiting");
                        break;
                    }
                    thread::sleep(Duration::from_millis(1));
                    continue;
                }
            };

            let observation = self.detector.process_block(&buffer);
            self.channels.recycle(buffer);

            let blocks = self.counters.blocks_processed.fetch_add(1, Ordering::Relaxed) + 1;
            self.counters
                .peaks_detected
                .store(self.detector.peaks_detected(), Ordering::Relaxed);

            let dropped = self.channels.dropped_blocks();
            if dropped != reported_drops {
                tracing::warn!(
                    "[AnalysisThread] {} block(s) dropped by capture, timing may drift",
                    dropped - reported_drops
                );
                reported_drops = dropped;
                self.counters.dropped_blocks.store(dropped, Ordering::Relaxed);
            }

            if let Some(observation) = observation {
                tracing::debug!(
                    "[AnalysisThread] Swing at {:.3}s: interval {:.3}s, deviation {:.3}s -> {:?}",
                    observation.timestamp_secs,
                    observation.measured_interval_secs,
                    observation.deviation_secs,
                    observation.accuracy
                );
                if self.subscriber.send(observation).is_ok() {
                    self.counters
                        .observations_emitted
                        .fetch_add(1, Ordering::Relaxed);
                } else {
                    tracing::debug!("[AnalysisThread] Subscriber gone, observation discarded");
                }
            }

            if self.log_every_n_blocks > 0 && blocks % self.log_every_n_blocks == 0 {
                tracing::debug!(
                    "[AnalysisThread] {} blocks, {:.1}s analysed, window rms {:.4}, {} peaks",
                    blocks,
                    self.detector.elapsed_secs(),
                    self.detector.window_rms(),
                    self.detector.peaks_detected()
                );
            }
        }
        // Subscriber sender dropped here
    }
}

/// Turns a capture stream into swing observations.
///
/// The analyzer owns the capture adapter it taps but is agnostic to what
/// drives it; any [`AudioCapture`] works.
pub struct SwingAnalyzer {
    capture: Box<dyn AudioCapture>,
    config: AnalyzerConfig,
    buffer_pool_size: usize,
    buffer_size: usize,
    expected_interval_secs: f64,
    running: Arc<AtomicBool>,
    counters: Arc<AnalyzerCounters>,
    worker: Option<JoinHandle<()>>,
}

impl SwingAnalyzer {
    pub fn new(
        capture: Box<dyn AudioCapture>,
        config: AnalyzerConfig,
        audio: &AudioConfig,
        expected_interval_secs: f64,
    ) -> Self {
        Self {
            capture,
            config,
            buffer_pool_size: audio.buffer_pool_size.max(1),
            buffer_size: audio.buffer_size.max(1),
            expected_interval_secs,
            running: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(AnalyzerCounters::default()),
            worker: None,
        }
    }

    /// Resets history, starts the capture and the analysis thread.
    /// Observations go to `subscriber` until [`stop_analysis`](Self::stop_analysis).
    pub fn start_analysis(&mut self, subscriber: ObservationSender) -> Result<(), AudioError> {
        if self.worker.is_some() {
            return Err(AudioError::AlreadyRunning);
        }
        self.counters.reset();

        let (mut capture_channels, analysis_channels) =
            BufferPool::new(self.buffer_pool_size, self.buffer_size);
        let handler: BlockHandler = Box::new(move |block: &[f32]| {
            capture_channels.push_block(block);
        });
        let sample_rate = self.capture.start(handler)?;

        let worker = AnalysisWorker {
            channels: analysis_channels,
            detector: SwingDetector::new(&self.config, sample_rate, self.expected_interval_secs),
            subscriber,
            running: Arc::clone(&self.running),
            counters: Arc::clone(&self.counters),
            log_every_n_blocks: self.config.log_every_n_blocks,
        };

        self.running.store(true, Ordering::SeqCst);
        let spawned = thread::Builder::new()
            .name("swing-analysis".to_string())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                log::info!("[SwingAnalyzer] Analysis started at {} Hz", sample_rate);
                Ok(())
            }
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = self.capture.stop();
                Err(AudioError::StreamFailure {
                    reason: format!("Failed to spawn analysis thread: {}", err),
                })
            }
        }
    }

    /// Detaches from the capture, waits for queued blocks to drain and drops
    /// the subscriber. No-op when not running.
    pub fn stop_analysis(&mut self) -> Result<(), AudioError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let capture_result = self.capture.stop();
        self.running.store(false, Ordering::SeqCst);
        if worker.join().is_err() {
            log::error!("[SwingAnalyzer] Analysis thread panicked");
        }
        log::info!("[SwingAnalyzer] Analysis stopped: {:?}", self.stats());
        capture_result
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn stats(&self) -> AnalyzerStats {
        self.counters.snapshot()
    }

    pub fn expected_interval_secs(&self) -> f64 {
        self.expected_interval_secs
    }
}

impl Drop for SwingAnalyzer {
    fn drop(&mut self) {
        if let Err(err) = self.stop_analysis() {
            log::warn!("[SwingAnalyzer] Stop on drop failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::stubs::ManualCapture;
    use crate::testing::{synthesize_swings, SynthConfig};

    fn analyzer_with_feeder() -> (SwingAnalyzer, crate::audio::stubs::CaptureFeeder) {
        let (capture, feeder) = ManualCapture::new(44_100);
        let audio = AudioConfig {
            buffer_pool_size: 1024,
            ..AudioConfig::default()
        };
        let analyzer = SwingAnalyzer::new(Box::new(capture), AnalyzerConfig::default(), &audio, 0.5);
        (analyzer, feeder)
    }

    #[test]
    fn test_observations_reach_subscriber_in_order() {
        let (mut analyzer, feeder) = analyzer_with_feeder();
        let (tx, mut rx) = mpsc::unbounded_channel();
        analyzer.start_analysis(tx).unwrap();

        let rec = synthesize_swings(&[0.5, 1.0, 1.7], 2.5, &SynthConfig::default());
        assert!(feeder.feed_all(&rec.samples, 441));
        analyzer.stop_analysis().unwrap();

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.accuracy, AccuracyClass::Perfect);
        assert_eq!(second.accuracy, AccuracyClass::NeedsWork);
        assert!(first.timestamp_secs < second.timestamp_secs);

        // Sender dropped with the worker
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        let stats = analyzer.stats();
        assert_eq!(stats.observations_emitted, 2);
        assert_eq!(stats.peaks_detected, 3);
        assert_eq!(stats.dropped_blocks, 0);
    }

    #[test]
    fn test_double_start_rejected_and_stop_idempotent() {
        let (mut analyzer, feeder) = analyzer_with_feeder();
        let (tx, _rx) = mpsc::unbounded_channel();
        analyzer.start_analysis(tx.clone()).unwrap();
        assert!(feeder.is_attached());
        assert_eq!(analyzer.start_analysis(tx), Err(AudioError::AlreadyRunning));

        analyzer.stop_analysis().unwrap();
        assert!(!feeder.is_attached());
        assert!(!analyzer.is_running());
        analyzer.stop_analysis().unwrap();
    }

    #[test]
    fn test_restart_resets_history() {
        let (mut analyzer, feeder) = analyzer_with_feeder();
        let rec = synthesize_swings(&[0.5], 1.0, &SynthConfig::default());

        let (tx, mut rx) = mpsc::unbounded_channel();
        analyzer.start_analysis(tx).unwrap();
        feeder.feed_all(&rec.samples, 441);
        analyzer.stop_analysis().unwrap();

        // One peak per run: no run has a predecessor to diff against
        let (tx, mut rx2) = mpsc::unbounded_channel();
        analyzer.start_analysis(tx).unwrap();
        feeder.feed_all(&rec.samples, 441);
        analyzer.stop_analysis().unwrap();

        assert!(rx.try_recv().is_err());
        assert!(rx2.try_recv().is_err());
        assert_eq!(analyzer.stats().peaks_detected, 1);
    }
}
