//! Session-facing value types: options, snapshots, updates, summaries and
//! telemetry published by the [`TrainingController`](super::TrainingController).

use serde::{Deserialize, Serialize};

use crate::analysis::{AccuracyClass, SwingObservation};
use crate::catalog::ShotType;
use crate::sequencer::{CycleReport, SwingPhase};
use crate::tempo::TempoProfile;

/// Per-session toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Practice mode (cues only) when false: no capture is opened.
    pub analyze_swings: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            analyze_swings: true,
        }
    }
}

/// What the feedback indicator shows. `Waiting` exists only here; the
/// analyzer itself never produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedbackDisplay {
    Waiting,
    Good,
    NeedsWork,
}

impl FeedbackDisplay {
    pub fn from_accuracy(accuracy: Option<AccuracyClass>) -> Self {
        match accuracy {
            Some(AccuracyClass::Perfect) | Some(AccuracyClass::Good) => FeedbackDisplay::Good,
            Some(AccuracyClass::NeedsWork) => FeedbackDisplay::NeedsWork,
            None => FeedbackDisplay::Waiting,
        }
    }
}

/// Pushed to presentation subscribers on every phase entry, preamble tick
/// and swing verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUpdate {
    pub phase: SwingPhase,
    pub cycle: u32,
    pub accuracy: Option<AccuracyClass>,
    pub deviation_secs: Option<f64>,
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub active: bool,
    pub shot_type: Option<ShotType>,
    pub pro_name: Option<String>,
    pub bpm: Option<u32>,
    pub ratio: Option<f64>,
    pub backswing_secs: Option<f64>,
    pub downswing_secs: Option<f64>,
    pub analyzing: bool,
    pub phase: SwingPhase,
    pub cycle: u32,
    pub cycles_completed: u32,
    pub latest_accuracy: Option<AccuracyClass>,
    pub latest_deviation_secs: Option<f64>,
    /// Oldest to newest, bounded by the analyzer's history length
    pub recent_deviations: Vec<f64>,
    pub feedback: FeedbackDisplay,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        Self {
            active: false,
            shot_type: None,
            pro_name: None,
            bpm: None,
            ratio: None,
            backswing_secs: None,
            downswing_secs: None,
            analyzing: false,
            phase: SwingPhase::Idle,
            cycle: 0,
            cycles_completed: 0,
            latest_accuracy: None,
            latest_deviation_secs: None,
            recent_deviations: Vec::new(),
            feedback: FeedbackDisplay::Waiting,
        }
    }

    pub(crate) fn starting(profile: &TempoProfile, analyzing: bool) -> Self {
        Self {
            active: true,
            shot_type: Some(profile.shot_type()),
            pro_name: Some(profile.pro_name().to_string()),
            bpm: Some(profile.bpm()),
            ratio: Some(profile.ratio()),
            backswing_secs: Some(profile.backswing_seconds()),
            downswing_secs: Some(profile.downswing_seconds()),
            analyzing,
            ..Self::idle()
        }
    }

    pub(crate) fn update(&self) -> SessionUpdate {
        SessionUpdate {
            phase: self.phase,
            cycle: self.cycle,
            accuracy: self.latest_accuracy,
            deviation_secs: self.latest_deviation_secs,
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

/// End-of-session report returned by `stop_training`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub shot_type: ShotType,
    pub pro_name: String,
    pub duration_secs: f64,
    pub cycles_completed: u32,
    pub swings_observed: u32,
    pub perfect: u32,
    pub good: u32,
    pub needs_work: u32,
    pub mean_deviation_secs: Option<f64>,
    pub mean_backswing_error_ms: Option<f64>,
    pub mean_downswing_error_ms: Option<f64>,
    pub dropped_blocks: u64,
}

impl SessionSummary {
    /// Count for one accuracy class.
    pub fn count(&self, accuracy: AccuracyClass) -> u32 {
        match accuracy {
            AccuracyClass::Perfect => self.perfect,
            AccuracyClass::Good => self.good,
            AccuracyClass::NeedsWork => self.needs_work,
        }
    }
}

/// Session lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TelemetryEvent {
    SessionStarted {
        shot_type: ShotType,
        pro_name: String,
        bpm: u32,
        analyze_swings: bool,
    },
    SessionStopped {
        pro_name: String,
        cycles_completed: u32,
    },
    StartFailed {
        code: i32,
        message: String,
    },
}

/// Running totals behind a [`SessionSummary`].
#[derive(Debug, Default, Clone)]
pub(crate) struct SessionTally {
    cycles_completed: u32,
    counts: [u32; 3],
    deviation_sum: f64,
    backswing_error_sum: f64,
    downswing_error_sum: f64,
}

impl SessionTally {
    pub(crate) fn record_observation(&mut self, observation: &SwingObservation) {
        let slot = match observation.accuracy {
            AccuracyClass::Perfect => 0,
            AccuracyClass::Good => 1,
            AccuracyClass::NeedsWork => 2,
        };
        self.counts[slot] += 1;
        self.deviation_sum += observation.deviation_secs;
    }

    pub(crate) fn record_cycle(&mut self, report: &CycleReport) {
        self.cycles_completed = self.cycles_completed.max(report.cycle);
        self.backswing_error_sum += report.backswing_error_ms;
        self.downswing_error_sum += report.downswing_error_ms;
    }

    pub(crate) fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub(crate) fn summarize(
        &self,
        profile: &TempoProfile,
        duration_secs: f64,
        dropped_blocks: u64,
    ) -> SessionSummary {
        let swings: u32 = self.counts.iter().sum();
        let cycles = self.cycles_completed;
        let mean = |sum: f64, n: u32| if n > 0 { Some(sum / n as f64) } else { None };
        SessionSummary {
            shot_type: profile.shot_type(),
            pro_name: profile.pro_name().to_string(),
            duration_secs,
            cycles_completed: cycles,
            swings_observed: swings,
            perfect: self.counts[0],
            good: self.counts[1],
            needs_work: self.counts[2],
            mean_deviation_secs: mean(self.deviation_sum, swings),
            mean_backswing_error_ms: mean(self.backswing_error_sum, cycles),
            mean_downswing_error_ms: mean(self.downswing_error_sum, cycles),
            dropped_blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(accuracy: AccuracyClass, deviation_secs: f64) -> SwingObservation {
        SwingObservation {
            accuracy,
            deviation_secs,
            measured_interval_secs: 0.5 + deviation_secs,
            timestamp_secs: 1.0,
        }
    }

    #[test]
    fn test_feedback_projection() {
        assert_eq!(FeedbackDisplay::from_accuracy(None), FeedbackDisplay::Waiting);
        assert_eq!(
            FeedbackDisplay::from_accuracy(Some(AccuracyClass::Perfect)),
            FeedbackDisplay::Good
        );
        assert_eq!(
            FeedbackDisplay::from_accuracy(Some(AccuracyClass::Good)),
            FeedbackDisplay::Good
        );
        assert_eq!(
            FeedbackDisplay::from_accuracy(Some(AccuracyClass::NeedsWork)),
            FeedbackDisplay::NeedsWork
        );
    }

    #[test]
    fn test_tally_summary() {
        let profile = TempoProfile::custom(ShotType::Putting, "Tiger Woods", 76, 2.0).unwrap();
        let mut tally = SessionTally::default();
        tally.record_observation(&observation(AccuracyClass::Perfect, 0.01));
        tally.record_observation(&observation(AccuracyClass::NeedsWork, 0.29));

        let summary = tally.summarize(&profile, 12.5, 0);
        assert_eq!(summary.swings_observed, 2);
        assert_eq!(summary.count(AccuracyClass::Perfect), 1);
        assert_eq!(summary.count(AccuracyClass::NeedsWork), 1);
        assert!((summary.mean_deviation_secs.unwrap() - 0.15).abs() < 1e-9);
        assert_eq!(summary.cycles_completed, 0);
        assert_eq!(summary.mean_backswing_error_ms, None);
        assert_eq!(summary.shot_type, ShotType::Putting);
    }

    #[test]
    fn test_starting_snapshot_carries_identity() {
        let profile = TempoProfile::custom(ShotType::LongGame, "Adam Scott", 73, 3.0).unwrap();
        let snapshot = SessionSnapshot::starting(&profile, true);
        assert!(snapshot.active);
        assert_eq!(snapshot.pro_name.as_deref(), Some("Adam Scott"));
        assert_eq!(snapshot.phase, SwingPhase::Idle);
        assert_eq!(snapshot.feedback, FeedbackDisplay::Waiting);
        assert!((snapshot.backswing_secs.unwrap() - 2.466).abs() < 1e-3);
    }
}
