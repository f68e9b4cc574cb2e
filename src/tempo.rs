//! Tempo model - converts a professional's bpm/ratio into swing phase durations
//!
//! One beat is one downswing. The backswing lasts `ratio` beats, so a 3:1
//! profile at 73 bpm spends ~2.466s on the backswing and ~0.822s on the
//! downswing. Everything here is pure and allocation-free.

use crate::catalog::ShotType;
use crate::error::TempoError;
use serde::Serialize;
use std::time::Duration;

/// Number of metronome ticks that share one backswing in the preamble.
const METRONOME_DIVISIONS: f64 = 3.0;

/// Longest phase the sequencer will schedule.
pub const MAX_PHASE_SECS: f64 = 600.0;

/// Phase lengths are validated by `phase_durations`; hand-built values are
/// clamped into range rather than trusted.
fn phase_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.clamp(0.0, MAX_PHASE_SECS)).unwrap_or(Duration::ZERO)
}

/// Backswing and downswing lengths derived from a tempo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseDurations {
    pub backswing_secs: f64,
    pub downswing_secs: f64,
}

impl PhaseDurations {
    pub fn backswing(&self) -> Duration {
        phase_duration(self.backswing_secs)
    }

    pub fn downswing(&self) -> Duration {
        phase_duration(self.downswing_secs)
    }

    /// Gap between preamble metronome ticks (`backswing / 3`).
    pub fn metronome_spacing(&self) -> Duration {
        phase_duration(self.backswing_secs / METRONOME_DIVISIONS)
    }

    /// Takeaway to impact.
    pub fn swing_total_secs(&self) -> f64 {
        self.backswing_secs + self.downswing_secs
    }

    pub fn ratio(&self) -> f64 {
        self.backswing_secs / self.downswing_secs
    }
}

/// Converts a tempo into phase durations.
///
/// # Arguments
/// * `bpm` - Beats per minute; one beat is the downswing
/// * `ratio` - Backswing length in beats
///
/// # Returns
/// `PhaseDurations` with `downswing = 60/bpm` and `backswing = ratio * 60/bpm`,
/// or `TempoError::InvalidTempoParameters` if either input is not a positive
/// finite number or either phase would outlast `MAX_PHASE_SECS`.
///
/// # Examples
/// ```
/// use golf_tempo_trainer::tempo::phase_durations;
///
/// let durations = phase_durations(73.0, 3.0).unwrap();
/// assert!((durations.backswing_secs - 2.466).abs() < 0.001);
/// assert!((durations.downswing_secs - 0.822).abs() < 0.001);
/// ```
pub fn phase_durations(bpm: f64, ratio: f64) -> Result<PhaseDurations, TempoError> {
    if !(bpm.is_finite() && bpm > 0.0 && ratio.is_finite() && ratio > 0.0) {
        return Err(TempoError::InvalidTempoParameters { bpm, ratio });
    }

    let beat = 60.0 / bpm;
    let backswing_secs = beat * ratio;
    let schedulable = |secs: f64| {
        secs <= MAX_PHASE_SECS && Duration::try_from_secs_f64(secs).is_ok()
    };
    if !(schedulable(backswing_secs) && schedulable(beat)) {
        return Err(TempoError::InvalidTempoParameters { bpm, ratio });
    }

    Ok(PhaseDurations {
        backswing_secs,
        downswing_secs: beat,
    })
}

/// A selected professional's tempo, fixed for the lifetime of a session.
///
/// Only `bpm` and `ratio` drive timing; the text fields pass through to
/// whoever renders the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TempoProfile {
    shot_type: ShotType,
    pro_name: String,
    bpm: u32,
    ratio: f64,
    frame_notation: String,
    description: String,
    learning_notes: String,
}

impl TempoProfile {
    /// Builds a profile, rejecting tempos the sequencer could not schedule.
    pub fn new(
        shot_type: ShotType,
        pro_name: impl Into<String>,
        bpm: u32,
        ratio: f64,
        frame_notation: impl Into<String>,
        description: impl Into<String>,
        learning_notes: impl Into<String>,
    ) -> Result<Self, TempoError> {
        phase_durations(bpm as f64, ratio)?;
        Ok(Self {
            shot_type,
            pro_name: pro_name.into(),
            bpm,
            ratio,
            frame_notation: frame_notation.into(),
            description: description.into(),
            learning_notes: learning_notes.into(),
        })
    }

    /// Bare profile with empty text fields, handy for ad-hoc tempos.
    pub fn custom(
        shot_type: ShotType,
        pro_name: impl Into<String>,
        bpm: u32,
        ratio: f64,
    ) -> Result<Self, TempoError> {
        Self::new(shot_type, pro_name, bpm, ratio, "", "", "")
    }

    pub fn shot_type(&self) -> ShotType {
        self.shot_type
    }

    pub fn pro_name(&self) -> &str {
        &self.pro_name
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn frame_notation(&self) -> &str {
        &self.frame_notation
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn learning_notes(&self) -> &str {
        &self.learning_notes
    }

    /// Re-derives the phase durations. Construction already validated the
    /// inputs, but this stays fallible so callers never trust a stale check.
    pub fn durations(&self) -> Result<PhaseDurations, TempoError> {
        phase_durations(self.bpm as f64, self.ratio)
    }

    pub fn backswing_seconds(&self) -> f64 {
        (60.0 / self.bpm as f64) * self.ratio
    }

    pub fn downswing_seconds(&self) -> f64 {
        60.0 / self.bpm as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_profile_durations() {
        let d = phase_durations(73.0, 3.0).unwrap();
        assert!((d.backswing_secs - 2.4658).abs() < 1e-3);
        assert!((d.downswing_secs - 0.8219).abs() < 1e-3);
        assert!((d.ratio() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_durations_formula_across_range() {
        for bpm in [1.0, 40.0, 73.0, 98.0, 112.0, 240.0] {
            for ratio in [0.5, 1.0, 2.0, 3.0, 4.5] {
                let d = phase_durations(bpm, ratio).unwrap();
                assert!((d.backswing_secs - 60.0 * ratio / bpm).abs() < 1e-9);
                assert!((d.downswing_secs - 60.0 / bpm).abs() < 1e-9);
                assert!(d.backswing_secs > 0.0);
                assert!(d.downswing_secs > 0.0);
            }
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        for (bpm, ratio) in [
            (0.0, 3.0),
            (-73.0, 3.0),
            (73.0, 0.0),
            (73.0, -2.0),
            (f64::NAN, 3.0),
            (73.0, f64::INFINITY),
            (1.0, 1e20),
            (1e-300, 3.0),
            (0.05, 1.0),
        ] {
            assert!(
                matches!(
                    phase_durations(bpm, ratio),
                    Err(TempoError::InvalidTempoParameters { .. })
                ),
                "bpm={} ratio={} should be rejected",
                bpm,
                ratio
            );
        }
    }

    #[test]
    fn test_longest_schedulable_phase_accepted() {
        // 1 bpm at 10:1 is exactly ten minutes of backswing
        let d = phase_durations(1.0, 10.0).unwrap();
        assert_eq!(d.backswing(), Duration::from_secs(600));
        assert_eq!(d.metronome_spacing(), Duration::from_secs(200));
        assert!(phase_durations(1.0, 10.5).is_err());
    }

    #[test]
    fn test_hand_built_durations_never_panic() {
        let d = PhaseDurations {
            backswing_secs: 6e21,
            downswing_secs: f64::NAN,
        };
        assert_eq!(d.backswing(), Duration::from_secs(600));
        assert_eq!(d.metronome_spacing(), Duration::from_secs(600));
        assert!(d.downswing() <= Duration::from_secs(600));
    }

    #[test]
    fn test_profile_rejects_unschedulable_ratio() {
        let result = TempoProfile::custom(ShotType::LongGame, "x", 1, 1e20);
        assert!(matches!(
            result,
            Err(TempoError::InvalidTempoParameters { .. })
        ));
    }

    #[test]
    fn test_metronome_spacing_is_third_of_backswing() {
        let d = phase_durations(98.0, 3.0).unwrap();
        let spacing = d.metronome_spacing().as_secs_f64();
        assert!((spacing * 3.0 - d.backswing_secs).abs() < 1e-6);
    }

    #[test]
    fn test_profile_rejects_zero_bpm() {
        let result = TempoProfile::custom(ShotType::LongGame, "Nobody", 0, 3.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_accessors() {
        let profile = TempoProfile::new(
            ShotType::Putting,
            "Jake Armijo",
            85,
            2.0,
            "12/6",
            "Quick, rhythmic putting tempo",
            "notes",
        )
        .unwrap();
        assert_eq!(profile.frame_notation(), "12/6");
        assert!((profile.downswing_seconds() - 60.0 / 85.0).abs() < 1e-9);
        assert!((profile.backswing_seconds() - 120.0 / 85.0).abs() < 1e-9);
        let d = profile.durations().unwrap();
        assert_eq!(d.backswing_secs, profile.backswing_seconds());
    }
}
