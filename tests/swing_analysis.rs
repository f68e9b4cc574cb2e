//! Offline swing analysis over synthetic recordings.

use golf_tempo_trainer::analysis::{analyze_samples, AccuracyClass};
use golf_tempo_trainer::config::AnalyzerConfig;
use golf_tempo_trainer::testing::{swing_schedule, synthesize_swings, SynthConfig};

const BLOCK: usize = 441;

fn classes(bursts: &[f64], total_secs: f64) -> Vec<AccuracyClass> {
    let recording = synthesize_swings(bursts, total_secs, &SynthConfig::default());
    analyze_samples(
        &recording.samples,
        recording.sample_rate,
        BLOCK,
        &AnalyzerConfig::default(),
        0.5,
    )
    .into_iter()
    .map(|observation| observation.accuracy)
    .collect()
}

#[test]
fn test_mixed_timing_covers_every_class() {
    // Intervals: 0.5 (perfect), 0.58 (good), 0.7 (needs work), 0.5 (perfect)
    let bursts = [0.2, 0.7, 1.28, 1.98, 2.48];
    assert_eq!(
        classes(&bursts, 3.0),
        vec![
            AccuracyClass::Perfect,
            AccuracyClass::Good,
            AccuracyClass::NeedsWork,
            AccuracyClass::Perfect,
        ]
    );
}

#[test]
fn test_rushed_swings_need_work() {
    let bursts = swing_schedule(5, 0.2, 0.3, 0.0, 3);
    let verdicts = classes(&bursts, 2.0);
    assert_eq!(verdicts.len(), 4);
    assert!(verdicts.iter().all(|c| *c == AccuracyClass::NeedsWork));
}

#[test]
fn test_small_jitter_stays_within_good() {
    let bursts = swing_schedule(10, 0.2, 0.5, 0.02, 11);
    let verdicts = classes(&bursts, 6.0);
    assert_eq!(verdicts.len(), 9);
    assert!(verdicts.iter().all(|c| *c != AccuracyClass::NeedsWork));
}

#[test]
fn test_noise_floor_alone_is_silent() {
    assert!(classes(&[], 3.0).is_empty());
}
