//! Synthetic swing recordings
//!
//! A swing is modelled as a short loud burst (a swoosh or club contact)
//! over low background noise. Noise comes from a seeded RNG so a given
//! seed always produces the same samples.

use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: u32,
    /// Peak amplitude of the background noise
    pub noise_amplitude: f32,
    /// Amplitude of each swing burst
    pub burst_amplitude: f32,
    pub burst_ms: u32,
    pub burst_frequency_hz: f32,
    pub seed: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            noise_amplitude: 0.01,
            burst_amplitude: 0.6,
            burst_ms: 60,
            burst_frequency_hz: 180.0,
            seed: 7,
        }
    }
}

/// Mono samples plus where the bursts were placed.
#[derive(Debug, Clone)]
pub struct SwingRecording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Burst onsets in seconds from the start of the recording
    pub burst_times_secs: Vec<f64>,
}

impl SwingRecording {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Renders `total_secs` of noise with a burst starting at each of
/// `burst_times_secs`. Bursts past the end are clipped.
pub fn synthesize_swings(
    burst_times_secs: &[f64],
    total_secs: f64,
    config: &SynthConfig,
) -> SwingRecording {
    let sample_rate = config.sample_rate.max(1);
    let total = (total_secs.max(0.0) * sample_rate as f64).round() as usize;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut samples: Vec<f32> = if config.noise_amplitude > 0.0 {
        (0..total)
            .map(|_| rng.gen_range(-config.noise_amplitude..config.noise_amplitude))
            .collect()
    } else {
        vec![0.0; total]
    };

    let burst_len = (config.burst_ms as usize * sample_rate as usize) / 1000;
    for &onset in burst_times_secs {
        let start = (onset.max(0.0) * sample_rate as f64).round() as usize;
        let end = (start + burst_len).min(total);
        for (offset, sample) in samples[start.min(total)..end].iter_mut().enumerate() {
            let phase = TAU * config.burst_frequency_hz * offset as f32 / sample_rate as f32;
            *sample += config.burst_amplitude * phase.sin();
        }
    }

    SwingRecording {
        samples,
        sample_rate,
        burst_times_secs: burst_times_secs.to_vec(),
    }
}

/// Burst onsets for `count` swings `interval_secs` apart, starting at
/// `first_secs`, each nudged by up to `jitter_secs` either way.
pub fn swing_schedule(
    count: usize,
    first_secs: f64,
    interval_secs: f64,
    jitter_secs: f64,
    seed: u64,
) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let jitter = if jitter_secs > 0.0 {
                rng.gen_range(-jitter_secs..jitter_secs)
            } else {
                0.0
            };
            (first_secs + i as f64 * interval_secs + jitter).max(0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_samples() {
        let config = SynthConfig::default();
        let a = synthesize_swings(&[0.5], 1.0, &config);
        let b = synthesize_swings(&[0.5], 1.0, &config);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.samples.len(), 44_100);
    }

    #[test]
    fn test_burst_is_louder_than_noise() {
        let config = SynthConfig::default();
        let rec = synthesize_swings(&[0.5], 1.0, &config);
        let rms = |s: &[f32]| (s.iter().map(|x| x * x).sum::<f32>() / s.len() as f32).sqrt();
        let quiet = rms(&rec.samples[0..2048]);
        let loud = rms(&rec.samples[22_050..22_050 + 2048]);
        assert!(quiet < 0.02, "noise rms {}", quiet);
        assert!(loud > 0.3, "burst rms {}", loud);
    }

    #[test]
    fn test_schedule_without_jitter_is_exact() {
        let times = swing_schedule(3, 1.0, 0.5, 0.0, 1);
        assert_eq!(times, vec![1.0, 1.5, 2.0]);
    }
}
