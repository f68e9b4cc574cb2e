//! Tone assets - synthesized or loaded from WAV files
//!
//! Each cue kind has one short mono clip. Clips are shared with the mixer
//! through `Arc` so playback never copies or allocates.

use std::path::Path;
use std::sync::Arc;

use crate::cue::CueKind;
use crate::error::AudioError;

/// Linear attack/decay length applied to synthesized tones
const ENVELOPE_MS: f32 = 5.0;

/// Frequency and length of a synthesized cue tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency_hz: f32,
    pub duration_ms: f32,
}

/// Built-in tone for each cue kind: a soft 330 Hz tick and a rising
/// A4 / C#5 / E5 triad for the swing phases.
pub fn default_tone_spec(kind: CueKind) -> ToneSpec {
    match kind {
        CueKind::Metronome => ToneSpec {
            frequency_hz: 330.0,
            duration_ms: 50.0,
        },
        CueKind::Takeaway => ToneSpec {
            frequency_hz: 440.0,
            duration_ms: 100.0,
        },
        CueKind::Downswing => ToneSpec {
            frequency_hz: 554.37,
            duration_ms: 100.0,
        },
        CueKind::Impact => ToneSpec {
            frequency_hz: 659.25,
            duration_ms: 100.0,
        },
    }
}

/// Generates a unit-amplitude sine tone with a short linear fade at both ends.
///
/// # Arguments
/// * `spec` - Frequency and duration
/// * `sample_rate` - Output sample rate in Hz
///
/// # Returns
/// Mono samples in `[-1.0, 1.0]`, starting and ending at zero
pub fn synthesize_tone(spec: ToneSpec, sample_rate: u32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * spec.duration_ms / 1000.0) as usize;
    let envelope_len = ((sample_rate as f32 * ENVELOPE_MS / 1000.0) as usize)
        .min(num_samples / 2)
        .max(1);
    let step = 2.0 * std::f32::consts::PI * spec.frequency_hz / sample_rate as f32;

    (0..num_samples)
        .map(|i| {
            let from_end = num_samples - 1 - i;
            let gain = if i < envelope_len {
                i as f32 / envelope_len as f32
            } else if from_end < envelope_len {
                from_end as f32 / envelope_len as f32
            } else {
                1.0
            };
            (step * i as f32).sin() * gain
        })
        .collect()
}

/// A decoded mono clip.
#[derive(Debug, Clone)]
pub struct ToneClip {
    samples: Arc<[f32]>,
}

impl ToneClip {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    pub fn samples(&self) -> &Arc<[f32]> {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One clip slot per cue kind. Missing slots play as logged no-ops.
#[derive(Debug, Clone)]
pub struct ToneBank {
    clips: [Option<ToneClip>; CueKind::COUNT],
    sample_rate: u32,
}

impl ToneBank {
    /// Bank of synthesized default tones.
    pub fn synthesized(sample_rate: u32) -> Self {
        let clips = CueKind::ALL.map(|kind| {
            Some(ToneClip::new(synthesize_tone(
                default_tone_spec(kind),
                sample_rate,
            )))
        });
        Self { clips, sample_rate }
    }

    /// Loads `<asset_name>.wav` for each cue kind from `dir`.
    ///
    /// Files that are missing or unreadable leave their slot empty; the
    /// session still runs and those cues are skipped.
    pub fn from_dir(dir: impl AsRef<Path>, sample_rate: u32) -> Self {
        let dir = dir.as_ref();
        let clips = CueKind::ALL.map(|kind| {
            let path = dir.join(format!("{}.wav", kind.asset_name()));
            match load_wav(&path, sample_rate) {
                Ok(clip) => {
                    log::info!(
                        "[ToneBank] Loaded {} ({} samples)",
                        path.display(),
                        clip.len()
                    );
                    Some(clip)
                }
                Err(err) => {
                    crate::error::log_audio_error(&err, "ToneBank::from_dir");
                    None
                }
            }
        });
        Self { clips, sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn clip(&self, kind: CueKind) -> Result<&ToneClip, AudioError> {
        self.clips[kind.index()]
            .as_ref()
            .ok_or_else(|| AudioError::AssetNotFound {
                asset: kind.asset_name().to_string(),
            })
    }
}

/// Reads a WAV file as mono f32 at `target_rate`.
///
/// Multi-channel files keep their first channel. Integer PCM is scaled to
/// `[-1, 1]` and mismatched rates are linearly resampled.
pub fn load_wav(path: &Path, target_rate: u32) -> Result<ToneClip, AudioError> {
    let asset = path.display().to_string();
    if !path.exists() {
        return Err(AudioError::AssetNotFound { asset });
    }

    let mut reader = hound::WavReader::open(path).map_err(|err| AudioError::AssetDecodeFailed {
        asset: asset.clone(),
        reason: err.to_string(),
    })?;
    let spec = reader.spec();
    let decode_err = |err: hound::Error| AudioError::AssetDecodeFailed {
        asset: asset.clone(),
        reason: err.to_string(),
    };

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(decode_err)?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(decode_err)?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let mono: Vec<f32> = interleaved.iter().step_by(channels).copied().collect();
    Ok(ToneClip::new(resample_linear(&mono, spec.sample_rate, target_rate)))
}

/// Linear-interpolation resampler, adequate for short cue tones.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let out_len = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let step = from_rate as f64 / to_rate as f64;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let index = pos as usize;
            let frac = (pos - index as f64) as f32;
            let a = samples[index.min(samples.len() - 1)];
            let b = samples[(index + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_tone_length_and_envelope() {
        let tone = synthesize_tone(default_tone_spec(CueKind::Takeaway), 44_100);
        assert_eq!(tone.len(), 4410);
        assert_eq!(tone[0], 0.0);
        assert!(tone.last().unwrap().abs() < 0.01);
        assert!(tone.iter().all(|s| s.abs() <= 1.0));
        let peak = tone.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.9);
    }

    #[test]
    fn test_metronome_tick_is_shorter() {
        let tick = synthesize_tone(default_tone_spec(CueKind::Metronome), 44_100);
        assert_eq!(tick.len(), 2205);
    }

    #[test]
    fn test_synthesized_bank_has_every_kind() {
        let bank = ToneBank::synthesized(48_000);
        for kind in CueKind::ALL {
            assert!(bank.clip(kind).is_ok());
        }
        assert_eq!(bank.sample_rate(), 48_000);
    }

    #[test]
    fn test_missing_directory_yields_asset_not_found() {
        let bank = ToneBank::from_dir("/nonexistent/tones", 44_100);
        let err = bank.clip(CueKind::Impact).unwrap_err();
        assert_eq!(
            err,
            AudioError::AssetNotFound {
                asset: "impact_tone".to_string()
            }
        );
    }

    #[test]
    fn test_load_wav_from_disk() {
        let dir = std::env::temp_dir().join(format!("golf_tempo_tones_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("takeaway_tone.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..1000 {
            let left = if i % 2 == 0 { 16_384 } else { -16_384 };
            writer.write_sample(left as i16).unwrap();
            writer.write_sample(0_i16).unwrap();
        }
        writer.finalize().unwrap();

        let bank = ToneBank::from_dir(&dir, 44_100);
        let clip = bank.clip(CueKind::Takeaway).unwrap();
        assert_eq!(clip.len(), 2000);
        assert!((clip.samples()[0] - 0.5).abs() < 1e-3);
        assert!(bank.clip(CueKind::Downswing).is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_resample_identity_and_double() {
        let samples = vec![0.0, 1.0, 0.0, -1.0];
        assert_eq!(resample_linear(&samples, 100, 100), samples);
        let doubled = resample_linear(&samples, 100, 200);
        assert_eq!(doubled.len(), 8);
        assert!((doubled[1] - 0.5).abs() < 1e-6);
    }
}
