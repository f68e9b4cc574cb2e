//! Configuration management
//!
//! Timing constants, analyzer thresholds and cue volumes are loaded from a
//! JSON file so they can be tuned without recompiling. Every section falls
//! back to its defaults when missing, and a missing or broken file falls
//! back to `AppConfig::default()`.

use crate::catalog::ShotType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at an alternate config file (desktop only)
pub const CONFIG_PATH_ENV: &str = "GOLF_TEMPO_CONFIG";

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sequencer: SequencerConfig,
    pub analyzer: AnalyzerConfig,
    pub audio: AudioConfig,
    pub cues: CueConfig,
    pub speech: SpeechConfig,
}

/// Fixed pauses of the cue cycle. Phase lengths come from the tempo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Pause after announcing the professional
    pub announce_gap_ms: u64,
    /// Pause after "Address the ball" before the first tick
    pub settle_delay_ms: u64,
    /// Preamble metronome ticks
    pub metronome_ticks: u8,
    /// Time spent in Impact before returning to Idle
    pub impact_hold_ms: u64,
    /// Time spent in Idle between cycles
    pub inter_cycle_pause_ms: u64,
    /// Capacity of the sequencer event broadcast
    pub event_capacity: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            announce_gap_ms: 500,
            settle_delay_ms: 1000,
            metronome_ticks: 4,
            impact_hold_ms: 1000,
            inter_cycle_pause_ms: 1500,
            event_capacity: 64,
        }
    }
}

impl SequencerConfig {
    pub fn announce_gap(&self) -> Duration {
        Duration::from_millis(self.announce_gap_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn impact_hold(&self) -> Duration {
        Duration::from_millis(self.impact_hold_ms)
    }

    pub fn inter_cycle_pause(&self) -> Duration {
        Duration::from_millis(self.inter_cycle_pause_ms)
    }
}

/// Swing analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    /// RMS window length in samples
    pub window_size: usize,
    /// RMS level (normalized [-1, 1] scale) that counts as a swing peak
    pub rms_threshold: f32,
    /// Length of the rolling sample buffer
    pub history_seconds: f32,
    /// Reference interval between peaks. `None` uses the profile's beat.
    pub expected_interval_secs: Option<f64>,
    /// Deviation below this is Perfect
    pub perfect_tolerance_secs: f64,
    /// Deviation below this is Good
    pub good_tolerance_secs: f64,
    /// Number of deviations kept for trend display
    pub deviation_history_len: usize,
    /// Log analyzer statistics every N blocks
    pub log_every_n_blocks: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            window_size: 1024,
            rms_threshold: 0.1,
            history_seconds: 2.0,
            expected_interval_secs: Some(0.5),
            perfect_tolerance_secs: 0.05,
            good_tolerance_secs: 0.10,
            deviation_history_len: 3,
            log_every_n_blocks: 500,
        }
    }
}

impl AnalyzerConfig {
    /// Rolling buffer capacity in samples at `sample_rate` (never smaller
    /// than one window).
    pub fn history_capacity(&self, sample_rate: u32) -> usize {
        let samples = (self.history_seconds.max(0.0) * sample_rate as f32) as usize;
        samples.max(self.window_size)
    }
}

/// Audio pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Number of pre-allocated capture buffers
    pub buffer_pool_size: usize,
    /// Size of each capture buffer in samples
    pub buffer_size: usize,
    /// Directory holding `<cue>_tone.wav` files. `None` synthesizes tones.
    pub assets_dir: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            buffer_pool_size: 64,
            buffer_size: 2048,
            assets_dir: None,
        }
    }
}

/// Volumes for the three swing tones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseVolumes {
    pub takeaway: f32,
    pub downswing: f32,
    pub impact: f32,
}

/// Per shot type tone volumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotVolumes {
    pub long_game: PhaseVolumes,
    pub short_game: PhaseVolumes,
    pub putting: PhaseVolumes,
}

impl Default for ShotVolumes {
    fn default() -> Self {
        Self {
            long_game: PhaseVolumes {
                takeaway: 0.8,
                downswing: 0.8,
                impact: 0.9,
            },
            short_game: PhaseVolumes {
                takeaway: 0.8,
                downswing: 0.8,
                impact: 0.85,
            },
            putting: PhaseVolumes {
                takeaway: 0.7,
                downswing: 0.7,
                impact: 0.8,
            },
        }
    }
}

impl ShotVolumes {
    pub fn for_shot(&self, shot_type: ShotType) -> PhaseVolumes {
        match shot_type {
            ShotType::LongGame => self.long_game,
            ShotType::ShortGame => self.short_game,
            ShotType::Putting => self.putting,
        }
    }
}

/// Cue playback levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    /// Metronome ticks sit under the swing tones
    pub metronome_volume: f32,
    pub swing_volume: f32,
    pub shot_volumes: ShotVolumes,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            metronome_volume: 0.5,
            swing_volume: 1.0,
            shot_volumes: ShotVolumes::default(),
        }
    }
}

/// Spoken announcement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Override for the text-to-speech program (`say`/`espeak` otherwise)
    pub command: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or `AppConfig::default()` if the file is
    /// missing or invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Android ships without a writable config file; defaults apply.
    #[cfg(target_os = "android")]
    pub fn load_android() -> Self {
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    /// Load configuration for non-Android platforms
    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(path),
            Err(_) if Path::new("config.json").exists() => Self::load_from_file("config.json"),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.sequencer.settle_delay_ms, 1000);
        assert_eq!(config.sequencer.metronome_ticks, 4);
        assert_eq!(config.sequencer.inter_cycle_pause_ms, 1500);
        assert_eq!(config.analyzer.window_size, 1024);
        assert_eq!(config.analyzer.rms_threshold, 0.1);
        assert_eq!(config.analyzer.expected_interval_secs, Some(0.5));
        assert_eq!(config.cues.metronome_volume, 0.5);
        assert_eq!(config.audio.buffer_pool_size, 64);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"sequencer": {"settle_delay_ms": 250}, "analyzer": {"expected_interval_secs": null}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sequencer.settle_delay_ms, 250);
        assert_eq!(config.sequencer.impact_hold_ms, 1000);
        assert_eq!(config.analyzer.expected_interval_secs, None);
        assert_eq!(config.analyzer.window_size, 1024);
        assert_eq!(config.speech, SpeechConfig::default());
    }

    #[test]
    fn test_history_capacity() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.history_capacity(config.sample_rate), 88_200);

        let tiny = AnalyzerConfig {
            history_seconds: 0.001,
            ..AnalyzerConfig::default()
        };
        assert_eq!(tiny.history_capacity(tiny.sample_rate), tiny.window_size);
    }

    #[test]
    fn test_shot_volumes_lookup() {
        let volumes = ShotVolumes::default();
        assert_eq!(volumes.for_shot(ShotType::Putting).impact, 0.8);
        assert_eq!(volumes.for_shot(ShotType::ShortGame).impact, 0.85);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/golf_tempo_config.json");
        assert_eq!(config, AppConfig::default());
    }
}
