//! Platform audio backends.
//!
//! A backend hands out the two device-bound collaborators a training session
//! needs: a cue player on the output device and a capture on the input
//! device. Sessions acquire both through this trait only, so tests and the
//! CLI can swap in hardware-free backends.

use std::sync::Arc;

use crate::audio::capture::AudioCapture;
use crate::audio::speech::{CommandSpeech, LogSpeech, SpeechSynthesizer};
use crate::audio::tones::ToneBank;
use crate::config::AppConfig;
use crate::cue::CuePlayer;
use crate::error::AudioError;

/// Trait implemented by platform-specific audio backends.
pub trait AudioBackend: Send + Sync {
    /// Opens the output device and returns a ready cue player.
    fn open_cue_player(&self, config: &AppConfig) -> Result<Arc<dyn CuePlayer>, AudioError>;

    /// Returns an (unstarted) capture for the input device.
    fn open_capture(&self, config: &AppConfig) -> Result<Box<dyn AudioCapture>, AudioError>;
}

/// Tone bank for an output running at `sample_rate`.
pub(crate) fn tone_bank_for(config: &AppConfig, sample_rate: u32) -> ToneBank {
    match &config.audio.assets_dir {
        Some(dir) => ToneBank::from_dir(dir, sample_rate),
        None => ToneBank::synthesized(sample_rate),
    }
}

/// Speech engine selected by configuration.
pub(crate) fn speech_for(config: &AppConfig) -> Arc<dyn SpeechSynthesizer> {
    if !config.speech.enabled {
        return Arc::new(LogSpeech);
    }
    match &config.speech.command {
        Some(program) => Arc::new(CommandSpeech::new(program.clone())),
        None => Arc::new(CommandSpeech::platform_default()),
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        mod oboe;
        pub use oboe::OboeBackend;

        /// Backend for the current platform.
        pub fn create_backend() -> Arc<dyn AudioBackend> {
            Arc::new(OboeBackend::new())
        }
    } else {
        mod cpal;
        pub use cpal::CpalBackend;

        /// Backend for the current platform.
        pub fn create_backend() -> Arc<dyn AudioBackend> {
            Arc::new(CpalBackend::new())
        }
    }
}

mod silent;
pub use silent::SilentBackend;
