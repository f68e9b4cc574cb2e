use std::sync::Arc;

use crate::audio::capture::AudioCapture;
use crate::audio::stubs::{LogCuePlayer, NullCapture};
use crate::config::AppConfig;
use crate::cue::CuePlayer;
use crate::error::AudioError;

use super::AudioBackend;

/// Backend without devices: cues are logged and the microphone is silent.
///
/// Used for headless runs and the `--silent` CLI mode.
#[derive(Default)]
pub struct SilentBackend {
    _unit: (),
}

impl SilentBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for SilentBackend {
    fn open_cue_player(&self, _config: &AppConfig) -> Result<Arc<dyn CuePlayer>, AudioError> {
        Ok(Arc::new(LogCuePlayer))
    }

    fn open_capture(&self, config: &AppConfig) -> Result<Box<dyn AudioCapture>, AudioError> {
        Ok(Box::new(NullCapture::new(config.analyzer.sample_rate)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_backend_always_opens() {
        let backend = SilentBackend::new();
        let config = AppConfig::default();
        let player = backend.open_cue_player(&config).unwrap();
        player.speak("Address the ball");
        player.cleanup();

        let mut capture = backend.open_capture(&config).unwrap();
        assert_eq!(capture.start(Box::new(|_: &[f32]| {})).unwrap(), 44_100);
        capture.stop().unwrap();
    }
}
