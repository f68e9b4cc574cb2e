//! CPAL-based audio backend for desktop platforms (Linux, macOS, Windows)

use std::sync::Arc;

use crate::audio::capture::AudioCapture;
use crate::audio::engine_cpal::{open_output_stream, CpalCapture};
use crate::audio::mixer::{ToneMixer, DEFAULT_COMMAND_CAPACITY};
use crate::audio::speech::SpeechChannel;
use crate::config::AppConfig;
use crate::cue::{CuePlayer, DeviceCuePlayer};
use crate::error::AudioError;

use super::{speech_for, tone_bank_for, AudioBackend};

/// Default system devices through cpal
#[derive(Default)]
pub struct CpalBackend {
    _unit: (),
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for CpalBackend {
    fn open_cue_player(&self, config: &AppConfig) -> Result<Arc<dyn CuePlayer>, AudioError> {
        let (mixer, handle) = ToneMixer::new(DEFAULT_COMMAND_CAPACITY);
        let stream = open_output_stream(mixer)?;
        let bank = tone_bank_for(config, stream.sample_rate());
        let speech = SpeechChannel::new(speech_for(config));

        Ok(Arc::new(DeviceCuePlayer::new(
            bank,
            handle,
            speech,
            config.cues.clone(),
            Some(Box::new(stream)),
        )))
    }

    fn open_capture(&self, _config: &AppConfig) -> Result<Box<dyn AudioCapture>, AudioError> {
        Ok(Box::new(CpalCapture::new()))
    }
}
