//! Android backend built on Oboe streams.

use std::sync::Arc;

use crate::audio::capture::AudioCapture;
use crate::audio::engine_oboe::{open_output_stream, OboeCapture};
use crate::audio::mixer::{ToneMixer, DEFAULT_COMMAND_CAPACITY};
use crate::audio::speech::{LogSpeech, SpeechChannel};
use crate::config::AppConfig;
use crate::cue::{CuePlayer, DeviceCuePlayer};
use crate::error::AudioError;

use super::{tone_bank_for, AudioBackend};

/// Android backend. Speech is voiced by the host app, so announcements are
/// logged here.
#[derive(Default)]
pub struct OboeBackend {
    _unit: (),
}

impl OboeBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for OboeBackend {
    fn open_cue_player(&self, config: &AppConfig) -> Result<Arc<dyn CuePlayer>, AudioError> {
        let (mixer, handle) = ToneMixer::new(DEFAULT_COMMAND_CAPACITY);
        let stream = open_output_stream(mixer)?;
        let bank = tone_bank_for(config, stream.sample_rate());
        let speech = SpeechChannel::new(Arc::new(LogSpeech));

        Ok(Arc::new(DeviceCuePlayer::new(
            bank,
            handle,
            speech,
            config.cues.clone(),
            Some(Box::new(stream)),
        )))
    }

    fn open_capture(&self, _config: &AppConfig) -> Result<Box<dyn AudioCapture>, AudioError> {
        Ok(Box::new(OboeCapture::new()))
    }
}
