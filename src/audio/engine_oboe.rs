//! Android audio I/O via oboe-rs (AAudio/OpenSL ES)
//!
//! Both directions run callback streams: the output callback renders the
//! tone mixer, the input callback hands mono blocks to the capture handler.
//! Callbacks never allocate or lock.

use oboe::{
    AudioInputCallback, AudioInputStreamSafe, AudioOutputCallback, AudioOutputStreamSafe,
    AudioStream, AudioStreamAsync, AudioStreamBuilder, DataCallbackResult, Input, Output,
    PerformanceMode, SharingMode,
};

use super::capture::{AudioCapture, BlockHandler};
use super::mixer::ToneMixer;
use crate::error::AudioError;

/// Output callback rendering cue tones
pub struct MixerCallback {
    mixer: ToneMixer,
}

impl AudioOutputCallback for MixerCallback {
    type FrameType = (f32, oboe::Mono);

    fn on_audio_ready(
        &mut self,
        _stream: &mut dyn AudioOutputStreamSafe,
        frames: &mut [f32],
    ) -> DataCallbackResult {
        self.mixer.render(frames, 1);
        DataCallbackResult::Continue
    }
}

/// Input callback forwarding captured blocks
pub struct CaptureCallback {
    handler: BlockHandler,
}

impl AudioInputCallback for CaptureCallback {
    type FrameType = (f32, oboe::Mono);

    fn on_audio_ready(
        &mut self,
        _stream: &mut dyn AudioInputStreamSafe,
        frames: &[f32],
    ) -> DataCallbackResult {
        (self.handler)(frames);
        DataCallbackResult::Continue
    }
}

/// Running output stream; dropping it stops playback.
pub struct OboeOutputStream {
    stream: AudioStreamAsync<Output, MixerCallback>,
}

impl OboeOutputStream {
    pub fn sample_rate(&self) -> u32 {
        self.stream.get_sample_rate().max(0) as u32
    }
}

impl Drop for OboeOutputStream {
    fn drop(&mut self) {
        let _ = self.stream.stop();
    }
}

/// Opens a low-latency mono output stream rendering `mixer`.
pub fn open_output_stream(mixer: ToneMixer) -> Result<OboeOutputStream, AudioError> {
    let mut stream = AudioStreamBuilder::default()
        .set_performance_mode(PerformanceMode::LowLatency)
        .set_sharing_mode(SharingMode::Shared)
        .set_direction::<Output>()
        .set_channel_count::<oboe::Mono>()
        .set_format::<f32>()
        .set_callback(MixerCallback { mixer })
        .open_stream()
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Output stream: {:?}", e),
        })?;

    stream.start().map_err(|e| AudioError::DeviceUnavailable {
        details: format!("Failed to start output stream: {:?}", e),
    })?;

    Ok(OboeOutputStream { stream })
}

/// Microphone capture through Oboe
#[derive(Default)]
pub struct OboeCapture {
    stream: Option<AudioStreamAsync<Input, CaptureCallback>>,
}

impl OboeCapture {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioCapture for OboeCapture {
    fn start(&mut self, handler: BlockHandler) -> Result<u32, AudioError> {
        if self.stream.is_some() {
            return Err(AudioError::AlreadyRunning);
        }

        let mut stream = AudioStreamBuilder::default()
            .set_performance_mode(PerformanceMode::LowLatency)
            .set_sharing_mode(SharingMode::Shared)
            .set_direction::<Input>()
            .set_channel_count::<oboe::Mono>()
            .set_format::<f32>()
            .set_callback(CaptureCallback { handler })
            .open_stream()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Input stream: {:?}", e),
            })?;

        stream.start().map_err(|e| AudioError::DeviceUnavailable {
            details: format!("Failed to start input stream: {:?}", e),
        })?;

        let sample_rate = stream.get_sample_rate().max(0) as u32;
        self.stream = Some(stream);
        Ok(sample_rate)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(mut stream) = self.stream.take() {
            stream.stop().map_err(|e| AudioError::StreamFailure {
                reason: format!("Failed to stop input stream: {:?}", e),
            })?;
        }
        Ok(())
    }
}
