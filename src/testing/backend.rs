use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::capture::AudioCapture;
use crate::audio::stubs::{CaptureFeeder, ManualCapture};
use crate::config::AppConfig;
use crate::cue::CuePlayer;
use crate::engine::backend::AudioBackend;
use crate::error::AudioError;

use super::recording::{CueLog, RecordingCuePlayer};

/// Backend for tests and simulations.
///
/// Every cue player it opens records into one shared [`CueLog`]; every
/// capture is a [`ManualCapture`] whose feeder is kept for the caller.
/// Output and input can be made to fail on demand.
pub struct FakeBackend {
    log: CueLog,
    sample_rate: u32,
    feeder: Mutex<Option<CaptureFeeder>>,
    players_opened: AtomicUsize,
    captures_opened: AtomicUsize,
    fail_output: AtomicBool,
    fail_capture: AtomicBool,
}

impl FakeBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            log: CueLog::new(),
            sample_rate,
            feeder: Mutex::new(None),
            players_opened: AtomicUsize::new(0),
            captures_opened: AtomicUsize::new(0),
            fail_output: AtomicBool::new(false),
            fail_capture: AtomicBool::new(false),
        }
    }

    pub fn log(&self) -> &CueLog {
        &self.log
    }

    /// Feeder of the most recently opened capture.
    pub fn feeder(&self) -> Option<CaptureFeeder> {
        self.feeder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_fail_output(&self, fail: bool) {
        self.fail_output.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_capture(&self, fail: bool) {
        self.fail_capture.store(fail, Ordering::SeqCst);
    }

    pub fn players_opened(&self) -> usize {
        self.players_opened.load(Ordering::SeqCst)
    }

    pub fn captures_opened(&self) -> usize {
        self.captures_opened.load(Ordering::SeqCst)
    }
}

impl AudioBackend for FakeBackend {
    fn open_cue_player(&self, _config: &AppConfig) -> Result<Arc<dyn CuePlayer>, AudioError> {
        if self.fail_output.load(Ordering::SeqCst) {
            return Err(AudioError::DeviceUnavailable {
                details: "fake output device disabled".to_string(),
            });
        }
        self.players_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(RecordingCuePlayer::with_log(self.log.clone())))
    }

    fn open_capture(&self, _config: &AppConfig) -> Result<Box<dyn AudioCapture>, AudioError> {
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(AudioError::PermissionDenied);
        }
        let (capture, feeder) = ManualCapture::new(self.sample_rate);
        *self
            .feeder
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(feeder);
        self.captures_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(capture))
    }
}
