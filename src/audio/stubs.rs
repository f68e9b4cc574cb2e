//! Hardware-free audio endpoints
//!
//! These keep the full session pipeline runnable where no device is
//! available (CI, headless desktops) and let tests and the CLI push recorded
//! or synthetic audio through the same capture path the microphone uses.

use std::sync::{Arc, Mutex};

use crate::cue::{CueBinding, CueKind, CuePlayer};
use crate::error::AudioError;

use super::capture::{AudioCapture, BlockHandler};

/// Capture that never delivers a block. Sessions see no swings.
pub struct NullCapture {
    sample_rate: u32,
    running: bool,
}

impl NullCapture {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            running: false,
        }
    }
}

impl AudioCapture for NullCapture {
    fn start(&mut self, _handler: BlockHandler) -> Result<u32, AudioError> {
        if self.running {
            return Err(AudioError::AlreadyRunning);
        }
        self.running = true;
        Ok(self.sample_rate)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running = false;
        Ok(())
    }
}

type SharedHandler = Arc<Mutex<Option<BlockHandler>>>;

/// Capture driven by a [`CaptureFeeder`] instead of a device callback.
pub struct ManualCapture {
    sample_rate: u32,
    handler: SharedHandler,
}

/// Pushes blocks into a started [`ManualCapture`] from any thread.
#[derive(Clone)]
pub struct CaptureFeeder {
    handler: SharedHandler,
}

impl ManualCapture {
    pub fn new(sample_rate: u32) -> (Self, CaptureFeeder) {
        let handler: SharedHandler = Arc::new(Mutex::new(None));
        (
            Self {
                sample_rate,
                handler: Arc::clone(&handler),
            },
            CaptureFeeder { handler },
        )
    }
}

impl AudioCapture for ManualCapture {
    fn start(&mut self, handler: BlockHandler) -> Result<u32, AudioError> {
        let mut slot = self.handler.lock().map_err(|_| AudioError::LockPoisoned {
            component: "manual_capture".to_string(),
        })?;
        if slot.is_some() {
            return Err(AudioError::AlreadyRunning);
        }
        *slot = Some(handler);
        Ok(self.sample_rate)
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.handler
            .lock()
            .map_err(|_| AudioError::LockPoisoned {
                component: "manual_capture".to_string(),
            })?
            .take();
        Ok(())
    }
}

impl CaptureFeeder {
    /// Delivers one block. Returns false if the capture is not running.
    pub fn feed(&self, block: &[f32]) -> bool {
        let mut slot = self
            .handler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match slot.as_mut() {
            Some(handler) => {
                handler(block);
                true
            }
            None => false,
        }
    }

    /// Splits `samples` into `block_size` chunks and delivers them in order.
    pub fn feed_all(&self, samples: &[f32], block_size: usize) -> bool {
        samples
            .chunks(block_size.max(1))
            .all(|block| self.feed(block))
    }

    pub fn is_attached(&self) -> bool {
        self.handler
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

/// Cue player that only logs. Used when no output device is wanted.
#[derive(Default)]
pub struct LogCuePlayer;

impl CuePlayer for LogCuePlayer {
    fn bind(&self, binding: CueBinding) {
        log::info!(
            "[CuePlayer] (silent) bound to {} / {}",
            binding.shot_type,
            binding.pro_name
        );
    }

    fn play_cue(&self, kind: CueKind) {
        log::debug!("[CuePlayer] (silent) {}", kind.asset_name());
    }

    fn speak(&self, text: &str) {
        log::info!("[CuePlayer] (silent) says \"{}\"", text);
    }

    fn cleanup(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_manual_capture_delivers_blocks() {
        let (mut capture, feeder) = ManualCapture::new(44_100);
        assert!(!feeder.feed(&[0.0; 4]), "not started yet");

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        let rate = capture
            .start(Box::new(move |block: &[f32]| {
                seen_clone.fetch_add(block.len(), Ordering::SeqCst);
            }))
            .unwrap();
        assert_eq!(rate, 44_100);
        assert!(feeder.is_attached());

        assert!(feeder.feed_all(&[0.0; 10], 4));
        assert_eq!(seen.load(Ordering::SeqCst), 10);

        capture.stop().unwrap();
        assert!(!feeder.feed(&[0.0; 4]));
    }

    #[test]
    fn test_double_start_rejected() {
        let (mut capture, _feeder) = ManualCapture::new(8_000);
        capture.start(Box::new(|_: &[f32]| {})).unwrap();
        assert_eq!(
            capture.start(Box::new(|_: &[f32]| {})),
            Err(AudioError::AlreadyRunning)
        );

        let mut null = NullCapture::new(8_000);
        null.start(Box::new(|_: &[f32]| {})).unwrap();
        assert!(null.start(Box::new(|_: &[f32]| {})).is_err());
        null.stop().unwrap();
        assert!(null.start(Box::new(|_: &[f32]| {})).is_ok());
    }
}
