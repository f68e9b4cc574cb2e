//! Audio capture abstraction
//!
//! The swing analyzer only sees this trait. Platform adapters (cpal on
//! desktop, Oboe on Android) and test sources implement it.

use crate::error::AudioError;

/// Called from the capture thread with each block of mono samples.
pub type BlockHandler = Box<dyn FnMut(&[f32]) + Send + 'static>;

pub trait AudioCapture: Send {
    /// Starts delivering blocks to `handler` and returns the sample rate the
    /// blocks arrive at.
    fn start(&mut self, handler: BlockHandler) -> Result<u32, AudioError>;

    /// Stops delivery and drops the handler. Safe to call when stopped.
    fn stop(&mut self) -> Result<(), AudioError>;
}
