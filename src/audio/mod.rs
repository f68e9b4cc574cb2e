// Audio module - cue output, speech and microphone capture

pub mod buffer_pool;
pub mod capture;
pub mod mixer;
pub mod speech;
pub mod stubs;
pub mod tones;

#[cfg(not(target_os = "android"))]
pub mod engine_cpal;
#[cfg(target_os = "android")]
pub mod engine_oboe;

// Re-export commonly used types for convenience
pub use buffer_pool::{AudioBuffer, BufferPool, DEFAULT_BUFFER_COUNT, DEFAULT_BUFFER_SIZE};
pub use capture::{AudioCapture, BlockHandler};
pub use mixer::{MixerHandle, ToneMixer};
pub use speech::{CommandSpeech, LogSpeech, SpeechChannel, SpeechSynthesizer};
pub use stubs::{CaptureFeeder, LogCuePlayer, ManualCapture, NullCapture};
pub use tones::{ToneBank, ToneClip, ToneSpec};
