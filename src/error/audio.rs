// Audio error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 1001-1012
pub struct AudioErrorCodes;

impl AudioErrorCodes {
    /// Capture or playback is already running
    pub const ALREADY_RUNNING: i32 = 1001;

    /// Capture or playback is not running
    pub const NOT_RUNNING: i32 = 1002;

    /// No usable input or output device
    pub const DEVICE_UNAVAILABLE: i32 = 1003;

    /// Failed to open audio stream
    pub const STREAM_OPEN_FAILED: i32 = 1004;

    /// Microphone permission denied
    pub const PERMISSION_DENIED: i32 = 1005;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1006;

    /// Requested tone asset does not exist
    pub const ASSET_NOT_FOUND: i32 = 1007;

    /// Tone asset exists but could not be decoded
    pub const ASSET_DECODE_FAILED: i32 = 1008;

    /// Speech synthesis failed or is unavailable
    pub const SPEECH_SYNTHESIS_FAILURE: i32 = 1009;

    /// Audio stream disconnected or channel closed unexpectedly
    pub const STREAM_FAILURE: i32 = 1010;

    /// JNI initialization failed on Android
    pub const JNI_INIT_FAILED: i32 = 1011;

    /// Android context was not initialized before the device was opened
    pub const CONTEXT_NOT_INITIALIZED: i32 = 1012;
}

/// Log an audio error with structured context
///
/// Audio failures during a running session are absorbed by the caller; this
/// keeps a record of them without interrupting the cue timeline.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=Audio, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These cover playback, speech, capture and device acquisition.
///
/// Error code ranges: 1001-1012
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Capture or playback is already running
    AlreadyRunning,

    /// Capture or playback is not running
    NotRunning,

    /// No usable input or output device
    DeviceUnavailable { details: String },

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Microphone permission denied
    PermissionDenied,

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// Requested tone asset does not exist
    AssetNotFound { asset: String },

    /// Tone asset exists but could not be decoded
    AssetDecodeFailed { asset: String, reason: String },

    /// Speech synthesis failed or is unavailable
    SpeechSynthesisFailure { reason: String },

    /// Stream channel disconnected unexpectedly
    StreamFailure { reason: String },

    /// JNI initialization failed on Android
    JniInitFailed { reason: String },

    /// Android context was not initialized before the device was opened
    ContextNotInitialized,
}

impl AudioError {
    /// True for errors that mean the physical device could not be acquired.
    pub fn is_device_failure(&self) -> bool {
        matches!(
            self,
            AudioError::DeviceUnavailable { .. }
                | AudioError::StreamOpenFailed { .. }
                | AudioError::PermissionDenied
                | AudioError::JniInitFailed { .. }
                | AudioError::ContextNotInitialized
        )
    }
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::AlreadyRunning => AudioErrorCodes::ALREADY_RUNNING,
            AudioError::NotRunning => AudioErrorCodes::NOT_RUNNING,
            AudioError::DeviceUnavailable { .. } => AudioErrorCodes::DEVICE_UNAVAILABLE,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::PermissionDenied => AudioErrorCodes::PERMISSION_DENIED,
            AudioError::LockPoisoned { .. } => AudioErrorCodes::LOCK_POISONED,
            AudioError::AssetNotFound { .. } => AudioErrorCodes::ASSET_NOT_FOUND,
            AudioError::AssetDecodeFailed { .. } => AudioErrorCodes::ASSET_DECODE_FAILED,
            AudioError::SpeechSynthesisFailure { .. } => {
                AudioErrorCodes::SPEECH_SYNTHESIS_FAILURE
            }
            AudioError::StreamFailure { .. } => AudioErrorCodes::STREAM_FAILURE,
            AudioError::JniInitFailed { .. } => AudioErrorCodes::JNI_INIT_FAILED,
            AudioError::ContextNotInitialized => AudioErrorCodes::CONTEXT_NOT_INITIALIZED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::AlreadyRunning => "Audio stream already running".to_string(),
            AudioError::NotRunning => "Audio stream not running".to_string(),
            AudioError::DeviceUnavailable { details } => {
                format!("Audio device unavailable: {}", details)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::PermissionDenied => {
                "Microphone permission denied. Please grant microphone access.".to_string()
            }
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            AudioError::AssetNotFound { asset } => {
                format!("Tone asset not found: {}", asset)
            }
            AudioError::AssetDecodeFailed { asset, reason } => {
                format!("Failed to decode tone asset {}: {}", asset, reason)
            }
            AudioError::SpeechSynthesisFailure { reason } => {
                format!("Speech synthesis failed: {}", reason)
            }
            AudioError::StreamFailure { reason } => {
                format!("Audio stream failed: {}", reason)
            }
            AudioError::JniInitFailed { reason } => {
                format!("JNI initialization failed: {}", reason)
            }
            AudioError::ContextNotInitialized => {
                "Android context not initialized before opening audio".to_string()
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::DeviceUnavailable {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::AlreadyRunning.code(),
            AudioErrorCodes::ALREADY_RUNNING
        );
        assert_eq!(AudioError::NotRunning.code(), AudioErrorCodes::NOT_RUNNING);
        assert_eq!(
            AudioError::AssetNotFound {
                asset: "impact_tone".to_string()
            }
            .code(),
            1007
        );
        assert_eq!(
            AudioError::SpeechSynthesisFailure {
                reason: "no engine".to_string()
            }
            .code(),
            1009
        );
        assert_eq!(AudioError::ContextNotInitialized.code(), 1012);
    }

    #[test]
    fn test_audio_error_messages() {
        let err = AudioError::AssetNotFound {
            asset: "takeaway_tone".to_string(),
        };
        assert_eq!(err.message(), "Tone asset not found: takeaway_tone");

        let err = AudioError::DeviceUnavailable {
            details: "no default input".to_string(),
        };
        assert!(err.message().contains("no default input"));
    }

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::PermissionDenied;
        let display = format!("{}", err);
        assert!(display.starts_with("AudioError::PermissionDenied"));
        assert!(display.contains("1005"));
    }

    #[test]
    fn test_device_failure_classification() {
        assert!(AudioError::StreamOpenFailed {
            reason: "busy".to_string()
        }
        .is_device_failure());
        assert!(AudioError::PermissionDenied.is_device_failure());
        assert!(!AudioError::AssetNotFound {
            asset: "x".to_string()
        }
        .is_device_failure());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::other("device vanished");
        let audio_err: AudioError = io_err.into();
        match audio_err {
            AudioError::DeviceUnavailable { details } => {
                assert!(details.contains("device vanished"));
            }
            _ => panic!("Expected DeviceUnavailable"),
        }
    }
}
