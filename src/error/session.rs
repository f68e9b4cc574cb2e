// Tempo and session lifecycle errors

use crate::error::{AudioError, ErrorCode};
use log::error;
use std::fmt;

/// Session error code constants
///
/// Tempo validation: 2001. Session lifecycle: 3001-3003.
pub struct SessionErrorCodes;

impl SessionErrorCodes {
    /// bpm or ratio is not a positive finite number
    pub const INVALID_TEMPO_PARAMETERS: i32 = 2001;

    /// Session rejected because its tempo parameters are invalid
    pub const SESSION_INVALID_TEMPO: i32 = 3001;

    /// Output or input device could not be acquired
    pub const AUDIO_DEVICE_UNAVAILABLE: i32 = 3002;

    /// Session state lock was poisoned
    pub const LOCK_POISONED: i32 = 3003;
}

/// Tempo model validation failure
#[derive(Debug, Clone, PartialEq)]
pub enum TempoError {
    /// bpm or ratio is zero, negative, NaN or infinite
    InvalidTempoParameters { bpm: f64, ratio: f64 },
}

impl ErrorCode for TempoError {
    fn code(&self) -> i32 {
        match self {
            TempoError::InvalidTempoParameters { .. } => {
                SessionErrorCodes::INVALID_TEMPO_PARAMETERS
            }
        }
    }

    fn message(&self) -> String {
        match self {
            TempoError::InvalidTempoParameters { bpm, ratio } => format!(
                "bpm and ratio must be positive finite numbers (got bpm={}, ratio={})",
                bpm, ratio
            ),
        }
    }
}

impl fmt::Display for TempoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TempoError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for TempoError {}

/// Failures surfaced by `TrainingController::start_training`
///
/// Only session establishment propagates errors; everything that goes wrong
/// once a session is running is logged and absorbed.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Profile tempo parameters failed validation
    InvalidTempo(TempoError),

    /// Output or input device could not be acquired or started
    AudioDeviceUnavailable { source: AudioError },

    /// Session state lock was poisoned
    LockPoisoned { component: String },
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::InvalidTempo(_) => SessionErrorCodes::SESSION_INVALID_TEMPO,
            SessionError::AudioDeviceUnavailable { .. } => {
                SessionErrorCodes::AUDIO_DEVICE_UNAVAILABLE
            }
            SessionError::LockPoisoned { .. } => SessionErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            SessionError::InvalidTempo(inner) => {
                format!("Cannot start session: {}", inner.message())
            }
            SessionError::AudioDeviceUnavailable { source } => {
                format!("Cannot start session: {}", source.message())
            }
            SessionError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SessionError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::InvalidTempo(inner) => Some(inner),
            SessionError::AudioDeviceUnavailable { source } => Some(source),
            SessionError::LockPoisoned { .. } => None,
        }
    }
}

impl From<TempoError> for SessionError {
    fn from(err: TempoError) -> Self {
        SessionError::InvalidTempo(err)
    }
}

impl From<AudioError> for SessionError {
    fn from(err: AudioError) -> Self {
        SessionError::AudioDeviceUnavailable { source: err }
    }
}

/// Log a session error with structured context
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=SessionController, message={}",
        context,
        err.code(),
        err.message()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_error_code_and_message() {
        let err = TempoError::InvalidTempoParameters {
            bpm: 0.0,
            ratio: 3.0,
        };
        assert_eq!(err.code(), 2001);
        assert!(err.message().contains("bpm=0"));
    }

    #[test]
    fn test_session_error_wraps_sources() {
        let err: SessionError = AudioError::PermissionDenied.into();
        assert_eq!(err.code(), SessionErrorCodes::AUDIO_DEVICE_UNAVAILABLE);
        assert!(err.message().contains("permission denied"));
        assert!(std::error::Error::source(&err).is_some());

        let err: SessionError = TempoError::InvalidTempoParameters {
            bpm: 73.0,
            ratio: -1.0,
        }
        .into();
        assert_eq!(err.code(), 3001);
        assert!(format!("{}", err).contains("3001"));
    }
}
