// Error types for the tempo trainer
//
// Each concern (audio I/O, tempo math, session lifecycle, catalog lookup) has
// its own enum with stable numeric codes so callers on the far side of an FFI
// or HTTP boundary can branch on them.

mod audio;
mod catalog;
mod session;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use catalog::{CatalogError, CatalogErrorCodes};
pub use session::{log_session_error, SessionError, SessionErrorCodes, TempoError};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
