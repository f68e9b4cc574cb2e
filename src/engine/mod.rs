//! Engine module housing the training session core.
//!
//! `backend` hands out device-bound collaborators (cue player, capture),
//! `core` holds the [`TrainingController`] that composes them with the
//! sequencer and swing analyzer, and `session` defines the values the
//! controller publishes.

pub mod backend;
pub mod core;
pub mod session;

#[cfg(target_os = "android")]
pub use backend::OboeBackend;
#[cfg(not(target_os = "android"))]
pub use backend::CpalBackend;
pub use backend::{create_backend, AudioBackend, SilentBackend};
pub use core::TrainingController;
pub use session::{
    FeedbackDisplay, SessionOptions, SessionSnapshot, SessionSummary, SessionUpdate,
    TelemetryEvent,
};
