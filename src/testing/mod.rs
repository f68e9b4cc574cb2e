//! Hardware-free harness pieces shared by unit tests, integration tests and
//! the CLI `simulate` command.
//!
//! - [`recording`]: a cue player that records every call with a timestamp
//! - [`backend`]: an [`AudioBackend`](crate::engine::backend::AudioBackend)
//!   handing out recording players and manually fed captures
//! - [`swings`]: seeded synthetic swing recordings

pub mod backend;
pub mod recording;
pub mod swings;

pub use backend::FakeBackend;
pub use recording::{CueEvent, CueLog, RecordedCue, RecordingCuePlayer};
pub use swings::{swing_schedule, synthesize_swings, SwingRecording, SynthConfig};
