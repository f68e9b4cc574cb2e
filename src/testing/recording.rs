use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use crate::cue::{CueBinding, CueKind, CuePlayer};

/// One call made on a [`RecordingCuePlayer`].
#[derive(Debug, Clone, PartialEq)]
pub enum CueEvent {
    Bound { shot_type: String, pro_name: String },
    Tone(CueKind),
    Speech(String),
    Cleanup,
}

#[derive(Debug, Clone)]
pub struct RecordedCue {
    /// Id of the player that recorded the call
    pub player: usize,
    pub at: Instant,
    pub event: CueEvent,
}

/// Append-only log, shareable between several players so the interleaving
/// of two sessions can be inspected.
#[derive(Debug, Clone, Default)]
pub struct CueLog {
    entries: Arc<Mutex<Vec<RecordedCue>>>,
}

impl CueLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, player: usize, event: CueEvent) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push(RecordedCue {
            player,
            at: Instant::now(),
            event,
        });
    }

    pub fn entries(&self) -> Vec<RecordedCue> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tones in playback order.
    pub fn tones(&self) -> Vec<CueKind> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry.event {
                CueEvent::Tone(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }

    /// Spoken phrases in order.
    pub fn speech(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry.event {
                CueEvent::Speech(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn tone_count(&self, kind: CueKind) -> usize {
        self.tones().into_iter().filter(|k| *k == kind).count()
    }

    /// Timestamps of every `kind` tone.
    pub fn tone_times(&self, kind: CueKind) -> Vec<Instant> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.event == CueEvent::Tone(kind))
            .map(|entry| entry.at)
            .collect()
    }
}

static NEXT_PLAYER_ID: AtomicUsize = AtomicUsize::new(1);

/// Cue player that records instead of making sound.
#[derive(Debug)]
pub struct RecordingCuePlayer {
    id: usize,
    log: CueLog,
    binding: Mutex<Option<CueBinding>>,
}

impl RecordingCuePlayer {
    pub fn new() -> Self {
        Self::with_log(CueLog::new())
    }

    /// Records into an existing (possibly shared) log.
    pub fn with_log(log: CueLog) -> Self {
        Self {
            id: NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed),
            log,
            binding: Mutex::new(None),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn log(&self) -> &CueLog {
        &self.log
    }

    pub fn binding(&self) -> Option<CueBinding> {
        self.binding
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for RecordingCuePlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl CuePlayer for RecordingCuePlayer {
    fn bind(&self, binding: CueBinding) {
        self.log.push(
            self.id,
            CueEvent::Bound {
                shot_type: binding.shot_type.to_string(),
                pro_name: binding.pro_name.clone(),
            },
        );
        *self
            .binding
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(binding);
    }

    fn play_cue(&self, kind: CueKind) {
        self.log.push(self.id, CueEvent::Tone(kind));
    }

    fn speak(&self, text: &str) {
        self.log.push(self.id, CueEvent::Speech(text.to_string()));
    }

    fn cleanup(&self) {
        self.log.push(self.id, CueEvent::Cleanup);
        self.binding
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }
}
