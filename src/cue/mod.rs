//! Cue player contract
//!
//! A cue player turns sequencer decisions into sound: short tones keyed by
//! [`CueKind`] and spoken phrases on an independent speech channel. All
//! methods are fire-and-forget. Implementations log their own failures and
//! never propagate them, so a missing tone or a broken speech engine cannot
//! stall the cue timeline.

mod device;

pub use device::DeviceCuePlayer;

use serde::Serialize;

use crate::catalog::ShotType;
use crate::config::CueConfig;
use crate::sequencer::SwingPhase;
use crate::tempo::PhaseDurations;

/// Sounds the sequencer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CueKind {
    Metronome,
    Takeaway,
    Downswing,
    Impact,
}

impl CueKind {
    pub const COUNT: usize = 4;
    pub const ALL: [CueKind; CueKind::COUNT] = [
        CueKind::Metronome,
        CueKind::Takeaway,
        CueKind::Downswing,
        CueKind::Impact,
    ];

    /// Asset file stem for this cue (`<name>.wav`).
    pub fn asset_name(self) -> &'static str {
        match self {
            CueKind::Metronome => "metronome_tone",
            CueKind::Takeaway => "takeaway_tone",
            CueKind::Downswing => "downswing_tone",
            CueKind::Impact => "impact_tone",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            CueKind::Metronome => 0,
            CueKind::Takeaway => 1,
            CueKind::Downswing => 2,
            CueKind::Impact => 3,
        }
    }

    /// Tone announcing entry into `phase`, if that phase has one.
    pub fn for_phase(phase: SwingPhase) -> Option<CueKind> {
        match phase {
            SwingPhase::Idle => None,
            SwingPhase::Takeaway => Some(CueKind::Takeaway),
            SwingPhase::Downswing => Some(CueKind::Downswing),
            SwingPhase::Impact => Some(CueKind::Impact),
            SwingPhase::Metronome => Some(CueKind::Metronome),
        }
    }
}

/// Session identity and levels handed to the player when a session starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CueBinding {
    pub shot_type: ShotType,
    pub pro_name: String,
    pub durations: PhaseDurations,
    /// Master volume in `[0, 1]`
    pub volume: f32,
}

/// Sound output used by the sequencer.
pub trait CuePlayer: Send + Sync {
    /// Attaches session identity and volume. Cues played before the first
    /// bind use full master volume and long-game levels.
    fn bind(&self, binding: CueBinding);

    /// Starts the tone for `kind` immediately, restarting it if it is
    /// already sounding. Other kinds keep playing.
    fn play_cue(&self, kind: CueKind);

    /// Queues `text` on the speech channel.
    fn speak(&self, text: &str);

    /// Stops speech, silences tones and drops the session binding.
    fn cleanup(&self);
}

/// Playback gain for `kind` under the given levels.
///
/// The metronome uses its own (quieter) base level; swing tones combine the
/// swing base level with the per-shot-type table. Everything is scaled by the
/// user's master volume.
pub fn cue_gain(kind: CueKind, config: &CueConfig, shot_type: ShotType, volume: f32) -> f32 {
    let volumes = config.shot_volumes.for_shot(shot_type);
    let base = match kind {
        CueKind::Metronome => config.metronome_volume,
        CueKind::Takeaway => config.swing_volume * volumes.takeaway,
        CueKind::Downswing => config.swing_volume * volumes.downswing,
        CueKind::Impact => config.swing_volume * volumes.impact,
    };
    (base * volume.clamp(0.0, 1.0)).max(0.0)
}
