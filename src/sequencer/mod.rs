//! Sequencer - the repeating swing cue cycle
//!
//! ```text
//! start ─► "Starting <pro>" ─► "Address the ball" ─► 4 ticks ─┐   (first cycle only)
//!                                                             ▼
//!      ┌──────────► Takeaway ──backswing──► Downswing ──downswing──► Impact
//!      │                                                                │
//!      └──── inter-cycle pause ◄──── Idle ◄──────── impact hold ────────┘
//! ```
//!
//! The whole session runs as one tokio task. Every deferred effect (a cue,
//! a phase change, an event) is applied under the state lock and only if the
//! session epoch it was scheduled under is still current. `stop()` bumps the
//! epoch under the same lock, so once it returns nothing scheduled earlier
//! can fire.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::config::SequencerConfig;
use crate::cue::{CueKind, CuePlayer};
use crate::error::TempoError;
use crate::tempo::{PhaseDurations, TempoProfile};


/// Phrase spoken before the first tick of a session
pub const ADDRESS_PROMPT: &str = "Address the ball";

/// Position in the cue cycle.
///
/// `Metronome` marks the preamble ticks; the sequencer never rests in it and
/// never reports it as a phase entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SwingPhase {
    Idle,
    Takeaway,
    Downswing,
    Impact,
    Metronome,
}

impl SwingPhase {
    /// Successor within the repeating cycle.
    pub fn next_in_cycle(self) -> SwingPhase {
        match self {
            SwingPhase::Idle | SwingPhase::Metronome => SwingPhase::Takeaway,
            SwingPhase::Takeaway => SwingPhase::Downswing,
            SwingPhase::Downswing => SwingPhase::Impact,
            SwingPhase::Impact => SwingPhase::Idle,
        }
    }
}

/// Toggles that gate cue output for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerOptions {
    /// When false the preamble keeps its spacing but plays no ticks.
    pub metronome_enabled: bool,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            metronome_enabled: true,
        }
    }
}

/// Scheduled against measured timing for one completed swing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u32,
    pub target_backswing_secs: f64,
    pub measured_backswing_secs: f64,
    pub target_downswing_secs: f64,
    pub measured_downswing_secs: f64,
    pub backswing_error_ms: f64,
    pub downswing_error_ms: f64,
    pub target_ratio: f64,
    pub measured_ratio: f64,
}

impl CycleReport {
    fn new(cycle: u32, durations: &PhaseDurations, backswing: f64, downswing: f64) -> Self {
        let measured_ratio = if downswing > 0.0 {
            backswing / downswing
        } else {
            0.0
        };
        Self {
            cycle,
            target_backswing_secs: durations.backswing_secs,
            measured_backswing_secs: backswing,
            target_downswing_secs: durations.downswing_secs,
            measured_downswing_secs: downswing,
            backswing_error_ms: (backswing - durations.backswing_secs) * 1000.0,
            downswing_error_ms: (downswing - durations.downswing_secs) * 1000.0,
            target_ratio: durations.ratio(),
            measured_ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SequencerEvent {
    /// The cycle moved into `phase` (never `Metronome`)
    PhaseEntered { phase: SwingPhase, cycle: u32 },
    /// Preamble tick `beat` (1-based) fired
    MetronomeTick { beat: u8 },
    /// Impact reached; timing of the swing just cued
    CycleCompleted(CycleReport),
    /// `stop()` forced the sequencer back to Idle
    Stopped,
}

struct SequencerState {
    epoch: u64,
    phase: SwingPhase,
    cycle: u32,
    task: Option<JoinHandle<()>>,
}

struct SequencerInner {
    cue_player: Arc<dyn CuePlayer>,
    config: SequencerConfig,
    state: Mutex<SequencerState>,
    events: broadcast::Sender<SequencerEvent>,
}

/// Everything the timeline task needs, fixed at `start()`.
struct CuePlan {
    epoch: u64,
    pro_name: String,
    durations: PhaseDurations,
    options: SequencerOptions,
}

/// Drives cue playback for one session at a time.
pub struct Sequencer {
    inner: Arc<SequencerInner>,
    runtime: Handle,
}

impl Sequencer {
    pub fn new(cue_player: Arc<dyn CuePlayer>, config: SequencerConfig, runtime: Handle) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(SequencerInner {
                cue_player,
                config,
                state: Mutex::new(SequencerState {
                    epoch: 0,
                    phase: SwingPhase::Idle,
                    cycle: 0,
                    task: None,
                }),
                events,
            }),
            runtime,
        }
    }

    /// Cancels any running cycle, then starts a fresh session for `profile`
    /// beginning with the preamble.
    pub fn start(
        &self,
        profile: &TempoProfile,
        options: SequencerOptions,
    ) -> Result<(), TempoError> {
        let durations = profile.durations()?;

        let mut state = self.inner.lock_state();
        cancel_locked(&mut state);
        let plan = CuePlan {
            epoch: state.epoch,
            pro_name: profile.pro_name().to_string(),
            durations,
            options,
        };
        log::info!(
            "[Sequencer] Starting {} (epoch {}, backswing {:.3}s, downswing {:.3}s)",
            plan.pro_name,
            plan.epoch,
            durations.backswing_secs,
            durations.downswing_secs
        );
        state.task = Some(
            self.runtime
                .spawn(run_timeline(Arc::clone(&self.inner), plan)),
        );
        Ok(())
    }

    /// Cancels all pending transitions and forces `Idle`. Idempotent.
    pub fn stop(&self) {
        let mut state = self.inner.lock_state();
        let was_running = state.task.is_some();
        cancel_locked(&mut state);
        if was_running {
            log::info!("[Sequencer] Stopped (epoch now {})", state.epoch);
            let _ = self.inner.events.send(SequencerEvent::Stopped);
        }
    }

    pub fn current_phase(&self) -> SwingPhase {
        self.inner.lock_state().phase
    }

    /// Cycle number of the current phase (0 before the first takeaway).
    pub fn cycle(&self) -> u32 {
        self.inner.lock_state().cycle
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock_state().task.is_some()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequencerEvent> {
        self.inner.events.subscribe()
    }
}

impl Drop for Sequencer {
    fn drop(&mut self) {
        let mut state = self.inner.lock_state();
        cancel_locked(&mut state);
    }
}

fn cancel_locked(state: &mut SequencerState) {
    state.epoch += 1;
    state.phase = SwingPhase::Idle;
    state.cycle = 0;
    if let Some(task) = state.task.take() {
        task.abort();
    }
}

impl SequencerInner {
    fn lock_state(&self) -> MutexGuard<'_, SequencerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `effect` if `epoch` is still current. Returns false once the
    /// session has been cancelled.
    fn apply(&self, epoch: u64, effect: impl FnOnce(&mut SequencerState, &dyn CuePlayer)) -> bool {
        let mut state = self.lock_state();
        if state.epoch != epoch {
            return false;
        }
        effect(&mut state, self.cue_player.as_ref());
        true
    }

    fn enter(&self, epoch: u64, phase: SwingPhase, cycle: u32) -> bool {
        self.apply(epoch, |state, player| {
            state.phase = phase;
            state.cycle = cycle;
            if let Some(kind) = CueKind::for_phase(phase) {
                player.play_cue(kind);
            }
            log::debug!("[Sequencer] cycle {} -> {:?}", cycle, phase);
            let _ = self
                .events
                .send(SequencerEvent::PhaseEntered { phase, cycle });
        })
    }
}

async fn run_timeline(inner: Arc<SequencerInner>, plan: CuePlan) {
    let config = inner.config.clone();
    let epoch = plan.epoch;

    // Preamble
    let mut deadline = Instant::now();
    let announcement = format!("Starting {}", plan.pro_name);
    if !inner.apply(epoch, |_, player| player.speak(&announcement)) {
        return;
    }
    deadline += config.announce_gap();
    sleep_until(deadline).await;

    if !inner.apply(epoch, |_, player| player.speak(ADDRESS_PROMPT)) {
        return;
    }
    deadline += config.settle_delay();
    sleep_until(deadline).await;

    let spacing = plan.durations.metronome_spacing();
    for beat in 1..=config.metronome_ticks {
        let ticked = inner.apply(epoch, |_, player| {
            if plan.options.metronome_enabled {
                player.play_cue(CueKind::Metronome);
            }
            let _ = inner.events.send(SequencerEvent::MetronomeTick { beat });
        });
        if !ticked {
            return;
        }
        deadline += spacing;
        sleep_until(deadline).await;
    }

    let mut cycle: u32 = 1;
    loop {
        let takeaway_at = Instant::now();
        if !inner.enter(epoch, SwingPhase::Takeaway, cycle) {
            return;
        }
        deadline += plan.durations.backswing();
        sleep_until(deadline).await;

        let downswing_at = Instant::now();
        if !inner.enter(epoch, SwingPhase::Downswing, cycle) {
            return;
        }
        deadline += plan.durations.downswing();
        sleep_until(deadline).await;

        let impact_at = Instant::now();
        let report = CycleReport::new(
            cycle,
            &plan.durations,
            (downswing_at - takeaway_at).as_secs_f64(),
            (impact_at - downswing_at).as_secs_f64(),
        );
        if !inner.enter(epoch, SwingPhase::Impact, cycle) {
            return;
        }
        if !inner.apply(epoch, |_, _| {
            let _ = inner.events.send(SequencerEvent::CycleCompleted(report));
        }) {
            return;
        }
        deadline += config.impact_hold();
        sleep_until(deadline).await;

        if !inner.enter(epoch, SwingPhase::Idle, cycle) {
            return;
        }
        deadline += config.inter_cycle_pause();
        sleep_until(deadline).await;

        cycle = cycle.saturating_add(1);
    }
}
