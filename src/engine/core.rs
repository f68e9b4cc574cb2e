//! TrainingController: composes cue player, sequencer and swing analyzer
//! into one training session at a time.
//!
//! Start and stop are serialized on the lifecycle lock, so at most one
//! session holds the audio devices. Each session gets an epoch; the relay
//! task that moves sequencer events and swing observations onto the shared
//! session state checks it before every write, so nothing from a finished
//! session can leak into the next one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::analysis::{RollingTimingWindow, SwingAnalyzer, SwingObservation};
use crate::catalog::ShotType;
use crate::config::AppConfig;
use crate::cue::{CueBinding, CuePlayer};
use crate::engine::backend::AudioBackend;
use crate::error::{log_audio_error, log_session_error, ErrorCode, SessionError};
use crate::managers::BroadcastChannelManager;
use crate::preferences::PreferenceStore;
use crate::sequencer::{Sequencer, SequencerEvent, SequencerOptions, SwingPhase};
use crate::tempo::TempoProfile;

use super::session::{
    FeedbackDisplay, SessionOptions, SessionSnapshot, SessionSummary, SessionTally, SessionUpdate,
    TelemetryEvent,
};

#[path = "core_subscriptions.rs"]
mod core_subscriptions;


/// Resources owned by the running session.
struct ActiveSession {
    epoch: u64,
    profile: TempoProfile,
    cue_player: Arc<dyn CuePlayer>,
    sequencer: Sequencer,
    analyzer: Option<SwingAnalyzer>,
    relay: JoinHandle<()>,
    started_at: Instant,
}

/// State the relay task writes and readers snapshot.
struct SessionState {
    /// Epoch of the session allowed to write; 0 when none is
    epoch: u64,
    snapshot: SessionSnapshot,
    deviations: RollingTimingWindow,
    tally: SessionTally,
}

impl SessionState {
    fn idle(history_len: usize) -> Self {
        Self {
            epoch: 0,
            snapshot: SessionSnapshot::idle(),
            deviations: RollingTimingWindow::new(history_len),
            tally: SessionTally::default(),
        }
    }
}

type SharedState = Arc<Mutex<SessionState>>;

fn lock_state(state: &SharedState) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns the single active training session.
pub struct TrainingController {
    backend: Arc<dyn AudioBackend>,
    config: AppConfig,
    preferences: Arc<dyn PreferenceStore>,
    runtime: Handle,
    lifecycle: Mutex<Option<ActiveSession>>,
    state: SharedState,
    next_epoch: AtomicU64,
    pub(crate) broadcasts: BroadcastChannelManager,
    update_tx: broadcast::Sender<SessionUpdate>,
    telemetry_tx: broadcast::Sender<TelemetryEvent>,
}

impl TrainingController {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        config: AppConfig,
        preferences: Arc<dyn PreferenceStore>,
        runtime: Handle,
    ) -> Self {
        let broadcasts = BroadcastChannelManager::new();
        let update_tx = broadcasts.init_session_updates();
        let telemetry_tx = broadcasts.init_telemetry();
        let history_len = config.analyzer.deviation_history_len;
        Self {
            backend,
            config,
            preferences,
            runtime,
            lifecycle: Mutex::new(None),
            state: Arc::new(Mutex::new(SessionState::idle(history_len))),
            next_epoch: AtomicU64::new(0),
            broadcasts,
            update_tx,
            telemetry_tx,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Starts a session for `profile`, stopping any active one first.
    ///
    /// Fails without emitting a single cue when the tempo is invalid or a
    /// device cannot be acquired; anything acquired so far is released.
    pub fn start_training(
        &self,
        profile: &TempoProfile,
        options: SessionOptions,
    ) -> Result<(), SessionError> {
        let mut lifecycle = self
            .lifecycle
            .lock()
            .map_err(|_| SessionError::LockPoisoned {
                component: "session_lifecycle".to_string(),
            })?;

        if let Some(previous) = lifecycle.take() {
            log::info!(
                "[SessionController] Stopping {} before starting {}",
                previous.profile.pro_name(),
                profile.pro_name()
            );
            self.teardown(previous);
        }

        let result = self.launch(profile, options);
        match result {
            Ok(active) => {
                *lifecycle = Some(active);
                Ok(())
            }
            Err(err) => {
                log_session_error(&err, "start_training");
                self.publish_telemetry(TelemetryEvent::StartFailed {
                    code: err.code(),
                    message: err.message(),
                });
                Err(err)
            }
        }
    }

    /// Starts a session for an ad-hoc tempo not in the catalog.
    pub fn start_custom(
        &self,
        shot_type: ShotType,
        pro_name: &str,
        bpm: u32,
        ratio: f64,
        options: SessionOptions,
    ) -> Result<(), SessionError> {
        let profile = match TempoProfile::custom(shot_type, pro_name, bpm, ratio) {
            Ok(profile) => profile,
            Err(err) => {
                let err = SessionError::from(err);
                log_session_error(&err, "start_custom");
                self.publish_telemetry(TelemetryEvent::StartFailed {
                    code: err.code(),
                    message: err.message(),
                });
                return Err(err);
            }
        };
        self.start_training(&profile, options)
    }

    fn launch(
        &self,
        profile: &TempoProfile,
        options: SessionOptions,
    ) -> Result<ActiveSession, SessionError> {
        let durations = profile.durations()?;
        let mut preferences = self.preferences.load();

        // Acquire devices before anything can sound
        let cue_player = self.backend.open_cue_player(&self.config)?;
        let mut analyzer = if options.analyze_swings {
            match self.backend.open_capture(&self.config) {
                Ok(capture) => {
                    let expected = self
                        .config
                        .analyzer
                        .expected_interval_secs
                        .unwrap_or(durations.downswing_secs);
                    Some(SwingAnalyzer::new(
                        capture,
                        self.config.analyzer.clone(),
                        &self.config.audio,
                        expected,
                    ))
                }
                Err(err) => {
                    cue_player.cleanup();
                    return Err(err.into());
                }
            }
        } else {
            None
        };

        let (observation_tx, observation_rx) = mpsc::unbounded_channel();
        if let Some(analyzer) = analyzer.as_mut() {
            if let Err(err) = analyzer.start_analysis(observation_tx) {
                cue_player.cleanup();
                return Err(err.into());
            }
        } else {
            drop(observation_tx);
        }

        let epoch = self.next_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        cue_player.bind(CueBinding {
            shot_type: profile.shot_type(),
            pro_name: profile.pro_name().to_string(),
            durations,
            volume: preferences.clamped_volume(),
        });

        let sequencer = Sequencer::new(
            Arc::clone(&cue_player),
            self.config.sequencer.clone(),
            self.runtime.clone(),
        );
        let sequencer_events = sequencer.subscribe();

        {
            let mut state = lock_state(&self.state);
            state.epoch = epoch;
            state.snapshot = SessionSnapshot::starting(profile, analyzer.is_some());
            state.deviations = RollingTimingWindow::new(self.config.analyzer.deviation_history_len);
            state.tally = SessionTally::default();
            let _ = self.update_tx.send(state.snapshot.update());
        }

        let relay = self.runtime.spawn(relay_session(
            Arc::clone(&self.state),
            self.update_tx.clone(),
            epoch,
            sequencer_events,
            observation_rx,
        ));

        let sequencer_options = SequencerOptions {
            metronome_enabled: preferences.metronome_enabled,
        };
        if let Err(err) = sequencer.start(profile, sequencer_options) {
            relay.abort();
            if let Some(mut analyzer) = analyzer {
                let _ = analyzer.stop_analysis();
            }
            cue_player.cleanup();
            *lock_state(&self.state) =
                SessionState::idle(self.config.analyzer.deviation_history_len);
            return Err(err.into());
        }

        preferences.last_shot_type = Some(profile.shot_type().key().to_string());
        preferences.last_pro = Some(profile.pro_name().to_string());
        if let Err(err) = self.preferences.save(&preferences) {
            log::warn!("[SessionController] Failed to save preferences: {:#}", err);
        }

        log::info!(
            "[SessionController] Session {} started: {} / {} ({} bpm, {:.1}:1, analysis {})",
            epoch,
            profile.shot_type(),
            profile.pro_name(),
            profile.bpm(),
            profile.ratio(),
            if analyzer.is_some() { "on" } else { "off" }
        );
        self.publish_telemetry(TelemetryEvent::SessionStarted {
            shot_type: profile.shot_type(),
            pro_name: profile.pro_name().to_string(),
            bpm: profile.bpm(),
            analyze_swings: analyzer.is_some(),
        });

        Ok(ActiveSession {
            epoch,
            profile: profile.clone(),
            cue_player,
            sequencer,
            analyzer,
            relay,
            started_at: Instant::now(),
        })
    }

    /// Stops the active session and returns its summary. `None` when idle.
    pub fn stop_training(&self) -> Option<SessionSummary> {
        let mut lifecycle = self
            .lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let active = lifecycle.take()?;
        Some(self.teardown(active))
    }

    fn teardown(&self, active: ActiveSession) -> SessionSummary {
        let ActiveSession {
            epoch,
            profile,
            cue_player,
            sequencer,
            analyzer,
            relay,
            started_at,
        } = active;

        sequencer.stop();

        let mut dropped_blocks = 0;
        if let Some(mut analyzer) = analyzer {
            if let Err(err) = analyzer.stop_analysis() {
                log_audio_error(&err, "stop_training");
            }
            dropped_blocks = analyzer.stats().dropped_blocks;
        }

        cue_player.cleanup();
        relay.abort();

        let summary = {
            let mut state = lock_state(&self.state);
            let summary = state
                .tally
                .summarize(&profile, started_at.elapsed().as_secs_f64(), dropped_blocks);
            if state.epoch == epoch {
                *state = SessionState::idle(self.config.analyzer.deviation_history_len);
                let _ = self.update_tx.send(state.snapshot.update());
            }
            summary
        };

        log::info!(
            "[SessionController] Session {} stopped after {} cycle(s), {} swing(s)",
            epoch,
            summary.cycles_completed,
            summary.swings_observed
        );
        self.publish_telemetry(TelemetryEvent::SessionStopped {
            pro_name: summary.pro_name.clone(),
            cycles_completed: summary.cycles_completed,
        });
        summary
    }

    /// Current session view (idle snapshot when nothing runs).
    pub fn snapshot(&self) -> SessionSnapshot {
        lock_state(&self.state).snapshot.clone()
    }

    pub fn is_active(&self) -> bool {
        lock_state(&self.state).snapshot.active
    }

    /// Phase the running sequencer is in.
    pub fn current_phase(&self) -> SwingPhase {
        let lifecycle = self
            .lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        lifecycle
            .as_ref()
            .map(|active| active.sequencer.current_phase())
            .unwrap_or(SwingPhase::Idle)
    }

    fn publish_telemetry(&self, event: TelemetryEvent) {
        self.broadcasts.publish_telemetry(event);
    }
}

impl Drop for TrainingController {
    fn drop(&mut self) {
        let active = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(active) = active {
            self.teardown(active);
        }
    }
}

/// Moves sequencer events and swing observations onto the session state,
/// in arrival order, for as long as `epoch` is current.
async fn relay_session(
    state: SharedState,
    updates: broadcast::Sender<SessionUpdate>,
    epoch: u64,
    mut events: broadcast::Receiver<SequencerEvent>,
    mut observations: mpsc::UnboundedReceiver<SwingObservation>,
) {
    let mut observations_open = true;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if !apply_sequencer_event(&state, &updates, epoch, event) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("[SessionController] Relay lagged, {} sequencer event(s) skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            observation = observations.recv(), if observations_open => match observation {
                Some(observation) => {
                    if !apply_observation(&state, &updates, epoch, observation) {
                        break;
                    }
                }
                None => observations_open = false,
            },
        }
    }
    log::debug!("[SessionController] Relay for session {} finished", epoch);
}

fn apply_sequencer_event(
    state: &SharedState,
    updates: &broadcast::Sender<SessionUpdate>,
    epoch: u64,
    event: SequencerEvent,
) -> bool {
    let mut state = lock_state(state);
    if state.epoch != epoch {
        return false;
    }
    match event {
        SequencerEvent::PhaseEntered { phase, cycle } => {
            state.snapshot.phase = phase;
            state.snapshot.cycle = cycle;
        }
        SequencerEvent::MetronomeTick { .. } => {
            state.snapshot.phase = SwingPhase::Metronome;
        }
        SequencerEvent::CycleCompleted(report) => {
            state.tally.record_cycle(&report);
            state.snapshot.cycles_completed = state.tally.cycles_completed();
            return true;
        }
        SequencerEvent::Stopped => return true,
    }
    let _ = updates.send(state.snapshot.update());
    true
}

fn apply_observation(
    state: &SharedState,
    updates: &broadcast::Sender<SessionUpdate>,
    epoch: u64,
    observation: SwingObservation,
) -> bool {
    let mut state = lock_state(state);
    if state.epoch != epoch {
        return false;
    }
    state.deviations.push(observation.deviation_secs);
    state.tally.record_observation(&observation);
    state.snapshot.latest_accuracy = Some(observation.accuracy);
    state.snapshot.latest_deviation_secs = Some(observation.deviation_secs);
    state.snapshot.recent_deviations = state.deviations.to_vec();
    state.snapshot.feedback = FeedbackDisplay::from_accuracy(Some(observation.accuracy));
    let _ = updates.send(state.snapshot.update());
    true
}
