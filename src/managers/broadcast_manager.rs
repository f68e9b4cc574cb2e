// BroadcastChannelManager: Centralized tokio broadcast channel management
// Single Responsibility: Broadcast channel lifecycle and subscription

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::engine::session::{SessionUpdate, TelemetryEvent};

/// Buffer for session updates (four phase entries per cycle plus swings)
pub const SESSION_UPDATE_CAPACITY: usize = 128;
pub const TELEMETRY_CAPACITY: usize = 32;

type Slot<T> = Arc<Mutex<Option<broadcast::Sender<T>>>>;

fn lock_slot<T>(slot: &Slot<T>) -> MutexGuard<'_, Option<broadcast::Sender<T>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Manages the controller's outbound broadcast channels
///
/// # Channel Types
/// - Session updates: phase changes and swing verdicts for presentation
/// - Telemetry: session lifecycle events (started, stopped, failed)
///
/// Channels are created lazily by the `init_*` methods; subscribing before
/// init yields `None`. Re-initialising replaces the sender, which closes
/// every receiver of the old one.
pub struct BroadcastChannelManager {
    session_updates: Slot<SessionUpdate>,
    telemetry: Slot<TelemetryEvent>,
}

impl BroadcastChannelManager {
    /// Create a new BroadcastChannelManager with all channels uninitialized
    pub fn new() -> Self {
        Self {
            session_updates: Arc::new(Mutex::new(None)),
            telemetry: Arc::new(Mutex::new(None)),
        }
    }

    // ========================================================================
    // SESSION UPDATE CHANNEL
    // ========================================================================

    /// Initialize the session update channel and return its sender.
    ///
    /// Subscribers that fall more than [`SESSION_UPDATE_CAPACITY`] messages
    /// behind observe `Lagged` and skip ahead.
    pub fn init_session_updates(&self) -> broadcast::Sender<SessionUpdate> {
        let (tx, _) = broadcast::channel(SESSION_UPDATE_CAPACITY);
        *lock_slot(&self.session_updates) = Some(tx.clone());
        tx
    }

    /// Sender for session updates, if initialised
    pub fn session_update_sender(&self) -> Option<broadcast::Sender<SessionUpdate>> {
        lock_slot(&self.session_updates).clone()
    }

    pub fn subscribe_session_updates(&self) -> Option<broadcast::Receiver<SessionUpdate>> {
        lock_slot(&self.session_updates)
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    // ========================================================================
    // TELEMETRY CHANNEL
    // ========================================================================

    /// Initialize the telemetry channel and return its sender.
    pub fn init_telemetry(&self) -> broadcast::Sender<TelemetryEvent> {
        let (tx, _) = broadcast::channel(TELEMETRY_CAPACITY);
        *lock_slot(&self.telemetry) = Some(tx.clone());
        tx
    }

    pub fn subscribe_telemetry(&self) -> Option<broadcast::Receiver<TelemetryEvent>> {
        lock_slot(&self.telemetry).as_ref().map(|tx| tx.subscribe())
    }

    /// Publishes a telemetry event; dropped silently when nobody listens.
    pub fn publish_telemetry(&self, event: TelemetryEvent) {
        if let Some(tx) = lock_slot(&self.telemetry).as_ref() {
            let _ = tx.send(event);
        }
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::SwingPhase;

    fn idle_update() -> SessionUpdate {
        SessionUpdate {
            phase: SwingPhase::Idle,
            cycle: 0,
            accuracy: None,
            deviation_secs: None,
        }
    }

    #[test]
    fn test_session_channel_lifecycle() {
        let manager = BroadcastChannelManager::new();

        // Initially no subscription possible
        assert!(manager.subscribe_session_updates().is_none());
        assert!(manager.session_update_sender().is_none());

        let _tx = manager.init_session_updates();
        assert!(manager.subscribe_session_updates().is_some());
        assert!(manager.session_update_sender().is_some());
    }

    #[test]
    fn test_session_multiple_subscribers() {
        let manager = BroadcastChannelManager::new();
        let tx = manager.init_session_updates();

        let mut rx1 = manager.subscribe_session_updates().unwrap();
        let mut rx2 = manager.subscribe_session_updates().unwrap();

        tx.send(idle_update()).unwrap();

        assert_eq!(rx1.try_recv().unwrap(), idle_update());
        assert_eq!(rx2.try_recv().unwrap(), idle_update());
    }

    #[test]
    fn test_telemetry_publish_without_init_is_noop() {
        let manager = BroadcastChannelManager::default();
        manager.publish_telemetry(TelemetryEvent::SessionStopped {
            pro_name: "Nobody".to_string(),
            cycles_completed: 0,
        });
        assert!(manager.subscribe_telemetry().is_none());

        manager.init_telemetry();
        let mut rx = manager.subscribe_telemetry().unwrap();
        manager.publish_telemetry(TelemetryEvent::SessionStopped {
            pro_name: "Somebody".to_string(),
            cycles_completed: 2,
        });
        assert!(matches!(
            rx.try_recv().unwrap(),
            TelemetryEvent::SessionStopped { cycles_completed: 2, .. }
        ));
    }
}
