use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::engine::session::{SessionUpdate, TelemetryEvent};
use super::TrainingController;

impl TrainingController {
    // ========================================================================
    // STREAM SUBSCRIPTIONS
    // ========================================================================

    /// Receiver for every session update from now on.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<SessionUpdate> {
        self.update_tx.subscribe()
    }

    /// Session updates as a `Stream`. Updates missed by a lagging consumer
    /// are skipped rather than ending the stream.
    pub fn update_stream(&self) -> impl Stream<Item = SessionUpdate> + Send + 'static {
        BroadcastStream::new(self.subscribe_updates()).filter_map(|item| async move {
            match item {
                Ok(update) => Some(update),
                Err(err) => {
                    log::debug!("[SessionController] Update stream lagged: {}", err);
                    None
                }
            }
        })
    }

    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.telemetry_tx.subscribe()
    }

    pub fn telemetry_stream(&self) -> impl Stream<Item = TelemetryEvent> + Send + 'static {
        BroadcastStream::new(self.subscribe_telemetry())
            .filter_map(|item| async move { item.ok() })
    }
}
