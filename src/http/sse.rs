use std::convert::Infallible;
use std::pin::Pin;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};

use crate::engine::TrainingController;

pub type SessionStream = Sse<Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>>;

/// Server-Sent Events stream of live session updates.
pub fn session_updates(controller: &TrainingController) -> SessionStream {
    let stream = controller.update_stream().filter_map(|update| async move {
        match serde_json::to_string(&update) {
            Ok(payload) => Some(Ok(Event::default().event("session").data(payload))),
            Err(_) => None,
        }
    });

    Sse::new(Box::pin(stream) as Pin<Box<_>>).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(5))
            .text("tempo-keepalive"),
    )
}
