use std::sync::Arc;

use axum::extract::ws::Message;
use kiosk_events::EventBus;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::ws::manager::WsManager;

/// Spawn a task relaying every bus event to every WebSocket client as a
/// JSON text frame.
///
/// The subscription is taken before the task starts, so nothing published
/// after this call returns is missed.
pub fn start_forwarder(
    events: &EventBus,
    ws_manager: Arc<WsManager>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                received = rx.recv() => received,
            };
            match event {
                Ok(event) => {
                    tracing::debug!(event = event.kind.name(), "Pushing event to clients");
                    ws_manager.broadcast(Message::Text(event.to_json().into())).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event forwarder lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
