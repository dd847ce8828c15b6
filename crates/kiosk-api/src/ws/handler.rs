use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::kiosk::LogLevel;
use crate::state::AppState;
use crate::ws::manager::ClientRole;

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub role: ClientRole,
}

/// Messages a client may send up the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    /// The display moved to a new item.
    CurrentItem { image_name: String },
    Log {
        #[serde(default)]
        level: LogLevel,
        message: String,
    },
}

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params.role, state))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Outbound frames come from the manager channel on a spawned sender task;
/// inbound frames are handled on this task until the client goes away.
async fn handle_socket(socket: WebSocket, role: ClientRole, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, ?role, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id.clone(), role).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => handle_text(&state, &conn_id, text.as_str()),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    state.ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

fn handle_text(state: &AppState, conn_id: &str, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::CurrentItem { image_name }) => {
            state.kiosk.set_current_item(image_name, state.clock.now());
        }
        Ok(ClientMessage::Log { level, message }) => {
            state.kiosk.log(level, message, state.clock.now());
        }
        Err(e) => {
            tracing::debug!(conn_id, error = %e, "Ignoring unrecognised WebSocket message");
        }
    }
}
