//! Handlers for the remote-control channel.
//!
//! Both endpoints belong to the display protocol and return bare shapes.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use kiosk_core::command::Command;
use kiosk_core::mailbox::PendingCommand;
use serde::Serialize;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool,
    pub command: PendingCommand,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub command: Option<PendingCommand>,
}

/// POST /api/control/send
///
/// Body: `{"command": "next"}` or `{"command": "jump", "image_name": "..."}`.
///
/// Navigation commands first end any playing video, a jump handing its
/// target over as the next item. The command is then parked in the pull
/// mailbox and pushed to live clients. A jump onto a registered video
/// starts that video in the background.
pub async fn send_command(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<impl IntoResponse> {
    let command = Command::parse(&body)?;

    if command.stops_video() {
        let jump_target = match &command {
            Command::Jump { target } => Some(target.clone()),
            _ => None,
        };
        if let Some(outcome) = state.orchestrator.stop(jump_target).await {
            tracing::info!(
                video_id = %outcome.video_id,
                command = command.kind(),
                "Video interrupted by remote command",
            );
        }
    }

    let pending = state.commands.send(command.clone());

    if let Command::Jump { target } = &command {
        let source = state.store.read(|s| s.videos.get(target).map(|v| v.url.clone())).await;
        if let Some(source) = source {
            let orchestrator = Arc::clone(&state.orchestrator);
            let video_id = target.clone();
            tokio::spawn(async move {
                if let Err(e) = orchestrator.start(&video_id, &source).await {
                    tracing::warn!(video_id = %video_id, error = %e, "Jump to video failed");
                }
            });
        }
    }

    tracing::info!(command = pending.command.kind(), target = pending.command.target(), "Command accepted");
    Ok(Json(SendResponse {
        success: true,
        command: pending,
    }))
}

/// GET /api/control/poll
///
/// Hands out the pending command at most once, and never after it expired.
pub async fn poll_command(State(state): State<AppState>) -> impl IntoResponse {
    Json(PollResponse {
        command: state.commands.poll(),
    })
}
