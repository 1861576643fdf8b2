//! WebSocket Progress Handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::domain::project::ProjectId;
use crate::infrastructure::events::ProgressEvent;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

use super::parse_project_id;

/// 项目进度 WebSocket，帧内容与 SSE 相同
pub async fn project_websocket(
    ws: WebSocketUpgrade,
    Path(project_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let project_id = parse_project_id(&project_id)?;
    if state.project_repo.get(&project_id).is_none() {
        return Err(ApiError::NotFound(format!(
            "Project not found: {}",
            project_id
        )));
    }

    Ok(ws
        .on_upgrade(move |socket| handle_project_socket(socket, project_id, state))
        .into_response())
}

fn to_message(event: &ProgressEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize progress event");
            None
        }
    }
}

async fn handle_project_socket(socket: WebSocket, project_id: ProjectId, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (mut event_rx, subscription) = state.broadcaster.subscribe_channel(project_id.clone());

    tracing::info!(project_id = %project_id, "WebSocket connected");

    let forward_id = project_id.clone();
    let forward_task = tokio::spawn(async move {
        if let Some(msg) = to_message(&ProgressEvent::Connected) {
            if sender.send(msg).await.is_err() {
                return;
            }
        }

        while let Some(event) = event_rx.recv().await {
            let Some(msg) = to_message(&event) else {
                continue;
            };
            if let Err(e) = sender.send(msg).await {
                tracing::debug!(
                    project_id = %forward_id,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }
        }
    });

    let receive_id = project_id.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::debug!(project_id = %receive_id, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(project_id = %receive_id, error = %e, "WebSocket error");
                    break;
                }
                // ping 由 axum 自动回复 pong
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    subscription.unsubscribe();
    tracing::info!(project_id = %project_id, "WebSocket disconnected");
}
