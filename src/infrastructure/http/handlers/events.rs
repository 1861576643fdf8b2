//! SSE Progress Handler

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream, StreamExt};

use crate::infrastructure::events::ProgressEvent;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

use super::parse_project_id;

pub(crate) fn sse_event(event: &ProgressEvent) -> Event {
    Event::default()
        .json_data(event)
        .unwrap_or_else(|_| Event::default().event("error").data("JSON encoding failed"))
}

/// 项目进度 SSE 流，首帧为 `connected`；断开即退订
pub async fn project_events(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let project_id = parse_project_id(&project_id)?;
    if state.project_repo.get(&project_id).is_none() {
        return Err(ApiError::NotFound(format!(
            "Project not found: {}",
            project_id
        )));
    }

    let (rx, subscription) = state.broadcaster.subscribe_channel(project_id.clone());
    tracing::debug!(project_id = %project_id, "SSE subscriber connected");

    // subscription 随流一起被丢弃
    let updates = stream::unfold((rx, subscription), |(mut rx, subscription)| async move {
        rx.recv().await.map(|event| (event, (rx, subscription)))
    });
    let stream = stream::once(async { ProgressEvent::Connected })
        .chain(updates)
        .map(|event| Ok(sse_event(&event)));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
