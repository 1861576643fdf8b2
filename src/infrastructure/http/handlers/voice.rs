//! Voice HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::ListVoices;
use crate::infrastructure::http::dto::{ApiResponse, ListVoicesRequest, VoicesResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出合成服务可用的音色
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListVoicesRequest>,
) -> Result<Json<ApiResponse<VoicesResponse>>, ApiError> {
    let voices = state
        .list_voices_handler
        .handle(ListVoices {
            api_key: req.api_key,
        })
        .await?;

    Ok(Json(ApiResponse::success(VoicesResponse { voices })))
}
