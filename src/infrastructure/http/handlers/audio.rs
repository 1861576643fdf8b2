//! Audio File Handler

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 流式返回输出目录下的音频文件
///
/// 路径经存储层解析，越出输出根目录的请求被拒绝
pub async fn serve_audio(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let resolved = state.storage.resolve(&path).await?;

    let file = tokio::fs::File::open(&resolved)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open audio: {}", e)))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to stat audio: {}", e)))?
        .len();

    let content_type = match resolved.extension().and_then(|e| e.to_str()) {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, size)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
