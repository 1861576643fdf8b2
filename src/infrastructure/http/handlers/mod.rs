//! HTTP Handlers

mod audio;
mod events;
mod ping;
mod project;
mod voice;
mod websocket;

pub use audio::*;
pub use events::*;
pub use ping::*;
pub use project::*;
pub use voice::*;
pub use websocket::*;

use std::str::FromStr;

use crate::domain::project::ProjectId;
use crate::infrastructure::http::error::ApiError;

/// 解析路径中的项目 ID
pub(crate) fn parse_project_id(raw: &str) -> Result<ProjectId, ApiError> {
    ProjectId::from_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid project id: {}", raw)))
}
