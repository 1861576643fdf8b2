//! Project HTTP Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::application::{CreateProject, GetProject, ListProjects};
use crate::domain::project::ProjectStatus;
use crate::infrastructure::http::dto::{
    ApiResponse, BookResponse, CreateProjectRequest, CreateProjectResponseDto, ProjectResponse,
    ProjectStatusResponse, ProjectSummaryResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

use super::parse_project_id;

/// 创建项目
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<Json<ApiResponse<CreateProjectResponseDto>>, ApiError> {
    let command = CreateProject::from(req);
    let result = state.create_project_handler.handle(command).await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// 项目列表（按创建时间倒序）
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ProjectSummaryResponse>>>, ApiError> {
    let projects = state.list_projects_handler.handle(ListProjects).await?;
    let summaries = projects.iter().map(ProjectSummaryResponse::from).collect();

    Ok(Json(ApiResponse::success(summaries)))
}

/// 项目详情
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<ProjectResponse>>, ApiError> {
    let project_id = parse_project_id(&project_id)?;
    let project = state
        .get_project_handler
        .handle(GetProject { project_id })
        .await?;

    Ok(Json(ApiResponse::success(ProjectResponse::from(&project))))
}

/// 开始处理：租约在返回前获取，驱动在后台运行
pub async fn start_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<ProjectStatusResponse>>, ApiError> {
    let project_id = parse_project_id(&project_id)?;
    state.processor.start(&project_id).await?;

    Ok(Json(ApiResponse::success(ProjectStatusResponse {
        project_id,
        status: ProjectStatus::Processing,
    })))
}

pub async fn pause_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<ProjectStatusResponse>>, ApiError> {
    let project_id = parse_project_id(&project_id)?;
    state.processor.pause(&project_id).await?;

    Ok(Json(ApiResponse::success(ProjectStatusResponse {
        project_id,
        status: ProjectStatus::Paused,
    })))
}

pub async fn resume_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<ProjectStatusResponse>>, ApiError> {
    let project_id = parse_project_id(&project_id)?;
    state.processor.resume(&project_id).await?;

    Ok(Json(ApiResponse::success(ProjectStatusResponse {
        project_id,
        status: ProjectStatus::Processing,
    })))
}

/// 手动组装整书（同步等待完成）
pub async fn build_book(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiResponse<BookResponse>>, ApiError> {
    let project_id = parse_project_id(&project_id)?;
    let book_url = state.processor.build_book(&project_id).await?;

    Ok(Json(ApiResponse::success(BookResponse {
        project_id,
        book_url,
    })))
}
