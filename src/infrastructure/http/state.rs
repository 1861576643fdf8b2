//! Application State
//!
//! 路由共享的端口实例与 Command/Query Handlers

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CreateProjectHandler,
    // Query handlers
    GetProjectHandler, ListProjectsHandler, ListVoicesHandler,
    // Ports
    AudioStoragePort, ProjectRepositoryPort, SpeechSynthesizerPort,
};
use crate::infrastructure::events::ProgressBroadcaster;
use crate::infrastructure::worker::ProjectProcessor;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub project_repo: Arc<dyn ProjectRepositoryPort>,
    pub storage: Arc<dyn AudioStoragePort>,
    pub broadcaster: Arc<ProgressBroadcaster>,
    pub processor: Arc<ProjectProcessor>,

    // ========== Command Handlers ==========
    pub create_project_handler: CreateProjectHandler,

    // ========== Query Handlers ==========
    pub get_project_handler: GetProjectHandler,
    pub list_projects_handler: ListProjectsHandler,
    pub list_voices_handler: ListVoicesHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        storage: Arc<dyn AudioStoragePort>,
        broadcaster: Arc<ProgressBroadcaster>,
        processor: Arc<ProjectProcessor>,
        default_voice_switch_token: impl Into<String>,
    ) -> Self {
        Self {
            project_repo: project_repo.clone(),
            storage,
            broadcaster,
            processor,

            create_project_handler: CreateProjectHandler::new(
                project_repo.clone(),
                synthesizer.clone(),
                default_voice_switch_token,
            ),

            get_project_handler: GetProjectHandler::new(project_repo.clone()),
            list_projects_handler: ListProjectsHandler::new(project_repo),
            list_voices_handler: ListVoicesHandler::new(synthesizer),
        }
    }
}
