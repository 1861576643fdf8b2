//! Project Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::ProjectRepositoryPort;
use crate::application::queries::{GetProject, ListProjects};
use crate::domain::project::Project;

/// GetProject Handler
pub struct GetProjectHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
}

impl GetProjectHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepositoryPort>) -> Self {
        Self { project_repo }
    }

    pub async fn handle(&self, query: GetProject) -> Result<Project, ApplicationError> {
        self.project_repo
            .get(&query.project_id)
            .ok_or_else(|| ApplicationError::not_found("Project", &query.project_id))
    }
}

/// ListProjects Handler
pub struct ListProjectsHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
}

impl ListProjectsHandler {
    pub fn new(project_repo: Arc<dyn ProjectRepositoryPort>) -> Self {
        Self { project_repo }
    }

    /// 按创建时间倒序
    pub async fn handle(&self, _query: ListProjects) -> Result<Vec<Project>, ApplicationError> {
        let mut projects = self.project_repo.list();
        projects.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(projects)
    }
}
