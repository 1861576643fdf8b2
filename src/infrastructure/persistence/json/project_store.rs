//! JSON Project Store
//!
//! 整个项目集合保存为一个 JSON 文档（projectId -> Project）。
//! 启动时读取一次，之后只在 `persist` 时整体重写。

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::application::ports::{ProjectRepositoryPort, RepositoryError};
use crate::domain::project::{Project, ProjectId};

/// JSON 文件项目仓储
pub struct JsonProjectStore {
    path: PathBuf,
    projects: DashMap<ProjectId, Project>,
    /// 串行化 persist
    write_lock: Mutex<()>,
}

impl JsonProjectStore {
    /// 打开存储；文档缺失或损坏时以空集合启动
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let projects = DashMap::new();

        for mut project in load_document(&path).await {
            if project.recover_interrupted() {
                tracing::info!(
                    project_id = %project.id(),
                    "Interrupted project marked as paused"
                );
            }
            projects.insert(project.id().clone(), project);
        }

        tracing::info!(
            path = %path.display(),
            projects = projects.len(),
            "Project store loaded"
        );

        Self {
            path,
            projects,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "projects.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

async fn load_document(path: &Path) -> Vec<Project> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No project document, starting empty");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read project document");
            return Vec::new();
        }
    };

    match serde_json::from_slice::<BTreeMap<String, Project>>(&bytes) {
        Ok(document) => document.into_values().collect(),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Corrupt project document, starting empty"
            );
            Vec::new()
        }
    }
}

#[async_trait]
impl ProjectRepositoryPort for JsonProjectStore {
    fn list(&self) -> Vec<Project> {
        self.projects.iter().map(|p| p.value().clone()).collect()
    }

    fn get(&self, id: &ProjectId) -> Option<Project> {
        self.projects.get(id).map(|p| p.value().clone())
    }

    fn set(&self, project: Project) {
        self.projects.insert(project.id().clone(), project);
    }

    fn update(
        &self,
        id: &ProjectId,
        f: &mut dyn FnMut(&mut Project),
    ) -> Result<(), RepositoryError> {
        let mut project = self
            .projects
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        f(project.value_mut());
        Ok(())
    }

    async fn persist(&self) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;

        let document: BTreeMap<String, Project> = self
            .projects
            .iter()
            .map(|p| (p.key().to_string(), p.value().clone()))
            .collect();
        let bytes = serde_json::to_vec_pretty(&document)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::StorageError(e.to_string()))?;
        }

        let temp = self.temp_path();
        fs::write(&temp, &bytes)
            .await
            .map_err(|e| RepositoryError::StorageError(e.to_string()))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| RepositoryError::StorageError(e.to_string()))?;

        tracing::debug!(
            path = %self.path.display(),
            projects = document.len(),
            bytes = bytes.len(),
            "Project document persisted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manuscript::{segment, SegmentOptions};
    use crate::domain::project::{
        ChapterNumbering, ChapterStatus, DemoLimits, NewProject, ProjectStatus, Title, VoiceMode,
        VoiceSettings,
    };
    use std::sync::Arc;
    use tempfile::TempDir;

    fn project() -> Project {
        Project::new(project_input())
    }

    fn project_input() -> NewProject {
        NewProject {
            title: Title::new("Stored").unwrap(),
            author: Some("Anon".to_string()),
            language: None,
            description: None,
            series_number: None,
            mode: VoiceMode::Single,
            voices: vec!["v".to_string()],
            api_key: "k".to_string(),
            settings: VoiceSettings::default(),
            voice_settings: Vec::new(),
            chapter_limit: None,
            demo_mode: false,
            demo_limits: DemoLimits::default(),
            voice_switch_token: "***".to_string(),
            numbering: ChapterNumbering::default(),
            chapters: segment("# One\nBody.", VoiceMode::Single, &SegmentOptions::default()),
        }
    }

    #[tokio::test]
    async fn test_missing_document_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonProjectStore::open(dir.path().join("projects.json")).await;
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonProjectStore::open(&path).await;
        assert!(store.list().is_empty());
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("projects.json");

        let store = JsonProjectStore::open(&path).await;
        let mut input = project_input();
        input.series_number = Some(3);
        let project = Project::new(input);
        let id = project.id().clone();
        store.set(project);
        store.persist().await.unwrap();

        assert!(!store.temp_path().exists());

        let reopened = JsonProjectStore::open(&path).await;
        let loaded = reopened.get(&id).unwrap();
        assert_eq!(loaded.title().as_str(), "Stored");
        assert_eq!(loaded.author(), Some("Anon"));
        assert_eq!(loaded.series_number(), Some(3));
        assert_eq!(loaded.chapters()[0].sequence_number, 1);
    }

    #[tokio::test]
    async fn test_mutations_are_memory_only_until_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");

        let store = JsonProjectStore::open(&path).await;
        store.set(project());

        let reopened = JsonProjectStore::open(&path).await;
        assert!(reopened.list().is_empty());
    }

    #[tokio::test]
    async fn test_processing_projects_recover_as_paused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("projects.json");

        let store = JsonProjectStore::open(&path).await;
        let mut project = project();
        project.begin_run().unwrap();
        project.chapter_mut(0).unwrap().begin(2);
        let id = project.id().clone();
        store.set(project);
        store.persist().await.unwrap();

        let reopened = JsonProjectStore::open(&path).await;
        let loaded = reopened.get(&id).unwrap();
        assert_eq!(loaded.status(), ProjectStatus::Paused);
        assert_eq!(loaded.chapters()[0].status, ChapterStatus::Paused);
    }

    #[tokio::test]
    async fn test_modify_updates_in_place() {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn ProjectRepositoryPort> =
            Arc::new(JsonProjectStore::open(dir.path().join("p.json")).await);
        let project = project();
        let id = project.id().clone();
        store.set(project);

        let status = store
            .modify(&id, |p| {
                p.begin_run().unwrap();
                p.status()
            })
            .unwrap();
        assert_eq!(status, ProjectStatus::Processing);
        assert_eq!(store.get(&id).unwrap().status(), ProjectStatus::Processing);

        assert!(matches!(
            store.modify(&ProjectId::new(), |_| ()),
            Err(RepositoryError::NotFound(_))
        ));
    }
}
