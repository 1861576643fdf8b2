//! Project Processor - Chapter / Chunk Pipeline Driver
//!
//! 按章节顺序驱动合成、合并与整书组装。分块文件名确定，已存在即视为完成，
//! 因此任意次中断后重新运行都只补齐缺失部分。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::{
    AudioKind, AudioRendererPort, AudioStorageError, AudioStoragePort, ProjectRepositoryPort,
    RenderError, RepositoryError, SpeechSynthesizerPort, SynthesisError, SynthesisRequest,
};
use crate::application::ApplicationError;
use crate::domain::manuscript::DEFAULT_MAX_CHUNK_CHARS;
use crate::domain::project::{
    book_file_name, chapter_file_name, plan_chapter, Chapter, ChapterPlan, ChapterStatus, Project,
    ProjectError, ProjectId, SegmentStatus, VoiceMode,
};
use crate::infrastructure::events::{ProgressBroadcaster, ProgressEvent};
use crate::infrastructure::memory::{LeaseError, RunLease, RunRegistry};

/// 处理流程错误
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Project is already running: {0}")]
    AlreadyRunning(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("No completed chapters to compile")]
    NothingToCompile,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Storage(#[from] AudioStorageError),

    #[error(transparent)]
    Project(#[from] ProjectError),
}

impl From<LeaseError> for ProcessError {
    fn from(err: LeaseError) -> Self {
        match err {
            LeaseError::AlreadyRunning(id) => ProcessError::AlreadyRunning(id.to_string()),
        }
    }
}

impl From<ProcessError> for ApplicationError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::NotFound(id) => ApplicationError::not_found("Project", id),
            ProcessError::AlreadyRunning(id) => {
                ApplicationError::conflict(format!("Project {} is already running", id))
            }
            ProcessError::InvalidState(msg) => ApplicationError::invalid_state(msg),
            ProcessError::NothingToCompile => {
                ApplicationError::validation("No completed chapters to compile")
            }
            ProcessError::Repository(e) => e.into(),
            ProcessError::Synthesis(e) => e.into(),
            ProcessError::Render(e) => ApplicationError::ExternalServiceError(e.to_string()),
            ProcessError::Storage(e) => e.into(),
            ProcessError::Project(e) => e.into(),
        }
    }
}

/// Processor 配置
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// 单次合成请求的最大字符数
    pub max_chunk_chars: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

/// 运行结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChapterOutcome {
    Completed,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BookOutcome {
    Completed(Option<String>),
    Paused,
}

/// 项目处理器
///
/// 每个项目同一时刻至多一个驱动任务（由 RunRegistry 租约保证），
/// 不同项目之间互不影响。
pub struct ProjectProcessor {
    config: ProcessorConfig,
    repo: Arc<dyn ProjectRepositoryPort>,
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
    renderer: Arc<dyn AudioRendererPort>,
    storage: Arc<dyn AudioStoragePort>,
    broadcaster: Arc<ProgressBroadcaster>,
    runs: Arc<RunRegistry>,
}

impl ProjectProcessor {
    pub fn new(
        config: ProcessorConfig,
        repo: Arc<dyn ProjectRepositoryPort>,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        renderer: Arc<dyn AudioRendererPort>,
        storage: Arc<dyn AudioStoragePort>,
        broadcaster: Arc<ProgressBroadcaster>,
        runs: Arc<RunRegistry>,
    ) -> Self {
        Self {
            config,
            repo,
            synthesizer,
            renderer,
            storage,
            broadcaster,
            runs,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 获取运行租约并将项目置为 processing
    pub async fn begin(&self, project_id: &ProjectId) -> Result<RunLease, ProcessError> {
        self.load(project_id)?;
        let lease = self.runs.acquire(project_id)?;

        self.repo.modify(project_id, |p| p.begin_run())??;
        self.repo.persist().await?;

        tracing::info!(project_id = %project_id, "Project run acquired");
        Ok(lease)
    }

    /// 后台启动运行；租约在调用返回前已获取
    pub async fn start(self: &Arc<Self>, project_id: &ProjectId) -> Result<(), ProcessError> {
        let lease = self.begin(project_id).await?;
        let this = Arc::clone(self);

        tokio::spawn(async move {
            let project_id = lease.project_id().clone();
            if let Err(e) = this.drive(lease).await {
                tracing::warn!(project_id = %project_id, error = %e, "Project run failed");
            }
        });

        Ok(())
    }

    pub async fn resume(self: &Arc<Self>, project_id: &ProjectId) -> Result<(), ProcessError> {
        self.start(project_id).await
    }

    /// 协作式暂停：立即落盘 paused，驱动在下一个检查点停止
    pub async fn pause(&self, project_id: &ProjectId) -> Result<(), ProcessError> {
        self.load(project_id)?;
        self.repo.modify(project_id, |p| p.pause())??;
        self.repo.persist().await?;

        let signalled = self.runs.cancel(project_id);
        tracing::info!(project_id = %project_id, signalled, "Project pause requested");
        Ok(())
    }

    /// 手动组装整书（使用当前已完成的章节）
    pub async fn build_book(&self, project_id: &ProjectId) -> Result<Option<String>, ProcessError> {
        self.load(project_id)?;
        let lease = self.runs.acquire(project_id)?;

        match self.assemble_book(&lease, true).await {
            Ok(BookOutcome::Completed(url)) => Ok(url),
            Ok(BookOutcome::Paused) => Err(ProcessError::InvalidState(
                "Book assembly paused before completion".to_string(),
            )),
            Err(ProcessError::NothingToCompile) => Err(ProcessError::NothingToCompile),
            Err(e) => {
                self.record_failure(project_id, &e).await;
                Err(e)
            }
        }
    }

    /// 运行项目直到完成、暂停或失败；租约随返回释放
    pub async fn drive(&self, lease: RunLease) -> Result<RunOutcome, ProcessError> {
        let project_id = lease.project_id().clone();
        tracing::info!(project_id = %project_id, "Project run started");

        match self.run(&lease).await {
            Ok(outcome) => {
                tracing::info!(project_id = %project_id, ?outcome, "Project run finished");
                Ok(outcome)
            }
            Err(e) => {
                self.record_failure(&project_id, &e).await;
                Err(e)
            }
        }
    }

    async fn run(&self, lease: &RunLease) -> Result<RunOutcome, ProcessError> {
        let project_id = lease.project_id();
        let project = self.load(project_id)?;
        let limit = project.effective_chapter_limit();
        let demo = project.demo_mode();

        for index in 0..project.chapters().len() {
            if lease.is_cancelled() {
                return Ok(RunOutcome::Paused);
            }

            let project = self.load(project_id)?;
            let chapter = project
                .chapter(index)
                .ok_or(ProjectError::ChapterNotFound(index))?;

            if index >= limit {
                self.skip_chapter(project_id, index, chapter, skipped_event(index, demo))
                    .await?;
                continue;
            }

            if self.is_rendered(chapter).await {
                tracing::debug!(
                    project_id = %project_id,
                    chapter_index = index,
                    "Chapter already rendered, skipping"
                );
                continue;
            }

            let plan = plan_chapter(&project, index, self.config.max_chunk_chars)?;
            if plan.chunks.is_empty() {
                self.skip_chapter(
                    project_id,
                    index,
                    chapter,
                    ProgressEvent::ChapterSkipped { chapter_index: index },
                )
                .await?;
                continue;
            }

            self.publish(
                project_id,
                ProgressEvent::ChapterStart {
                    chapter_index: index,
                    title: chapter.title.clone(),
                },
            );

            let outcome = self.process_chapter(lease, &project, index, &plan).await?;
            if outcome == ChapterOutcome::Paused {
                return Ok(RunOutcome::Paused);
            }
        }

        if lease.is_cancelled() {
            return Ok(RunOutcome::Paused);
        }

        match self.assemble_book(lease, false).await? {
            BookOutcome::Completed(_) => Ok(RunOutcome::Completed),
            BookOutcome::Paused => Ok(RunOutcome::Paused),
        }
    }

    /// 已跳过的章节不再重复广播
    async fn skip_chapter(
        &self,
        project_id: &ProjectId,
        index: usize,
        chapter: &Chapter,
        event: ProgressEvent,
    ) -> Result<(), ProcessError> {
        if chapter.status == ChapterStatus::Skipped {
            return Ok(());
        }
        self.repo
            .modify(project_id, |p| p.chapter_mut(index).map(Chapter::skip))??;
        self.repo.persist().await?;
        self.publish(project_id, event);
        Ok(())
    }

    async fn is_rendered(&self, chapter: &Chapter) -> bool {
        match (chapter.is_completed(), chapter.file.as_deref()) {
            (true, Some(file)) => {
                self.storage
                    .exists(&self.storage.path_for(AudioKind::Chapter, file))
                    .await
            }
            _ => false,
        }
    }

    /// 章节内任何失败都记录到章节并广播，然后中止运行
    async fn process_chapter(
        &self,
        lease: &RunLease,
        project: &Project,
        index: usize,
        plan: &ChapterPlan,
    ) -> Result<ChapterOutcome, ProcessError> {
        match self.render_chapter(lease, project, index, plan).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let message = e.to_string();
                let project_id = project.id();
                tracing::error!(
                    project_id = %project_id,
                    chapter_index = index,
                    error = %message,
                    "Chapter failed"
                );

                let recorded = self
                    .repo
                    .modify(project_id, |p| p.chapter_mut(index).map(|c| c.fail(&message)));
                if let Err(record_err) = recorded {
                    tracing::warn!(
                        project_id = %project_id,
                        error = %record_err,
                        "Failed to record chapter error"
                    );
                }
                self.publish(
                    project_id,
                    ProgressEvent::ChapterError {
                        chapter_index: index,
                        error: message,
                    },
                );
                Err(e)
            }
        }
    }

    async fn render_chapter(
        &self,
        lease: &RunLease,
        project: &Project,
        index: usize,
        plan: &ChapterPlan,
    ) -> Result<ChapterOutcome, ProcessError> {
        let project_id = project.id();
        let total = plan.chunks.len();

        self.repo.modify(project_id, |p| {
            let chapter = p.chapter_mut(index)?;
            chapter.begin(total);
            for &skipped in &plan.skipped_segments {
                if let Some(segment) = chapter.segments.get_mut(skipped) {
                    segment.status = SegmentStatus::Skipped;
                }
            }
            Ok::<_, ProjectError>(())
        })??;
        self.repo.persist().await?;

        let mut chunk_files: Vec<PathBuf> = Vec::with_capacity(total);

        for (position, planned) in plan.chunks.iter().enumerate() {
            if lease.is_cancelled() {
                self.repo
                    .modify(project_id, |p| p.chapter_mut(index).map(Chapter::pause))??;
                self.repo.persist().await?;
                tracing::info!(
                    project_id = %project_id,
                    chapter_index = index,
                    completed = position,
                    total,
                    "Chapter paused"
                );
                return Ok(ChapterOutcome::Paused);
            }

            let voice = match project.mode() {
                VoiceMode::Dual => Some(planned.voice_index),
                VoiceMode::Single => None,
            };
            self.publish(
                project_id,
                ProgressEvent::SegmentStart {
                    chapter_index: index,
                    segment_index: planned.key.ordinal,
                    total: Some(total),
                    voice,
                },
            );

            let file_name = planned.key.file_name();
            let path = self.storage.path_for(AudioKind::Chunk, &file_name);
            let cached = self.storage.exists(&path).await;

            if cached {
                tracing::debug!(
                    project_id = %project_id,
                    chapter_index = index,
                    ordinal = planned.key.ordinal,
                    "Chunk cache hit"
                );
            } else {
                let voice_id = project.voice_for(planned.voice_index).ok_or_else(|| {
                    ProcessError::InvalidState(format!(
                        "No voice configured for index {}",
                        planned.voice_index
                    ))
                })?;
                let request = SynthesisRequest {
                    text: planned.text.clone(),
                    voice_id: voice_id.to_string(),
                    api_key: project.api_key().to_string(),
                    settings: project.settings_for_voice(planned.voice_index),
                };
                let audio = self.synthesizer.synthesize(request).await?;
                self.storage.write(&path, &audio).await?;

                tracing::debug!(
                    project_id = %project_id,
                    chapter_index = index,
                    ordinal = planned.key.ordinal,
                    size = audio.len(),
                    "Chunk synthesized"
                );
            }

            // 片段的最后一个分块完成时片段才算完成
            let segment_done = plan
                .chunks
                .get(position + 1)
                .map_or(true, |next| next.segment_index != planned.segment_index);

            self.repo.modify(project_id, |p| {
                let chapter = p.chapter_mut(index)?;
                chapter.completed_chunks = position + 1;
                if let Some(segment) = planned
                    .segment_index
                    .and_then(|s| chapter.segments.get_mut(s))
                {
                    segment.file = Some(file_name.clone());
                    segment.status = if segment_done {
                        SegmentStatus::Completed
                    } else {
                        SegmentStatus::Processing
                    };
                }
                Ok::<_, ProjectError>(())
            })??;
            self.repo.persist().await?;

            self.publish(
                project_id,
                ProgressEvent::SegmentComplete {
                    chapter_index: index,
                    segment_index: planned.key.ordinal,
                    cached,
                },
            );
            chunk_files.push(path);
        }

        self.publish(project_id, ProgressEvent::ChapterMerging { chapter_index: index });

        let file_name = chapter_file_name(project_id, index);
        let target = self.storage.path_for(AudioKind::Chapter, &file_name);
        self.render_to(&chunk_files, &target).await?;

        let url = self.storage.url_for(AudioKind::Chapter, &file_name);
        let demo = project.demo_mode();
        self.repo.modify(project_id, |p| {
            p.chapter_mut(index)
                .map(|c| c.complete(file_name.clone(), url.clone(), demo))
        })??;
        self.repo.persist().await?;

        tracing::info!(
            project_id = %project_id,
            chapter_index = index,
            chunks = total,
            "Chapter completed"
        );
        self.publish(
            project_id,
            ProgressEvent::ChapterComplete {
                chapter_index: index,
                url,
            },
        );

        Ok(ChapterOutcome::Completed)
    }

    /// 组装整书：已完成且文件存在的章节按顺序合并
    async fn assemble_book(
        &self,
        lease: &RunLease,
        manual: bool,
    ) -> Result<BookOutcome, ProcessError> {
        let project_id = lease.project_id();
        let project = self.load(project_id)?;

        let mut inputs = Vec::new();
        for (index, file) in project.completed_chapter_files() {
            let path = self.storage.path_for(AudioKind::Chapter, file);
            if self.storage.exists(&path).await {
                inputs.push(path);
            } else {
                tracing::warn!(
                    project_id = %project_id,
                    chapter_index = index,
                    "Completed chapter file missing, excluded from book"
                );
            }
        }

        if inputs.is_empty() {
            if manual {
                return Err(ProcessError::NothingToCompile);
            }
            self.repo.modify(project_id, |p| p.complete(None))??;
            self.repo.persist().await?;
            tracing::info!(project_id = %project_id, "Project completed without book file");
            self.publish(project_id, ProgressEvent::ProjectComplete { book_url: None });
            return Ok(BookOutcome::Completed(None));
        }

        self.publish(
            project_id,
            ProgressEvent::BookMerging {
                manual,
                chapters: inputs.len(),
            },
        );

        let file_name = book_file_name(project_id);
        let target = self.storage.path_for(AudioKind::Book, &file_name);
        self.render_to(&inputs, &target).await?;

        // 合并期间收到暂停：保留整书文件，不标记完成
        if lease.is_cancelled() {
            tracing::info!(project_id = %project_id, manual, "Book assembly paused");
            return Ok(BookOutcome::Paused);
        }

        let url = self.storage.url_for(AudioKind::Book, &file_name);
        self.repo
            .modify(project_id, |p| p.complete(Some((file_name.clone(), url.clone()))))??;
        self.repo.persist().await?;

        tracing::info!(
            project_id = %project_id,
            chapters = inputs.len(),
            manual,
            "Book assembled"
        );
        self.publish(
            project_id,
            ProgressEvent::ProjectComplete {
                book_url: Some(url.clone()),
            },
        );

        Ok(BookOutcome::Completed(Some(url)))
    }

    /// 合并 → 响度归一化 → 替换原文件
    async fn render_to(&self, inputs: &[PathBuf], target: &Path) -> Result<(), ProcessError> {
        self.renderer.merge_sequential(inputs, target).await?;

        let scratch = self.storage.scratch_path(target);
        self.renderer.normalize(target, &scratch).await?;
        self.storage.replace(&scratch, target).await?;
        Ok(())
    }

    async fn record_failure(&self, project_id: &ProjectId, err: &ProcessError) {
        let message = err.to_string();

        if let Err(e) = self.repo.modify(project_id, |p| p.fail(&message)) {
            tracing::warn!(project_id = %project_id, error = %e, "Failed to record project error");
        }
        if let Err(e) = self.repo.persist().await {
            tracing::error!(project_id = %project_id, error = %e, "Failed to persist project error");
        }

        self.publish(project_id, ProgressEvent::ProjectError { error: message });
    }

    fn load(&self, project_id: &ProjectId) -> Result<Project, ProcessError> {
        self.repo
            .get(project_id)
            .ok_or_else(|| ProcessError::NotFound(project_id.to_string()))
    }

    fn publish(&self, project_id: &ProjectId, event: ProgressEvent) {
        self.broadcaster.publish(project_id, event);
    }
}

fn skipped_event(chapter_index: usize, demo: bool) -> ProgressEvent {
    if demo {
        ProgressEvent::ChapterSkippedDemo { chapter_index }
    } else {
        ProgressEvent::ChapterSkipped { chapter_index }
    }
}
