//! Project Command Handlers

use std::sync::Arc;

use crate::application::commands::CreateProject;
use crate::application::error::ApplicationError;
use crate::application::ports::{ProjectRepositoryPort, SpeechSynthesizerPort};
use crate::domain::manuscript::{segment, SegmentOptions};
use crate::domain::project::{ChapterNumbering, NewProject, Project, ProjectId, Title};

// ============================================================================
// CreateProject
// ============================================================================

/// 章节概要
#[derive(Debug, Clone)]
pub struct ChapterSummary {
    pub index: usize,
    pub sequence_number: u32,
    pub label: String,
    pub title: String,
    pub segments: usize,
}

/// 创建项目响应
#[derive(Debug, Clone)]
pub struct CreateProjectResponse {
    pub project_id: ProjectId,
    pub chapters: Vec<ChapterSummary>,
}

/// CreateProject Handler
///
/// 校验输入 → 通过 list_voices 校验凭据 → 分段 → 保存 pending 项目
pub struct CreateProjectHandler {
    project_repo: Arc<dyn ProjectRepositoryPort>,
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
    default_voice_switch_token: String,
}

impl CreateProjectHandler {
    pub fn new(
        project_repo: Arc<dyn ProjectRepositoryPort>,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        default_voice_switch_token: impl Into<String>,
    ) -> Self {
        Self {
            project_repo,
            synthesizer,
            default_voice_switch_token: default_voice_switch_token.into(),
        }
    }

    pub async fn handle(
        &self,
        command: CreateProject,
    ) -> Result<CreateProjectResponse, ApplicationError> {
        let title = Title::new(command.title)?;

        let api_key = command.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(ApplicationError::validation("API key is required"));
        }

        let voices: Vec<String> = command
            .voices
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        let required = command.mode.required_voices();
        if voices.len() < required {
            return Err(ApplicationError::validation(format!(
                "{:?} mode requires {} voice(s)",
                command.mode, required
            )));
        }

        let chapter_limit = match command.chapter_limit {
            None => None,
            Some(limit) if limit > 0 => Some(limit as usize),
            Some(_) => {
                return Err(ApplicationError::validation(
                    "Chapter limit must be a positive integer",
                ))
            }
        };

        let series_number = positive_number(command.series_number, "Series number")?;
        let numbering = ChapterNumbering {
            start_number: positive_number(command.chapter_start_number, "Starting chapter number")?
                .unwrap_or(1),
            auto_detect: command.auto_detect_chapter_numbers.unwrap_or(true),
        };

        if command.manuscript.trim().is_empty() {
            return Err(ApplicationError::validation("Manuscript is empty"));
        }

        let demo_limits = command.demo_limits.unwrap_or_default();
        if command.demo_mode
            && (demo_limits.char_limit == 0
                || demo_limits.chunks_per_segment == 0
                || demo_limits.segments_per_chapter == 0)
        {
            return Err(ApplicationError::validation("Demo limits must be positive"));
        }

        let voice_switch_token = command
            .voice_switch_token
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.default_voice_switch_token.clone());

        // 凭据校验
        self.synthesizer.list_voices(&api_key).await?;

        let chapters = segment(
            &command.manuscript,
            command.mode,
            &SegmentOptions {
                voice_switch_token: voice_switch_token.clone(),
            },
        );

        let project = Project::new(NewProject {
            title,
            author: non_blank(command.author),
            language: non_blank(command.language),
            description: non_blank(command.description),
            series_number,
            mode: command.mode,
            voices,
            api_key,
            settings: command.settings,
            voice_settings: command.voice_settings,
            chapter_limit,
            demo_mode: command.demo_mode,
            demo_limits,
            voice_switch_token,
            numbering,
            chapters,
        });

        let project_id = project.id().clone();
        let chapters = project
            .chapters()
            .iter()
            .enumerate()
            .map(|(index, c)| ChapterSummary {
                index,
                sequence_number: c.sequence_number,
                label: c.label(),
                title: c.title.clone(),
                segments: c.segments.len(),
            })
            .collect::<Vec<_>>();

        self.project_repo.set(project);
        self.project_repo.persist().await?;

        tracing::info!(
            project_id = %project_id,
            chapters = chapters.len(),
            "Project created"
        );

        Ok(CreateProjectResponse {
            project_id,
            chapters,
        })
    }
}

/// 可选的正整数输入
fn positive_number(value: Option<i64>, field: &str) -> Result<Option<u32>, ApplicationError> {
    match value {
        None => Ok(None),
        Some(n) => u32::try_from(n)
            .ok()
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or_else(|| {
                ApplicationError::validation(format!(
                    "{} must be a positive integer when provided",
                    field
                ))
            }),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
