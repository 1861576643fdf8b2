//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{ChapterSummary, CreateProject, CreateProjectResponse, Voice};
use crate::domain::project::{
    Chapter, ChapterNumbering, DemoLimits, Project, ProjectId, ProjectStatus, VoiceMode, VoiceSettings,
};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Project DTOs
// ============================================================================

/// 创建项目请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub series_number: Option<i64>,
    #[serde(default)]
    pub mode: VoiceMode,
    #[serde(default)]
    pub voices: Vec<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub settings: VoiceSettings,
    #[serde(default)]
    pub voice_settings: Vec<VoiceSettings>,
    #[serde(default)]
    pub chapter_limit: Option<i64>,
    #[serde(default)]
    pub demo_mode: bool,
    #[serde(default)]
    pub demo_char_limit: Option<usize>,
    #[serde(default)]
    pub demo_chunks_per_segment: Option<usize>,
    #[serde(default)]
    pub demo_segments_per_chapter: Option<usize>,
    #[serde(default)]
    pub voice_switch_token: Option<String>,
    #[serde(default)]
    pub chapter_start_number: Option<i64>,
    #[serde(default)]
    pub auto_detect_chapter_numbers: Option<bool>,
    #[serde(alias = "manuscript")]
    pub text: String,
}

impl CreateProjectRequest {
    fn demo_limits(&self) -> Option<DemoLimits> {
        if self.demo_char_limit.is_none()
            && self.demo_chunks_per_segment.is_none()
            && self.demo_segments_per_chapter.is_none()
        {
            return None;
        }
        let defaults = DemoLimits::default();
        Some(DemoLimits {
            char_limit: self.demo_char_limit.unwrap_or(defaults.char_limit),
            chunks_per_segment: self
                .demo_chunks_per_segment
                .unwrap_or(defaults.chunks_per_segment),
            segments_per_chapter: self
                .demo_segments_per_chapter
                .unwrap_or(defaults.segments_per_chapter),
        })
    }
}

impl From<CreateProjectRequest> for CreateProject {
    fn from(req: CreateProjectRequest) -> Self {
        let demo_limits = req.demo_limits();
        CreateProject {
            title: req.title,
            author: req.author,
            language: req.language,
            description: req.description,
            series_number: req.series_number,
            mode: req.mode,
            voices: req.voices,
            api_key: req.api_key,
            settings: req.settings,
            voice_settings: req.voice_settings,
            chapter_limit: req.chapter_limit,
            demo_mode: req.demo_mode,
            demo_limits,
            voice_switch_token: req.voice_switch_token,
            chapter_start_number: req.chapter_start_number,
            auto_detect_chapter_numbers: req.auto_detect_chapter_numbers,
            manuscript: req.text,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummaryResponse {
    pub index: usize,
    pub sequence_number: u32,
    pub label: String,
    pub title: String,
    pub segments: usize,
}

impl From<ChapterSummary> for ChapterSummaryResponse {
    fn from(summary: ChapterSummary) -> Self {
        Self {
            index: summary.index,
            sequence_number: summary.sequence_number,
            label: summary.label,
            title: summary.title,
            segments: summary.segments,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponseDto {
    pub project_id: ProjectId,
    pub chapters: Vec<ChapterSummaryResponse>,
}

impl From<CreateProjectResponse> for CreateProjectResponseDto {
    fn from(resp: CreateProjectResponse) -> Self {
        Self {
            project_id: resp.project_id,
            chapters: resp.chapters.into_iter().map(Into::into).collect(),
        }
    }
}

/// 项目详情（凭据不下发）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: ProjectId,
    pub title: String,
    pub author: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    pub series_number: Option<u32>,
    pub mode: VoiceMode,
    pub voices: Vec<String>,
    pub has_api_key: bool,
    pub settings: VoiceSettings,
    pub voice_settings: Vec<VoiceSettings>,
    pub chapter_limit: Option<usize>,
    pub demo_mode: bool,
    pub demo_limits: DemoLimits,
    pub voice_switch_token: String,
    pub chapter_numbering: ChapterNumbering,
    pub status: ProjectStatus,
    pub chapters: Vec<Chapter>,
    pub book_file: Option<String>,
    pub book_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Project> for ProjectResponse {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id().clone(),
            title: p.title().to_string(),
            author: p.author().map(str::to_string),
            language: p.language().map(str::to_string),
            description: p.description().map(str::to_string),
            series_number: p.series_number(),
            mode: p.mode(),
            voices: p.voices().to_vec(),
            has_api_key: !p.api_key().is_empty(),
            settings: *p.settings(),
            voice_settings: p.voice_settings().to_vec(),
            chapter_limit: p.chapter_limit(),
            demo_mode: p.demo_mode(),
            demo_limits: *p.demo_limits(),
            voice_switch_token: p.voice_switch_token().to_string(),
            chapter_numbering: p.chapter_numbering(),
            status: p.status(),
            chapters: p.chapters().to_vec(),
            book_file: p.book_file().map(str::to_string),
            book_url: p.book_url().map(str::to_string),
            error: p.error().map(str::to_string),
            created_at: p.created_at(),
            completed_at: p.completed_at(),
        }
    }
}

/// 项目列表项
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryResponse {
    pub id: ProjectId,
    pub title: String,
    pub author: Option<String>,
    pub series_number: Option<u32>,
    pub mode: VoiceMode,
    pub status: ProjectStatus,
    pub demo_mode: bool,
    pub total_chapters: usize,
    pub completed_chapters: usize,
    pub book_url: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Project> for ProjectSummaryResponse {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id().clone(),
            title: p.title().to_string(),
            author: p.author().map(str::to_string),
            series_number: p.series_number(),
            mode: p.mode(),
            status: p.status(),
            demo_mode: p.demo_mode(),
            total_chapters: p.chapters().len(),
            completed_chapters: p.chapters().iter().filter(|c| c.is_completed()).count(),
            book_url: p.book_url().map(str::to_string),
            error: p.error().map(str::to_string),
            created_at: p.created_at(),
        }
    }
}

/// 运行控制响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStatusResponse {
    pub project_id: ProjectId,
    pub status: ProjectStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub project_id: ProjectId,
    pub book_url: Option<String>,
}

// ============================================================================
// Voice DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVoicesRequest {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<Voice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateProjectRequest = serde_json::from_value(json!({
            "title": "Book",
            "apiKey": "k",
            "voices": ["v1"],
            "text": "# Chapter 1\nHello."
        }))
        .unwrap();

        let command = CreateProject::from(req);
        assert_eq!(command.mode, VoiceMode::Single);
        assert!(command.demo_limits.is_none());
        assert_eq!(command.manuscript, "# Chapter 1\nHello.");
    }

    #[test]
    fn test_create_request_numbering_fields() {
        let req: CreateProjectRequest = serde_json::from_value(json!({
            "title": "Book",
            "text": "# Chapter 1\nHello.",
            "seriesNumber": 2,
            "chapterStartNumber": 5,
            "autoDetectChapterNumbers": false
        }))
        .unwrap();

        let command = CreateProject::from(req);
        assert_eq!(command.series_number, Some(2));
        assert_eq!(command.chapter_start_number, Some(5));
        assert_eq!(command.auto_detect_chapter_numbers, Some(false));
    }

    #[test]
    fn test_chapter_summary_carries_label() {
        let value = serde_json::to_value(ChapterSummaryResponse::from(ChapterSummary {
            index: 0,
            sequence_number: 3,
            label: "Chapter 3".to_string(),
            title: "Chapter 3".to_string(),
            segments: 0,
        }))
        .unwrap();

        assert_eq!(value["sequenceNumber"], 3);
        assert_eq!(value["label"], "Chapter 3");
    }

    #[test]
    fn test_partial_demo_limits_fill_defaults() {
        let req: CreateProjectRequest = serde_json::from_value(json!({
            "title": "Book",
            "manuscript": "text",
            "demoMode": true,
            "demoCharLimit": 100
        }))
        .unwrap();

        let limits = req.demo_limits().unwrap();
        assert_eq!(limits.char_limit, 100);
        assert_eq!(limits.chunks_per_segment, DemoLimits::default().chunks_per_segment);
    }
}
