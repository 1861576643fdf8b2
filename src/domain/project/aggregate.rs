//! Project Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    assign_sequence_numbers, Chapter, ChapterNumbering, ChapterStatus, DemoLimits, ProjectError,
    ProjectId, ProjectStatus, Title, VoiceMode, VoiceSettings,
};
use crate::domain::manuscript::{ChapterDraft, DEFAULT_VOICE_SWITCH_TOKEN};

/// 创建项目所需的全部输入（已校验、已分段）
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: Title,
    pub author: Option<String>,
    pub language: Option<String>,
    pub description: Option<String>,
    /// 系列中的册号
    pub series_number: Option<u32>,
    pub mode: VoiceMode,
    pub voices: Vec<String>,
    pub api_key: String,
    pub settings: VoiceSettings,
    pub voice_settings: Vec<VoiceSettings>,
    pub chapter_limit: Option<usize>,
    pub demo_mode: bool,
    pub demo_limits: DemoLimits,
    pub voice_switch_token: String,
    pub numbering: ChapterNumbering,
    pub chapters: Vec<ChapterDraft>,
}

/// Project 聚合根
///
/// 不变量:
/// - 章节顺序在创建时确定，之后不可变
/// - 状态迁移遵循 `ProjectStatus::can_transition_to`
/// - 分块不持久化，每次运行由章节内容重新派生
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    id: ProjectId,
    title: Title,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    series_number: Option<u32>,
    #[serde(default)]
    mode: VoiceMode,
    voices: Vec<String>,
    api_key: String,
    #[serde(default)]
    settings: VoiceSettings,
    #[serde(default)]
    voice_settings: Vec<VoiceSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    chapter_limit: Option<usize>,
    #[serde(default)]
    demo_mode: bool,
    #[serde(default)]
    demo_limits: DemoLimits,
    #[serde(default = "default_voice_switch_token")]
    voice_switch_token: String,
    #[serde(default)]
    chapter_numbering: ChapterNumbering,
    #[serde(default)]
    status: ProjectStatus,
    chapters: Vec<Chapter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    book_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    book_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

fn default_voice_switch_token() -> String {
    DEFAULT_VOICE_SWITCH_TOKEN.to_string()
}

impl Project {
    /// 创建待处理项目，同时分配章节编号
    pub fn new(input: NewProject) -> Self {
        let mut chapters: Vec<Chapter> = input.chapters.into_iter().map(Chapter::from).collect();
        assign_sequence_numbers(&mut chapters, input.numbering);

        Self {
            id: ProjectId::new(),
            title: input.title,
            author: input.author,
            language: input.language,
            description: input.description,
            series_number: input.series_number,
            mode: input.mode,
            voices: input.voices,
            api_key: input.api_key,
            settings: input.settings,
            voice_settings: input.voice_settings,
            chapter_limit: input.chapter_limit,
            demo_mode: input.demo_mode,
            demo_limits: input.demo_limits,
            voice_switch_token: input.voice_switch_token,
            chapter_numbering: input.numbering,
            status: ProjectStatus::Pending,
            chapters,
            book_file: None,
            book_url: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn transition(&mut self, next: ProjectStatus) -> Result<(), ProjectError> {
        if !self.status.can_transition_to(next) {
            return Err(ProjectError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// 开始一次新的运行
    pub fn begin_run(&mut self) -> Result<(), ProjectError> {
        self.transition(ProjectStatus::Processing)?;
        self.error = None;
        Ok(())
    }

    /// 暂停；已暂停时为空操作
    pub fn pause(&mut self) -> Result<(), ProjectError> {
        if self.status == ProjectStatus::Paused {
            return Ok(());
        }
        self.transition(ProjectStatus::Paused)?;
        for chapter in &mut self.chapters {
            if chapter.status == ChapterStatus::Processing {
                chapter.pause();
            }
        }
        Ok(())
    }

    /// 标记完成，可附带整书文件
    pub fn complete(&mut self, book: Option<(String, String)>) -> Result<(), ProjectError> {
        self.transition(ProjectStatus::Completed)?;
        if let Some((file, url)) = book {
            self.book_file = Some(file);
            self.book_url = Some(url);
        }
        self.error = None;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// 记录失败，任何状态都可进入
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ProjectStatus::Error;
        self.error = Some(message.into());
    }

    /// 重启后无驱动存活：processing 归一为 paused
    pub fn recover_interrupted(&mut self) -> bool {
        if self.status != ProjectStatus::Processing {
            return false;
        }
        self.status = ProjectStatus::Paused;
        for chapter in &mut self.chapters {
            if chapter.status == ChapterStatus::Processing {
                chapter.pause();
            }
        }
        true
    }

    /// 实际处理的章节数上限
    pub fn effective_chapter_limit(&self) -> usize {
        let total = self.chapters.len();
        let limit = self.chapter_limit.map_or(total, |l| l.min(total));
        if self.demo_mode {
            limit.min(1)
        } else {
            limit
        }
    }

    /// 音色下标对应的音色 ID
    pub fn voice_for(&self, voice_index: usize) -> Option<&str> {
        self.voices.get(voice_index).map(String::as_str)
    }

    /// 音色下标对应的合成参数（覆盖合并到基础参数上）
    pub fn settings_for_voice(&self, voice_index: usize) -> VoiceSettings {
        match self.voice_settings.get(voice_index) {
            Some(overrides) => overrides.merged_over(&self.settings),
            None => self.settings,
        }
    }

    pub fn chapter_mut(&mut self, index: usize) -> Result<&mut Chapter, ProjectError> {
        self.chapters
            .get_mut(index)
            .ok_or(ProjectError::ChapterNotFound(index))
    }

    /// 已完成且有文件的章节（按章节顺序）
    pub fn completed_chapter_files(&self) -> Vec<(usize, &str)> {
        self.chapters
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_completed())
            .filter_map(|(i, c)| c.file.as_deref().map(|f| (i, f)))
            .collect()
    }

    // Getters
    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn series_number(&self) -> Option<u32> {
        self.series_number
    }

    pub fn chapter_numbering(&self) -> ChapterNumbering {
        self.chapter_numbering
    }

    pub fn mode(&self) -> VoiceMode {
        self.mode
    }

    pub fn voices(&self) -> &[String] {
        &self.voices
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn settings(&self) -> &VoiceSettings {
        &self.settings
    }

    pub fn voice_settings(&self) -> &[VoiceSettings] {
        &self.voice_settings
    }

    pub fn chapter_limit(&self) -> Option<usize> {
        self.chapter_limit
    }

    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    pub fn demo_limits(&self) -> &DemoLimits {
        &self.demo_limits
    }

    pub fn voice_switch_token(&self) -> &str {
        &self.voice_switch_token
    }

    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn book_file(&self) -> Option<&str> {
        self.book_file.as_deref()
    }

    pub fn book_url(&self) -> Option<&str> {
        self.book_url.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}
