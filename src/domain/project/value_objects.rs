//! Project Context - Value Objects

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::ProjectError;

/// 项目唯一标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ProjectId {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ProjectError::InvalidId(s.to_string()))
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 项目标题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Title(String);

impl Title {
    pub fn new(title: impl Into<String>) -> Result<Self, ProjectError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ProjectError::InvalidTitle("标题不能为空".to_string()));
        }
        if title.chars().count() > 200 {
            return Err(ProjectError::InvalidTitle(
                "标题长度不能超过200字符".to_string(),
            ));
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 朗读模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceMode {
    /// 单音色：整章一个声音
    #[default]
    Single,
    /// 双音色：按切换标记交替
    Dual,
}

impl VoiceMode {
    /// 该模式需要的音色数量
    pub fn required_voices(&self) -> usize {
        match self {
            Self::Single => 1,
            Self::Dual => 2,
        }
    }
}

/// 项目状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Pending,
    Processing,
    Paused,
    Completed,
    Error,
}

impl ProjectStatus {
    /// 状态迁移表
    pub fn can_transition_to(self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (self, next),
            (Pending | Paused | Completed | Error, Processing)
                | (Processing, Paused | Completed | Error)
                | (Pending, Paused)
                | (Paused | Completed | Error, Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 合成音色参数，缺省字段由合成端补默认值
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl VoiceSettings {
    /// 逐字段覆盖：self 中有值的字段优先
    pub fn merged_over(&self, base: &VoiceSettings) -> VoiceSettings {
        VoiceSettings {
            stability: self.stability.or(base.stability),
            similarity_boost: self.similarity_boost.or(base.similarity_boost),
            style: self.style.or(base.style),
            speed: self.speed.or(base.speed),
        }
    }
}

/// 演示模式限额
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoLimits {
    #[serde(default = "default_demo_char_limit")]
    pub char_limit: usize,
    #[serde(default = "default_demo_chunks_per_segment")]
    pub chunks_per_segment: usize,
    #[serde(default = "default_demo_segments_per_chapter")]
    pub segments_per_chapter: usize,
}

fn default_demo_char_limit() -> usize {
    600
}

fn default_demo_chunks_per_segment() -> usize {
    1
}

fn default_demo_segments_per_chapter() -> usize {
    2
}

impl Default for DemoLimits {
    fn default() -> Self {
        Self {
            char_limit: default_demo_char_limit(),
            chunks_per_segment: default_demo_chunks_per_segment(),
            segments_per_chapter: default_demo_segments_per_chapter(),
        }
    }
}

/// 章节编号规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterNumbering {
    /// 首章编号，至少为 1
    #[serde(default = "default_chapter_start_number")]
    pub start_number: u32,
    /// 从标题中识别章节号
    #[serde(default = "default_auto_detect")]
    pub auto_detect: bool,
}

fn default_chapter_start_number() -> u32 {
    1
}

fn default_auto_detect() -> bool {
    true
}

impl Default for ChapterNumbering {
    fn default() -> Self {
        Self {
            start_number: default_chapter_start_number(),
            auto_detect: default_auto_detect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_parse() {
        let id = ProjectId::new();
        let parsed: ProjectId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<ProjectId>().is_err());
    }

    #[test]
    fn test_title_validation() {
        assert!(Title::new("  ").is_err());
        assert!(Title::new("a".repeat(201)).is_err());
        assert_eq!(Title::new(" Moby Dick ").unwrap().as_str(), "Moby Dick");
    }

    #[test]
    fn test_status_transitions() {
        use ProjectStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Processing));
        assert!(Error.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Processing));
        assert!(!Completed.can_transition_to(Paused));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn test_voice_settings_merge() {
        let base = VoiceSettings {
            stability: Some(0.5),
            similarity_boost: Some(0.75),
            ..Default::default()
        };
        let overrides = VoiceSettings {
            stability: Some(0.2),
            speed: Some(1.1),
            ..Default::default()
        };

        let merged = overrides.merged_over(&base);
        assert_eq!(merged.stability, Some(0.2));
        assert_eq!(merged.similarity_boost, Some(0.75));
        assert_eq!(merged.speed, Some(1.1));
        assert_eq!(merged.style, None);
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_string(&VoiceMode::Dual).unwrap(), "\"dual\"");
        let limits: DemoLimits = serde_json::from_str("{}").unwrap();
        assert_eq!(limits, DemoLimits::default());
    }
}
