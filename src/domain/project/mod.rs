//! Project Context - 有声书项目限界上下文
//!
//! 职责:
//! - Project 聚合与状态迁移
//! - 章节 / 双音色片段实体
//! - 章节编号
//! - 确定性分块计划（含演示模式截断）

mod aggregate;
mod chunk_plan;
mod entities;
mod errors;
mod numbering;
mod value_objects;

pub use aggregate::{NewProject, Project};
pub use chunk_plan::{
    book_file_name, chapter_file_name, plan_chapter, ChapterPlan, ChunkKey, PlannedChunk,
    AUDIO_EXTENSION,
};
pub use entities::{Chapter, ChapterStatus, Segment, SegmentStatus};
pub use errors::ProjectError;
pub use numbering::{assign_sequence_numbers, detect_chapter_number};
pub use value_objects::{
    ChapterNumbering, DemoLimits, ProjectId, ProjectStatus, Title, VoiceMode, VoiceSettings,
};
