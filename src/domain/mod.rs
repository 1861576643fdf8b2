//! Domain Layer - 领域层
//!
//! - Project Context: 有声书项目聚合、章节状态机、分块计划
//! - Manuscript: 章节识别与文本分块（纯函数）

pub mod manuscript;
pub mod project;

pub use manuscript::{chunk, segment, ChapterDraft, SegmentDraft, SegmentOptions};
