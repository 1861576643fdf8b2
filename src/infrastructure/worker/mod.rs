//! Worker Layer - Background Project Processing
//!
//! 实现 ProjectProcessor，驱动章节合成与整书组装

mod project_processor;

pub use project_processor::{ProcessError, ProcessorConfig, ProjectProcessor, RunOutcome};
