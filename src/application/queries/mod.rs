//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：处理所有读操作

mod project_queries;
mod voice_queries;

pub mod handlers;

pub use project_queries::*;
pub use voice_queries::*;
