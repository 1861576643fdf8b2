//! Query Handlers 实现

mod project_handlers;
mod voice_handlers;

pub use project_handlers::*;
pub use voice_handlers::*;
