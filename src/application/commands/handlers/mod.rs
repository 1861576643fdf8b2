//! Command Handlers 实现

mod project_handlers;

pub use project_handlers::*;
