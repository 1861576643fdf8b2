//! Memory Layer - In-Memory State Management
//!
//! 运行租约表：保证每个项目至多一个驱动任务

mod run_registry;

pub use run_registry::{LeaseError, RunLease, RunRegistry};
