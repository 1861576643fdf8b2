//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod render;
pub mod speech;
pub mod storage;

pub use render::*;
pub use speech::*;
pub use storage::*;
