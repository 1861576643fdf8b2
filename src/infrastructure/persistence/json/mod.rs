//! JSON 文档存储

mod project_store;

pub use project_store::JsonProjectStore;
