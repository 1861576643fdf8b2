//! Bookcast - 有声书生成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Manuscript: 章节识别、双音色切分、长度受限分块
//! - Project Context: 项目聚合、章节/片段状态、确定性分块计划
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ProjectRepository, SpeechSynthesizer, AudioRenderer, AudioStorage）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + SSE / WebSocket 进度流
//! - Memory: 运行租约表
//! - Worker: ProjectProcessor 章节流水线
//! - Persistence: JSON 项目文档
//! - Adapters: 合成客户端、ffmpeg 渲染、文件存储
//! - Events: 进度广播

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
