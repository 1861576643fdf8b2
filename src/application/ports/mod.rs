//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_renderer;
mod audio_storage;
mod project_repository;
mod speech_synthesizer;

pub use audio_renderer::{AudioRendererPort, RenderError};
pub use audio_storage::{AudioKind, AudioStorageError, AudioStoragePort};
pub use project_repository::{ProjectRepositoryPort, RepositoryError};
pub use speech_synthesizer::{
    SpeechSynthesizerPort, SynthesisError, SynthesisRequest, Voice,
};
