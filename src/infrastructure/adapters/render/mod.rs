//! Render Adapter - 音频拼接与归一化实现

mod ffmpeg_renderer;

pub use ffmpeg_renderer::{FfmpegRenderer, FfmpegRendererConfig};
