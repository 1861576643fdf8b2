//! FFmpeg Renderer
//!
//! 通过 ffmpeg 子进程实现 AudioRendererPort:
//! - 拼接: concat demuxer + 列表文件，`-c copy` 不重编码
//! - 归一化: loudnorm 滤镜 + 重采样

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;

use crate::application::ports::{AudioRendererPort, RenderError};

/// stderr 保留的最大字符数
const STDERR_TAIL_CHARS: usize = 800;

/// FFmpeg 渲染器配置
#[derive(Debug, Clone)]
pub struct FfmpegRendererConfig {
    /// ffmpeg 可执行文件
    pub ffmpeg_path: PathBuf,
    /// 响度归一化滤镜
    pub loudnorm_filter: String,
    /// 归一化输出采样率
    pub sample_rate: u32,
}

impl Default for FfmpegRendererConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            loudnorm_filter: "loudnorm=I=-16:TP=-1.5:LRA=11".to_string(),
            sample_rate: 44100,
        }
    }
}

/// FFmpeg 渲染器
pub struct FfmpegRenderer {
    config: FfmpegRendererConfig,
}

impl FfmpegRenderer {
    pub fn new(config: FfmpegRendererConfig) -> Self {
        Self { config }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<(), RenderError> {
        tracing::debug!(
            ffmpeg = %self.config.ffmpeg_path.display(),
            args = ?args,
            "Running ffmpeg"
        );

        let output = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RenderError::ToolUnavailable(self.config.ffmpeg_path.display().to_string())
                } else {
                    RenderError::IoError(e.to_string())
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::ToolFailed {
                status: output.status.to_string(),
                stderr: tail(stderr.trim(), STDERR_TAIL_CHARS),
            });
        }

        Ok(())
    }

    fn normalize_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.into(),
            "-af".into(),
            self.config.loudnorm_filter.clone().into(),
            "-ar".into(),
            self.config.sample_rate.to_string().into(),
            output.into(),
        ]
    }
}

fn merge_args(list_file: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        list_file.into(),
        "-c".into(),
        "copy".into(),
        output.into(),
    ]
}

/// concat 列表文件内容，单引号按 ffmpeg 规则转义
fn concat_list(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|p| {
            let escaped = p.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// `{output}.list`
fn list_file_for(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".list");
    PathBuf::from(name)
}

fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(max_chars)).collect()
}

#[async_trait]
impl AudioRendererPort for FfmpegRenderer {
    async fn merge_sequential(
        &self,
        inputs: &[PathBuf],
        output: &Path,
    ) -> Result<(), RenderError> {
        if inputs.is_empty() {
            return Err(RenderError::NoInputs);
        }

        // 列表中的相对路径按列表文件所在目录解析，统一转为绝对路径
        let mut absolute = Vec::with_capacity(inputs.len());
        for input in inputs {
            let path = fs::canonicalize(input)
                .await
                .map_err(|e| RenderError::IoError(format!("{}: {}", input.display(), e)))?;
            absolute.push(path);
        }

        let list_file = list_file_for(output);
        fs::write(&list_file, concat_list(&absolute))
            .await
            .map_err(|e| RenderError::IoError(e.to_string()))?;

        let result = self.run(merge_args(&list_file, output)).await;

        if let Err(e) = fs::remove_file(&list_file).await {
            tracing::debug!(path = %list_file.display(), error = %e, "Failed to remove concat list");
        }

        result?;

        tracing::debug!(
            inputs = inputs.len(),
            output = %output.display(),
            "Audio merged"
        );
        Ok(())
    }

    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), RenderError> {
        self.run(self.normalize_args(input, output)).await?;
        tracing::debug!(output = %output.display(), "Audio normalized");
        Ok(())
    }
}
