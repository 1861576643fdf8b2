//! Bookcast - 有声书生成服务
//!
//! 组装适配器、处理器与 HTTP 服务

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use bookcast::application::{ProjectRepositoryPort, SpeechSynthesizerPort};
use bookcast::config::{load_config, print_config, AppConfig, SynthesisProvider};
use bookcast::infrastructure::adapters::{
    FakeSpeechClient, FfmpegRenderer, FfmpegRendererConfig, FileAudioStorage, HttpSpeechClient,
    HttpSpeechClientConfig,
};
use bookcast::infrastructure::events::ProgressBroadcaster;
use bookcast::infrastructure::http::{AppState, HttpServer};
use bookcast::infrastructure::memory::RunRegistry;
use bookcast::infrastructure::persistence::JsonProjectStore;
use bookcast::infrastructure::worker::{ProcessorConfig, ProjectProcessor};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},bookcast={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_synthesizer(config: &AppConfig) -> anyhow::Result<Arc<dyn SpeechSynthesizerPort>> {
    Ok(match config.synthesis.provider {
        SynthesisProvider::Http => {
            let client_config = HttpSpeechClientConfig::new(&config.synthesis.url)
                .with_timeout(config.synthesis.timeout_secs)
                .with_model(&config.synthesis.model_id)
                .with_output_format(&config.synthesis.output_format);
            Arc::new(HttpSpeechClient::new(client_config)?)
        }
        SynthesisProvider::Fake => Arc::new(FakeSpeechClient::with_defaults()),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().context("Failed to load config")?;

    init_tracing(&config);
    tracing::info!("Bookcast - audiobook generation service");
    print_config(&config);

    // 项目文档：processing 状态的项目在加载时归一为 paused
    let store = Arc::new(JsonProjectStore::open(&config.storage.data_file).await);
    let storage = Arc::new(
        FileAudioStorage::new(&config.storage.output_dir)
            .await
            .context("Failed to prepare output directory")?,
    );

    let synthesizer = build_synthesizer(&config)?;
    let renderer = Arc::new(FfmpegRenderer::new(FfmpegRendererConfig {
        ffmpeg_path: config.audio.ffmpeg_path.clone(),
        loudnorm_filter: config.audio.loudnorm_filter.clone(),
        sample_rate: config.audio.sample_rate,
    }));

    let broadcaster = ProgressBroadcaster::new().arc();
    let processor = ProjectProcessor::new(
        ProcessorConfig {
            max_chunk_chars: config.processing.max_chunk_chars,
        },
        store.clone(),
        synthesizer.clone(),
        renderer,
        storage.clone(),
        broadcaster.clone(),
        RunRegistry::new().arc(),
    )
    .arc();

    let state = AppState::new(
        store.clone(),
        synthesizer,
        storage,
        broadcaster,
        processor,
        config.processing.voice_switch_token.clone(),
    );

    let server = HttpServer::new(config.server.addr(), state);

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    // 最后一次落盘
    store.persist().await.context("Failed to persist projects")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
