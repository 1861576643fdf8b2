//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                    GET   健康检查
//! - /api/projects                GET   项目列表
//! - /api/projects                POST  创建项目（分段并保存为 pending）
//! - /api/projects/:id            GET   项目详情
//! - /api/projects/:id/start      POST  开始处理
//! - /api/projects/:id/pause      POST  暂停（协作式）
//! - /api/projects/:id/resume     POST  继续处理
//! - /api/projects/:id/book       POST  手动组装整书
//! - /api/voices                  POST  列出可用音色
//! - /api/events/:id              GET   SSE 进度流
//! - /ws/projects/:id             WS    WebSocket 进度流
//! - /audio/*path                 GET   输出目录下的音频文件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/projects/:project_id", get(handlers::project_websocket))
        .route("/audio/*path", get(handlers::serve_audio))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .merge(project_routes())
        .route("/voices", post(handlers::list_voices))
        .route("/events/:project_id", get(handlers::project_events))
}

/// Project 路由
fn project_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route("/projects/:project_id", get(handlers::get_project))
        .route("/projects/:project_id/start", post(handlers::start_project))
        .route("/projects/:project_id/pause", post(handlers::pause_project))
        .route("/projects/:project_id/resume", post(handlers::resume_project))
        .route("/projects/:project_id/book", post(handlers::build_book))
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::str::FromStr;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::Router;
    use axum::http::{header, Request, StatusCode};
    use futures_util::StreamExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    use crate::application::{AudioRendererPort, ProjectRepositoryPort, RenderError};
    use crate::domain::project::ProjectId;
    use crate::infrastructure::adapters::{FakeSpeechClient, FileAudioStorage};
    use crate::infrastructure::events::ProgressBroadcaster;
    use crate::infrastructure::http::{AppState, HttpServer};
    use crate::infrastructure::memory::RunRegistry;
    use crate::infrastructure::persistence::JsonProjectStore;
    use crate::infrastructure::worker::{ProcessorConfig, ProjectProcessor};

    struct ConcatRenderer;

    #[async_trait]
    impl AudioRendererPort for ConcatRenderer {
        async fn merge_sequential(
            &self,
            inputs: &[PathBuf],
            output: &Path,
        ) -> Result<(), RenderError> {
            let mut data = Vec::new();
            for input in inputs {
                data.extend(std::fs::read(input).map_err(|e| RenderError::IoError(e.to_string()))?);
            }
            std::fs::write(output, data).map_err(|e| RenderError::IoError(e.to_string()))
        }

        async fn normalize(&self, input: &Path, output: &Path) -> Result<(), RenderError> {
            std::fs::copy(input, output)
                .map(|_| ())
                .map_err(|e| RenderError::IoError(e.to_string()))
        }
    }

    struct TestApp {
        dir: TempDir,
        state: Arc<AppState>,
        router: Router,
    }

    async fn test_app() -> TestApp {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonProjectStore::open(dir.path().join("projects.json")).await);
        let storage = Arc::new(FileAudioStorage::new(dir.path().join("output")).await.unwrap());
        let synthesizer = Arc::new(FakeSpeechClient::with_defaults());
        let broadcaster = ProgressBroadcaster::new().arc();

        let processor = ProjectProcessor::new(
            ProcessorConfig::default(),
            store.clone(),
            synthesizer.clone(),
            Arc::new(ConcatRenderer),
            storage.clone(),
            broadcaster.clone(),
            RunRegistry::new().arc(),
        )
        .arc();

        let state = Arc::new(AppState::new(
            store,
            synthesizer,
            storage,
            broadcaster,
            processor,
            "***",
        ));
        let router = HttpServer::build_router(state.clone());

        TestApp { dir, state, router }
    }

    impl TestApp {
        async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, body.to_vec())
        }

        async fn get_json(&self, uri: &str) -> Value {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let (_, body) = self.send(request).await;
            serde_json::from_slice(&body).unwrap()
        }

        async fn post_json(&self, uri: &str, payload: Value) -> Value {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap();
            let (_, body) = self.send(request).await;
            serde_json::from_slice(&body).unwrap()
        }

        async fn create_project(&self) -> String {
            let resp = self
                .post_json(
                    "/api/projects",
                    json!({
                        "title": "Route Book",
                        "apiKey": "secret-key",
                        "voices": ["narrator"],
                        "text": "# Chapter 1\nHello there.\n# Chapter 2\nGoodbye now."
                    }),
                )
                .await;
            assert_eq!(resp["errno"], 0, "{}", resp);
            resp["data"]["projectId"].as_str().unwrap().to_string()
        }

        async fn wait_for_status(&self, id: &str, status: &str) -> Value {
            for _ in 0..250 {
                let resp = self.get_json(&format!("/api/projects/{}", id)).await;
                if resp["data"]["status"] == status {
                    return resp;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            panic!("project {} never reached {}", id, status);
        }
    }

    #[tokio::test]
    async fn test_ping() {
        let app = test_app().await;
        let resp = app.get_json("/api/ping").await;
        assert_eq!(resp["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_get_and_list_redact_credentials() {
        let app = test_app().await;
        let id = app.create_project().await;

        let detail = app.get_json(&format!("/api/projects/{}", id)).await;
        assert_eq!(detail["errno"], 0);
        assert_eq!(detail["data"]["status"], "pending");
        assert_eq!(detail["data"]["hasApiKey"], true);
        assert_eq!(detail["data"]["chapters"].as_array().unwrap().len(), 2);
        assert!(!detail.to_string().contains("secret-key"));

        let list = app.get_json("/api/projects").await;
        let items = list["data"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["totalChapters"], 2);
        assert!(!list.to_string().contains("secret-key"));
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let app = test_app().await;

        let resp = app
            .post_json(
                "/api/projects",
                json!({ "title": "No voices", "apiKey": "k", "text": "Body." }),
            )
            .await;
        assert_eq!(resp["errno"], 400);

        let resp = app
            .post_json(
                "/api/projects",
                json!({ "title": "Dual", "apiKey": "k", "mode": "dual", "voices": ["a"], "text": "A***B" }),
            )
            .await;
        assert_eq!(resp["errno"], 400);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let app = test_app().await;

        let resp = app.get_json("/api/projects/not-a-uuid").await;
        assert_eq!(resp["errno"], 400);

        let resp = app
            .get_json(&format!("/api/projects/{}", ProjectId::new()))
            .await;
        assert_eq!(resp["errno"], 404);

        let resp = app
            .post_json(&format!("/api/projects/{}/start", ProjectId::new()), json!({}))
            .await;
        assert_eq!(resp["errno"], 404);
    }

    #[tokio::test]
    async fn test_start_runs_to_completion_and_serves_book() {
        let app = test_app().await;
        let id = app.create_project().await;

        let resp = app
            .post_json(&format!("/api/projects/{}/start", id), json!({}))
            .await;
        assert_eq!(resp["errno"], 0);

        let detail = app.wait_for_status(&id, "completed").await;
        let book_url = detail["data"]["bookUrl"].as_str().unwrap().to_string();
        assert!(book_url.starts_with("/audio/book/"));

        let request = Request::builder().uri(&book_url).body(Body::empty()).unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!body.is_empty());
    }

    #[tokio::test]
    async fn test_start_while_running_conflicts() {
        let app = test_app().await;
        let id = app.create_project().await;
        let project_id = ProjectId::from_str(&id).unwrap();

        let _lease = app.state.processor.begin(&project_id).await.unwrap();

        let resp = app
            .post_json(&format!("/api/projects/{}/start", id), json!({}))
            .await;
        assert_eq!(resp["errno"], 409);

        let resp = app
            .post_json(&format!("/api/projects/{}/book", id), json!({}))
            .await;
        assert_eq!(resp["errno"], 409);
    }

    #[tokio::test]
    async fn test_pause_and_manual_book_without_chapters() {
        let app = test_app().await;
        let id = app.create_project().await;

        let resp = app
            .post_json(&format!("/api/projects/{}/book", id), json!({}))
            .await;
        assert_eq!(resp["errno"], 400);

        let resp = app
            .post_json(&format!("/api/projects/{}/pause", id), json!({}))
            .await;
        assert_eq!(resp["errno"], 0);
        assert_eq!(resp["data"]["status"], "paused");

        let project_id = ProjectId::from_str(&id).unwrap();
        let repo: Arc<dyn ProjectRepositoryPort> = app.state.project_repo.clone();
        assert_eq!(
            repo.get(&project_id).unwrap().status().as_str(),
            "paused"
        );
    }

    #[tokio::test]
    async fn test_voices_requires_key() {
        let app = test_app().await;

        let resp = app.post_json("/api/voices", json!({ "apiKey": "" })).await;
        assert_eq!(resp["errno"], 400);

        let resp = app.post_json("/api/voices", json!({ "apiKey": "k" })).await;
        assert_eq!(resp["errno"], 0);
        assert!(!resp["data"]["voices"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_audio_rejects_path_traversal() {
        let app = test_app().await;
        std::fs::write(app.dir.path().join("secret.txt"), b"top secret").unwrap();

        for uri in [
            "/audio/..%2Fsecret.txt",
            "/audio/chapters/..%2F..%2Fsecret.txt",
        ] {
            let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
            let (_, body) = app.send(request).await;
            assert!(!String::from_utf8_lossy(&body).contains("top secret"));
            let resp: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(resp["errno"], 400, "{}", uri);
        }

        let resp = app.get_json("/audio/chapters/missing.mp3").await;
        assert_eq!(resp["errno"], 404);
    }

    #[tokio::test]
    async fn test_events_stream_starts_with_connected() {
        let app = test_app().await;
        let id = app.create_project().await;

        let request = Request::builder()
            .uri(format!("/api/events/{}", id))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let mut body = response.into_body().into_data_stream();
        let frame = body.next().await.unwrap().unwrap();
        let text = String::from_utf8(frame.to_vec()).unwrap();
        assert!(text.starts_with("data: "));
        assert!(text.contains(r#""type":"connected""#));

        let project_id = ProjectId::from_str(&id).unwrap();
        assert_eq!(app.state.broadcaster.subscriber_count(&project_id), 1);
        drop(body);
        assert_eq!(app.state.broadcaster.subscriber_count(&project_id), 0);
    }
}
