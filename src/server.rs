//! HTTP 服务层
//!
//! 对外暴露两个接口：
//! - `POST /analyze`：分析一种疾病，返回问答对与用量统计
//! - `GET /healthz`：存活探测
//!
//! 错误语义：
//! - 请求体不是合法 JSON（含数值字段为负数）→ 400
//! - 缺少 `disease_name` 或为空字符串 → 400
//! - 流水线任何一步失败 → 500，错误信息放在 `error` 字段

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::models::{AnalyzeRequest, AnalyzeResponse};
use crate::orchestrator::DiseaseAnalyzer;
use crate::utils::logging;

/// 服务共享状态
#[derive(Clone)]
struct AppState {
    config: Config,
}

/// HTTP 层错误：映射成状态码 + JSON 错误体
#[derive(Debug, thiserror::Error)]
enum ServerError {
    /// 请求不合法（400）
    #[error("{0}")]
    BadRequest(String),
    /// 分析流水线失败（500）
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// POST /analyze
///
/// `payload` 用 `Result` 接收，JSON 解析失败时走 400 而不是 axum 的默认 422。
async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ServerError> {
    let Json(request) =
        payload.map_err(|_| ServerError::BadRequest("Invalid JSON in request body".to_string()))?;

    let num_questions = request.effective_num_questions();
    let max_workers = request.effective_max_workers();
    let disease_name = request
        .disease_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ServerError::BadRequest("disease_name is required".to_string()))?;

    info!("📥 收到分析请求: {}", disease_name);

    let analyzer = DiseaseAnalyzer::connect(&state.config)
        .await
        .map_err(|e| internal_error(&e))?;
    let response = analyzer
        .analyze(&disease_name, num_questions, max_workers)
        .await
        .map_err(|e| internal_error(&e))?;

    Ok(Json(response))
}

/// GET /healthz
async fn healthz() -> Json<serde_json::Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn internal_error(e: &anyhow::Error) -> ServerError {
    error!("❌ 分析请求失败: {:#}", e);
    ServerError::Internal(e.to_string())
}

/// 组装路由
fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/healthz", get(healthz))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 启动 HTTP 服务并阻塞运行，收到 Ctrl+C 后优雅退出
pub async fn serve(config: Config) -> Result<()> {
    let listener = TcpListener::bind(&config.listen_addr).await?;
    logging::log_startup(
        &config.listen_addr,
        &config.generation_model,
        &config.verification_model,
    );

    let app = router(AppState { config });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("🛑 收到退出信号，正在关闭服务..."),
        Err(e) => error!("❌ 无法监听 Ctrl+C 信号: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    /// 路由测试用配置：后端地址指向本机不可达端口，不依赖外部服务
    fn test_state() -> AppState {
        AppState {
            config: Config {
                openai_api_base: "http://127.0.0.1:1/v1".to_string(),
                pinecone_index_host: Some("http://127.0.0.1:1".to_string()),
                ..Config::default()
            },
        }
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("构造请求失败")
    }

    async fn error_message(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("读取响应体失败");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("响应体不是 JSON");
        value["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_missing_disease_name_returns_400() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(r#"{"num_questions": 5}"#))
            .await
            .expect("请求失败");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "disease_name is required");
    }

    #[tokio::test]
    async fn test_empty_disease_name_returns_400() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(r#"{"disease_name": ""}"#))
            .await
            .expect("请求失败");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "disease_name is required");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request("{not json"))
            .await
            .expect("请求失败");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "Invalid JSON in request body");
    }

    #[tokio::test]
    async fn test_negative_num_questions_returns_400() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(
                r#"{"disease_name": "asthma", "num_questions": -5}"#,
            ))
            .await
            .expect("请求失败");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unreachable_backend_returns_500() {
        let app = router(test_state());
        let response = app
            .oneshot(json_request(r#"{"disease_name": "asthma"}"#))
            .await
            .expect("请求失败");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let message = error_message(response).await;
        assert!(
            message.starts_with("Internal server error: "),
            "意外的错误信息: {}",
            message
        );
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .expect("构造请求失败"),
            )
            .await
            .expect("请求失败");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .expect("构造请求失败"),
            )
            .await
            .expect("请求失败");

        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
