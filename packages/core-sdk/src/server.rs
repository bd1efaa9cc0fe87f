use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, get_service, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    config::Settings,
    models::ProviderKind,
    pipeline::{self, SolutionRequest},
    telemetry,
};

/**
 * \brief 构建路由：JSON API + 前端静态资源。
 */
pub fn router(settings: Arc<Settings>) -> Router {
    let static_handler =
        ServeDir::new(settings.ui_dir.clone()).append_index_html_on_directories(true);
    let static_service = get_service(static_handler);

    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/models", get(list_models))
        .route("/api/health", get(health_check))
        .fallback_service(static_service)
        .layer(TraceLayer::new_for_http())
        .with_state(settings)
}

/**
 * \brief 启动本地 HTTP 服务，提供静态前端与 API。
 * \param addr 监听地址，如 "127.0.0.1:7860"
 */
pub async fn run(addr: &str, settings: Settings) -> Result<()> {
    let app = router(Arc::new(settings));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Serialize, Debug)]
struct GenerateResponse {
    /** \brief markdown 结果或错误提示 */
    output: String,
}

#[derive(Serialize, Debug)]
struct ModelChoices {
    choices: Vec<&'static str>,
    default: &'static str,
}

#[derive(Serialize, Debug)]
struct ModelsResponse {
    openai: ModelChoices,
    gemini: ModelChoices,
}

/**
 * \brief 生成接口：POST /api/generate。失败同样以 200 返回，错误文本放在 output 中。
 */
async fn generate(
    State(settings): State<Arc<Settings>>,
    payload: Result<Json<SolutionRequest>, JsonRejection>,
) -> (StatusCode, Json<GenerateResponse>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return rejected(rejection),
    };
    telemetry::log_event("server.generate", &format!("request {:?}", req));
    let output = pipeline::generate_solution(&req, &settings).await;
    (StatusCode::OK, Json(GenerateResponse { output }))
}

/**
 * \brief 请求体无法解析时，把 axum 的拒绝原因写进 output，状态码仍为 200。
 */
fn rejected(rejection: JsonRejection) -> (StatusCode, Json<GenerateResponse>) {
    telemetry::log_error("server.generate", &rejection.body_text());
    (
        StatusCode::OK,
        Json(GenerateResponse {
            output: format!("❌ Invalid request: {}", rejection.body_text()),
        }),
    )
}

fn choices(kind: ProviderKind) -> ModelChoices {
    ModelChoices {
        choices: kind.model_choices().to_vec(),
        default: kind.default_model(),
    }
}

/**
 * \brief 前端下拉框可选模型。
 */
async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        openai: choices(ProviderKind::OpenAI),
        gemini: choices(ProviderKind::Gemini),
    })
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
