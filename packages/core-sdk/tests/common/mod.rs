/*!
 * \brief 进程内模拟的 OpenAI 与 Gemini HTTP 接口。
 *
 * 仅接受 `sk-good` 与 `g-good` 两个 Key，记录每次通过鉴权的调用，
 * 并按系统提示词选择预设回复。
 */

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use mergemind_core_sdk::config::Settings;
use serde_json::{json, Value};

pub const GOOD_OPENAI_KEY: &str = "sk-good";
pub const GOOD_GEMINI_KEY: &str = "g-good";

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub provider: &'static str,
    pub model: String,
    pub ping: bool,
    pub system: String,
    pub messages: Vec<Value>,
}

struct Inner {
    calls: Vec<Call>,
    proposer_reply: String,
    gemini_reply: String,
    referee_reply: String,
    fail_gemini_chat: bool,
}

#[derive(Clone)]
pub struct FakeProviders {
    inner: Arc<Mutex<Inner>>,
}

impl FakeProviders {
    pub fn new(proposer_reply: &str, gemini_reply: &str, referee_reply: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                calls: Vec::new(),
                proposer_reply: proposer_reply.to_string(),
                gemini_reply: gemini_reply.to_string(),
                referee_reply: referee_reply.to_string(),
                fail_gemini_chat: false,
            })),
        }
    }

    pub fn fail_gemini_chat(self) -> Self {
        self.inner.lock().unwrap().fail_gemini_chat = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn chat_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| !c.ping).collect()
    }

    /** \brief 绑定临时端口并返回基地址。 */
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/v1/chat/completions", post(openai))
            .route("/v1beta/models/{call}", post(gemini))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    pub async fn settings(&self) -> Settings {
        let base = self.spawn().await;
        Settings {
            openai_base: base.clone(),
            gemini_base: base,
            ..Settings::default()
        }
    }
}

fn error_body(message: &str) -> Json<Value> {
    Json(json!({ "error": { "message": message } }))
}

async fn openai(
    State(fake): State<FakeProviders>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if auth != format!("Bearer {}", GOOD_OPENAI_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            error_body("Incorrect API key provided"),
        );
    }

    let ping = body.get("max_tokens").and_then(Value::as_u64) == Some(1);
    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    let system = messages
        .iter()
        .find(|m| m["role"] == "system")
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    let mut inner = fake.inner.lock().unwrap();
    let reply = if ping {
        "p".to_string()
    } else if system.contains("senior judge") {
        inner.referee_reply.clone()
    } else {
        inner.proposer_reply.clone()
    };
    inner.calls.push(Call {
        provider: "openai",
        model: body["model"].as_str().unwrap_or_default().to_string(),
        ping,
        system,
        messages,
    });

    (
        StatusCode::OK,
        Json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": reply } }]
        })),
    )
}

async fn gemini(
    State(fake): State<FakeProviders>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if key != GOOD_GEMINI_KEY {
        return (
            StatusCode::BAD_REQUEST,
            error_body("API key not valid. Please pass a valid API key."),
        );
    }

    let ping = body["generationConfig"]["maxOutputTokens"].as_u64() == Some(1);
    let system = body["system_instruction"]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let messages = body["contents"].as_array().cloned().unwrap_or_default();

    let mut inner = fake.inner.lock().unwrap();
    inner.calls.push(Call {
        provider: "gemini",
        model: call.trim_end_matches(":generateContent").to_string(),
        ping,
        system,
        messages,
    });

    if ping {
        return (
            StatusCode::OK,
            Json(json!({ "candidates": [{ "finishReason": "MAX_TOKENS" }] })),
        );
    }
    if inner.fail_gemini_chat {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_body("backend overloaded"),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": inner.gemini_reply }] }
            }]
        })),
    )
}
