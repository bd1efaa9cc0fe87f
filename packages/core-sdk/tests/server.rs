/*!
 * \brief 前端页面调用的 JSON API，在临时端口上启动。
 */

mod common;

use std::sync::Arc;

use common::{FakeProviders, GOOD_OPENAI_KEY};
use mergemind_core_sdk::config::Settings;
use mergemind_core_sdk::server;
use serde_json::{json, Value};

async fn serve(settings: Settings) -> String {
    let app = server::router(Arc::new(settings));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn generate_returns_referee_answer() {
    let fake = FakeProviders::new("draft\n```js\nx\n```", "unused", "final\n```js\ny\n```\nTERMINATE");
    let base = serve(fake.settings().await).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .json(&json!({
            "question": "reverse a string in JavaScript",
            "openai_key": GOOD_OPENAI_KEY,
            "openai_model": "gpt-4o",
            "gemini_key": "",
            "gemini_model": "gemini-1.5-flash"
        }))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["output"], "final\n```js\ny\n```\nTERMINATE");
}

#[tokio::test]
async fn generate_reports_missing_key_in_output() {
    let fake = FakeProviders::new("a", "b", "c");
    let base = serve(fake.settings().await).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .json(&json!({ "question": "anything" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["output"]
        .as_str()
        .unwrap()
        .starts_with("❌ **OpenAI API key is required.**"));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn generate_accepts_empty_object() {
    let fake = FakeProviders::new("a", "b", "c");
    let base = serve(fake.settings().await).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/generate", base))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["output"]
        .as_str()
        .unwrap()
        .starts_with("❌ **OpenAI API key is required.**"));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn malformed_body_is_reported_in_output() {
    let fake = FakeProviders::new("a", "b", "c");
    let base = serve(fake.settings().await).await;
    let client = reqwest::Client::new();

    let broken = client
        .post(format!("{}/api/generate", base))
        .header("content-type", "application/json")
        .body("{\"question\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(broken.status().as_u16(), 200);
    let body: Value = broken.json().await.unwrap();
    assert!(body["output"]
        .as_str()
        .unwrap()
        .starts_with("❌ Invalid request: "));

    let plain = client
        .post(format!("{}/api/generate", base))
        .body("question=hi")
        .send()
        .await
        .unwrap();
    assert_eq!(plain.status().as_u16(), 200);
    let body: Value = plain.json().await.unwrap();
    assert!(body["output"]
        .as_str()
        .unwrap()
        .starts_with("❌ Invalid request: "));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn models_lists_ui_choices() {
    let base = serve(Settings::default()).await;

    let body: Value = reqwest::get(format!("{}/api/models", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["openai"]["default"], "gpt-3.5-turbo");
    assert_eq!(body["gemini"]["default"], "gemini-1.5-flash");
    assert!(body["openai"]["choices"]
        .as_array()
        .unwrap()
        .contains(&json!("gpt-4o-mini")));
}

#[tokio::test]
async fn health_reports_ok() {
    let base = serve(Settings::default()).await;

    let body: Value = reqwest::get(format!("{}/api/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn static_page_is_served_from_ui_dir() {
    let dir = std::env::temp_dir().join(format!("mergemind-ui-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>MergeMind</h1>").unwrap();
    let settings = Settings {
        ui_dir: dir.to_string_lossy().into_owned(),
        ..Settings::default()
    };
    let base = serve(settings).await;

    let text = reqwest::get(format!("{}/", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(text, "<h1>MergeMind</h1>");
}

#[tokio::test]
async fn bundled_page_renders_output_as_markdown() {
    let ui_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../web");
    let base = serve(Settings {
        ui_dir: ui_dir.to_string(),
        ..Settings::default()
    })
    .await;

    let page = reqwest::get(format!("{}/", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(page.contains("renderMarkdown(data.output"));
    assert!(!page.contains("output.textContent = data.output"));
}
