use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

use crate::models::{Credentials, Message, ProviderKind};

const GEMINI_KEY_HEADER: &str = "x-goog-api-key";

/** \brief 校验凭据时使用的探测提示词。 */
pub const PING_PROMPT: &str = "ping";

/**
 * \brief 非流式调用，返回完整回复。回复中没有文本时视为失败。
 */
pub async fn chat_once(creds: &Credentials, messages: &[Message]) -> Result<String> {
    let v = match creds.kind {
        ProviderKind::OpenAI => request_openai(creds, messages, None).await?,
        ProviderKind::Gemini => request_gemini(creds, messages, None).await?,
    };
    let content = match creds.kind {
        ProviderKind::OpenAI => extract_openai_content(&v),
        ProviderKind::Gemini => extract_gemini_content(&v),
    };
    content.ok_or_else(|| anyhow!("{} returned no text: {}", creds.kind, summarize(&v)))
}

/**
 * \brief 以最小输出长度发起一次真实请求，仅确认 Key 与模型名可用。
 */
pub async fn ping(creds: &Credentials) -> Result<()> {
    let messages = [Message::user(PING_PROMPT)];
    match creds.kind {
        ProviderKind::OpenAI => request_openai(creds, &messages, Some(1)).await?,
        ProviderKind::Gemini => request_gemini(creds, &messages, Some(1)).await?,
    };
    Ok(())
}

async fn request_openai(
    creds: &Credentials,
    messages: &[Message],
    max_tokens: Option<u32>,
) -> Result<Value> {
    let url = format!(
        "{}/v1/chat/completions",
        creds.api_base.trim_end_matches('/')
    );
    let client = reqwest::Client::new();
    let mut body = json!({
        "model": creds.model,
        "messages": messages,
        "stream": false
    });
    if let Some(limit) = max_tokens {
        body["max_tokens"] = json!(limit);
    }

    let resp = client
        .post(url)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, sensitive(&format!("Bearer {}", creds.api_key))?)
        .json(&body)
        .send()
        .await
        .map_err(strip_url)?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(anyhow!("{} -> {}", status, error_reason(&text)));
    }
    resp.json().await.map_err(strip_url)
}

/**
 * \brief 构造携带密钥的请求头，标记为敏感以免出现在调试输出中。
 */
fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut header =
        HeaderValue::from_str(value).map_err(|_| anyhow!("API key contains invalid characters"))?;
    header.set_sensitive(true);
    Ok(header)
}

async fn request_gemini(
    creds: &Credentials,
    messages: &[Message],
    max_output_tokens: Option<u32>,
) -> Result<Value> {
    let base = normalize_gemini_base(&creds.api_base);
    let model = creds.model.trim_start_matches("models/");
    let url = format!("{}/models/{}:generateContent", base, model);
    let client = reqwest::Client::new();
    let (system_prompt, contents) = gemini_payload(messages);

    let mut body = json!({
        "contents": contents,
    });
    if let Some(sys) = system_prompt {
        body["system_instruction"] = json!({
            "parts": [{"text": sys}]
        });
    }
    if let Some(limit) = max_output_tokens {
        body["generationConfig"] = json!({ "maxOutputTokens": limit });
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    // Key 放在请求头而非 query，避免出现在错误信息的 URL 中。
    headers.insert(GEMINI_KEY_HEADER, sensitive(&creds.api_key)?);

    let resp = client
        .post(url)
        .headers(headers)
        .json(&body)
        .send()
        .await
        .map_err(strip_url)?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(anyhow!("{} -> {}", status, error_reason(&text)));
    }
    resp.json().await.map_err(strip_url)
}

fn strip_url(err: reqwest::Error) -> anyhow::Error {
    anyhow::Error::new(err.without_url())
}

/**
 * \brief 从 Provider 错误响应中提取可读原因；两家均使用 {"error": {"message": ...}}。
 */
fn error_reason(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn summarize(v: &Value) -> String {
    let text = v.to_string();
    if text.chars().count() > 200 {
        format!("{}…", text.chars().take(200).collect::<String>())
    } else {
        text
    }
}

fn extract_openai_content(v: &Value) -> Option<String> {
    v.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
}

fn extract_gemini_content(v: &Value) -> Option<String> {
    let first = v
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())?;
    if let Some(parts) = first
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        let text = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Some(text);
        }
    }
    first
        .get("output")
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
}

fn gemini_payload(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();
    for msg in messages {
        match msg.role.as_str() {
            "system" => system_parts.push(msg.content.clone()),
            "assistant" => contents.push(json!({
                "role": "model",
                "parts": [{"text": msg.content}]
            })),
            _ => contents.push(json!({
                "role": "user",
                "parts": [{"text": msg.content}]
            })),
        }
    }
    let system_prompt = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system_prompt, contents)
}

fn normalize_gemini_base(api_base: &str) -> String {
    let trimmed = api_base.trim_end_matches('/');
    if trimmed.ends_with("/v1")
        || trimmed.ends_with("/v1beta")
        || trimmed.contains("/v1/")
        || trimmed.contains("/v1beta/")
    {
        trimmed.to_string()
    } else {
        format!("{}/v1beta", trimmed)
    }
}
