use std::fmt;

use serde::{Deserialize, Serialize};

/**
 * \brief 支持的 Provider 类型，封闭集合。
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    Gemini,
}

impl ProviderKind {
    /**
     * \brief 面向用户的显示名称。
     */
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }

    /**
     * \brief 官方 API 基地址。
     */
    pub fn default_api_base(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "https://api.openai.com",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
        }
    }

    /**
     * \brief 获取 API Key 的页面地址。
     */
    pub fn key_page(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "https://platform.openai.com/api-keys",
            ProviderKind::Gemini => "https://makersuite.google.com/app/apikey",
        }
    }

    /**
     * \brief 前端下拉框中提供的模型列表，首项为默认值。
     */
    pub fn model_choices(self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAI => &[
                "gpt-3.5-turbo",
                "gpt-4o",
                "gpt-4o-mini",
                "gpt-5",
                "gpt-5.1",
                "gpt-5.2",
            ],
            ProviderKind::Gemini => &[
                "gemini-1.5-flash",
                "gemini-1.5-pro",
                "gemini-3-flash-preview",
                "gemini-2.5-flash",
            ],
        }
    }

    pub fn default_model(self) -> &'static str {
        self.model_choices()[0]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/**
 * \brief 单次请求内有效的 Provider 凭据，请求结束即丢弃，不落盘。
 */
#[derive(Clone)]
pub struct Credentials {
    /** \brief Provider 类型 */
    pub kind: ProviderKind,
    /** \brief API 基地址 */
    pub api_base: String,
    /** \brief API Key，仅驻留内存 */
    pub api_key: String,
    /** \brief 模型名 */
    pub model: String,
}

impl Credentials {
    /**
     * \brief 使用官方基地址构造凭据。
     */
    pub fn new(kind: ProviderKind, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind,
            api_base: kind.default_api_base().to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

// Key 永不进入日志。
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("kind", &self.kind)
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/**
 * \brief 消息结构，与 OpenAI Chat 消息格式对齐。
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /** \brief 角色：system/user/assistant */
    pub role: String,
    /** \brief 内容 */
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/**
 * \brief 会话记录中的一条消息：发送者名称 + 正文。
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /** \brief 发送者名称，会话内唯一 */
    pub name: String,
    /** \brief 正文 */
    pub content: String,
}

impl ChatMessage {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}
