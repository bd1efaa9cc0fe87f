use crate::conversation::{Termination, DEFAULT_ROUND_LIMIT};
use crate::models::ProviderKind;

/**
 * \brief 进程级只读配置：默认值 + 环境变量覆盖，CLI 参数可再覆盖。
 */
#[derive(Debug, Clone)]
pub struct Settings {
    /** \brief 会话轮次上限（含用户问题） */
    pub round_limit: usize,
    /** \brief 终止策略 */
    pub termination: Termination,
    /** \brief OpenAI API 基地址 */
    pub openai_base: String,
    /** \brief Gemini API 基地址 */
    pub gemini_base: String,
    /** \brief 前端静态资源目录 */
    pub ui_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            round_limit: DEFAULT_ROUND_LIMIT,
            termination: Termination::default(),
            openai_base: ProviderKind::OpenAI.default_api_base().to_string(),
            gemini_base: ProviderKind::Gemini.default_api_base().to_string(),
            ui_dir: "web".to_string(),
        }
    }
}

impl Settings {
    /**
     * \brief 读取 MERGEMIND_* 环境变量覆盖默认值；无法解析的值被忽略。
     */
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(v) = lookup("MERGEMIND_OPENAI_BASE").filter(|v| !v.trim().is_empty()) {
            settings.openai_base = v;
        }
        if let Some(v) = lookup("MERGEMIND_GEMINI_BASE").filter(|v| !v.trim().is_empty()) {
            settings.gemini_base = v;
        }
        if let Some(v) = lookup("MERGEMIND_UI_DIR").filter(|v| !v.trim().is_empty()) {
            settings.ui_dir = v;
        }
        if let Some(limit) = lookup("MERGEMIND_ROUND_LIMIT").and_then(|v| v.trim().parse().ok()) {
            settings.round_limit = limit;
        }
        if let Some(t) = lookup("MERGEMIND_TERMINATION").and_then(|v| v.parse().ok()) {
            settings.termination = t;
        }
        settings
    }

    /**
     * \brief 给定 Provider 的 API 基地址。
     */
    pub fn api_base(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::OpenAI => &self.openai_base,
            ProviderKind::Gemini => &self.gemini_base,
        }
    }
}
