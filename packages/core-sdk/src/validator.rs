use tracing::{info, warn};

use crate::llm;
use crate::models::{Credentials, ProviderKind};

/**
 * \brief 凭据校验结果。
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /** \brief 是否通过 */
    pub ok: bool,
    /** \brief 面向用户的提示文本 */
    pub message: String,
}

/**
 * \brief 必填 Key 缺失时的固定提示，不发起任何网络请求。
 */
pub fn missing_key_message(kind: ProviderKind) -> String {
    format!(
        "❌ **{label} API key is required.** Get your key here: [{label} Platform]({page})",
        label = kind.label(),
        page = kind.key_page()
    )
}

/**
 * \brief 发起一次最小化真实调用确认 Key 与模型可用；任何失败都归入同一失败路径，不重试。
 */
pub async fn validate(creds: &Credentials) -> Validation {
    match llm::ping(creds).await {
        Ok(()) => {
            info!(provider = %creds.kind, model = %creds.model, "credential accepted");
            Validation {
                ok: true,
                message: format!("✅ {} key is valid", creds.kind.label()),
            }
        }
        Err(e) => {
            warn!(
                provider = %creds.kind,
                model = %creds.model,
                error = %format!("{:#}", e),
                "credential rejected"
            );
            Validation {
                ok: false,
                message: format!("❌ {} key invalid: {:#}", creds.kind.label(), e),
            }
        }
    }
}
