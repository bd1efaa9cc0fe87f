use thiserror::Error;

use crate::models::ProviderKind;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("{0} API key is required")]
    MissingCredential(ProviderKind),

    #[error("{message}")]
    InvalidCredential {
        provider: ProviderKind,
        message: String,
    },

    #[error("{participant} failed: {reason}")]
    ProviderCall { participant: String, reason: String },

    #[error("no participants configured")]
    NoParticipants,
}

impl MergeError {
    /**
     * \brief 渲染为前端可直接展示的 markdown 文本。
     */
    pub fn user_message(&self) -> String {
        match self {
            // 与凭据相关的错误文本已由校验器预先格式化。
            MergeError::InvalidCredential { message, .. } => message.clone(),
            MergeError::MissingCredential(kind) => crate::validator::missing_key_message(*kind),
            other => format!("❌ Generation failed: {}", other),
        }
    }
}
