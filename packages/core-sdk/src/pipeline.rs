use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::agents::{
    make_participant, make_referee, ParticipantRole, TurnProducer, PRIMARY_NAME, SECONDARY_NAME,
};
use crate::config::Settings;
use crate::conversation::{Conversation, Transcript};
use crate::error::MergeError;
use crate::models::{Credentials, ProviderKind};
use crate::{telemetry, validator};

/**
 * \brief 前端提交的五个输入值。
 */
#[derive(Clone, Default, Deserialize)]
pub struct SolutionRequest {
    /** \brief 用户的编程问题 */
    #[serde(default)]
    pub question: String,
    /** \brief OpenAI Key（必填） */
    #[serde(default)]
    pub openai_key: String,
    /** \brief OpenAI 模型名，为空时使用默认模型 */
    #[serde(default)]
    pub openai_model: String,
    /** \brief Gemini Key（可选） */
    #[serde(default)]
    pub gemini_key: String,
    /** \brief Gemini 模型名，为空时使用默认模型 */
    #[serde(default)]
    pub gemini_model: String,
}

impl fmt::Debug for SolutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolutionRequest")
            .field("question_len", &self.question.len())
            .field("openai_key_set", &!self.openai_key.is_empty())
            .field("openai_model", &self.openai_model)
            .field("gemini_key_set", &!self.gemini_key.is_empty())
            .field("gemini_model", &self.gemini_model)
            .finish()
    }
}

fn credentials_for(kind: ProviderKind, key: &str, model: &str, settings: &Settings) -> Credentials {
    let model = match model.trim() {
        "" => kind.default_model(),
        m => m,
    };
    Credentials::new(kind, key, model).with_api_base(settings.api_base(kind))
}

async fn checked(creds: Credentials) -> Result<Credentials, MergeError> {
    let result = validator::validate(&creds).await;
    if result.ok {
        Ok(creds)
    } else {
        Err(MergeError::InvalidCredential {
            provider: creds.kind,
            message: result.message,
        })
    }
}

/**
 * \brief 校验凭据、组装参与者并驱动会话，返回完整记录。
 */
pub async fn solve(req: &SolutionRequest, settings: &Settings) -> Result<Transcript, MergeError> {
    // Key 原样透传；仅空串视为未填写。
    let openai_key = req.openai_key.as_str();
    if openai_key.is_empty() {
        return Err(MergeError::MissingCredential(ProviderKind::OpenAI));
    }
    let primary = checked(credentials_for(
        ProviderKind::OpenAI,
        openai_key,
        &req.openai_model,
        settings,
    ))
    .await?;

    let gemini_key = req.gemini_key.as_str();
    let secondary = if gemini_key.is_empty() {
        None
    } else {
        Some(
            checked(credentials_for(
                ProviderKind::Gemini,
                gemini_key,
                &req.gemini_model,
                settings,
            ))
            .await?,
        )
    };

    let mut proposers = vec![PRIMARY_NAME];
    let mut participants: Vec<Arc<dyn TurnProducer>> = vec![Arc::new(make_participant(
        PRIMARY_NAME,
        ParticipantRole::Primary,
        primary.clone(),
    ))];
    if let Some(creds) = secondary {
        proposers.push(SECONDARY_NAME);
        participants.push(Arc::new(make_participant(
            SECONDARY_NAME,
            ParticipantRole::Secondary,
            creds,
        )));
    }
    // 裁判沿用主模型凭据。
    participants.push(Arc::new(make_referee(&proposers, primary)));

    telemetry::log_event(
        "core.pipeline",
        &format!(
            "participants={} question_len={} round_limit={}",
            participants.len(),
            req.question.len(),
            settings.round_limit
        ),
    );

    Conversation::new(participants, settings.round_limit)
        .with_termination(settings.termination)
        .run(&req.question)
        .await
}

/**
 * \brief 单一入站操作：五个输入进，一段 markdown 出；所有失败都渲染为文本。
 */
pub async fn generate_solution(req: &SolutionRequest, settings: &Settings) -> String {
    match solve(req, settings).await {
        Ok(transcript) => transcript.final_text().to_string(),
        Err(e) => {
            telemetry::log_error("core.pipeline", &e.to_string());
            e.user_message()
        }
    }
}
