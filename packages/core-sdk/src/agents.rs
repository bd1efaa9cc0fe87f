use async_trait::async_trait;
use tracing::debug;

use crate::llm;
use crate::models::{ChatMessage, Credentials, Message};

/** \brief 会话结束标记。 */
pub const TERMINATE_MARKER: &str = "TERMINATE";

pub const PRIMARY_NAME: &str = "ChatGpt";
pub const SECONDARY_NAME: &str = "Gemini";
pub const REFEREE_NAME: &str = "Referee";

/** \brief 提议者（主/副模型）共用的系统指令。 */
pub const PROPOSER_INSTRUCTION: &str = "Write explanation and the most efficient code \
in the language specified by the user.\n\
Output MUST include a fenced code block.\n\
End with: TERMINATE";

/**
 * \brief 参与者在会话中的角色，封闭集合。
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Primary,
    Secondary,
    Referee,
}

/**
 * \brief 轮次生产者：给定会话历史，产出下一条消息。编排器只依赖该能力，便于测试替换。
 */
#[async_trait]
pub trait TurnProducer: Send + Sync {
    fn name(&self) -> &str;
    fn role(&self) -> ParticipantRole;

    async fn propose(&self, history: &[ChatMessage]) -> anyhow::Result<String>;
}

/**
 * \brief 绑定单个 Provider 配置与固定指令的会话参与者，创建后不可变。
 */
#[derive(Debug, Clone)]
pub struct Participant {
    name: String,
    role: ParticipantRole,
    instruction: String,
    credentials: Credentials,
}

impl Participant {
    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

/**
 * \brief 构造提议者参与者；不做校验，调用方须先完成凭据校验。
 */
pub fn make_participant(
    name: impl Into<String>,
    role: ParticipantRole,
    credentials: Credentials,
) -> Participant {
    Participant {
        name: name.into(),
        role,
        instruction: PROPOSER_INSTRUCTION.to_string(),
        credentials,
    }
}

/**
 * \brief 构造裁判参与者，指令中点名需要评审的提议者。
 */
pub fn make_referee(proposers: &[&str], credentials: Credentials) -> Participant {
    Participant {
        name: REFEREE_NAME.to_string(),
        role: ParticipantRole::Referee,
        instruction: referee_instruction(proposers),
        credentials,
    }
}

pub fn referee_instruction(proposers: &[&str]) -> String {
    format!(
        "You are a senior judge.\n\
         Evaluate solutions from {}.\n\
         Merge strengths and output the single best solution.\n\
         Provide explanation and final code only.\n\
         End with: {}",
        proposers.join(" and "),
        TERMINATE_MARKER
    )
}

/**
 * \brief 将会话历史投影为某个参与者视角的线上消息。
 * \param speaker 发言者名称：其历史消息作为 assistant，其余作为 user 并带上发送者前缀。
 */
pub fn project_history(speaker: &str, instruction: &str, history: &[ChatMessage]) -> Vec<Message> {
    let mut out = Vec::with_capacity(history.len() + 1);
    out.push(Message::system(instruction));
    for (idx, msg) in history.iter().enumerate() {
        if msg.name == speaker {
            out.push(Message::assistant(msg.content.clone()));
        } else if idx == 0 {
            // 首条是用户问题，原样传递。
            out.push(Message::user(msg.content.clone()));
        } else {
            out.push(Message::user(format!("{}:\n{}", msg.name, msg.content)));
        }
    }
    out
}

#[async_trait]
impl TurnProducer for Participant {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> ParticipantRole {
        self.role
    }

    async fn propose(&self, history: &[ChatMessage]) -> anyhow::Result<String> {
        let messages = project_history(&self.name, &self.instruction, history);
        debug!(
            participant = %self.name,
            provider = %self.credentials.kind,
            model = %self.credentials.model,
            messages = messages.len(),
            "requesting turn"
        );
        llm::chat_once(&self.credentials, &messages).await
    }
}
