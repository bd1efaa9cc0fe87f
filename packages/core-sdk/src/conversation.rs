use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agents::{TurnProducer, REFEREE_NAME, TERMINATE_MARKER};
use crate::error::MergeError;
use crate::models::ChatMessage;

/** \brief 默认轮次上限（包含用户问题本身）。 */
pub const DEFAULT_ROUND_LIMIT: usize = 5;

/** \brief 驱动会话的控制者名称，无模型支撑。 */
pub const CONTROLLER_NAME: &str = "user_proxy";

/**
 * \brief 终止判定：消息右侧去空白后以 TERMINATE 结尾。
 */
pub fn is_termination_msg(content: &str) -> bool {
    content.trim_end().ends_with(TERMINATE_MARKER)
}

/**
 * \brief 会话终止策略，独立于提示词文本可替换。
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    /** \brief 任意最新消息带终止标记即结束 */
    #[default]
    Any,
    /** \brief 仅裁判消息带终止标记才结束 */
    Referee,
}

impl Termination {
    pub fn is_terminated(self, history: &[ChatMessage]) -> bool {
        let Some(last) = history.last() else {
            return false;
        };
        match self {
            Termination::Any => is_termination_msg(&last.content),
            Termination::Referee => last.name == REFEREE_NAME && is_termination_msg(&last.content),
        }
    }
}

impl std::str::FromStr for Termination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Termination::Any),
            "referee" => Ok(Termination::Referee),
            other => Err(format!("unknown termination policy: {other}")),
        }
    }
}

/**
 * \brief 一次会话的完整记录。
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    terminated_by_marker: bool,
}

impl Transcript {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /** \brief 最后一条消息正文，原样返回（不剥离终止标记）。 */
    pub fn final_text(&self) -> &str {
        self.messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    pub fn terminated_by_marker(&self) -> bool {
        self.terminated_by_marker
    }
}

/**
 * \brief 有界多方会话：轮询选择发言者，直到终止或达到轮次上限。
 */
pub struct Conversation {
    participants: Vec<Arc<dyn TurnProducer>>,
    round_limit: usize,
    termination: Termination,
}

impl Conversation {
    /**
     * \param participants 有序参与者，发言顺序即列表顺序并循环
     * \param round_limit  消息总数上限，至少为 1
     */
    pub fn new(participants: Vec<Arc<dyn TurnProducer>>, round_limit: usize) -> Self {
        Self {
            participants,
            round_limit: round_limit.max(1),
            termination: Termination::default(),
        }
    }

    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    pub fn round_limit(&self) -> usize {
        self.round_limit
    }

    fn next_speaker(&self, turn: usize) -> &Arc<dyn TurnProducer> {
        &self.participants[turn % self.participants.len()]
    }

    /**
     * \brief 以用户问题开场驱动会话；任一参与者调用失败即整体失败，不保留部分结果。
     */
    pub async fn run(&self, question: &str) -> Result<Transcript, MergeError> {
        if self.participants.is_empty() {
            return Err(MergeError::NoParticipants);
        }
        let start = Instant::now();
        let mut messages = vec![ChatMessage::new(CONTROLLER_NAME, question)];
        let mut turn = 0usize;

        let terminated_by_marker = loop {
            if self.termination.is_terminated(&messages) {
                break true;
            }
            if messages.len() >= self.round_limit {
                break false;
            }

            let speaker = self.next_speaker(turn);
            let reply = speaker.propose(&messages).await.map_err(|e| {
                warn!(participant = %speaker.name(), round = messages.len() + 1, "turn failed");
                MergeError::ProviderCall {
                    participant: speaker.name().to_string(),
                    reason: format!("{:#}", e),
                }
            })?;
            info!(
                participant = %speaker.name(),
                role = ?speaker.role(),
                round = messages.len() + 1,
                chars = reply.len(),
                "turn complete"
            );
            messages.push(ChatMessage::new(speaker.name(), reply));
            turn += 1;
        };

        info!(
            rounds = messages.len(),
            terminated_by_marker,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "conversation finished"
        );
        Ok(Transcript {
            messages,
            terminated_by_marker,
        })
    }
}

/**
 * \brief 便捷入口：按默认终止策略运行一次会话并返回完整记录。
 */
pub async fn run(
    question: &str,
    participants: Vec<Arc<dyn TurnProducer>>,
    round_limit: usize,
) -> Result<Transcript, MergeError> {
    Conversation::new(participants, round_limit)
        .run(question)
        .await
}
