//! 对话记录
//!
//! 追加式消息序列：插入顺序即回合顺序，追加后不删除、不重排。
//! 另提供按角色视角的 LLM 消息转换（自己说的为 assistant，其余为 user）。

use serde::{Deserialize, Serialize};

use crate::core::Role;
use crate::llm::ChatMessage;

/// 单条对话消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// 路由消息的收件人（未识别的收件人只保留在 content 中）
    #[serde(skip)]
    pub recipient: Option<Role>,
}

impl Message {
    /// 自由文本回复
    pub fn reply(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            recipient: None,
        }
    }

    /// 路由消息：content 形如 `[to coworker] ...`，原始 recipient 文本保留
    pub fn addressed(role: Role, recipient: &str, message: &str) -> Self {
        Self {
            role,
            content: format!("[to {}] {}", recipient, message),
            recipient: Role::from_key(recipient),
        }
    }
}

/// 追加式对话
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// 以 `role` 的视角重建 LLM 历史；每次调用重新计算
    pub fn view_for(&self, role: Role) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .map(|m| {
                if m.role == role {
                    ChatMessage::assistant(m.content.clone())
                } else {
                    ChatMessage::user(m.content.clone())
                }
            })
            .collect()
    }

    /// 最新一条是否来自其他角色（即 `role` 有待回应的消息）
    pub fn has_inbound_for(&self, role: Role) -> bool {
        self.last().is_some_and(|m| m.role != role)
    }
}
