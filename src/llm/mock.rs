//! Mock / 脚本化 LLM 客户端（无需 API）
//!
//! - MockLlmClient：确定性离线后端，主角先问同事、被拒后找主管，便于本地跑通整个流程
//! - ScriptedLlmClient：按角色预置回复序列，并记录每次调用，供测试断言

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::agent::Stage;
use crate::core::Role;
use crate::llm::{ChatMessage, ChatRole, GenerationOptions, GenerationRequest, LlmClient, LlmError};

/// 确定性离线客户端
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: GenerationRequest<'_>) -> Result<String, LlmError> {
        if request.stage == Stage::Analyze {
            return Ok("The last reply did not contain the information I need.".to_string());
        }
        let heard_back = request
            .messages
            .iter()
            .any(|m| m.role == ChatRole::User);
        let reply = match request.role {
            Role::Protagonist if heard_back => {
                r#"{"recipient": "supervisor", "message": "The coworker will not share the project configuration. Could you send it to me?"}"#
            }
            Role::Protagonist => {
                r#"{"recipient": "coworker", "message": "Could you share the project configuration details?"}"#
            }
            Role::Coworker => "Sorry, I'm swamped right now. Maybe ask someone else.",
            Role::Supervisor => "Of course. Here are the details you asked for.",
        };
        Ok(reply.to_string())
    }
}

/// 一次被记录的调用
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub role: Role,
    pub stage: Stage,
    pub messages: Vec<ChatMessage>,
    pub options: GenerationOptions,
}

/// 脚本化客户端：Respond 阶段按角色依次弹出预置结果；Analyze 阶段返回固定分析文本
#[derive(Debug)]
pub struct ScriptedLlmClient {
    scripts: Mutex<HashMap<Role, VecDeque<Result<String, LlmError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    analysis: String,
}

impl Default for ScriptedLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            analysis: "analysis".to_string(),
        }
    }

    /// 追加某角色的回复序列
    pub fn with_replies<I, S>(self, role: Role, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(role, replies.into_iter().map(|r| Ok(r.into())));
        self
    }

    /// 追加某角色的一次失败
    pub fn with_failure(self, role: Role, err: LlmError) -> Self {
        self.push(role, std::iter::once(Err(err)));
        self
    }

    fn push(&self, role: Role, items: impl Iterator<Item = Result<String, LlmError>>) {
        let mut scripts = self.scripts.lock().unwrap_or_else(|e| e.into_inner());
        scripts.entry(role).or_default().extend(items);
    }

    /// 已发生的调用（按时间顺序）
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// 某角色尚未消费的脚本条数
    pub fn remaining(&self, role: Role) -> usize {
        self.scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&role)
            .map_or(0, VecDeque::len)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, request: GenerationRequest<'_>) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                role: request.role,
                stage: request.stage,
                messages: request.messages.to_vec(),
                options: request.options.clone(),
            });

        if request.stage == Stage::Analyze {
            return Ok(self.analysis.clone());
        }

        self.scripts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&request.role)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(LlmError::Api(format!("script exhausted for {}", request.role))))
    }
}
