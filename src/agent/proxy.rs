//! AgentProxy：绑定单一角色的 LLM 代理
//!
//! 每次发言时按该角色视角重建对话历史，拼上 system prompt 调用 LLM；
//! 可选先跑一次 Analyze（分析最新收到的消息），再由 Respond 阶段结合分析产出真正的发言。
//! 后端拒绝某个生成参数时去掉该参数重试一次。

use std::sync::Arc;

use crate::agent::prompts::{plan_instruction, ANALYZE_INSTRUCTION};
use crate::agent::{Pipeline, Stage};
use crate::core::{AgentError, Role};
use crate::llm::{ChatMessage, GenerationOptions, GenerationRequest, LlmClient, LlmError};
use crate::memory::Conversation;

pub struct AgentProxy {
    role: Role,
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    options: GenerationOptions,
    pipeline: Pipeline,
}

impl AgentProxy {
    pub fn new(
        role: Role,
        llm: Arc<dyn LlmClient>,
        system_prompt: impl Into<String>,
        options: GenerationOptions,
        pipeline: Pipeline,
    ) -> Self {
        Self {
            role,
            llm,
            system_prompt: system_prompt.into(),
            options,
            pipeline,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    /// 产出本角色的下一句发言（原始文本，结构化解析由编排器负责）
    pub async fn respond(&self, conversation: &Conversation) -> Result<String, AgentError> {
        let mut messages = vec![ChatMessage::system(self.system_prompt.clone())];
        messages.extend(conversation.view_for(self.role));

        let mut utterance = None;
        for stage in self.pipeline.stages() {
            match stage {
                // 还没有收到任何消息时没什么可分析
                Stage::Analyze if conversation.has_inbound_for(self.role) => {
                    let mut analyze = messages.clone();
                    analyze.push(ChatMessage::user(ANALYZE_INSTRUCTION));
                    let analysis = self.generate(Stage::Analyze, &analyze).await?;
                    tracing::debug!(role = %self.role, analysis = %analysis, "analysis");
                    messages.push(ChatMessage::user(plan_instruction(&analysis)));
                }
                Stage::Analyze => {}
                Stage::Respond => {
                    utterance = Some(self.generate(Stage::Respond, &messages).await?);
                }
            }
        }
        Ok(utterance.unwrap_or_default())
    }

    async fn generate(&self, stage: Stage, messages: &[ChatMessage]) -> Result<String, AgentError> {
        self.complete_negotiated(stage, messages)
            .await
            .map_err(|source| AgentError::Generation {
                role: self.role,
                source,
            })
    }

    /// 参数协商：UnsupportedOption 时去掉该参数只重试一次；其余错误直接返回
    async fn complete_negotiated(
        &self,
        stage: Stage,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let request = GenerationRequest {
            role: self.role,
            stage,
            messages,
            options: &self.options,
        };
        match self.llm.complete(request).await {
            Err(LlmError::UnsupportedOption { option }) => {
                let Some(fallback) = self.options.without(option) else {
                    return Err(LlmError::UnsupportedOption { option });
                };
                tracing::warn!(
                    role = %self.role,
                    option = %option,
                    model = %self.options.model,
                    "Backend rejected generation option, retrying without it"
                );
                self.llm
                    .complete(GenerationRequest {
                        options: &fallback,
                        ..request
                    })
                    .await
            }
            other => other,
        }
    }
}
