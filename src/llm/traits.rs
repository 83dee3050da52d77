//! LLM 客户端抽象
//!
//! 编排核心只依赖 LlmClient：给定角色、阶段、消息（system prompt 在首位）与生成参数，返回文本。
//! 后端拒绝某个生成参数时返回 UnsupportedOption，由调用方去掉该参数重试一次。

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::Stage;
use crate::core::Role;

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// 发给 LLM 的单条消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

/// 可协商移除的生成参数
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GenerationOption {
    Temperature,
}

impl GenerationOption {
    pub fn name(self) -> &'static str {
        match self {
            GenerationOption::Temperature => "temperature",
        }
    }

    /// 后端错误中的参数名（如 OpenAI 错误体的 `param` 字段）
    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "temperature" => Some(GenerationOption::Temperature),
            _ => None,
        }
    }
}

impl fmt::Display for GenerationOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 每个角色的生成参数：模型与采样温度
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: Option<f32>,
}

impl GenerationOptions {
    pub fn new(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature: Some(temperature),
        }
    }

    /// 去掉某个参数；该参数本就未设置时返回 None（无可协商）
    pub fn without(&self, option: GenerationOption) -> Option<Self> {
        match option {
            GenerationOption::Temperature => self.temperature.map(|_| Self {
                model: self.model.clone(),
                temperature: None,
            }),
        }
    }
}

/// 一次生成请求
#[derive(Clone, Copy, Debug)]
pub struct GenerationRequest<'a> {
    pub role: Role,
    pub stage: Stage,
    pub messages: &'a [ChatMessage],
    pub options: &'a GenerationOptions,
}

/// LLM 调用错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Unsupported generation option: {option}")]
    UnsupportedOption { option: GenerationOption },
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: GenerationRequest<'_>) -> Result<String, LlmError>;
}
