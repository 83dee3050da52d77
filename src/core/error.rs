//! 错误类型
//!
//! - ConfigError：运行前的致命错误（配置、缺失信息文件、输出路径），终止整个调用
//! - AgentError：单次运行内的错误，由 TurnOrchestrator 转换为 Outcome，不越过运行边界

use std::path::PathBuf;

use thiserror::Error;

use crate::core::{Outcome, Role};
use crate::llm::LlmError;

/// 启动阶段的致命错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing info file not found: {0}")]
    MissingInfoNotFound(PathBuf),

    #[error("Failed to read missing info file {path}: {source}")]
    MissingInfoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in missing info file {path}: {source}")]
    MissingInfoInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("max_attempts must be at least 1 (got {0})")]
    InvalidMaxAttempts(i64),

    #[error("Role {role} is missing a {field}")]
    InvalidRole { role: Role, field: &'static str },

    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("Provider '{provider}' requires environment variable {var}")]
    MissingApiKey { provider: String, var: &'static str },

    #[error("Output directory {path} is not writable: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 单次运行内的错误（运行级，不传播到批次）
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Error calling {role}: {source}")]
    Generation {
        role: Role,
        #[source]
        source: LlmError,
    },

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Unknown recipient: '{0}'")]
    UnknownRecipient(String),
}

impl AgentError {
    /// 运行级错误到终局结果的映射
    pub fn outcome(&self) -> Outcome {
        match self {
            AgentError::Generation { .. } => Outcome::Error,
            AgentError::JsonParseError(_) | AgentError::UnknownRecipient(_) => {
                Outcome::ModerateFailure
            }
        }
    }
}
