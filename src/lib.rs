//! Coworker Bench - 三角色对话基准
//!
//! 主角需要拿到一份受保护的信息：先问不配合的同事，必要时升级找主管。
//! 本 crate 编排三者之间的回合、限制尝试次数、解析路由决策、判定结果并持久化记录。
//!
//! 模块划分：
//! - **agent**: 角色代理（system prompt、Analyze/Respond 阶段、路由决策解析）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 角色目录、缺失信息、回合状态机、单次与批量运行
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock / 脚本化）
//! - **memory**: 对话记录、transcript、结果 JSON
//! - **observability**: 日志初始化

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;

pub use crate::core::{Bench, Outcome, Role, RunResult};
