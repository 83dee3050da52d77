//! 核心编排层：角色目录、缺失信息、错误、回合状态机、单次运行、批量运行

pub mod batch;
pub mod builder;
pub mod error;
pub mod missing_info;
pub mod orchestrator;
pub mod roles;
pub mod run;
pub mod state;

pub use batch::{summarize, BatchRunner, OutputPaths};
pub use builder::{create_llm_from_config, Bench};
pub use error::{AgentError, ConfigError};
pub use missing_info::{MissingInfo, MissingInfoSource};
pub use orchestrator::{Cast, Turn, TurnLimits, TurnOrchestrator, Utterance};
pub use roles::{load_roles, Role, RoleProfile, RoleRegistry};
pub use run::{RunOrchestrator, RunPaths};
pub use state::{Outcome, RunResult, TurnState};
