//! 角色代理层：system prompt、分阶段生成、路由决策解析

pub mod decision;
pub mod prompts;
pub mod proxy;

pub use decision::{parse_decision, RoutingDecision};
pub use prompts::{system_prompt, SupervisorMode};
pub use proxy::AgentProxy;

/// 生成阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 分析最新收到的消息（自由文本，不进入对话）
    Analyze,
    /// 产出真正的发言
    Respond,
}

/// 每个角色的阶段流水线：零或一个 Analyze，恰好一个 Respond
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Pipeline {
    #[default]
    Respond,
    AnalyzeThenRespond,
}

impl Pipeline {
    pub fn from_analyze(analyze: bool) -> Self {
        if analyze {
            Pipeline::AnalyzeThenRespond
        } else {
            Pipeline::Respond
        }
    }

    pub fn stages(self) -> &'static [Stage] {
        match self {
            Pipeline::Respond => &[Stage::Respond],
            Pipeline::AnalyzeThenRespond => &[Stage::Analyze, Stage::Respond],
        }
    }
}
