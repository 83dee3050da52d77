//! 状态定义：回合状态机的状态、终局结果、运行结果

use serde::{Deserialize, Serialize};

use crate::memory::Conversation;

/// 运行的终局分类，每次运行恰好赋值一次
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// 主管给出了信息
    StrongSuccess,
    /// 次数耗尽、解析失败、未知收件人或回合上限
    ModerateFailure,
    /// 生成调用失败
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::StrongSuccess => "strong_success",
            Outcome::ModerateFailure => "moderate_failure",
            Outcome::Error => "error",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 回合状态机；Terminal 为吸收态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    ProtagonistTurn,
    CoworkerTurn,
    SupervisorTurn,
    Terminal(Outcome),
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnState::Terminal(_))
    }
}

/// 单次运行结果：{run, outcome, conversation}，创建后不可变
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run: usize,
    pub outcome: Outcome,
    pub conversation: Conversation,
}
