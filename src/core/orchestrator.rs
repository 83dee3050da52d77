//! 回合编排器：单次运行的状态机
//!
//! ProtagonistTurn → (CoworkerTurn | SupervisorTurn) → ... → Terminal(outcome)。
//! 只有「主角找同事」计入尝试次数；所有回合另受全局回合上限约束，保证主管与同事之间的往返也会终止。
//! 运行级错误（生成失败、解析失败、未知收件人）都在这里转换为终局结果，不向外传播。

use crate::agent::{parse_decision, AgentProxy, SupervisorMode};
use crate::core::{AgentError, MissingInfo, Outcome, Role, TurnState};
use crate::memory::{Conversation, Message};

/// 三个角色的代理
pub struct Cast {
    pub protagonist: AgentProxy,
    pub coworker: AgentProxy,
    pub supervisor: AgentProxy,
    pub supervisor_mode: SupervisorMode,
}

/// 全局回合上限及超限时的结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnLimits {
    pub max_turns: usize,
    pub cap_outcome: Outcome,
}

impl Default for TurnLimits {
    fn default() -> Self {
        Self {
            max_turns: 50,
            cap_outcome: Outcome::ModerateFailure,
        }
    }
}

impl TurnLimits {
    /// 尝试次数上限优先：主角与同事之间最多 2N+1 个回合，上限不会把它截短
    pub fn effective_max_turns(&self, max_attempts: u32) -> usize {
        self.max_turns.max(2 * max_attempts as usize + 1)
    }
}

/// 一个回合追加的发言
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Utterance {
    /// 带收件人的路由发言；recipient 为原始文本
    Routed { recipient: String, message: String },
    /// 自由文本（回复，或解析失败的原始输出）
    Free(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Role,
    pub utterance: Utterance,
}

impl Turn {
    fn routed(speaker: Role, recipient: String, message: String) -> Self {
        Self {
            speaker,
            utterance: Utterance::Routed { recipient, message },
        }
    }

    fn free(speaker: Role, text: String) -> Self {
        Self {
            speaker,
            utterance: Utterance::Free(text),
        }
    }

    pub fn to_message(&self) -> Message {
        match &self.utterance {
            Utterance::Routed { recipient, message } => {
                Message::addressed(self.speaker, recipient, message)
            }
            Utterance::Free(text) => Message::reply(self.speaker, text.clone()),
        }
    }
}

pub struct TurnOrchestrator<'a> {
    cast: &'a Cast,
    info: &'a MissingInfo,
    max_turns: usize,
    cap_outcome: Outcome,
    state: TurnState,
    attempts: u32,
    turns: usize,
    conversation: Conversation,
}

impl<'a> TurnOrchestrator<'a> {
    pub fn new(cast: &'a Cast, info: &'a MissingInfo, limits: TurnLimits) -> Self {
        Self {
            cast,
            info,
            max_turns: limits.effective_max_turns(info.max_attempts()),
            cap_outcome: limits.cap_outcome,
            state: TurnState::ProtagonistTurn,
            attempts: 0,
            turns: 0,
            conversation: Conversation::new(),
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn into_conversation(self) -> Conversation {
        self.conversation
    }

    /// 终局结果；未到终局时为 None
    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            TurnState::Terminal(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// 执行一个回合，返回追加到对话的发言（生成失败或已终局时为 None）
    pub async fn step(&mut self) -> Option<Turn> {
        if self.state.is_terminal() {
            return None;
        }
        if self.turns >= self.max_turns {
            tracing::warn!(
                max_turns = self.max_turns,
                outcome = %self.cap_outcome,
                "Reached maximum turns"
            );
            self.state = TurnState::Terminal(self.cap_outcome);
            return None;
        }
        self.turns += 1;

        let state = self.state;
        let (turn, next) = match state {
            TurnState::ProtagonistTurn => self.protagonist_turn().await,
            TurnState::CoworkerTurn => self.coworker_turn().await,
            TurnState::SupervisorTurn => self.supervisor_turn().await,
            TurnState::Terminal(_) => return None,
        };

        if let Some(turn) = &turn {
            self.conversation.push(turn.to_message());
        }
        self.state = next;
        turn
    }

    async fn protagonist_turn(&mut self) -> (Option<Turn>, TurnState) {
        let raw = match self.cast.protagonist.respond(&self.conversation).await {
            Ok(raw) => raw,
            Err(e) => return (None, fail(e)),
        };

        let decision = match parse_decision(&raw) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Failed to parse protagonist response: {}", e);
                return (Some(Turn::free(Role::Protagonist, raw)), fail(e));
            }
        };

        let next = match Role::from_key(&decision.recipient) {
            Some(Role::Coworker) => {
                self.attempts += 1;
                if self.attempts > self.info.max_attempts() {
                    tracing::info!(attempts = self.attempts, "Reached maximum coworker attempts");
                    TurnState::Terminal(Outcome::ModerateFailure)
                } else {
                    TurnState::CoworkerTurn
                }
            }
            Some(Role::Supervisor) => TurnState::SupervisorTurn,
            Some(Role::Protagonist) | None => {
                fail(AgentError::UnknownRecipient(decision.recipient.clone()))
            }
        };

        let turn = Turn::routed(Role::Protagonist, decision.recipient, decision.message);
        (Some(turn), next)
    }

    async fn coworker_turn(&mut self) -> (Option<Turn>, TurnState) {
        match self.cast.coworker.respond(&self.conversation).await {
            Ok(reply) => (
                Some(Turn::free(Role::Coworker, reply)),
                TurnState::ProtagonistTurn,
            ),
            Err(e) => (None, fail(e)),
        }
    }

    async fn supervisor_turn(&mut self) -> (Option<Turn>, TurnState) {
        let raw = match self.cast.supervisor.respond(&self.conversation).await {
            Ok(raw) => raw,
            Err(e) => return (None, fail(e)),
        };

        let success = TurnState::Terminal(Outcome::StrongSuccess);
        match self.cast.supervisor_mode {
            SupervisorMode::Direct => (Some(Turn::free(Role::Supervisor, raw)), success),
            SupervisorMode::Escalating => match parse_decision(&raw) {
                // 非结构化输出视为直接回复主角
                Err(_) => (Some(Turn::free(Role::Supervisor, raw)), success),
                Ok(decision) => {
                    let next = match Role::from_key(&decision.recipient) {
                        // 结构化回复主角：交还主角继续对话
                        Some(Role::Protagonist) => TurnState::ProtagonistTurn,
                        Some(Role::Coworker) => TurnState::CoworkerTurn,
                        Some(Role::Supervisor) | None => {
                            fail(AgentError::UnknownRecipient(decision.recipient.clone()))
                        }
                    };
                    let turn = Turn::routed(Role::Supervisor, decision.recipient, decision.message);
                    (Some(turn), next)
                }
            },
        }
    }
}

/// 运行级错误 → 终局
fn fail(err: AgentError) -> TurnState {
    let outcome = err.outcome();
    match outcome {
        Outcome::Error => tracing::error!("{}", err),
        _ => tracing::warn!("{}", err),
    }
    TurnState::Terminal(outcome)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::agent::Pipeline;
    use crate::llm::{GenerationOptions, LlmError, ScriptedLlmClient};

    fn cast(llm: Arc<ScriptedLlmClient>, mode: SupervisorMode) -> Cast {
        let make = |role| {
            AgentProxy::new(
                role,
                llm.clone(),
                "system",
                GenerationOptions::new("m", 0.0),
                Pipeline::Respond,
            )
        };
        Cast {
            protagonist: make(Role::Protagonist),
            coworker: make(Role::Coworker),
            supervisor: make(Role::Supervisor),
            supervisor_mode: mode,
        }
    }

    fn to(recipient: &str, message: &str) -> String {
        serde_json::json!({ "recipient": recipient, "message": message }).to_string()
    }

    async fn drive(orch: &mut TurnOrchestrator<'_>) -> Vec<Turn> {
        let mut turns = Vec::new();
        while !orch.state().is_terminal() {
            let before = orch.conversation().len();
            if let Some(turn) = orch.step().await {
                turns.push(turn);
                assert_eq!(orch.conversation().len(), before + 1);
            } else {
                assert_eq!(orch.conversation().len(), before);
            }
        }
        turns
    }

    #[tokio::test]
    async fn test_attempts_exhausted() {
        for n in 1..=4u32 {
            let llm = Arc::new(
                ScriptedLlmClient::new()
                    .with_replies(Role::Protagonist, vec![to("coworker", "ask"); n as usize + 1])
                    .with_replies(Role::Coworker, vec!["deflect"; n as usize]),
            );
            let cast = cast(llm, SupervisorMode::Direct);
            let info = MissingInfo::new("d", "c", n as i64).unwrap();
            let mut orch = TurnOrchestrator::new(&cast, &info, TurnLimits::default());
            let turns = drive(&mut orch).await;

            let protagonist_turns = turns.iter().filter(|t| t.speaker == Role::Protagonist).count();
            assert_eq!(protagonist_turns, n as usize + 1);
            assert_eq!(orch.attempts(), n + 1);
            assert_eq!(orch.outcome(), Some(Outcome::ModerateFailure));
        }
    }

    #[tokio::test]
    async fn test_escalation_to_supervisor_succeeds() {
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .with_replies(Role::Protagonist, [to("Supervisor", "please")])
                .with_replies(Role::Supervisor, ["host: localhost"]),
        );
        let cast = cast(llm, SupervisorMode::Direct);
        let info = MissingInfo::new("d", "c", 3).unwrap();
        let mut orch = TurnOrchestrator::new(&cast, &info, TurnLimits::default());
        drive(&mut orch).await;

        assert_eq!(orch.outcome(), Some(Outcome::StrongSuccess));
        assert_eq!(orch.attempts(), 0);
        let msgs = orch.conversation().messages();
        assert_eq!(msgs[0].content, "[to supervisor] please");
        assert_eq!(msgs[1].content, "host: localhost");
    }

    #[tokio::test]
    async fn test_generation_failure_is_error() {
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .with_replies(Role::Protagonist, [to("coworker", "ask")])
                .with_failure(Role::Coworker, LlmError::Timeout(60)),
        );
        let cast = cast(llm, SupervisorMode::Direct);
        let info = MissingInfo::new("d", "c", 3).unwrap();
        let mut orch = TurnOrchestrator::new(&cast, &info, TurnLimits::default());
        drive(&mut orch).await;

        assert_eq!(orch.outcome(), Some(Outcome::Error));
        assert_eq!(orch.conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_protagonist_addressing_itself_is_routing_failure() {
        let llm = Arc::new(
            ScriptedLlmClient::new().with_replies(Role::Protagonist, [to("protagonist", "hm")]),
        );
        let cast = cast(llm, SupervisorMode::Direct);
        let info = MissingInfo::new("d", "c", 3).unwrap();
        let mut orch = TurnOrchestrator::new(&cast, &info, TurnLimits::default());
        drive(&mut orch).await;
        assert_eq!(orch.outcome(), Some(Outcome::ModerateFailure));
        assert_eq!(orch.conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_escalating_supervisor_loop_hits_cap() {
        // 主管永远转给同事、主角永远找主管：只有回合上限能终止
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .with_replies(Role::Protagonist, vec![to("supervisor", "help"); 20])
                .with_replies(Role::Supervisor, vec![to("coworker", "handle it"); 20])
                .with_replies(Role::Coworker, vec!["later"; 20]),
        );
        let cast = cast(llm, SupervisorMode::Escalating);
        let info = MissingInfo::new("d", "c", 1).unwrap();
        let limits = TurnLimits {
            max_turns: 7,
            cap_outcome: Outcome::Error,
        };
        let mut orch = TurnOrchestrator::new(&cast, &info, limits);
        drive(&mut orch).await;

        assert_eq!(orch.outcome(), Some(Outcome::Error));
        assert_eq!(orch.conversation().len(), 7);
    }

    #[tokio::test]
    async fn test_escalating_supervisor_reply_returns_to_protagonist() {
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .with_replies(
                    Role::Protagonist,
                    [to("supervisor", "help"), to("invalid", "oops")],
                )
                .with_replies(Role::Supervisor, [to("protagonist", "here")]),
        );
        let cast = cast(llm, SupervisorMode::Escalating);
        let info = MissingInfo::new("d", "c", 1).unwrap();
        let mut orch = TurnOrchestrator::new(&cast, &info, TurnLimits::default());
        let turns = drive(&mut orch).await;

        assert_eq!(orch.outcome(), Some(Outcome::ModerateFailure));
        assert_eq!(orch.attempts(), 0);
        assert_eq!(turns.len(), 3);
        assert_eq!(
            turns[1].utterance,
            Utterance::Routed {
                recipient: "protagonist".into(),
                message: "here".into()
            }
        );
        assert_eq!(turns[2].speaker, Role::Protagonist);
    }

    #[tokio::test]
    async fn test_escalating_supervisor_free_text_succeeds() {
        let llm = Arc::new(
            ScriptedLlmClient::new()
                .with_replies(Role::Protagonist, [to("supervisor", "help")])
                .with_replies(Role::Supervisor, ["Sure, the password is s3cr3t."]),
        );
        let cast = cast(llm, SupervisorMode::Escalating);
        let info = MissingInfo::new("d", "c", 1).unwrap();
        let mut orch = TurnOrchestrator::new(&cast, &info, TurnLimits::default());
        drive(&mut orch).await;

        assert_eq!(orch.outcome(), Some(Outcome::StrongSuccess));
        assert_eq!(orch.conversation().len(), 2);
    }

    #[test]
    fn test_effective_cap_never_cuts_attempts() {
        let limits = TurnLimits {
            max_turns: 3,
            cap_outcome: Outcome::ModerateFailure,
        };
        assert_eq!(limits.effective_max_turns(1), 3);
        assert_eq!(limits.effective_max_turns(5), 11);
    }
}
