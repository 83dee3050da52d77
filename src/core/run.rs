//! 单次运行：驱动 TurnOrchestrator 到终局，边跑边写 transcript，结束后写结果 JSON
//!
//! 持久化失败只记日志，不改变运行结果。

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::orchestrator::{Cast, Turn, TurnLimits, TurnOrchestrator, Utterance};
use crate::core::{MissingInfo, Outcome, RunResult};
use crate::memory::{ResultWriter, Transcript};

/// 单次运行的输出位置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunPaths {
    pub transcript: PathBuf,
    pub result: PathBuf,
}

/// 运行编排器：多个运行共享同一组代理与缺失信息（只读）
pub struct RunOrchestrator {
    cast: Arc<Cast>,
    info: Arc<MissingInfo>,
    limits: TurnLimits,
}

impl RunOrchestrator {
    pub fn new(cast: Arc<Cast>, info: Arc<MissingInfo>, limits: TurnLimits) -> Self {
        Self { cast, info, limits }
    }

    pub fn missing_info(&self) -> &MissingInfo {
        &self.info
    }

    /// 执行第 `run` 次运行（从 1 开始）
    pub async fn run_once(&self, run: usize, paths: &RunPaths) -> RunResult {
        let transcript = match Transcript::open(&paths.transcript).await {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::error!(
                    run,
                    "Failed to open transcript '{}': {}",
                    paths.transcript.display(),
                    e
                );
                None
            }
        };

        let mut orch = TurnOrchestrator::new(&self.cast, &self.info, self.limits);
        while !orch.state().is_terminal() {
            if let Some(turn) = orch.step().await {
                if let Some(t) = &transcript {
                    if let Err(e) = write_turn(t, &turn).await {
                        tracing::error!(run, "Failed to append transcript: {}", e);
                    }
                }
            }
        }

        // 循环只在终局退出
        let outcome = orch.outcome().unwrap_or(Outcome::Error);
        let result = RunResult {
            run,
            outcome,
            conversation: orch.into_conversation(),
        };

        let writer = ResultWriter::new(&paths.result);
        match writer.save_run(&result).await {
            Ok(()) => tracing::info!(
                run,
                outcome = %outcome,
                "Run {} complete ({}). Output: {}",
                run,
                outcome,
                paths.result.display()
            ),
            Err(e) => tracing::error!(
                run,
                "Failed to write result '{}': {}",
                paths.result.display(),
                e
            ),
        }
        result
    }
}

async fn write_turn(transcript: &Transcript, turn: &Turn) -> std::io::Result<()> {
    match &turn.utterance {
        Utterance::Routed { recipient, message } => {
            transcript.routed(turn.speaker, recipient, message).await
        }
        Utterance::Free(text) => transcript.reply(turn.speaker, text).await,
    }
}
