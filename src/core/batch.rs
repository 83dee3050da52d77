//! 批量运行：N 次相互独立的运行，Semaphore 限制并发
//!
//! 结果按运行序号（1..=N）返回，与完成顺序无关。单个运行失败（包括任务 panic）不影响其他运行。
//! N > 1 时每次运行的文件名插入 `_run{i}`，并把全部结果汇总写到配置的结果路径。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::core::run::{RunOrchestrator, RunPaths};
use crate::core::{Outcome, RunResult};
use crate::memory::{Conversation, ResultWriter};

/// 批次的输出根路径
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub transcript_file: PathBuf,
    pub result_file: PathBuf,
}

impl OutputPaths {
    /// 第 `run` 次运行的路径；单次运行直接使用根路径
    pub fn for_run(&self, run: usize, runs: usize) -> RunPaths {
        if runs > 1 {
            RunPaths {
                transcript: with_run_suffix(&self.transcript_file, run),
                result: with_run_suffix(&self.result_file, run),
            }
        } else {
            RunPaths {
                transcript: self.transcript_file.clone(),
                result: self.result_file.clone(),
            }
        }
    }
}

/// `outputs/sim.json` → `outputs/sim_run3.json`
fn with_run_suffix(path: &Path, run: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_run{}.{}", stem, run, ext.to_string_lossy()),
        None => format!("{}_run{}", stem, run),
    };
    path.with_file_name(name)
}

pub struct BatchRunner {
    runner: Arc<RunOrchestrator>,
    max_parallel: usize,
}

impl BatchRunner {
    pub fn new(runner: Arc<RunOrchestrator>, max_parallel: usize) -> Self {
        Self {
            runner,
            max_parallel: max_parallel.max(1),
        }
    }

    pub async fn run(&self, runs: usize, output: &OutputPaths) -> Vec<RunResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));

        let handles: Vec<_> = (1..=runs)
            .map(|run| {
                let runner = Arc::clone(&self.runner);
                let semaphore = Arc::clone(&semaphore);
                let paths = output.for_run(run, runs);
                tokio::spawn(async move {
                    // Semaphore 不会被关闭；拿不到许可时仍照常运行
                    let _permit = semaphore.acquire_owned().await.ok();
                    runner.run_once(run, &paths).await
                })
            })
            .collect();

        // 每个序号一个槽位，按序号顺序收集
        let mut results = Vec::with_capacity(runs);
        for (idx, handle) in handles.into_iter().enumerate() {
            let run = idx + 1;
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!(run, "Run task failed: {}", e);
                    results.push(RunResult {
                        run,
                        outcome: Outcome::Error,
                        conversation: Conversation::new(),
                    });
                }
            }
        }

        if runs > 1 {
            let writer = ResultWriter::new(&output.result_file);
            match writer.save_aggregate(&results).await {
                Ok(()) => tracing::info!(
                    "Aggregated results written to {}",
                    output.result_file.display()
                ),
                Err(e) => tracing::error!(
                    "Failed to write aggregate '{}': {}",
                    output.result_file.display(),
                    e
                ),
            }
        }

        let summary = summarize(&results);
        tracing::info!(
            runs,
            strong_success = summary.get(&Outcome::StrongSuccess).copied().unwrap_or(0),
            moderate_failure = summary.get(&Outcome::ModerateFailure).copied().unwrap_or(0),
            error = summary.get(&Outcome::Error).copied().unwrap_or(0),
            "Batch complete"
        );
        results
    }
}

/// 各结果的计数
pub fn summarize(results: &[RunResult]) -> HashMap<Outcome, usize> {
    let mut counts = HashMap::new();
    for r in results {
        *counts.entry(r.outcome).or_insert(0) += 1;
    }
    counts
}
