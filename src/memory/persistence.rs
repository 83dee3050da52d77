//! 结果持久化
//!
//! 单次运行结果写为一个 JSON 对象；批量运行时另写一个 JSON 数组汇总。

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::RunResult;

/// JSON 结果文件写入端
#[derive(Debug, Clone)]
pub struct ResultWriter {
    path: PathBuf,
}

impl ResultWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写单次运行结果 {run, outcome, conversation}
    pub async fn save_run(&self, result: &RunResult) -> anyhow::Result<()> {
        self.save(result).await
    }

    /// 写批次汇总数组
    pub async fn save_aggregate(&self, results: &[RunResult]) -> anyhow::Result<()> {
        self.save(results).await
    }

    /// 父目录不存在时自动创建，整体覆盖写入
    async fn save<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, serde_json::to_string_pretty(value)?).await?;
        Ok(())
    }
}
