//! 运行记录（transcript）
//!
//! 纯文本、追加写：每条消息在产生时立即写盘，运行中途崩溃也能保留部分记录。
//! 文件首次创建时写入两行表头。

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::core::Role;

pub const TRANSCRIPT_HEADER: &str =
    "# Coworker Bench Transcript\n# Interaction logs for the benchmark.\n";

/// 单次运行的 transcript 写入端
#[derive(Debug, Clone)]
pub struct Transcript {
    path: PathBuf,
}

impl Transcript {
    /// 确保文件存在：父目录不存在时创建，文件不存在时写表头；已存在则继续追加
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(TRANSCRIPT_HEADER.as_bytes()).await?;
                tracing::info!("Initialized transcript at '{}'", path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!("Transcript '{}' already exists, appending", path.display());
            }
            Err(e) => return Err(e),
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `[Protagonist -> coworker]: ...`
    pub async fn routed(&self, sender: Role, recipient: &str, text: &str) -> std::io::Result<()> {
        self.append(&routed_line(sender, recipient, text)).await
    }

    /// `[Coworker]: ...`
    pub async fn reply(&self, sender: Role, text: &str) -> std::io::Result<()> {
        self.append(&reply_line(sender, text)).await
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        tracing::info!("{}", line);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await
    }
}

fn display_name(role: Role) -> &'static str {
    match role {
        Role::Protagonist => "Protagonist",
        Role::Coworker => "Coworker",
        Role::Supervisor => "Supervisor",
    }
}

pub fn routed_line(sender: Role, recipient: &str, text: &str) -> String {
    format!("[{} -> {}]: {}", display_name(sender), recipient, text)
}

pub fn reply_line(sender: Role, text: &str) -> String {
    format!("[{}]: {}", display_name(sender), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_formats() {
        assert_eq!(
            routed_line(Role::Protagonist, "coworker", "hi"),
            "[Protagonist -> coworker]: hi"
        );
        assert_eq!(reply_line(Role::Supervisor, "sure"), "[Supervisor]: sure");
    }

    #[tokio::test]
    async fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.txt");

        let t = Transcript::open(&path).await.unwrap();
        t.routed(Role::Protagonist, "coworker", "ask").await.unwrap();
        t.reply(Role::Coworker, "no").await.unwrap();

        // 再次打开不重复写表头
        let t = Transcript::open(&path).await.unwrap();
        t.reply(Role::Coworker, "still no").await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            format!(
                "{}[Protagonist -> coworker]: ask\n[Coworker]: no\n[Coworker]: still no\n",
                TRANSCRIPT_HEADER
            )
        );
    }
}
