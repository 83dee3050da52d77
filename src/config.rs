//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `COWORKER_BENCH__*` 覆盖
//! （双下划线表示嵌套，如 `COWORKER_BENCH__BENCH__RUNS=10`）。命令行参数最后覆盖（见 main.rs）。

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::agent::SupervisorMode;
use crate::core::{Outcome, Role};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub bench: BenchSection,
    pub llm: LlmSection,
    pub roles: RolesSection,
    pub missing_info: MissingInfoSection,
    pub output: OutputSection,
}

/// [bench] 段：运行次数、并发、回合上限、主管模式
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchSection {
    pub runs: usize,
    /// 批量运行的最大并发
    pub max_parallel: usize,
    /// 单次运行的全局回合上限
    pub max_turns: usize,
    /// 超过回合上限时的结果：moderate_failure / error
    pub turn_cap_outcome: Outcome,
    pub supervisor_mode: SupervisorMode,
}

impl Default for BenchSection {
    fn default() -> Self {
        Self {
            runs: 1,
            max_parallel: 4,
            max_turns: 50,
            turn_cap_outcome: Outcome::ModerateFailure,
            supervisor_mode: SupervisorMode::Direct,
        }
    }
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai / mock
    pub provider: String,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: None,
            request_timeout_secs: 60,
        }
    }
}

/// 单个角色的生成设置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoleSettings {
    pub model: String,
    pub temperature: f32,
    /// 是否在发言前先跑 Analyze 阶段；未设置时仅主角开启
    pub analyze: Option<bool>,
}

impl Default for RoleSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: 0.7,
            analyze: None,
        }
    }
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

/// [roles.*] 段
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RolesSection {
    pub protagonist: RoleSettings,
    pub coworker: RoleSettings,
    pub supervisor: RoleSettings,
}

impl RoleSettings {
    /// 主角输出结构化决策，默认先分析再发言
    pub fn analyze_for(&self, role: Role) -> bool {
        self.analyze.unwrap_or(role == Role::Protagonist)
    }
}

impl RolesSection {
    pub fn get(&self, role: Role) -> &RoleSettings {
        match role {
            Role::Protagonist => &self.protagonist,
            Role::Coworker => &self.coworker,
            Role::Supervisor => &self.supervisor,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut RoleSettings {
        match role {
            Role::Protagonist => &mut self.protagonist,
            Role::Coworker => &mut self.coworker,
            Role::Supervisor => &mut self.supervisor,
        }
    }
}

/// [missing_info] 段：外部 JSON 文件与次数上限覆盖
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct MissingInfoSection {
    pub file: Option<PathBuf>,
    pub max_attempts: Option<i64>,
}

/// [output] 段：transcript 与结果 JSON 路径
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub transcript_file: PathBuf,
    pub result_file: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            transcript_file: PathBuf::from("outputs/codex_memory.txt"),
            result_file: PathBuf::from("outputs/simulation_output.json"),
        }
    }
}

impl OutputSection {
    /// 裸文件名放到 outputs/ 下（该目录通常被 git 忽略）
    pub fn resolved(&self) -> Self {
        Self {
            transcript_file: under_outputs(&self.transcript_file),
            result_file: under_outputs(&self.result_file),
        }
    }
}

fn under_outputs(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => path.to_path_buf(),
        _ => Path::new("outputs").join(path),
    }
}

/// 从 config 目录加载配置，环境变量 COWORKER_BENCH__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path，则追加该文件（必须存在，可覆盖前面的键）
/// 3. 最后叠加环境变量（双下划线表示嵌套键）
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("COWORKER_BENCH")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.bench.runs, 1);
        assert_eq!(cfg.bench.max_turns, 50);
        assert_eq!(cfg.bench.supervisor_mode, SupervisorMode::Direct);
        assert!(cfg.roles.protagonist.analyze_for(Role::Protagonist));
        assert!(!cfg.roles.coworker.analyze_for(Role::Coworker));
        assert_eq!(cfg.roles.get(Role::Supervisor).model, "gpt-4.1-mini");
    }

    #[test]
    fn test_bare_filenames_redirected() {
        let out = OutputSection {
            transcript_file: "mem.txt".into(),
            result_file: "results/out.json".into(),
        }
        .resolved();
        assert_eq!(out.transcript_file, PathBuf::from("outputs/mem.txt"));
        assert_eq!(out.result_file, PathBuf::from("results/out.json"));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            f,
            r#"
[bench]
runs = 5
supervisor_mode = "escalating"
turn_cap_outcome = "error"

[roles.coworker]
model = "small-model"
temperature = 0.2

[missing_info]
max_attempts = 2
"#
        )
        .unwrap();
        let cfg = load_config(Some(f.path())).unwrap();
        assert_eq!(cfg.bench.runs, 5);
        assert_eq!(cfg.bench.supervisor_mode, SupervisorMode::Escalating);
        assert_eq!(cfg.bench.turn_cap_outcome, Outcome::Error);
        assert_eq!(cfg.roles.coworker.model, "small-model");
        assert!(cfg.roles.protagonist.analyze_for(Role::Protagonist));
        assert_eq!(cfg.missing_info.max_attempts, Some(2));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(load_config(Some(Path::new("/nonexistent/bench.toml"))).is_err());
    }
}
