//! 基准构建器：从配置一次性构建 LLM 后端、三个角色代理与批量运行器
//!
//! 构建出的 Cast / MissingInfo 通过 Arc 只读共享给所有运行，没有进程级可变状态。

use std::sync::Arc;

use crate::agent::{system_prompt, AgentProxy, Pipeline};
use crate::config::AppConfig;
use crate::core::batch::{BatchRunner, OutputPaths};
use crate::core::orchestrator::{Cast, TurnLimits};
use crate::core::run::RunOrchestrator;
use crate::core::{load_roles, ConfigError, MissingInfo, MissingInfoSource, Outcome, Role};
use crate::llm::{GenerationOptions, LlmClient, MockLlmClient, OpenAiClient};

/// 根据配置选择 LLM 后端（OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Result<Arc<dyn LlmClient>, ConfigError> {
    match cfg.llm.provider.to_lowercase().as_str() {
        "openai" => {
            let api_key =
                std::env::var("OPENAI_API_KEY").map_err(|_| ConfigError::MissingApiKey {
                    provider: cfg.llm.provider.clone(),
                    var: "OPENAI_API_KEY",
                })?;
            tracing::info!(
                base_url = cfg.llm.base_url.as_deref().unwrap_or("default"),
                "Using OpenAI-compatible LLM"
            );
            Ok(Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &api_key,
                cfg.llm.request_timeout_secs,
            )))
        }
        "mock" => {
            tracing::warn!("Using Mock LLM, results are not a real benchmark");
            Ok(Arc::new(MockLlmClient))
        }
        other => Err(ConfigError::InvalidSetting {
            key: "llm.provider",
            reason: format!("unknown provider '{other}' (expected openai or mock)"),
        }),
    }
}

/// 缺失信息：外部文件或内置默认值，再应用次数上限覆盖并校验
pub fn load_missing_info(cfg: &AppConfig) -> Result<MissingInfo, ConfigError> {
    let source = match &cfg.missing_info.file {
        Some(path) => MissingInfoSource::from_file(path)?,
        None => MissingInfoSource::default(),
    };
    source
        .with_max_attempts(cfg.missing_info.max_attempts)
        .validate()
}

/// 三个角色代理共用一个 LLM 后端，各自的模型、温度与阶段流水线来自配置
pub fn build_cast(
    cfg: &AppConfig,
    info: &MissingInfo,
    llm: Arc<dyn LlmClient>,
) -> Result<Cast, ConfigError> {
    let roles = load_roles()?;
    let mode = cfg.bench.supervisor_mode;
    let proxy = |role: Role| {
        let settings = cfg.roles.get(role);
        AgentProxy::new(
            role,
            Arc::clone(&llm),
            system_prompt(role, roles.get(role), info, mode),
            GenerationOptions::new(settings.model.clone(), settings.temperature),
            Pipeline::from_analyze(settings.analyze_for(role)),
        )
    };
    Ok(Cast {
        protagonist: proxy(Role::Protagonist),
        coworker: proxy(Role::Coworker),
        supervisor: proxy(Role::Supervisor),
        supervisor_mode: mode,
    })
}

/// 批次设置校验：只接受 Outcome::ModerateFailure / Error 作为回合上限结果
pub fn turn_limits(cfg: &AppConfig) -> Result<TurnLimits, ConfigError> {
    if cfg.bench.max_turns == 0 {
        return Err(ConfigError::InvalidSetting {
            key: "bench.max_turns",
            reason: "must be at least 1".to_string(),
        });
    }
    if cfg.bench.turn_cap_outcome == Outcome::StrongSuccess {
        return Err(ConfigError::InvalidSetting {
            key: "bench.turn_cap_outcome",
            reason: "must be moderate_failure or error".to_string(),
        });
    }
    Ok(TurnLimits {
        max_turns: cfg.bench.max_turns,
        cap_outcome: cfg.bench.turn_cap_outcome,
    })
}

/// 构建好的基准：批量运行器与输出路径
pub struct Bench {
    pub runner: BatchRunner,
    pub output: OutputPaths,
    pub runs: usize,
}

impl Bench {
    pub fn from_config(cfg: &AppConfig, llm: Arc<dyn LlmClient>) -> Result<Self, ConfigError> {
        if cfg.bench.runs == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "bench.runs",
                reason: "must be at least 1".to_string(),
            });
        }
        let info = load_missing_info(cfg)?;
        let limits = turn_limits(cfg)?;
        let cast = build_cast(cfg, &info, llm)?;

        let output = cfg.output.resolved();
        for path in [&output.transcript_file, &output.result_file] {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|source| ConfigError::OutputDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }

        let run = RunOrchestrator::new(Arc::new(cast), Arc::new(info), limits);
        Ok(Self {
            runner: BatchRunner::new(Arc::new(run), cfg.bench.max_parallel),
            output: OutputPaths {
                transcript_file: output.transcript_file,
                result_file: output.result_file,
            },
            runs: cfg.bench.runs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Pipeline, SupervisorMode};

    #[test]
    fn test_build_cast_uses_role_settings() {
        let mut cfg = AppConfig::default();
        cfg.roles.coworker.model = "cw-model".into();
        cfg.roles.supervisor.analyze = Some(true);
        cfg.bench.supervisor_mode = SupervisorMode::Escalating;
        let info = MissingInfo::new("d", "secret", 2).unwrap();
        let cast = build_cast(&cfg, &info, Arc::new(MockLlmClient)).unwrap();

        assert_eq!(cast.protagonist.pipeline(), Pipeline::AnalyzeThenRespond);
        assert_eq!(cast.coworker.pipeline(), Pipeline::Respond);
        assert_eq!(cast.supervisor.pipeline(), Pipeline::AnalyzeThenRespond);
        assert!(cast.coworker.system_prompt().contains("secret"));
        assert!(cast.supervisor.system_prompt().contains("\"protagonist\""));
        assert_eq!(cast.supervisor_mode, SupervisorMode::Escalating);
    }

    #[test]
    fn test_missing_info_override() {
        let mut cfg = AppConfig::default();
        cfg.missing_info.max_attempts = Some(7);
        assert_eq!(load_missing_info(&cfg).unwrap().max_attempts(), 7);
        cfg.missing_info.max_attempts = Some(0);
        assert!(matches!(
            load_missing_info(&cfg),
            Err(ConfigError::InvalidMaxAttempts(0))
        ));
    }

    #[test]
    fn test_invalid_limits() {
        let mut cfg = AppConfig::default();
        cfg.bench.turn_cap_outcome = Outcome::StrongSuccess;
        assert!(turn_limits(&cfg).is_err());
        cfg.bench.turn_cap_outcome = Outcome::Error;
        cfg.bench.max_turns = 0;
        assert!(turn_limits(&cfg).is_err());
    }

    #[test]
    fn test_unknown_provider() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "carrier-pigeon".into();
        assert!(matches!(
            create_llm_from_config(&cfg),
            Err(ConfigError::InvalidSetting { key: "llm.provider", .. })
        ));
        cfg.llm.provider = "mock".into();
        assert!(create_llm_from_config(&cfg).is_ok());
    }
}
