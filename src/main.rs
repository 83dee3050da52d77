//! Coworker Bench 命令行入口
//!
//! 加载配置，应用命令行覆盖，构建三个角色代理并执行批量运行。
//! 只有启动阶段的错误（配置、缺失信息文件、输出路径）返回非零退出码；
//! 运行结果是 moderate_failure 或 error 属于基准结论，进程仍正常退出。

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use coworker_bench::agent::SupervisorMode;
use coworker_bench::config::{load_config, AppConfig};
use coworker_bench::core::{create_llm_from_config, summarize, Bench, Outcome, Role};
use coworker_bench::observability;

#[derive(Parser, Debug)]
#[command(name = "coworker-bench")]
#[command(version, about = "Difficult coworker benchmark simulation")]
struct Cli {
    /// Extra TOML configuration file (applied over config/default.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    /// Number of simulation runs to execute
    #[arg(long)]
    runs: Option<usize>,

    /// Maximum runs executing concurrently
    #[arg(long)]
    max_parallel: Option<usize>,

    /// Global cap on turns within one run
    #[arg(long)]
    max_turns: Option<usize>,

    /// How the supervisor replies: direct or escalating
    #[arg(long)]
    supervisor_mode: Option<SupervisorMode>,

    /// LLM backend: openai or mock
    #[arg(long)]
    provider: Option<String>,

    #[arg(long)]
    protagonist_model: Option<String>,

    #[arg(long)]
    coworker_model: Option<String>,

    #[arg(long)]
    supervisor_model: Option<String>,

    #[arg(long)]
    protagonist_temperature: Option<f32>,

    #[arg(long)]
    coworker_temperature: Option<f32>,

    #[arg(long)]
    supervisor_temperature: Option<f32>,

    /// Path to JSON file containing the missing info payload
    #[arg(long)]
    missing_info_file: Option<PathBuf>,

    /// Override max coworker attempts in the missing info
    #[arg(long, allow_negative_numbers = true)]
    max_attempts: Option<i64>,

    /// Path for the transcript log
    #[arg(long)]
    memory_file: Option<PathBuf>,

    /// Path for the result JSON
    #[arg(long)]
    output_file: Option<PathBuf>,
}

impl Cli {
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(runs) = self.runs {
            cfg.bench.runs = runs;
        }
        if let Some(n) = self.max_parallel {
            cfg.bench.max_parallel = n;
        }
        if let Some(n) = self.max_turns {
            cfg.bench.max_turns = n;
        }
        if let Some(mode) = self.supervisor_mode {
            cfg.bench.supervisor_mode = mode;
        }
        if let Some(provider) = self.provider {
            cfg.llm.provider = provider;
        }
        for (role, model, temperature) in [
            (
                Role::Protagonist,
                self.protagonist_model,
                self.protagonist_temperature,
            ),
            (Role::Coworker, self.coworker_model, self.coworker_temperature),
            (
                Role::Supervisor,
                self.supervisor_model,
                self.supervisor_temperature,
            ),
        ] {
            let settings = cfg.roles.get_mut(role);
            if let Some(model) = model {
                settings.model = model;
            }
            if let Some(t) = temperature {
                settings.temperature = t;
            }
        }
        if let Some(path) = self.missing_info_file {
            cfg.missing_info.file = Some(path);
        }
        if let Some(n) = self.max_attempts {
            cfg.missing_info.max_attempts = Some(n);
        }
        if let Some(path) = self.memory_file {
            cfg.output.transcript_file = path;
        }
        if let Some(path) = self.output_file {
            cfg.output.result_file = path;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    observability::init(cli.verbose);

    let mut cfg = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut cfg);

    let llm = create_llm_from_config(&cfg).context("Failed to create LLM client")?;
    let bench = Bench::from_config(&cfg, llm).context("Invalid benchmark setup")?;

    tracing::info!(
        runs = bench.runs,
        supervisor_mode = ?cfg.bench.supervisor_mode,
        "=== Starting coworker benchmark ==="
    );
    let results = bench.runner.run(bench.runs, &bench.output).await;

    let counts = summarize(&results);
    for outcome in [Outcome::StrongSuccess, Outcome::ModerateFailure, Outcome::Error] {
        println!(
            "{:<17} {}",
            outcome.as_str(),
            counts.get(&outcome).copied().unwrap_or(0)
        );
    }

    Ok(())
}
