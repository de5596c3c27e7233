//! Shared entry point for the `research-article` and `single-agent-article` binaries.

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Arc,
};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    config::RunConfig,
    harness::{Harness, Outcome},
    pipeline::PipelineExecutor,
    providers::openai::OpenAICompatible,
    registry::Topology,
    retry::RetryPolicy,
    topic::Topic,
    LLMProvider,
};

#[derive(Debug, Parser)]
#[command(version, about = "Generate a blog article about a topic with LLM agents")]
pub struct Args {
    /// YAML file with backend and output settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Model name understood by the backend
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible chat completions API
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory the article is written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Retries per stage on transient backend failures
    #[arg(long)]
    pub retries: Option<u32>,

    /// Topic to write about; prompts interactively when omitted
    #[arg(long)]
    pub topic: Option<String>,
}

impl Args {
    pub fn apply(&self, mut config: RunConfig) -> RunConfig {
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(ref base_url) = self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(ref output_dir) = self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(retries) = self.retries {
            config.retry = RetryPolicy {
                max: retries,
                ..config.retry
            };
        }
        config
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

pub fn build_executor(config: &RunConfig, provider: Arc<dyn LLMProvider>) -> PipelineExecutor {
    let mut executor = PipelineExecutor::new(provider, config.model.clone())
        .with_stage_timeout(config.timeout())
        .with_retry(config.retry);
    if let Some(temperature) = config.temperature {
        executor = executor.with_temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        executor = executor.with_max_tokens(max_tokens);
    }
    executor
}

/// Parses arguments, wires the backend and runs one article generation.
///
/// Run failures are reported by the harness and still exit successfully;
/// only unusable configuration exits non-zero.
pub async fn main(topology: Topology) -> ExitCode {
    let args = Args::parse();
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match RunConfig::load(args.config.as_deref()) {
        Ok(config) => args.apply(config),
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    debug!(model = %config.model, base_url = %config.base_url, timeout_ms = config.timeout_ms, "configuration loaded");

    let provider = match OpenAICompatible::from_config(config.provider_config()) {
        Ok(provider) => provider,
        Err(err) => {
            eprintln!("Could not create completion client: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!(base_url = provider.base_url(), model = %config.model, mode = %topology, "backend ready");

    let executor = build_executor(&config, Arc::new(provider));
    let harness = Harness::new(topology, &executor, &config.output_dir);
    let preset = args.topic.as_deref().and_then(Topic::parse);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    match harness.run(preset, &mut stdin.lock(), &mut output).await {
        Ok(Outcome::NoTopic) => {
            let _ = writeln!(output);
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("console error: {err}");
            ExitCode::FAILURE
        }
    }
}
