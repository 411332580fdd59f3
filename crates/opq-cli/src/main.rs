use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use opq_core::{
    CompletionProvider, Operation, OperationInput, OperationKind, Priority, ProgressStatus,
};
use opq_engine::OperationEngine;
use opq_providers::{AnthropicProvider, OpenAIProvider};

mod config;

use config::Config;

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    ContentAnalysis,
    RecommendationGeneration,
    Clustering,
    InsightSynthesis,
}

impl From<KindArg> for OperationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::ContentAnalysis => OperationKind::ContentAnalysis,
            KindArg::RecommendationGeneration => OperationKind::RecommendationGeneration,
            KindArg::Clustering => OperationKind::Clustering,
            KindArg::InsightSynthesis => OperationKind::InsightSynthesis,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PriorityArg {
    High,
    Normal,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(priority: PriorityArg) -> Self {
        match priority {
            PriorityArg::High => Priority::High,
            PriorityArg::Normal => Priority::Normal,
            PriorityArg::Low => Priority::Low,
        }
    }
}

#[derive(Parser)]
#[command(name = "opq")]
#[command(author, version, about = "opq: queue AI operations and poll their progress", long_about = None)]
struct Cli {
    /// Input text for the operation
    #[arg(short, long)]
    input: String,

    /// Operation kind
    #[arg(short, long, value_enum, default_value = "content-analysis")]
    kind: KindArg,

    /// Queue priority
    #[arg(short, long, value_enum, default_value = "normal")]
    priority: PriorityArg,

    /// Structured context as a JSON value
    #[arg(short, long)]
    context: Option<String>,

    /// Operation id (generated when omitted)
    #[arg(long)]
    id: Option<String>,

    /// Provider to use (overrides config default)
    #[arg(long)]
    provider: Option<String>,

    /// Model to use (overrides the provider's default)
    #[arg(short, long)]
    model: Option<String>,

    /// Print queue diagnostics after the operation finishes
    #[arg(long)]
    status: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

fn build_provider(
    config: &Config,
    name: &str,
    model_override: Option<&str>,
) -> Result<Arc<dyn CompletionProvider>> {
    let entry = config
        .providers
        .get(name)
        .with_context(|| format!("provider '{name}' is not defined in config"))?;
    let api_key = entry
        .api_key
        .clone()
        .or_else(|| std::env::var("OPQ_API_KEY").ok())
        .with_context(|| {
            format!("provider '{name}' has no api_key (set it in config or OPQ_API_KEY)")
        })?;
    let model = model_override
        .map(str::to_string)
        .or_else(|| entry.default_model.clone());
    debug!("using provider '{name}'");

    let provider: Arc<dyn CompletionProvider> = match name {
        "anthropic" => {
            let mut provider = AnthropicProvider::new(api_key);
            if let Some(base_url) = &entry.base_url {
                provider = provider.with_base_url(base_url);
            }
            if let Some(model) = model {
                provider = provider.with_default_model(model);
            }
            Arc::new(provider)
        }
        // any other entry is treated as an OpenAI-compatible endpoint
        _ => {
            let mut provider = OpenAIProvider::new(api_key);
            if let Some(base_url) = &entry.base_url {
                provider = provider.with_base_url(base_url);
            }
            if let Some(model) = model {
                provider = provider.with_default_model(model);
            }
            Arc::new(provider)
        }
    };
    Ok(provider)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let config = Config::load()?;
    let provider_name = cli
        .provider
        .clone()
        .unwrap_or_else(|| config.default_provider.clone());
    let provider = build_provider(&config, &provider_name, cli.model.as_deref())?;

    let mut engine = OperationEngine::new(config.engine.to_engine_config()).with_provider(provider);
    for (processor, mut profile) in opq_processors::builtin() {
        if let Some(entry) = config.engine.kinds.get(processor.kind().as_str()) {
            if let Some(secs) = entry.default_duration_secs {
                profile.default_duration = Duration::from_secs(secs);
            }
            if let Some(secs) = entry.cache_ttl_secs {
                profile.cache_ttl = Duration::from_secs(secs);
            }
        }
        engine = engine.with_processor(processor, profile);
    }
    engine.start();

    let context = match &cli.context {
        Some(raw) => {
            Some(serde_json::from_str(raw).context("--context must be a valid JSON value")?)
        }
        None => None,
    };

    let id = cli
        .id
        .clone()
        .unwrap_or_else(|| format!("op-{}", chrono::Utc::now().timestamp_millis()));
    let mut input = OperationInput::text(&cli.input);
    if let Some(context) = context {
        input = input.with_context(context);
    }
    let operation = Operation::new(&id, cli.kind.into(), input).with_priority(cli.priority.into());

    let mut events = engine.events();
    let id = engine.enqueue(operation, None)?;

    let outcome = loop {
        let progress = events.recv().await?;
        if progress.operation_id != id {
            continue;
        }
        eprintln!(
            "[{:>3}%] {:<10} {}",
            progress.percent, progress.status, progress.message
        );
        if progress.is_terminal() {
            break progress;
        }
    };

    if cli.status {
        let status = engine.status();
        eprintln!(
            "queue: {} queued, {} active, {} cached, draining: {}",
            status.queued, status.active, status.cached, status.draining
        );
    }

    match outcome.status {
        ProgressStatus::Completed => {
            let result = engine.result(&id)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        ProgressStatus::Failed => anyhow::bail!("operation failed: {}", outcome.message),
        ProgressStatus::Cancelled => anyhow::bail!("operation was cancelled"),
        _ => unreachable!("loop exits only on terminal status"),
    }
}
