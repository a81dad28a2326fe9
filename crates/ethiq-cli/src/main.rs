//! Ethiq CLI - Command-line interface for the moderation council

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ethiq_core::{Ethiq, EthiqConfig, ModerationContext, ReportPeriod};

#[derive(Parser)]
#[command(name = "ethiq")]
#[command(about = "Ethiq - Multi-perspective content moderation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Moderate one piece of content and print the outcome
    Moderate {
        /// Content to moderate (read from stdin when omitted)
        #[arg(long)]
        content: Option<String>,

        /// Context as a JSON object, e.g. '{"audience_size": 50000}'
        #[arg(long)]
        context: Option<String>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// List the configured analyzers
    Agents {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check configuration validity
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "config/ethiq.toml")]
        config: PathBuf,
    },
    /// Summarize the persistent audit store
    Report {
        /// Configuration file path (must set audit.db_path)
        #[arg(short, long, default_value = "config/ethiq.toml")]
        config: PathBuf,

        /// Reporting window
        #[arg(long, value_enum, default_value_t = Period::All)]
        period: Period,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Full outcome as JSON
    Json,
    /// Markdown report for moderators
    Report,
    /// One-line notice for the content owner
    Notice,
}

#[derive(Clone, Copy, ValueEnum)]
enum Period {
    All,
    Today,
    LastWeek,
}

impl From<Period> for ReportPeriod {
    fn from(period: Period) -> Self {
        match period {
            Period::All => ReportPeriod::All,
            Period::Today => ReportPeriod::Today,
            Period::LastWeek => ReportPeriod::LastWeek,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Moderate {
            content,
            context,
            config,
            format,
        } => {
            let config = load_config(config.as_deref())?;
            init_tracing(&config);

            let content = match content {
                Some(content) => content,
                None => read_stdin()?,
            };
            let context = parse_context(context.as_deref())?;

            let ethiq = Ethiq::new(config).context("failed to initialize Ethiq")?;
            let outcome = ethiq.moderate(content, context).await;
            ethiq.flush().await.context("failed to flush audit sinks")?;

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
                Format::Report => println!("{}", outcome.explanation.moderator_report()),
                Format::Notice => println!("{}", outcome.explanation.user_notification()),
            }
        }
        Commands::Agents { config } => {
            let config = load_config(config.as_deref())?;
            init_tracing(&config);

            let ethiq = Ethiq::new(config).context("failed to initialize Ethiq")?;
            for agent in ethiq.agents() {
                println!("{:<14} {:<22} {}", agent.name, agent.framework, agent.description);
            }
        }
        Commands::Check { config } => {
            let parsed = EthiqConfig::from_file(&config)
                .with_context(|| format!("invalid configuration: {}", config.display()))?;
            println!(
                "Configuration OK: {} ({} analyzers, {} ms timeout)",
                config.display(),
                parsed.analyzers.enabled.len(),
                parsed.council.analyzer_timeout_ms
            );
        }
        Commands::Report { config, period } => {
            let config = load_config(Some(&config))?;
            init_tracing(&config);

            if config.audit.db_path.is_none() {
                bail!("audit.db_path is not set; nothing to report");
            }
            let ethiq = Ethiq::new(config).context("failed to initialize Ethiq")?;
            let store = ethiq
                .audit_store()
                .context("audit store was not opened")?;
            let report = store
                .report(period.into())
                .context("failed to read audit store")?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EthiqConfig> {
    match path {
        Some(path) => EthiqConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(EthiqConfig::default()),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(config: &EthiqConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!("Logging initialized with filter '{}'", config.logging.filter);
}

fn read_stdin() -> anyhow::Result<String> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("failed to read content from stdin")?;
    if content.trim().is_empty() {
        bail!("no content given: pass --content or pipe text on stdin");
    }
    Ok(content)
}

fn parse_context(raw: Option<&str>) -> anyhow::Result<ModerationContext> {
    let Some(raw) = raw else {
        return Ok(ModerationContext::new());
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--context is not valid JSON")?;
    if !value.is_object() {
        bail!("--context must be a JSON object");
    }
    Ok(ModerationContext::from_value(value))
}
