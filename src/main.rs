//! GitLab resource provider
//!
//! Command line host for the resource handlers. State travels as JSON on
//! stdin/stdout, logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tanuki_provider::{
    Provider, ProviderConfig,
    config::{LogFormat, LoggingConfig},
    load_config,
    resources::ResourceRegistry,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// GitLab resource provider - declarative management of GitLab objects
#[derive(Parser, Debug)]
#[command(name = "tanuki-provider")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "TANUKI_PROVIDER_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "TANUKI_PROVIDER_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered resource types
    Resources,
    /// Print the attribute schema and state JSON schema of a resource type
    Schema { resource_type: String },
    /// Validate a configuration object without contacting GitLab
    Validate {
        resource_type: String,
        /// JSON file, stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Create the object described by the planned state
    Create {
        resource_type: String,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Refresh a state; prints `null` when the object is gone
    Read {
        resource_type: String,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Apply the difference between two states
    Update {
        resource_type: String,
        #[arg(long)]
        prior: PathBuf,
        #[arg(long)]
        planned: PathBuf,
    },
    /// Delete the object behind a state
    Delete {
        resource_type: String,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Build a state from an existing object's id
    Import { resource_type: String, id: String },
}

impl Command {
    fn needs_gitlab(&self) -> bool {
        !matches!(
            self,
            Command::Resources | Command::Schema { .. } | Command::Validate { .. }
        )
    }
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Read a JSON document from a file, or stdin when no path is given
fn read_json(path: Option<&Path>) -> anyhow::Result<Value> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("Input is not valid JSON")
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Commands that never touch GitLab
fn run_offline(command: Command) -> anyhow::Result<()> {
    let registry = ResourceRegistry::builtin();

    match command {
        Command::Resources => {
            for name in registry.resource_types() {
                println!("{}", name);
            }
        }
        Command::Schema { resource_type } => {
            let entry = registry
                .get(&resource_type)
                .with_context(|| format!("Unknown resource type: {}", resource_type))?;
            print_json(&serde_json::json!({
                "schema": entry.schema,
                "state_schema": entry.state_schema,
            }))?;
        }
        Command::Validate {
            resource_type,
            input,
        } => {
            let config = read_json(input.as_deref())?;
            registry.validate(&resource_type, &config)?;
            info!(resource = %resource_type, "Configuration is valid");
        }
        other => anyhow::bail!("{:?} needs a GitLab connection", other),
    }

    Ok(())
}

async fn run_remote(command: Command, config: &ProviderConfig) -> anyhow::Result<()> {
    let provider = Provider::new(&config.gitlab)
        .inspect_err(|e| error!(error = %e, "Failed to create provider"))?;
    provider
        .configure()
        .await
        .inspect_err(|e| error!(error = %e, "Failed to configure provider"))?;

    let registry = provider.registry();
    let ctx = provider.context();

    match command {
        Command::Create {
            resource_type,
            input,
        } => {
            let planned = read_json(input.as_deref())?;
            let state = registry.create(&resource_type, &ctx, planned).await?;
            print_json(&state)?;
        }
        Command::Read {
            resource_type,
            input,
        } => {
            let current = read_json(input.as_deref())?;
            let state = registry.read(&resource_type, &ctx, current).await?;
            print_json(&state.unwrap_or(Value::Null))?;
        }
        Command::Update {
            resource_type,
            prior,
            planned,
        } => {
            let prior = read_json(Some(prior.as_path()))?;
            let planned = read_json(Some(planned.as_path()))?;
            let state = registry
                .update(&resource_type, &ctx, prior, planned)
                .await?;
            print_json(&state)?;
        }
        Command::Delete {
            resource_type,
            input,
        } => {
            let current = read_json(input.as_deref())?;
            registry.delete(&resource_type, &ctx, current).await?;
        }
        Command::Import { resource_type, id } => {
            let state = registry.import(&resource_type, &ctx, &id).await?;
            print_json(&state.unwrap_or(Value::Null))?;
        }
        other => return run_offline(other),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up a .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Configuration decides the log format, so load it before logging starts
    let config = args
        .command
        .needs_gitlab()
        .then(|| load_config(args.config.as_deref()));

    let logging = config
        .as_ref()
        .and_then(|c| c.as_ref().ok())
        .map(|c| c.logging.clone())
        .unwrap_or_else(LoggingConfig::default);
    init_logging(
        args.log_level.as_deref().unwrap_or(&logging.level),
        logging.format,
    );

    let config = config
        .transpose()
        .inspect_err(|e| error!(error = %e, "Failed to load configuration"))?;

    match config {
        Some(config) => {
            info!(
                version = env!("CARGO_PKG_VERSION"),
                url = %config.gitlab.url,
                "Starting GitLab resource provider"
            );
            run_remote(args.command, &config).await
        }
        None => run_offline(args.command),
    }
}
