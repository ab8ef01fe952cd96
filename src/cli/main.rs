//! Command-line front end for the policy engine.
//!
//! ```text
//! policy-engine check policies.yaml
//! policy-engine eval policies.yaml --context request.json
//! echo '{"remote_addr": "foo"}' | policy-engine eval policies.yaml --context -
//! ```
//!
//! `eval` exits with status 0 when a policy matched and 1 when none did.

use policy_author::{Config, EvaluationContext, PolicyEngine, Semantics};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

/// Policy engine command-line tool
#[derive(Parser, Debug)]
#[command(name = "policy-engine")]
#[command(about = "Evaluate declarative first-match policies")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "POLICY_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides configuration)
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON log format
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load and validate a policy document, then print its predicate tree
    Check {
        /// Policy document (defaults to engine.policy_file)
        policies: Option<PathBuf>,
    },

    /// Evaluate a context against a policy document
    Eval {
        /// Policy document (defaults to engine.policy_file)
        policies: Option<PathBuf>,

        /// JSON context file, or `-` for stdin
        #[arg(long)]
        context: String,

        /// Combinator semantics (strict or compat)
        #[arg(long)]
        semantics: Option<Semantics>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    config.validate()?;
    policy_author::telemetry::init(&config.logging)?;

    debug!(version = policy_author::VERSION, "starting {}", policy_author::NAME);

    match cli.command {
        Commands::Check { policies } => {
            let engine = load_engine(&config, policies.as_deref())?;
            info!(policies = engine.policy_count(), "policy document is valid");
            println!("{}", engine);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Eval {
            policies,
            context,
            semantics,
        } => {
            if let Some(semantics) = semantics {
                config.engine.semantics = semantics;
            }
            let engine = load_engine(&config, policies.as_deref())?;
            let context = read_context(&context)?;

            let decision = engine.evaluate(&context)?;
            println!("{}", serde_json::to_string_pretty(&decision)?);

            Ok(if decision.hit {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}

fn load_engine(config: &Config, policies: Option<&Path>) -> anyhow::Result<PolicyEngine> {
    let Some(path) = policies.or(config.engine.policy_file.as_deref()) else {
        bail!("no policy document given and engine.policy_file is not configured");
    };

    PolicyEngine::builder()
        .with_semantics(config.engine.semantics)
        .with_policy_file(path)
        .build()
        .with_context(|| format!("failed to load policies from {}", path.display()))
}

fn read_context(source: &str) -> anyhow::Result<EvaluationContext> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read context from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("failed to read context file {}", source))?
    };

    EvaluationContext::from_json(&raw).context("context must be a JSON object")
}
