use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use skill_gap::catalog::{RoleCatalog, Vocabulary};
use skill_gap::config::Config;
use skill_gap::embedding;
use skill_gap::ner::{CandidateSource, RuleBasedAnalyzer};
use skill_gap::service::{AnalysisRequest, SkillGapService};
use skill_gap::EngineError;

#[derive(Parser, Debug)]
#[command(name = "skill-gap")]
#[command(about = "Skill gap analysis - match your skills against a target role")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the roles that can be analyzed
    Roles,

    /// Score your skills against a role and list the gaps
    #[command(group(ArgGroup::new("input").required(true).args(["skills", "text_file"])))]
    Analyze {
        /// Target role name
        #[arg(short, long)]
        role: String,

        /// Comma-separated skills, e.g. "python, docker-compose, sql"
        #[arg(short, long)]
        skills: Option<String>,

        /// Plain-text resume to extract skills from
        #[arg(short, long)]
        text_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level, args.json_logs) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}

/// 2 for bad requests, 1 for everything else
fn exit_status(e: &anyhow::Error) -> u8 {
    let client_error = e
        .downcast_ref::<EngineError>()
        .is_some_and(EngineError::is_client_error);
    if client_error {
        2
    } else {
        1
    }
}

/// Load and validate configuration. Bad values are operator errors, so they
/// are reported without the client-error classification.
fn load_config(path: &str) -> Result<Config> {
    let config = Config::load(Some(path)).context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn candidate_source(
    skills: Option<String>,
    text_file: Option<PathBuf>,
) -> Result<CandidateSource> {
    match (skills, text_file) {
        (Some(skills), _) => Ok(CandidateSource::Manual(skills)),
        (None, Some(path)) => Ok(CandidateSource::Text(
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?,
        )),
        (None, None) => Err(EngineError::InvalidInput(
            "either --skills or --text-file is required".to_string(),
        )
        .into()),
    }
}

fn init_logging(log_level: &str, json: bool) -> Result<()> {
    let log_level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
    .context("Failed to set tracing subscriber")
}

async fn run(args: Args) -> Result<()> {
    info!("Starting skill-gap v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    info!("Configuration loaded");

    let roles = RoleCatalog::load(&config.data.roles_path)
        .context("Failed to load role definitions")?;

    match args.command {
        Command::Roles => {
            for name in roles.names() {
                println!("{}", name);
            }
        }
        Command::Analyze {
            role,
            skills,
            text_file,
        } => {
            let source = candidate_source(skills, text_file)?;

            let vocabulary = Vocabulary::load(&config.data.vocabulary_path)
                .context("Failed to load skill vocabulary")?;
            let provider = embedding::provider_from_config(&config.embedding)?;

            let service = SkillGapService::new(
                Arc::new(vocabulary),
                Arc::new(roles),
                Arc::new(RuleBasedAnalyzer),
                provider,
                config.matching.normalize_cutoff,
                config.matching.missing_threshold,
            )?;

            let report = service.analyze(&AnalysisRequest { role, source }).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
