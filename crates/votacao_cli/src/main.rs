//! Voting service executable.
//!
//! # Responsibility
//! - Parse configuration from flags and environment.
//! - Start logging, migrate the database, then serve the REST router.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;
use votacao_http::{build_router, EligibilityMode, ServiceConfig, ServiceState};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EligibilityArg {
    Random,
    Always,
    Never,
}

impl From<EligibilityArg> for EligibilityMode {
    fn from(value: EligibilityArg) -> Self {
        match value {
            EligibilityArg::Random => Self::Random,
            EligibilityArg::Always => Self::Always,
            EligibilityArg::Never => Self::Never,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "votacao", version, about = "Assembly voting REST service")]
struct Cli {
    /// REST socket address to bind, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080", env = "VOTACAO_LISTEN")]
    listen: SocketAddr,
    /// SQLite database file; created and migrated on startup.
    #[arg(long, default_value = "votacao.sqlite3", env = "VOTACAO_DB_PATH")]
    db_path: PathBuf,
    /// Log level: trace, debug, info, warn or error.
    #[arg(long, env = "VOTACAO_LOG_LEVEL")]
    log_level: Option<String>,
    /// Directory for rolling log files. Logs go to stderr when absent.
    #[arg(long, env = "VOTACAO_LOG_DIR")]
    log_dir: Option<PathBuf>,
    /// Identity validator answering eligibility checks.
    #[arg(long, value_enum, default_value_t = EligibilityArg::Random, env = "VOTACAO_ELIGIBILITY")]
    eligibility: EligibilityArg,
    /// Seed for the random identity validator.
    #[arg(long, env = "VOTACAO_ELIGIBILITY_SEED")]
    eligibility_seed: Option<u64>,
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| votacao_core::default_log_level().to_string());

    match &cli.log_dir {
        Some(dir) => {
            let dir = if dir.is_absolute() {
                dir.clone()
            } else {
                std::env::current_dir()
                    .context("resolving current directory for --log-dir")?
                    .join(dir)
            };
            votacao_core::init_logging(&level, &dir.to_string_lossy())
        }
        None => votacao_core::init_stderr_logging(&level),
    }
    .map_err(anyhow::Error::msg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = ServiceConfig {
        db_path: cli.db_path.clone(),
        eligibility: cli.eligibility.into(),
        eligibility_seed: cli.eligibility_seed,
    };
    let state = ServiceState::bootstrap(config)
        .with_context(|| format!("opening database {}", cli.db_path.display()))?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    info!(
        "event=http_serve module=cli status=ok listen={}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;
    Ok(())
}
