mod config;
mod routes;

use anyhow::Context;
use clap::Parser;
use config::Folders;
use fetch_engine::{Orchestrator, Registry};
use routes::AppState;
use std::sync::Arc;
use tracing::{Level, debug};
use utils::logging::{self, LogConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(
        short = 'l',
        long = "listen",
        value_name = "ADDR",
        default_value = "0.0.0.0:8080"
    )]
    listen: String,

    /// Destination folder mapping, repeatable (NAME=PATH)
    #[arg(short = 'd', long = "dir", value_name = "NAME=PATH")]
    dirs: Vec<String>,

    /// Log directory
    #[arg(long = "log-dir", value_name = "DIR", default_value = ".dev/logs")]
    log_dir: String,

    /// Set console log level
    #[arg(long = "console-log-level", value_name = "LEVEL",
          value_parser = ["trace", "debug", "info", "warn", "error"],
          default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match logging::init_logging(LogConfig {
        component: "fetchd",
        log_dir: cli.log_dir.clone().into(),
        silent_deps: vec![
            "hyper".into(),
            "hyper_util".into(),
            "mio".into(),
            "reqwest".into(),
        ],
        max_level: match cli.log_level.as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        },
        ..Default::default()
    }) {
        Ok(_) => debug!("logger initialized"),
        Err(e) => eprintln!("Failed to initialize logger: {}", e),
    }

    let folders = Folders::from_args(&cli.dirs)?;

    let registry = Arc::new(Registry::new());
    let orchestrator = Arc::new(Orchestrator::new(Arc::clone(&registry))?);
    let app = routes::router(AppState {
        orchestrator,
        registry,
        folders: Arc::new(folders),
    });

    let listener = tokio::net::TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
