use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use architect_workflow::{
    app::AppState,
    cli::{execute_command, Commands},
    config::{Config, LogFormat},
    docs::HttpDocsSource,
    langbase::{LangbaseClient, PipeGenerator, PipeSpec},
    storage::SqliteStorage,
    workflow::{Orchestrator, PhaseCore},
};

/// Planner, Librarian and Mentor workflow for turning a project idea into
/// requirements, documentation and code scaffolds.
#[derive(Parser, Debug)]
#[command(name = "architect", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Architect starting");

    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            Arc::new(s)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    let langbase = match LangbaseClient::new(&config.langbase, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.langbase.base_url, "Langbase client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize Langbase client");
            return Err(e.into());
        }
    };

    // Only a chat turn needs the pipes
    if matches!(cli.command, Commands::Chat { .. }) {
        info!("Ensuring required Langbase pipes exist...");
        for spec in [
            PipeSpec::deep(&config.pipes.deep),
            PipeSpec::fast(&config.pipes.fast),
        ] {
            if let Err(e) = langbase.ensure_pipe(&spec).await {
                error!(pipe = %spec.name, error = %e, "Failed to ensure pipe exists");
                return Err(e.into());
            }
        }
    }

    let docs = HttpDocsSource::new(&config.docs)?;

    let core = PhaseCore::new(
        Arc::new(PipeGenerator::new(langbase.clone(), &config.pipes.deep)),
        Arc::new(PipeGenerator::new(langbase, &config.pipes.fast)),
        Arc::new(docs),
        storage.clone(),
    );
    let orchestrator = Orchestrator::new(core, &config.workflow);
    let app = AppState::new(config, storage, orchestrator);

    let result = execute_command(cli.command, &app).await;
    if result.exit_code == 0 {
        println!("{}", result.message);
    } else {
        eprintln!("{}", result.message);
    }
    std::process::exit(result.exit_code);
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
