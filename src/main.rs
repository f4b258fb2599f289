use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reelscout::app::AppContext;
use reelscout::cli::{commands, Cli, Commands};
use reelscout::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli) {
        eprintln!("Failed to set up logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    // Scheduled jobs rely on the exit status; failed runs are not retried.
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let file_layer = match &cli.log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Releases {
            countries,
            providers,
            days,
            dry_run,
        } => {
            commands::collect_releases(&ctx, countries, providers, days, dry_run).await?;
        }
        Commands::Top {
            countries,
            providers,
            dry_run,
        } => {
            commands::collect_top(&ctx, countries, providers, dry_run).await?;
        }
        Commands::Highlights { days, per_provider } => {
            commands::show_highlights(&ctx, days, per_provider)?;
        }
        Commands::List { top, mark_sent } => {
            if top {
                commands::list_top(&ctx, mark_sent)?;
            } else {
                commands::list_releases(&ctx)?;
            }
        }
        Commands::Config => {
            commands::show_config(&ctx)?;
        }
    }

    Ok(())
}
