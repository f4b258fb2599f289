pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reelscout")]
#[command(about = "Collects new and popular movies from streaming catalogs", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/reelscout/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Also append log output to this file
    #[arg(short, long, global = true)]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect titles recently added to provider timelines
    Releases {
        /// Countries to scan
        #[arg(long = "country", default_values = ["Germany"])]
        countries: Vec<String>,

        /// Providers to scan
        #[arg(
            long = "provider",
            default_values = ["Netflix", "Amazon Prime Video", "Disney Plus", "Apple TV+"]
        )]
        providers: Vec<String>,

        /// Trailing days to include besides today
        #[arg(short, long, default_value_t = 1)]
        days: u32,

        /// Print the records as JSON instead of storing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Sample popular titles from each provider's catalog
    Top {
        /// Countries to sample
        #[arg(long = "country", default_values = ["Germany"])]
        countries: Vec<String>,

        /// Providers to sample
        #[arg(long = "provider", default_values = ["Netflix", "Amazon Prime Video"])]
        providers: Vec<String>,

        /// Print the records as JSON instead of storing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Best rated stored releases per provider
    Highlights {
        /// How far back to look
        #[arg(short, long, default_value_t = 7)]
        days: u32,

        /// Titles per provider
        #[arg(short = 'n', long, default_value_t = 3)]
        per_provider: usize,
    },
    /// List stored releases
    List {
        /// Show unsent top titles instead of releases
        #[arg(long)]
        top: bool,

        /// Mark the listed top titles as sent
        #[arg(long, requires = "top")]
        mark_sent: bool,
    },
    /// Print the effective configuration
    Config,
}
