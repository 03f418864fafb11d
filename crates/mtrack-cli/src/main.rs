use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "mtrack")]
#[command(about = "mtrack CLI - upgrade and inspect usage profiles", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upgrade a profile to the current schema version
    Upgrade {
        /// Profile JSON file
        profile: PathBuf,
        /// Read-only load: migrate without touching session state
        #[arg(long)]
        scan: bool,
        /// Write the result here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Config file (defaults to the platform config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List every known schema version
    Versions,
    /// Store a profile's grids separately from its metadata
    Split {
        profile: PathBuf,
        /// Directory to write metadata.json and grids.json into
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Reassemble a profile written by `split`
    Join {
        dir: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Upgrade {
            profile,
            scan,
            output,
            config,
        } => commands::upgrade::run(&profile, scan, output.as_deref(), config.as_deref())?,
        Commands::Versions => commands::versions::list(),
        Commands::Split { profile, output } => commands::split::split(&profile, &output)?,
        Commands::Join { dir, output } => commands::split::join(&dir, &output)?,
    }

    Ok(())
}
