//! Sprig CLI entry point

use clap::{Parser, Subcommand};
use sprig_core::ExtractionSeed;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "sprig")]
#[command(about = "Symbol-level dependency manifests and code extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root path (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Output directory, overriding `out_dir` from the config
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dependency manifest and write manifest.json
    Manifest,
    /// Extract the symbols reachable from one or more seeds
    Extract {
        /// Seed written as `path/to/file|symbol`; repeatable
        #[arg(short, long = "symbol", required = true)]
        symbols: Vec<ExtractionSeed>,

        /// Dependency hops to follow
        #[arg(long)]
        dependency_depth: Option<usize>,

        /// Dependent hops to follow
        #[arg(long)]
        dependent_depth: Option<usize>,
    },
    /// Check metrics against the configured thresholds and write audit.json
    Audit,
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("sprig={}", log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Project root: {}", cli.root.display());

    match cli.command {
        Commands::Manifest => commands::manifest(cli.root, cli.out_dir).await,
        Commands::Extract {
            symbols,
            dependency_depth,
            dependent_depth,
        } => {
            commands::extract(
                cli.root,
                cli.out_dir,
                symbols,
                dependency_depth,
                dependent_depth,
            )
            .await
        }
        Commands::Audit => commands::audit(cli.root, cli.out_dir).await,
        Commands::Init { force } => commands::init(cli.root, force).await,
        Commands::Version => {
            println!("sprig v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
