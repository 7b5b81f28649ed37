//! `renamr`: plan and apply collision-free batch renames.

mod commands;
mod error;
mod names;
mod video;

use crate::commands::App;
use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use renamr_config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "renamr", version, about = "Collision-free batch renaming with cached place labels")]
struct Cli {
    /// Configuration file (`.toml`, `.yaml` or `.json`).
    #[arg(short, long, global = true, env = "RENAMR_CONFIG")]
    config: Option<PathBuf>,
    /// More output (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the final name every file would get, without renaming anything.
    Plan {
        /// Directory containing the files.
        directory: PathBuf,
        /// JSON names file describing the batch.
        #[arg(short, long)]
        names: PathBuf,
    },
    /// Rename the files in a batch.
    Apply {
        directory: PathBuf,
        #[arg(short, long)]
        names: PathBuf,
        /// Plan and report, but leave the files alone.
        #[arg(long)]
        dry_run: bool,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Look up the place label for a coordinate.
    #[command(allow_negative_numbers = true)]
    Lookup { latitude: f64, longitude: f64 },
    /// Inspect or reset the label cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Debug, Subcommand)]
enum CacheCommand {
    Stats,
    Clear,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::ERROR,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::builder().with_default_directive(level.into()).from_env_lossy())
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let app = App::from_config(&config)?;
    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Plan { directory, names } => app.plan(&directory, &names, &mut out).await.map(drop),
        Command::Apply {
            directory,
            names,
            dry_run,
            json,
        } => app.apply(&directory, &names, dry_run, json, &mut out).await.map(drop),
        Command::Lookup { latitude, longitude } => app.lookup(latitude, longitude, &mut out).await.map(drop),
        Command::Cache { command: CacheCommand::Stats } => app.cache_stats(&mut out).await,
        Command::Cache { command: CacheCommand::Clear } => app.cache_clear(&mut out).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&["renamr", "lookup", "-33.86", "151.21"], -33.86)]
    #[case(&["renamr", "-v", "lookup", "50.08", "14.43"], 50.08)]
    fn test_lookup_arguments(#[case] args: &[&str], #[case] latitude: f64) {
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Lookup { latitude: l, .. } if l == latitude));
    }

    #[test]
    fn test_apply_arguments() {
        let cli = Cli::try_parse_from(["renamr", "apply", "/photos", "--names", "n.json", "--dry-run", "-q"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Apply { dry_run: true, json: false, .. }));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["renamr", "-v", "-q", "cache", "stats"]).is_err());
    }
}
