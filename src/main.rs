use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(
    name = "pastoralist",
    version,
    about = "Keep dependency overrides honest — track why each exists, prune the stale ones"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile overrides and rewrite package.json
    Update {
        /// Root package.json (or its directory)
        #[arg(long, default_value = "package.json")]
        path: PathBuf,
        /// Workspace manifest globs (overrides configured depPaths)
        #[arg(long = "dep-paths", value_name = "GLOB")]
        dep_paths: Vec<String>,
        /// Compute the result without writing
        #[arg(long)]
        dry_run: bool,
        /// Query configured security providers and apply proposed pins
        #[arg(long)]
        check_security: bool,
    },
    /// Review overrides without writing; exit 1 if any are removable
    Check {
        /// Root package.json (or its directory)
        #[arg(long, default_value = "package.json")]
        path: PathBuf,
        /// Workspace manifest globs (overrides configured depPaths)
        #[arg(long = "dep-paths", value_name = "GLOB")]
        dep_paths: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Update {
            path,
            dep_paths,
            dry_run,
            check_security,
        } => cli::update::cmd_update(path, dep_paths, dry_run, check_security),
        Command::Check { path, dep_paths } => cli::check::cmd_check(path, dep_paths),
    }
}
