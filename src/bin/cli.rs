//! pyatlas CLI: index a Python source tree and query the resulting graph.
//!
//! Usage:
//!   pyatlas build                      # Index the current directory
//!   pyatlas search <query>             # Find nodes
//!   pyatlas deps <query> --hops 2      # Dependencies and dependents
//!   pyatlas impact <query>             # What reaches a node
//!   pyatlas path <source> <target>     # Shortest path
//!   pyatlas stats                      # Counts, hubs, modules, clusters

use clap::Parser;
use pyatlas::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
