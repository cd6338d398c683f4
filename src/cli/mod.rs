//! CLI module for pyatlas.
//!
//! Commands:
//! - Index: build
//! - Query: search, deps, impact, path, subgraph
//! - Summary: stats, metadata
//!
//! Query commands read the graph artifact written by `build` and print their
//! result as JSON on stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::config::PyAtlasConfig;
use crate::graph::types::{EdgeKind, NodeKind};
use crate::graph::build_graph_from_root;
use crate::query::{Direction, ExpandOptions, GraphQueryService};

#[derive(Parser, Debug)]
#[command(name = "pyatlas")]
#[command(about = "Index a Python source tree into a code graph and query it")]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Graph artifact path (default: `output` from the config, under the root)
    #[arg(short, long, global = true)]
    pub graph: Option<PathBuf>,

    /// Config file (default: <root>/pyatlas.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    // ─── Index ──────────────────────────────────────────────────────
    /// Build the code graph and write it to disk
    Build {
        /// Where to write the graph (overrides --graph)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Parse at most this many files
        #[arg(long)]
        max_files: Option<usize>,
    },

    // ─── Query ──────────────────────────────────────────────────────
    /// Find nodes by id, name, qualified name or path
    Search {
        query: String,

        /// Only these node types (File, Function, Class, Module)
        #[arg(short = 't', long = "type")]
        node_types: Vec<NodeKind>,

        /// Max results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// What a node depends on and what depends on it
    Deps(ExpandArgs),

    /// Everything that reaches a node through incoming edges
    Impact {
        query: String,

        #[arg(long)]
        hops: Option<usize>,

        /// Only follow these edge types (CALLS, IMPORTS, INHERITS)
        #[arg(short, long = "edge-type")]
        edge_types: Vec<EdgeKind>,

        /// Max nodes returned
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Shortest path between two nodes
    Path {
        source: String,
        target: String,

        /// Only follow these edge types
        #[arg(short, long = "edge-type")]
        edge_types: Vec<EdgeKind>,

        /// Respect edge direction
        #[arg(long)]
        directed: bool,
    },

    /// Neighborhood of a node
    Subgraph(ExpandArgs),

    // ─── Summary ────────────────────────────────────────────────────
    /// Node and edge counts, hubs, modules and clusters
    Stats {
        /// Only count these edge types for hubs and clusters
        #[arg(short, long = "edge-type")]
        edge_types: Vec<EdgeKind>,

        /// Max entries per list
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Where and when the graph was built
    Metadata,
}

#[derive(Args, Debug)]
pub struct ExpandArgs {
    query: String,

    /// outgoing, incoming or both
    #[arg(short, long, default_value = "both")]
    direction: Direction,

    #[arg(long)]
    hops: Option<usize>,

    /// Only follow these edge types
    #[arg(short, long = "edge-type")]
    edge_types: Vec<EdgeKind>,

    /// Max nodes returned
    #[arg(short, long)]
    limit: Option<usize>,
}

impl ExpandArgs {
    fn options(&self) -> ExpandOptions {
        ExpandOptions {
            direction: self.direction,
            hops: self.hops,
            edge_types: self.edge_types.clone(),
            limit: self.limit,
        }
    }
}

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let root = cli.root.canonicalize().unwrap_or(cli.root);
    let mut config = match &cli.config {
        Some(path) => PyAtlasConfig::load_from(path),
        None => PyAtlasConfig::load(&root),
    };
    let graph_path = cli.graph.unwrap_or_else(|| config.output_path(&root));

    if let Commands::Build { output, max_files } = cli.command {
        if max_files.is_some() {
            config.max_files = max_files;
        }
        let output = output.unwrap_or(graph_path);
        return build(&root, &output, &config);
    }

    let service = GraphQueryService::from_path(&graph_path, config.query.clone())
        .with_context(|| format!("run `pyatlas build` first to create {}", graph_path.display()))?;

    match cli.command {
        Commands::Search {
            query,
            node_types,
            limit,
        } => print_json(&service.search(&query, &node_types, limit)),
        Commands::Deps(args) => print_json(&service.dependencies(&args.query, &args.options())),
        Commands::Impact {
            query,
            hops,
            edge_types,
            limit,
        } => print_json(&service.impact(&query, hops, &edge_types, limit)),
        Commands::Path {
            source,
            target,
            edge_types,
            directed,
        } => print_json(&service.path(&source, &target, &edge_types, directed)),
        Commands::Subgraph(args) => print_json(&service.subgraph(&args.query, &args.options())),
        Commands::Stats { edge_types, limit } => print_json(&service.stats(&edge_types, limit)),
        Commands::Metadata => print_json(&service.metadata()),
        Commands::Build { .. } => Ok(()),
    }
}

fn build(root: &Path, output: &Path, config: &PyAtlasConfig) -> Result<()> {
    let graph = build_graph_from_root(root, Some(output), config)?;
    info!(path = %output.display(), "build complete");
    print_json(&serde_json::json!({
        "graph_path": output.display().to_string(),
        "node_count": graph.node_count(),
        "edge_count": graph.edge_count(),
        "generated_at": graph.snapshot().and_then(|s| s.generated_at.clone()),
    }))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_flags() {
        let cli = Cli::parse_from([
            "pyatlas",
            "--root",
            "/repo",
            "deps",
            "Foo.method",
            "--direction",
            "outgoing",
            "--edge-type",
            "CALLS",
            "--edge-type",
            "inherits",
            "--hops",
            "2",
        ]);
        assert_eq!(cli.root, PathBuf::from("/repo"));
        let Commands::Deps(args) = cli.command else {
            panic!("expected deps");
        };
        let options = args.options();
        assert_eq!(options.direction, Direction::Outgoing);
        assert_eq!(options.hops, Some(2));
        assert_eq!(options.edge_types, vec![EdgeKind::Calls, EdgeKind::Inherits]);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_parse_build_and_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["pyatlas", "build", "--max-files", "10", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Build {
                output: None,
                max_files: Some(10)
            }
        ));
    }

    #[test]
    fn test_rejects_unknown_edge_type() {
        let result = Cli::try_parse_from(["pyatlas", "stats", "--edge-type", "USES"]);
        assert!(result.is_err());
    }
}
