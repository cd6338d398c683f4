//! Project configuration, read from `pyatlas.toml` at the project root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name of the configuration file looked up in the indexed root.
pub const CONFIG_FILE_NAME: &str = "pyatlas.toml";

/// Default location of the graph artifact, relative to the indexed root.
pub const DEFAULT_OUTPUT: &str = ".pyatlas/graph.json";

/// Configuration loaded from `pyatlas.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PyAtlasConfig {
    /// Directory names skipped while walking (in addition to .gitignore rules).
    pub exclude: Vec<String>,
    /// Graph artifact path, relative to the root unless absolute.
    pub output: PathBuf,
    /// Parse at most this many files, in walk order.
    pub max_files: Option<usize>,
    pub query: QueryConfig,
}

impl Default for PyAtlasConfig {
    fn default() -> Self {
        Self {
            exclude: [".venv", "__pycache__", ".git", ".hg", ".svn"]
                .into_iter()
                .map(String::from)
                .collect(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            max_files: None,
            query: QueryConfig::default(),
        }
    }
}

/// Limits and module-grouping settings for the query service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Path segments that mark a repository root when grouping nodes by module.
    pub root_markers: Vec<String>,
    pub search_limit: usize,
    pub seed_limit: usize,
    pub expand_limit: usize,
    pub stats_limit: usize,
    pub default_hops: usize,
    pub impact_hops: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            root_markers: Vec::new(),
            search_limit: 20,
            seed_limit: 5,
            expand_limit: 200,
            stats_limit: 10,
            default_hops: 1,
            impact_hops: 2,
        }
    }
}

impl PyAtlasConfig {
    /// Load `pyatlas.toml` from the given root directory.
    pub fn load(root: &Path) -> Self {
        Self::load_from(&root.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from an explicit file.
    ///
    /// A missing file yields the defaults. So does an unreadable or
    /// unparsable one, after a warning.
    pub fn load_from(config_path: &Path) -> Self {
        if !config_path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!(path = %config_path.display(), error = %err, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(path = %config_path.display(), error = %err, "failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve the artifact path against `root`.
    pub fn output_path(&self, root: &Path) -> PathBuf {
        if self.output.is_absolute() {
            self.output.clone()
        } else {
            root.join(&self.output)
        }
    }
}
