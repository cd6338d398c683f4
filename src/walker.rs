//! Source file discovery.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::warn;

use crate::parser::is_python_path;

/// Collect the Python files under `root`.
///
/// Respects `.gitignore` (inside a git repository or not), skips hidden
/// entries and any directory whose name is in `excludes`. The result is
/// sorted so that every build processes files in the same order.
pub fn python_files(root: &Path, excludes: &[String]) -> Vec<PathBuf> {
    let excludes = excludes.to_vec();
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir && entry.depth() > 0 && is_excluded(entry.path(), &excludes))
        })
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_some_and(|ft| ft.is_file()) && is_python_path(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    files
}

fn is_excluded(dir: &Path, excludes: &[String]) -> bool {
    dir.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| excludes.iter().any(|excluded| excluded == name))
}
