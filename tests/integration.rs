//! End-to-end tests: build a small Python project with the `pyatlas` binary,
//! then query the saved graph through the CLI and inspect the JSON it prints.
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pyatlas"))
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let app = dir.path().join("app");
    std::fs::create_dir_all(&app).unwrap();
    std::fs::write(
        app.join("models.py"),
        "class Base:\n    pass\n\n\
         class User(Base):\n    def save(self):\n        self.validate()\n\n    \
         def validate(self):\n        pass\n",
    )
    .unwrap();
    std::fs::write(
        app.join("views.py"),
        "import os\nfrom app.models import User\n\n\ndef handle():\n    save()\n",
    )
    .unwrap();
    // Excluded by default.
    let venv = dir.path().join(".venv").join("lib");
    std::fs::create_dir_all(&venv).unwrap();
    std::fs::write(venv.join("vendored.py"), "def vendored():\n    pass\n").unwrap();
    dir
}

fn run(root: &Path, args: &[&str]) -> std::process::Output {
    Command::new(binary())
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to invoke pyatlas binary")
}

/// Run a pyatlas command, assert success and parse stdout as JSON.
fn run_json(root: &Path, args: &[&str]) -> Value {
    let out = run(root, args);
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        out.status.success(),
        "command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
        args,
        out.status,
        stdout,
        stderr
    );
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}

fn built_fixture() -> tempfile::TempDir {
    let dir = fixture();
    run_json(dir.path(), &["build"]);
    dir
}

fn names(nodes: &Value) -> Vec<String> {
    nodes
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn test_build_writes_graph() {
    let dir = fixture();
    let summary = run_json(dir.path(), &["build"]);

    // 2 files, 2 classes, 3 functions, 2 modules.
    assert_eq!(summary["node_count"], 9);
    // 2 imports, 1 inheritance, 2 calls.
    assert_eq!(summary["edge_count"], 5);
    assert!(summary["generated_at"].is_string());

    let artifact = dir.path().join(".pyatlas").join("graph.json");
    let document: Value =
        serde_json::from_str(&std::fs::read_to_string(artifact).unwrap()).unwrap();
    assert_eq!(document["directed"], true);
    assert_eq!(document["nodes"].as_array().unwrap().len(), 9);
    assert_eq!(document["links"].as_array().unwrap().len(), 5);
}

#[test]
fn test_build_respects_max_files_and_output() {
    let dir = fixture();
    let output = dir.path().join("out.json");
    let summary = run_json(
        dir.path(),
        &["build", "--max-files", "1", "--output", output.to_str().unwrap()],
    );
    assert!(output.exists());
    // Only app/models.py: file, Base, User, save, validate.
    assert_eq!(summary["node_count"], 5);
}

#[test]
fn test_query_without_graph_fails() {
    let dir = fixture();
    let out = run(dir.path(), &["stats"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("pyatlas build"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[test]
fn test_search_filters_by_type() {
    let dir = built_fixture();
    let result = run_json(dir.path(), &["search", "user", "--type", "Class"]);
    assert_eq!(result["query"], "user");
    assert_eq!(names(&result["matches"]), vec!["User"]);

    let result = run_json(dir.path(), &["search", "user"]);
    let found = names(&result["matches"]);
    for expected in ["User", "save", "validate"] {
        assert!(found.contains(&expected.to_string()), "{found:?}");
    }
}

#[test]
fn test_deps_outgoing_calls() {
    let dir = built_fixture();
    let result = run_json(
        dir.path(),
        &["deps", "handle", "--direction", "outgoing", "--hops", "2"],
    );
    assert_eq!(result["direction"], "outgoing");
    assert_eq!(result["hops"], 2);
    assert_eq!(names(&result["nodes"]), vec!["handle", "save", "validate"]);
    assert_eq!(result["edges"].as_array().unwrap().len(), 2);
}

#[test]
fn test_impact_follows_incoming_edges() {
    let dir = built_fixture();
    let result = run_json(dir.path(), &["impact", "Base"]);
    let reached = names(&result["nodes"]);
    assert!(reached.contains(&"Base".to_string()));
    assert!(reached.contains(&"User".to_string()));
    assert_eq!(result["edges"][0]["type"], "INHERITS");
}

#[test]
fn test_path_directed_and_undirected() {
    let dir = built_fixture();

    let forward = run_json(dir.path(), &["path", "handle", "User.validate", "--directed"]);
    assert!(forward.get("error").is_none());
    assert_eq!(names(&forward["path"]), vec!["handle", "save", "validate"]);

    let backward = run_json(dir.path(), &["path", "User.validate", "handle", "--directed"]);
    assert_eq!(backward["error"], "No path found");

    let undirected = run_json(dir.path(), &["path", "User.validate", "handle"]);
    assert_eq!(names(&undirected["path"]), vec!["validate", "save", "handle"]);

    let missing = run_json(dir.path(), &["path", "handle", "nothing_like_this"]);
    assert_eq!(missing["error"], "Source or target not found");
}

#[test]
fn test_stats_and_metadata() {
    let dir = built_fixture();
    let stats = run_json(dir.path(), &["stats"]);
    assert_eq!(stats["node_counts"]["Function"], 3);
    assert_eq!(stats["node_counts"]["Module"], 2);
    assert_eq!(stats["edge_counts"]["CALLS"], 2);
    // Every pathed node lives under app/.
    assert_eq!(stats["module_breakdown"][0]["module"], "app");
    assert_eq!(stats["module_breakdown"][0]["count"], 7);

    let metadata = run_json(dir.path(), &["metadata"]);
    assert_eq!(metadata["node_count"], 9);
    assert!(metadata["generated_at"].is_string());
    let source_root = dir.path().canonicalize().unwrap();
    assert_eq!(
        metadata["source_root"].as_str().unwrap(),
        source_root.to_string_lossy()
    );
    assert!(metadata["graph_path"]
        .as_str()
        .unwrap()
        .ends_with("graph.json"));
}
