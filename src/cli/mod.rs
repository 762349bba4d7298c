pub mod check;
pub mod update;

use std::path::PathBuf;
use std::process;

use pastoralist::{DepPaths, RunOptions};

/// Resolve an input path (manifest file or project directory) to the root
/// package.json.
pub fn resolve_manifest_path(input: PathBuf) -> PathBuf {
    let path = if input.is_dir() {
        input.join("package.json")
    } else {
        input
    };
    if !path.exists() {
        eprintln!("error: no package.json found at '{}'", path.display());
        process::exit(1);
    }
    path
}

pub fn run_options(
    path: PathBuf,
    dep_paths: Vec<String>,
    dry_run: bool,
    check_security: bool,
) -> RunOptions {
    RunOptions {
        path: resolve_manifest_path(path),
        dep_paths: (!dep_paths.is_empty()).then_some(DepPaths::Patterns(dep_paths)),
        dry_run,
        check_security,
    }
}
