//! Workspace path resolution.
//!
//! Expands configured `depPaths` into concrete manifest file paths:
//!   - the sentinel `"workspace"`/`"workspaces"` derives glob patterns from
//!     the root manifest's `workspaces` entries, each with an implicit
//!     `/package.json` suffix;
//!   - an explicit pattern array is expanded as-is.
//!
//! Zero patterns and zero matches are both configuration errors and fail
//! fatally; `node_modules` is always excluded.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::manifest::PackageJson;

// ─── depPaths ──────────────────────────────────────────────────────

/// Where to look for dependent manifests: the workspace sentinel or an
/// explicit list of glob patterns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DepPaths {
    Sentinel(String),
    Patterns(Vec<String>),
}

impl DepPaths {
    pub fn is_workspace_sentinel(&self) -> bool {
        matches!(self, DepPaths::Sentinel(s) if s == "workspace" || s == "workspaces")
    }
}

/// Resolve `depPaths` to concrete manifest files under `root`.
///
/// Absent config falls back to the root `package.json` alone.
pub fn resolve_dep_paths(
    dep_paths: Option<&DepPaths>,
    root_manifest: &PackageJson,
    root: &Path,
) -> Result<Vec<PathBuf>, String> {
    let patterns: Vec<String> = match dep_paths {
        None => return Ok(vec![root.join("package.json")]),
        Some(dp) if dp.is_workspace_sentinel() => {
            let workspaces = root_manifest
                .workspaces
                .as_ref()
                .map(|w| w.patterns())
                .unwrap_or_default();
            if workspaces.is_empty() {
                return Err(
                    "depPaths is \"workspace\" but the root manifest declares no workspaces"
                        .to_string(),
                );
            }
            workspaces
                .iter()
                .map(|entry| format!("{}/package.json", entry.trim_end_matches('/')))
                .collect()
        }
        Some(DepPaths::Sentinel(other)) => {
            return Err(format!("unknown depPaths value '{}'", other));
        }
        Some(DepPaths::Patterns(patterns)) => patterns.clone(),
    };

    find_package_json_files(&patterns, &[], root)
}

// ─── Glob Expansion ────────────────────────────────────────────────

/// Expand glob `patterns` under `root` into manifest file paths.
///
/// Fatal on zero patterns and on zero matches — both mean the
/// configuration needs correcting, not a silent default. Results are
/// deduplicated and sorted.
pub fn find_package_json_files(
    patterns: &[String],
    exclude: &[String],
    root: &Path,
) -> Result<Vec<PathBuf>, String> {
    if patterns.is_empty() {
        return Err("no depPaths provided: at least one glob pattern is required".to_string());
    }

    let excludes: Vec<Pattern> = exclude
        .iter()
        .map(|e| Pattern::new(e).map_err(|err| format!("invalid exclude pattern '{}': {}", e, err)))
        .collect::<Result<_, _>>()?;

    let mut files: BTreeSet<PathBuf> = BTreeSet::new();
    for pattern in patterns {
        let full = root.join(pattern);
        let full = full.to_string_lossy();
        let paths =
            glob::glob(&full).map_err(|e| format!("invalid glob pattern '{}': {}", pattern, e))?;
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable glob entry");
                    continue;
                }
            };
            if !path.is_file() || is_excluded(&path, &excludes) {
                continue;
            }
            files.insert(path);
        }
    }

    if files.is_empty() {
        return Err(format!(
            "no package.json files matched depPaths {:?}",
            patterns
        ));
    }
    Ok(files.into_iter().collect())
}

fn is_excluded(path: &Path, excludes: &[Pattern]) -> bool {
    if path
        .components()
        .any(|c| c.as_os_str() == "node_modules")
    {
        return true;
    }
    excludes.iter().any(|pattern| pattern.matches_path(path))
}
