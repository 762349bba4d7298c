//! One reconciliation pass, start to finish.
//!
//! Every entry point drives the same pipeline: load and merge config,
//! resolve workspace manifest paths, build the dependency tree, compute the
//! next appendix, drop overrides nobody needs, optionally run the security
//! hook, and persist the result.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::appendix::{
    self, find_patch_files, find_removable_appendix_items, package_name_from_key, Appendix,
    DependencyTree, TreeBuilder, UpdateArgs,
};
use crate::config;
use crate::manifest::{self, PackageJson, Resolver};
use crate::security::{
    apply_security_findings, collect_findings, Prompt, ProviderRegistry, SecurityOutcome,
};
use crate::workspace::{self, DepPaths};

// ─── Options & Report ──────────────────────────────────────────────

pub struct RunOptions {
    /// Root `package.json` to reconcile.
    pub path: PathBuf,
    /// Overrides the configured `depPaths` when set (CLI flag).
    pub dep_paths: Option<DepPaths>,
    /// Compute everything, write nothing.
    pub dry_run: bool,
    /// Force the security pass even when the config leaves it off.
    pub check_security: bool,
}

/// What a reconciliation pass did (or, under `dry_run`, would do).
#[derive(Debug)]
pub struct RunReport {
    /// Overrides still justified after pruning (plus security additions).
    pub overrides: BTreeMap<String, String>,
    pub appendix: Appendix,
    /// Override names dropped because nothing depends on them anymore.
    pub removed: Vec<String>,
    /// The dependency tree the decisions were based on.
    pub tree: DependencyTree,
    pub security: Option<SecurityOutcome>,
    /// Packages whose vulnerability data could not be fetched.
    pub unavailable: Vec<String>,
    /// The resulting manifest state.
    pub manifest: PackageJson,
}

// ─── Pipeline ──────────────────────────────────────────────────────

pub fn run_reconciliation(
    opts: &RunOptions,
    registry: &ProviderRegistry,
    prompt: Option<&mut dyn Prompt>,
) -> Result<RunReport, String> {
    let mut resolver = Resolver::new();
    let root_path = &opts.path;
    let root_dir = root_path.parent().unwrap_or(Path::new(".")).to_path_buf();

    let root = resolver
        .resolve(root_path)
        .ok_or_else(|| format!("cannot read manifest '{}'", root_path.display()))?;

    // External config merged with the manifest's `pastoralist` section.
    let embedded = root
        .pastoralist
        .as_ref()
        .and_then(|section| config::safe_validate_config(&Value::Object(section.clone())));
    let mut config = config::load_config(&root_dir, embedded.as_ref());
    if let Some(dep_paths) = &opts.dep_paths {
        config.dep_paths = Some(dep_paths.clone());
    }

    // Current overrides from whichever field is active.
    let overrides = manifest::override_map(&root);
    debug!(count = overrides.len(), "overrides under reconciliation");

    let run_security = opts.check_security || config.check_security == Some(true);
    if overrides.is_empty() && !run_security && !has_override_bookkeeping(&root) {
        debug!("nothing to reconcile");
        return Ok(RunReport {
            overrides,
            appendix: Appendix::new(),
            removed: Vec::new(),
            tree: DependencyTree::new(),
            security: None,
            unavailable: Vec::new(),
            manifest: (*root).clone(),
        });
    }

    // Manifest files feeding the dependency tree: the configured dep
    // paths plus the root itself.
    let mut files = workspace::resolve_dep_paths(config.dep_paths.as_ref(), &root, &root_dir)?;
    let root_canonical =
        std::fs::canonicalize(root_path).unwrap_or_else(|_| root_path.to_path_buf());
    if !files.contains(&root_canonical) && !files.contains(root_path) {
        files.push(root_canonical);
    }

    let names: BTreeSet<String> = overrides.keys().cloned().collect();
    let mut trees = TreeBuilder::new();
    let tree = trees.build(&mut resolver, &files, &names);

    let previous = config.appendix.clone().unwrap_or_default();
    let patches = find_patch_files(&root_dir, &names);
    let mut next = appendix::update_appendix(&overrides, &tree, &root, Some(&previous), &patches);

    // Drop overrides nobody needs anymore.
    let removed = find_removable_appendix_items(&next);
    let mut kept = overrides.clone();
    for name in &removed {
        kept.remove(name);
    }
    if !removed.is_empty() {
        info!(removed = removed.len(), "pruning unneeded overrides");
    }

    // Optional security pass, after pruning so fresh pins are not judged
    // by dependents they do not have yet.
    let (security, unavailable) = if run_security {
        let security_config = config.security.clone().unwrap_or_default();
        let packages = security_targets(&root);
        let (findings, unavailable) = collect_findings(registry, &security_config, &packages);
        let outcome =
            apply_security_findings(&findings, &security_config, &mut kept, &mut next, prompt);
        for (name, version) in &outcome.applied {
            let key = format!("{}@{}", name, version);
            if let Some(item) = next.get_mut(&key) {
                if item.dependents.is_none() {
                    item.dependents = Some(tree.get(name).cloned().unwrap_or_default());
                }
            }
        }
        (Some(outcome), unavailable)
    } else {
        (None, Vec::new())
    };

    // Keep appendix keys consistent with the surviving override set
    // (retargeted pins leave their old key behind).
    next.retain(|key, _| {
        let name = package_name_from_key(key);
        kept.get(name)
            .is_some_and(|version| format!("{}@{}", name, version) == *key)
    });

    let manifest = appendix::update_package_json(
        &mut resolver,
        &UpdateArgs {
            path: root_path,
            config: &config,
            appendix: (!next.is_empty()).then_some(&next),
            overrides: (!kept.is_empty()).then_some(&kept),
            dry_run: opts.dry_run,
            is_testing: false,
        },
    )?;

    Ok(RunReport {
        overrides: kept,
        appendix: next,
        removed,
        tree,
        security,
        unavailable,
        manifest,
    })
}

/// Leftover bookkeeping that still warrants a cleanup write: an override
/// field (even an emptied one) or a stored appendix.
fn has_override_bookkeeping(root: &PackageJson) -> bool {
    root.resolutions.is_some()
        || root.overrides.is_some()
        || root.pnpm.as_ref().is_some_and(|p| p.overrides.is_some())
        || root
            .pastoralist
            .as_ref()
            .is_some_and(|section| section.contains_key("appendix"))
}

/// Packages the security pass queries: the root manifest's direct
/// dependencies, with range sigils trimmed to a bare version guess.
fn security_targets(root: &PackageJson) -> BTreeMap<String, String> {
    let mut targets = BTreeMap::new();
    for table in [root.dependencies.as_ref(), root.dev_dependencies.as_ref()]
        .into_iter()
        .flatten()
    {
        for (name, range) in table {
            let version = range.trim_start_matches(['^', '~', '>', '<', '=', ' ']);
            targets.insert(name.clone(), version.to_string());
        }
    }
    targets
}
