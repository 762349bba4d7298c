use std::collections::BTreeMap;

use chrono::Utc;

use super::{package_name_from_key, Appendix, AppendixItem, DependencyTree, Ledger};
use crate::manifest::PackageJson;

// ─── Reconciliation ────────────────────────────────────────────────

/// Compute the next appendix from the current overrides, the dependency
/// tree, and the previous appendix.
///
/// Per override `name@version`:
///   - `dependents` = every current requester of `name` (presence only —
///     range satisfaction is not checked);
///   - `rootDeps` = `name` when the root manifest depends on it directly;
///   - `patches` = patch files detected for `name`, falling back to the
///     previous entry's list;
///   - `ledger` carried forward unchanged; new entries get a fresh
///     `addedDate`. Only the security hook rewrites ledger stamps.
pub fn update_appendix(
    overrides: &BTreeMap<String, String>,
    tree: &DependencyTree,
    root_manifest: &PackageJson,
    previous: Option<&Appendix>,
    patches: &BTreeMap<String, Vec<String>>,
) -> Appendix {
    let mut next = Appendix::new();

    for (name, version) in overrides {
        let key = format!("{}@{}", name, version);
        let prior = previous.and_then(|appendix| appendix.get(&key));

        let dependents = tree.get(name).cloned().unwrap_or_default();

        let root_deps: Vec<String> = if is_root_dependency(root_manifest, name) {
            vec![name.clone()]
        } else {
            Vec::new()
        };

        let patch_files = patches
            .get(name)
            .cloned()
            .filter(|files| !files.is_empty())
            .or_else(|| prior.and_then(|item| item.patches.clone()));

        let ledger = prior.and_then(|item| item.ledger.clone()).or_else(|| {
            Some(Ledger {
                added_date: Utc::now().to_rfc3339(),
                ..Ledger::default()
            })
        });

        next.insert(
            key,
            AppendixItem {
                root_deps: (!root_deps.is_empty()).then_some(root_deps),
                dependents: Some(dependents),
                patches: patch_files,
                ledger,
            },
        );
    }

    next
}

fn is_root_dependency(root: &PackageJson, name: &str) -> bool {
    root.dependencies
        .as_ref()
        .is_some_and(|deps| deps.contains_key(name))
        || root
            .dev_dependencies
            .as_ref()
            .is_some_and(|deps| deps.contains_key(name))
}

/// Bare package names of every entry whose `dependents` is empty or
/// absent — the overrides nobody needs anymore.
pub fn find_removable_appendix_items(appendix: &Appendix) -> Vec<String> {
    appendix
        .iter()
        .filter(|(_, item)| item.is_removable())
        .map(|(key, _)| package_name_from_key(key).to_string())
        .collect()
}
