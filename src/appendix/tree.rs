use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::manifest::{PackageJson, Resolver};

// ─── Dependency Tree ───────────────────────────────────────────────

/// Overridden package name → requester package name → requested range.
///
/// Ranges are recorded verbatim; whether a range is still satisfied by the
/// pinned version is deliberately not checked — pruning looks only at the
/// presence of dependents.
pub type DependencyTree = BTreeMap<String, BTreeMap<String, String>>;

type CacheKey = (Vec<PathBuf>, Vec<String>);

/// Builds dependency trees over a set of manifest files, caching the walk
/// per (file set, name set) within one run.
pub struct TreeBuilder {
    cache: BTreeMap<CacheKey, DependencyTree>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            cache: BTreeMap::new(),
        }
    }

    /// Walk `files` and record, for every package in `names`, who requests
    /// it and at what range. Scoped names (`@scope/name`) are matched by
    /// full name. Unreadable or malformed manifests are skipped; the walk
    /// continues with the rest.
    pub fn build(
        &mut self,
        resolver: &mut Resolver,
        files: &[PathBuf],
        names: &BTreeSet<String>,
    ) -> DependencyTree {
        let key: CacheKey = (files.to_vec(), names.iter().cloned().collect());
        if let Some(tree) = self.cache.get(&key) {
            debug!("dependency tree cache hit");
            return tree.clone();
        }

        let mut tree: DependencyTree = names
            .iter()
            .map(|name| (name.clone(), BTreeMap::new()))
            .collect();

        for file in files {
            let Some(manifest) = resolver.resolve(file) else {
                warn!(path = %file.display(), "skipping unreadable manifest");
                continue;
            };
            let requester = manifest
                .name
                .clone()
                .unwrap_or_else(|| file.display().to_string());

            for table in dependency_tables(&manifest) {
                for (dep_name, range) in table {
                    if let Some(requesters) = tree.get_mut(dep_name) {
                        requesters.insert(requester.clone(), range.clone());
                    }
                }
            }
        }

        self.cache.insert(key, tree.clone());
        tree
    }

    /// Reset the per-run cache.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The four dependency tables a manifest can declare.
fn dependency_tables(
    manifest: &PackageJson,
) -> impl Iterator<Item = &BTreeMap<String, String>> {
    [
        manifest.dependencies.as_ref(),
        manifest.dev_dependencies.as_ref(),
        manifest.peer_dependencies.as_ref(),
        manifest.optional_dependencies.as_ref(),
    ]
    .into_iter()
    .flatten()
}
