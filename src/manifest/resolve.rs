use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::PackageJson;

// ─── Manifest Cache ────────────────────────────────────────────────

/// Cached manifest loader.
///
/// Parses are cached by canonical path, so repeated resolves of the same
/// file within one run return the identical `Arc`. The cache is owned by
/// the resolver instance (no ambient state): the reconciliation run holds
/// one, and tests construct their own isolated instances.
///
/// Freshness after writes relies on [`Resolver::invalidate`] being called
/// immediately after every real (non-dry-run) write; the persist step does
/// exactly that.
pub struct Resolver {
    cache: BTreeMap<PathBuf, Arc<PackageJson>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            cache: BTreeMap::new(),
        }
    }

    /// Canonical cache key; falls back to the given path for files that
    /// do not exist (yet).
    fn cache_key(path: &Path) -> PathBuf {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// Read and parse a manifest. Missing file or malformed JSON returns
    /// `None` — never an error; the caller decides whether that is fatal.
    pub fn resolve(&mut self, path: &Path) -> Option<Arc<PackageJson>> {
        let key = Self::cache_key(path);
        if let Some(cached) = self.cache.get(&key) {
            debug!(path = %key.display(), "manifest cache hit");
            return Some(Arc::clone(cached));
        }

        let content = std::fs::read_to_string(&key).ok()?;
        let manifest: PackageJson = serde_json::from_str(&content).ok()?;

        let manifest = Arc::new(manifest);
        self.cache.insert(key, Arc::clone(&manifest));
        Some(manifest)
    }

    /// Drop the cache entry for a path. Called after every real write so a
    /// subsequent resolve re-reads the file.
    pub fn invalidate(&mut self, path: &Path) {
        self.cache.remove(&Self::cache_key(path));
    }

    /// Drop every entry; returns how many were cleared.
    pub fn clear(&mut self) -> usize {
        let cleared = self.cache.len();
        self.cache.clear();
        cleared
    }

    pub fn size(&self) -> usize {
        self.cache.len()
    }

    pub fn keys(&self) -> Vec<PathBuf> {
        self.cache.keys().cloned().collect()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the nearest `package.json` in the given directory or its ancestors.
pub fn find_root_manifest(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join("package.json");
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}
