use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Map;
use tracing::{debug, info};

use super::{hint, Appendix};
use crate::config::Config;
use crate::manifest::{self, PackageJson, Resolver};

// ─── Manifest Persistence ──────────────────────────────────────────

/// Arguments for [`update_package_json`].
pub struct UpdateArgs<'a> {
    pub path: &'a Path,
    pub config: &'a Config,
    pub appendix: Option<&'a Appendix>,
    pub overrides: Option<&'a BTreeMap<String, String>>,
    /// Compute the resulting manifest without writing it.
    pub dry_run: bool,
    /// Like `dry_run`, set by test fixtures.
    pub is_testing: bool,
}

/// Apply overrides and the appendix to the manifest at `args.path` and
/// persist it.
///
/// With a populated override map, the map is written into the active field
/// (an existing field wins over the detected manager's preference) and the
/// appendix is stored under `pastoralist.appendix`. With an empty or absent
/// map, every override field is removed — a `pnpm` section left with no
/// other keys is dropped entirely — and `pastoralist.appendix` is removed
/// while sibling `pastoralist.*` keys stay untouched.
///
/// The write is skipped under `dry_run`/`is_testing`; a real write
/// invalidates the resolver's cache entry for `path` immediately. Disk
/// failures propagate — persistence was explicitly requested.
pub fn update_package_json(
    resolver: &mut Resolver,
    args: &UpdateArgs,
) -> Result<PackageJson, String> {
    let manifest = resolver
        .resolve(args.path)
        .ok_or_else(|| format!("cannot read manifest '{}'", args.path.display()))?;
    let mut manifest = (*manifest).clone();

    let root_dir = args.path.parent().unwrap_or(Path::new("."));
    let pm = manifest::detect_package_manager(root_dir);

    let overrides = args.overrides.cloned().unwrap_or_default();
    let appendix_len = args.appendix.map_or(0, |a| a.len());

    if overrides.is_empty() {
        // Nothing left to pin: drop whichever override fields remain,
        // populated or not, and the stored appendix.
        if manifest.resolutions.is_some() {
            manifest::remove_override_field(&mut manifest, manifest::OverrideField::Resolutions);
        }
        if manifest.overrides.is_some() {
            manifest::remove_override_field(&mut manifest, manifest::OverrideField::Overrides);
        }
        if manifest.pnpm.is_some() {
            manifest::remove_override_field(&mut manifest, manifest::OverrideField::Pnpm);
        }
        remove_stored_appendix(&mut manifest);
    } else {
        let field = manifest::active_field(&manifest, pm);
        manifest::apply_overrides(&mut manifest, &overrides, Some(field));
        if let Some(appendix) = args.appendix {
            store_appendix(&mut manifest, appendix)?;
        }
    }

    if args.dry_run || args.is_testing {
        debug!(path = %args.path.display(), "dry run: skipping write");
        return Ok(manifest);
    }

    let json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| format!("cannot serialize manifest '{}': {}", args.path.display(), e))?;
    std::fs::write(args.path, format!("{}\n", json))
        .map_err(|e| format!("cannot write manifest '{}': {}", args.path.display(), e))?;
    resolver.invalidate(args.path);
    info!(path = %args.path.display(), overrides = overrides.len(), "manifest updated");

    hint::maybe_suggest_external_config(appendix_len);

    Ok(manifest)
}

/// Serialize the appendix under `pastoralist.appendix`, keeping sibling
/// keys of the `pastoralist` section.
fn store_appendix(manifest: &mut PackageJson, appendix: &Appendix) -> Result<(), String> {
    let value = serde_json::to_value(appendix)
        .map_err(|e| format!("cannot serialize appendix: {}", e))?;
    let section = manifest.pastoralist.get_or_insert_with(Map::new);
    section.insert("appendix".to_string(), value);
    Ok(())
}

/// Remove `pastoralist.appendix`; an emptied `pastoralist` section is
/// dropped, one with remaining keys (depPaths, security, …) is kept.
fn remove_stored_appendix(manifest: &mut PackageJson) {
    if let Some(section) = manifest.pastoralist.as_mut() {
        section.remove("appendix");
        if section.is_empty() {
            manifest.pastoralist = None;
        }
    }
}
