use std::collections::BTreeMap;
use std::path::Path;

use super::{PackageJson, PnpmSection};

// ─── Package Manager Detection ─────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackageManager {
    Bun,
    Yarn,
    Pnpm,
    Npm,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Bun => "bun",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Npm => "npm",
        }
    }
}

/// Lockfile probes in priority order; first hit wins.
const LOCKFILES: &[(&str, PackageManager)] = &[
    ("bun.lockb", PackageManager::Bun),
    ("bun.lock", PackageManager::Bun),
    ("yarn.lock", PackageManager::Yarn),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
];

/// Detect the active package manager from lockfile presence in `root`.
/// No lockfile means npm.
pub fn detect_package_manager(root: &Path) -> PackageManager {
    for (lockfile, pm) in LOCKFILES {
        if root.join(lockfile).exists() {
            return *pm;
        }
    }
    PackageManager::Npm
}

// ─── Override Fields ───────────────────────────────────────────────

/// Which manifest key carries overrides. The three are mutually exclusive;
/// `None` at call sites means no field is populated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverrideField {
    Resolutions,
    Overrides,
    Pnpm,
}

impl OverrideField {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideField::Resolutions => "resolutions",
            OverrideField::Overrides => "overrides",
            OverrideField::Pnpm => "pnpm",
        }
    }
}

/// First populated field, in priority order:
/// `resolutions` > `overrides` > `pnpm.overrides`.
pub fn existing_field(manifest: &PackageJson) -> Option<OverrideField> {
    if manifest.resolutions.as_ref().is_some_and(|m| !m.is_empty()) {
        return Some(OverrideField::Resolutions);
    }
    if manifest.overrides.as_ref().is_some_and(|m| !m.is_empty()) {
        return Some(OverrideField::Overrides);
    }
    if manifest
        .pnpm
        .as_ref()
        .and_then(|p| p.overrides.as_ref())
        .is_some_and(|m| !m.is_empty())
    {
        return Some(OverrideField::Pnpm);
    }
    None
}

/// The field a package manager would use for new overrides.
pub fn field_for_manager(pm: PackageManager) -> OverrideField {
    match pm {
        PackageManager::Yarn => OverrideField::Resolutions,
        PackageManager::Pnpm => OverrideField::Pnpm,
        PackageManager::Npm | PackageManager::Bun => OverrideField::Overrides,
    }
}

/// The field to write into: an existing field always wins over the
/// manager's preferred one.
pub fn active_field(manifest: &PackageJson, pm: PackageManager) -> OverrideField {
    existing_field(manifest).unwrap_or_else(|| field_for_manager(pm))
}

/// Current override map from whichever field is populated.
pub fn override_map(manifest: &PackageJson) -> BTreeMap<String, String> {
    match existing_field(manifest) {
        Some(OverrideField::Resolutions) => manifest.resolutions.clone().unwrap_or_default(),
        Some(OverrideField::Overrides) => manifest.overrides.clone().unwrap_or_default(),
        Some(OverrideField::Pnpm) => manifest
            .pnpm
            .as_ref()
            .and_then(|p| p.overrides.clone())
            .unwrap_or_default(),
        None => BTreeMap::new(),
    }
}

/// Write `overrides` into the selected field. Writing into `pnpm` merges
/// into the existing section so sibling keys survive. A `None` field is a
/// no-op, not an error.
pub fn apply_overrides(
    manifest: &mut PackageJson,
    overrides: &BTreeMap<String, String>,
    field: Option<OverrideField>,
) {
    match field {
        None => {}
        Some(OverrideField::Resolutions) => manifest.resolutions = Some(overrides.clone()),
        Some(OverrideField::Overrides) => manifest.overrides = Some(overrides.clone()),
        Some(OverrideField::Pnpm) => {
            let pnpm = manifest.pnpm.get_or_insert_with(PnpmSection::default);
            pnpm.overrides = Some(overrides.clone());
        }
    }
}

/// Remove a field from the manifest. An emptied `pnpm` section is dropped
/// entirely; one with remaining sibling keys is kept.
pub fn remove_override_field(manifest: &mut PackageJson, field: OverrideField) {
    match field {
        OverrideField::Resolutions => manifest.resolutions = None,
        OverrideField::Overrides => manifest.overrides = None,
        OverrideField::Pnpm => {
            if let Some(pnpm) = manifest.pnpm.as_mut() {
                pnpm.overrides = None;
                if pnpm.is_empty() {
                    manifest.pnpm = None;
                }
            }
        }
    }
}
