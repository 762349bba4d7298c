use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

// ─── Patch Detection ───────────────────────────────────────────────

/// Directories scanned for patch files, relative to the project root.
const PATCH_DIRS: &[&str] = &["patches", ".patches"];

/// Find patch files for the overridden packages.
///
/// Follows the patch-package naming convention: `lodash+4.17.21.patch`,
/// scoped packages with the slash encoded (`@scope+name+1.2.3.patch`).
/// A bare `lodash.patch` also counts. Missing or unreadable patch
/// directories yield no matches, never an error.
pub fn find_patch_files(root: &Path, names: &BTreeSet<String>) -> BTreeMap<String, Vec<String>> {
    let mut found: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for dir in PATCH_DIRS {
        let dir_path = root.join(dir);
        if !dir_path.is_dir() {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir_path) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "patch") {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            for name in names {
                if patch_matches(file_name, name) {
                    found
                        .entry(name.clone())
                        .or_default()
                        .push(format!("{}/{}", dir, file_name));
                }
            }
        }
    }

    for files in found.values_mut() {
        files.sort();
        files.dedup();
    }
    found
}

fn patch_matches(file_name: &str, package: &str) -> bool {
    let encoded = package.replace('/', "+");
    file_name == format!("{}.patch", encoded)
        || file_name.starts_with(&format!("{}+", encoded))
}
