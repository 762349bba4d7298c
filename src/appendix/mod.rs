//! The appendix: a ledger of why each override exists and who still needs it.
//!
//! Keys are `"<name>@<version>"`; scoped packages keep their scope, so a key
//! can carry two `@` characters (`@scope/name@1.2.3`). The version separator
//! is always the **last** `@`.
//!
//! An entry with no recorded dependents marks a removable override. Ledger
//! fields are append-only across reconciliation runs; only the security hook
//! may overwrite the three `security*` stamps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::security::ProviderName;

// ─── Data Types ────────────────────────────────────────────────────

/// Ledger keyed by `"<name>@<version>"`.
pub type Appendix = BTreeMap<String, AppendixItem>;

/// Provenance of one override.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendixItem {
    /// Names among the root manifest's direct dependencies equal to the
    /// overridden package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_deps: Option<Vec<String>>,
    /// Requester package name → requested range. Empty or absent means
    /// nobody needs the override anymore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependents: Option<BTreeMap<String, String>>,
    /// Patch files on disk that touch the overridden package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patches: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<Ledger>,
}

impl AppendixItem {
    /// Removable iff `dependents` is empty or absent.
    pub fn is_removable(&self) -> bool {
        self.dependents.as_ref().map_or(true, |d| d.is_empty())
    }
}

/// Per-item provenance metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub added_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_check_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_provider: Option<ProviderName>,
}

/// Bare package name from an appendix key: everything before the last `@`.
/// `@scope/name@1.2.3` yields `@scope/name`; a key without a version
/// separator is returned whole.
pub fn package_name_from_key(key: &str) -> &str {
    match key.rfind('@') {
        Some(idx) if idx > 0 => &key[..idx],
        _ => key,
    }
}

/// Current Unix timestamp in seconds (shared by the hint state file).
pub(crate) fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

mod hint;
mod patches;
mod persist;
mod reconcile;
mod tree;

pub use patches::find_patch_files;
pub use persist::{update_package_json, UpdateArgs};
pub use reconcile::{find_removable_appendix_items, update_appendix};
pub use tree::{DependencyTree, TreeBuilder};

#[cfg(test)]
mod tests;
