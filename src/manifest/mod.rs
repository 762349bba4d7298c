//! Manifest access for pastoralist.
//!
//! Reads and rewrites `package.json` documents. Two concerns live here:
//!   - **Resolver** — cached manifest loading, keyed by absolute path.
//!   - **Fields** — which manifest key carries overrides for the active
//!     package manager (`resolutions`, `overrides`, or `pnpm.overrides`).
//!
//! Unknown manifest keys are preserved verbatim through a flattened tail map,
//! so a rewrite never loses fields this tool does not understand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─── Data Types ────────────────────────────────────────────────────

/// A parsed `package.json`, root or workspace member.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<BTreeMap<String, String>>,
    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "Option::is_none"
    )]
    pub dev_dependencies: Option<BTreeMap<String, String>>,
    #[serde(
        default,
        rename = "peerDependencies",
        skip_serializing_if = "Option::is_none"
    )]
    pub peer_dependencies: Option<BTreeMap<String, String>>,
    #[serde(
        default,
        rename = "optionalDependencies",
        skip_serializing_if = "Option::is_none"
    )]
    pub optional_dependencies: Option<BTreeMap<String, String>>,
    /// npm/bun override field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<BTreeMap<String, String>>,
    /// yarn override field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolutions: Option<BTreeMap<String, String>>,
    /// pnpm section; overrides live at `pnpm.overrides`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnpm: Option<PnpmSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspaces: Option<Workspaces>,
    /// Embedded tool section: config keys plus the stored appendix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pastoralist: Option<Map<String, Value>>,
    /// Every other manifest key, preserved as-is on rewrite.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// The `pnpm` manifest section. Sibling keys (hoist flags and the like)
/// survive override rewrites via the flattened tail.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PnpmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl PnpmSection {
    /// True when removing `overrides` would leave nothing behind.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_none() && self.rest.is_empty()
    }
}

/// The `workspaces` field: a bare pattern array, or yarn's object form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    Patterns(Vec<String>),
    Detailed {
        packages: Vec<String>,
        #[serde(flatten)]
        rest: Map<String, Value>,
    },
}

impl Workspaces {
    pub fn patterns(&self) -> &[String] {
        match self {
            Workspaces::Patterns(patterns) => patterns,
            Workspaces::Detailed { packages, .. } => packages,
        }
    }
}

mod fields;
mod resolve;

pub use fields::{
    active_field, apply_overrides, detect_package_manager, existing_field, field_for_manager,
    override_map, remove_override_field, OverrideField, PackageManager,
};
pub use resolve::{find_root_manifest, Resolver};
