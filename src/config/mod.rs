//! Tool configuration.
//!
//! Two sources per run: an external config file (first valid candidate from
//! a fixed filename list) and the manifest's embedded `pastoralist` section,
//! merged right-biased — the embedded side wins at the top level, while
//! `appendix`/`overridePaths`/`resolutionPaths`/`security` are deep-unioned
//! key by key. The merged config is immutable for the rest of the run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::appendix::Appendix;
use crate::security::{ProviderSpec, Severity};
use crate::workspace::DepPaths;

// ─── Data Types ────────────────────────────────────────────────────

/// Tool configuration. The schema is closed: unknown fields, wrong types,
/// and unknown enum values all fail validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appendix: Option<Appendix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dep_paths: Option<DepPaths>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_security: Option<bool>,
    /// Package name → manifest paths carrying its override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_paths: Option<BTreeMap<String, Vec<String>>>,
    /// Package name → manifest paths carrying its resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_paths: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecurityConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_threshold: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_packages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_fix: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
}

mod loader;
mod merge;
mod validate;

pub use loader::{load_config, load_external_config, ConfigFormat, ConfigSource, CONFIG_SOURCES};
pub use merge::merge_configs;
pub use validate::{safe_validate_config, validate_config};

#[cfg(test)]
mod tests;
