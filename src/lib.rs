//! Keep dependency overrides honest.
//!
//! Package manifests accumulate forced-version pins — `overrides`,
//! `resolutions`, `pnpm.overrides` — to patch transitive vulnerabilities and
//! bugs, and nobody remembers later which pins are still needed. pastoralist
//! tracks an append-only ledger (the *appendix*) recording why each override
//! exists and who still depends on it, and prunes overrides once no package
//! requires them anymore.
//!
//! Pipeline per run: resolve manifests (cached), detect the active override
//! field, expand workspace globs, walk the dependency tables, reconcile the
//! appendix, and write the manifest back. See [`run::run_reconciliation`].

pub mod appendix;
pub mod config;
pub mod manifest;
pub mod run;
pub mod security;
pub mod workspace;

// Re-exports — the operations every entry point reaches for.
pub use appendix::{
    find_patch_files, find_removable_appendix_items, package_name_from_key, update_appendix,
    update_package_json, Appendix, AppendixItem, DependencyTree, Ledger, TreeBuilder, UpdateArgs,
};
pub use config::{
    load_config, load_external_config, merge_configs, safe_validate_config, validate_config,
    Config, SecurityConfig,
};
pub use manifest::{
    active_field, apply_overrides, detect_package_manager, existing_field, field_for_manager,
    find_root_manifest, override_map, OverrideField, PackageJson, PackageManager, Resolver,
};
pub use run::{run_reconciliation, RunOptions, RunReport};
pub use security::{
    apply_security_findings, collect_findings, Finding, Prompt, ProviderName, ProviderRegistry,
    ProviderSpec, Report, SecurityOutcome, Severity, VulnerabilityInfo, VulnerabilityProvider,
};
pub use workspace::{find_package_json_files, resolve_dep_paths, DepPaths};
