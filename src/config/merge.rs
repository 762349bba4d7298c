use std::collections::BTreeMap;

use super::{Config, SecurityConfig};
use crate::appendix::{Appendix, AppendixItem};

// ─── Merge ─────────────────────────────────────────────────────────

/// Merge the external config with the manifest-embedded one.
///
/// Top level is right-biased: the embedded side wins. The four
/// bookkeeping keys — `appendix`, `overridePaths`, `resolutionPaths`,
/// `security` — are deep-unioned instead, so neither source clobbers the
/// other's records.
pub fn merge_configs(external: Option<&Config>, embedded: Option<&Config>) -> Config {
    let ext = external.cloned().unwrap_or_default();
    let emb = embedded.cloned().unwrap_or_default();

    Config {
        appendix: union_appendix(ext.appendix, emb.appendix),
        dep_paths: emb.dep_paths.or(ext.dep_paths),
        check_security: emb.check_security.or(ext.check_security),
        override_paths: union_path_map(ext.override_paths, emb.override_paths),
        resolution_paths: union_path_map(ext.resolution_paths, emb.resolution_paths),
        security: union_security(ext.security, emb.security),
    }
}

/// Keys present in either side are kept; a key present in both unions
/// the two items.
fn union_appendix(ext: Option<Appendix>, emb: Option<Appendix>) -> Option<Appendix> {
    match (ext, emb) {
        (None, None) => None,
        (Some(one), None) | (None, Some(one)) => Some(one),
        (Some(ext), Some(emb)) => {
            let mut merged = ext;
            for (key, emb_item) in emb {
                let item = match merged.remove(&key) {
                    Some(ext_item) => union_appendix_item(ext_item, emb_item),
                    None => emb_item,
                };
                merged.insert(key, item);
            }
            Some(merged)
        }
    }
}

/// Union `dependents` by key (embedded wins a conflicting key); other
/// fields take the embedded side when set.
fn union_appendix_item(ext: AppendixItem, emb: AppendixItem) -> AppendixItem {
    let dependents = match (ext.dependents, emb.dependents) {
        (None, None) => None,
        (Some(one), None) | (None, Some(one)) => Some(one),
        (Some(mut ext_deps), Some(emb_deps)) => {
            ext_deps.extend(emb_deps);
            Some(ext_deps)
        }
    };
    AppendixItem {
        root_deps: emb.root_deps.or(ext.root_deps),
        dependents,
        patches: emb.patches.or(ext.patches),
        ledger: emb.ledger.or(ext.ledger),
    }
}

fn union_path_map(
    ext: Option<BTreeMap<String, Vec<String>>>,
    emb: Option<BTreeMap<String, Vec<String>>>,
) -> Option<BTreeMap<String, Vec<String>>> {
    match (ext, emb) {
        (None, None) => None,
        (Some(one), None) | (None, Some(one)) => Some(one),
        (Some(mut ext_map), Some(emb_map)) => {
            ext_map.extend(emb_map);
            Some(ext_map)
        }
    }
}

fn union_security(
    ext: Option<SecurityConfig>,
    emb: Option<SecurityConfig>,
) -> Option<SecurityConfig> {
    match (ext, emb) {
        (None, None) => None,
        (Some(one), None) | (None, Some(one)) => Some(one),
        (Some(ext), Some(emb)) => Some(SecurityConfig {
            provider: emb.provider.or(ext.provider),
            severity_threshold: emb.severity_threshold.or(ext.severity_threshold),
            exclude_packages: emb.exclude_packages.or(ext.exclude_packages),
            auto_fix: emb.auto_fix.or(ext.auto_fix),
            interactive: emb.interactive.or(ext.interactive),
        }),
    }
}
