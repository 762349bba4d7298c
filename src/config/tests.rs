use std::collections::BTreeMap;
use std::fs;

use serde_json::json;

use super::*;
use crate::appendix::{Appendix, AppendixItem};
use crate::security::{ProviderName, ProviderSpec, Severity};
use crate::workspace::DepPaths;

// ── Validation ─────────────────────────────────────────────

#[test]
fn test_validate_accepts_full_config() {
    let value = json!({
        "depPaths": ["packages/*/package.json"],
        "checkSecurity": true,
        "overridePaths": {"lodash": ["package.json"]},
        "security": {
            "provider": ["osv", "github"],
            "severityThreshold": "high",
            "excludePackages": ["left-pad"],
            "autoFix": true
        }
    });
    let config = validate_config(&value).unwrap();
    assert_eq!(config.check_security, Some(true));
    let security = config.security.unwrap();
    assert_eq!(
        security.provider,
        Some(ProviderSpec::Many(vec![
            ProviderName::Osv,
            ProviderName::Github,
        ]))
    );
    assert_eq!(security.severity_threshold, Some(Severity::High));
}

#[test]
fn test_validate_rejects_unknown_field() {
    let err = validate_config(&json!({"depsPath": []})).unwrap_err();
    assert!(err.starts_with("Invalid config structure"), "got: {}", err);
}

#[test]
fn test_validate_rejects_unknown_provider() {
    let value = json!({"security": {"provider": "acme"}});
    assert!(validate_config(&value).is_err());
    assert!(safe_validate_config(&value).is_none());
}

#[test]
fn test_validate_rejects_unknown_severity() {
    let value = json!({"security": {"severityThreshold": "catastrophic"}});
    assert!(validate_config(&value).is_err());
}

#[test]
fn test_validate_rejects_wrong_type() {
    assert!(validate_config(&json!({"checkSecurity": "yes"})).is_err());
}

#[test]
fn test_validate_rejects_unknown_sentinel() {
    assert!(validate_config(&json!({"depPaths": "everywhere"})).is_err());
    let config = validate_config(&json!({"depPaths": "workspaces"})).unwrap();
    assert_eq!(
        config.dep_paths,
        Some(DepPaths::Sentinel("workspaces".to_string()))
    );
}

// ── External config loading ────────────────────────────────

#[test]
fn test_loader_respects_candidate_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".pastoralistrc.json"),
        r#"{"checkSecurity": true}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("pastoralist.json"),
        r#"{"checkSecurity": false}"#,
    )
    .unwrap();

    // .pastoralistrc.json precedes pastoralist.json in the candidate list.
    let config = load_external_config(dir.path()).unwrap();
    assert_eq!(config.check_security, Some(true));
}

#[test]
fn test_loader_skips_invalid_candidate() {
    let dir = tempfile::tempdir().unwrap();
    // First candidate is malformed JSON, second fails validation,
    // third is good.
    fs::write(dir.path().join(".pastoralistrc"), "{ nope").unwrap();
    fs::write(
        dir.path().join(".pastoralistrc.json"),
        r#"{"unknownKey": 1}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("pastoralist.json"),
        r#"{"depPaths": ["packages/*/package.json"]}"#,
    )
    .unwrap();

    let config = load_external_config(dir.path()).unwrap();
    assert_eq!(
        config.dep_paths,
        Some(DepPaths::Patterns(vec![
            "packages/*/package.json".to_string()
        ]))
    );
}

#[test]
fn test_loader_no_candidates_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_external_config(dir.path()).is_none());
}

#[test]
fn test_candidate_list_matches_contract() {
    let names: Vec<&str> = CONFIG_SOURCES.iter().map(|s| s.filename).collect();
    assert_eq!(
        names,
        [
            ".pastoralistrc",
            ".pastoralistrc.json",
            "pastoralist.json",
            "pastoralist.config.js",
            "pastoralist.config.ts",
        ]
    );
    assert_eq!(CONFIG_SOURCES[3].format, ConfigFormat::ScriptModule);
}

// ── Merge ──────────────────────────────────────────────────

fn appendix_with(key: &str, dependents: &[(&str, &str)]) -> Appendix {
    let mut appendix = Appendix::new();
    appendix.insert(
        key.to_string(),
        AppendixItem {
            dependents: Some(
                dependents
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..AppendixItem::default()
        },
    );
    appendix
}

#[test]
fn test_merge_top_level_right_biased() {
    let external = Config {
        check_security: Some(false),
        dep_paths: Some(DepPaths::Sentinel("workspace".to_string())),
        ..Config::default()
    };
    let embedded = Config {
        check_security: Some(true),
        ..Config::default()
    };

    let merged = merge_configs(Some(&external), Some(&embedded));
    // Embedded wins where set; external fills the gaps.
    assert_eq!(merged.check_security, Some(true));
    assert_eq!(
        merged.dep_paths,
        Some(DepPaths::Sentinel("workspace".to_string()))
    );
}

#[test]
fn test_merge_unions_appendix_keys() {
    let external = appendix_with("lodash@4.17.21", &[("pkg-a", "^4.0.0")]);
    let embedded = appendix_with("minimist@1.2.8", &[("pkg-b", "^1.0.0")]);

    let merged = merge_configs(
        Some(&Config {
            appendix: Some(external),
            ..Config::default()
        }),
        Some(&Config {
            appendix: Some(embedded),
            ..Config::default()
        }),
    );

    let appendix = merged.appendix.unwrap();
    assert_eq!(appendix.len(), 2);
    assert!(appendix.contains_key("lodash@4.17.21"));
    assert!(appendix.contains_key("minimist@1.2.8"));
}

#[test]
fn test_merge_unions_dependents_of_shared_key() {
    let external = appendix_with("lodash@4.17.21", &[("pkg-a", "^4.0.0")]);
    let embedded = appendix_with("lodash@4.17.21", &[("pkg-b", "^4.1.0")]);

    let merged = merge_configs(
        Some(&Config {
            appendix: Some(external),
            ..Config::default()
        }),
        Some(&Config {
            appendix: Some(embedded),
            ..Config::default()
        }),
    );

    let deps = merged.appendix.unwrap()["lodash@4.17.21"]
        .dependents
        .clone()
        .unwrap();
    // Neither side overwrote the other.
    assert_eq!(deps.len(), 2);
    assert_eq!(deps["pkg-a"], "^4.0.0");
    assert_eq!(deps["pkg-b"], "^4.1.0");
}

#[test]
fn test_merge_conflicting_dependent_takes_embedded() {
    let external = appendix_with("lodash@4.17.21", &[("pkg-a", "^4.0.0")]);
    let embedded = appendix_with("lodash@4.17.21", &[("pkg-a", "^4.2.0")]);

    let merged = merge_configs(
        Some(&Config {
            appendix: Some(external),
            ..Config::default()
        }),
        Some(&Config {
            appendix: Some(embedded),
            ..Config::default()
        }),
    );

    assert_eq!(
        merged.appendix.unwrap()["lodash@4.17.21"]
            .dependents
            .clone()
            .unwrap()["pkg-a"],
        "^4.2.0"
    );
}

#[test]
fn test_merge_unions_override_paths_and_security() {
    let external = Config {
        override_paths: Some(BTreeMap::from([(
            "lodash".to_string(),
            vec!["package.json".to_string()],
        )])),
        security: Some(SecurityConfig {
            provider: Some(ProviderSpec::One(ProviderName::Osv)),
            severity_threshold: Some(Severity::Low),
            ..SecurityConfig::default()
        }),
        ..Config::default()
    };
    let embedded = Config {
        override_paths: Some(BTreeMap::from([(
            "minimist".to_string(),
            vec!["packages/a/package.json".to_string()],
        )])),
        security: Some(SecurityConfig {
            severity_threshold: Some(Severity::High),
            ..SecurityConfig::default()
        }),
        ..Config::default()
    };

    let merged = merge_configs(Some(&external), Some(&embedded));

    let paths = merged.override_paths.unwrap();
    assert_eq!(paths.len(), 2);

    let security = merged.security.unwrap();
    // Keys from either side survive; embedded wins the conflict.
    assert_eq!(security.provider, Some(ProviderSpec::One(ProviderName::Osv)));
    assert_eq!(security.severity_threshold, Some(Severity::High));
}

#[test]
fn test_merge_with_one_side_absent() {
    let only = Config {
        check_security: Some(true),
        ..Config::default()
    };
    assert_eq!(merge_configs(Some(&only), None), only);
    assert_eq!(merge_configs(None, Some(&only)), only);
    assert_eq!(merge_configs(None, None), Config::default());
}
