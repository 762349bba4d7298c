use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use super::*;
use crate::config::Config;
use crate::manifest::{PackageJson, Resolver};

fn overrides(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(name, version)| (name.to_string(), version.to_string()))
        .collect()
}

fn dependents(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    overrides(entries)
}

fn item_with_dependents(entries: &[(&str, &str)]) -> AppendixItem {
    AppendixItem {
        dependents: Some(dependents(entries)),
        ..AppendixItem::default()
    }
}

// ── Key parsing ────────────────────────────────────────────

#[test]
fn test_package_name_from_key() {
    assert_eq!(package_name_from_key("lodash@4.17.21"), "lodash");
    assert_eq!(package_name_from_key("@scope/name@1.2.3"), "@scope/name");
    // No version separator: returned whole.
    assert_eq!(package_name_from_key("lodash"), "lodash");
    assert_eq!(package_name_from_key("@scope/name"), "@scope/name");
}

// ── Removable items ────────────────────────────────────────

#[test]
fn test_removable_iff_dependents_empty_or_absent() {
    let mut appendix = Appendix::new();
    appendix.insert("lodash@4.17.21".to_string(), item_with_dependents(&[]));
    appendix.insert("minimist@1.2.8".to_string(), AppendixItem::default());
    appendix.insert(
        "semver@7.5.2".to_string(),
        item_with_dependents(&[("my-app", "^7.0.0")]),
    );

    let removable = find_removable_appendix_items(&appendix);
    assert_eq!(removable, vec!["lodash", "minimist"]);
}

#[test]
fn test_removable_scoped_package_uses_last_at() {
    let mut appendix = Appendix::new();
    appendix.insert("@babel/core@7.23.0".to_string(), item_with_dependents(&[]));

    assert_eq!(find_removable_appendix_items(&appendix), vec!["@babel/core"]);
}

// ── update_appendix ────────────────────────────────────────

fn root_manifest(json: &str) -> PackageJson {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_update_appendix_records_dependents_and_root_deps() {
    let overrides = overrides(&[("lodash", "4.17.21")]);
    let mut tree = DependencyTree::new();
    tree.insert(
        "lodash".to_string(),
        dependents(&[("pkg-a", "^4.17.0"), ("pkg-b", "~4.17.20")]),
    );
    let root = root_manifest(r#"{"name": "root", "dependencies": {"lodash": "^4.17.0"}}"#);

    let appendix = update_appendix(&overrides, &tree, &root, None, &BTreeMap::new());

    let item = &appendix["lodash@4.17.21"];
    assert_eq!(item.root_deps.as_deref(), Some(&["lodash".to_string()][..]));
    let deps = item.dependents.as_ref().unwrap();
    assert_eq!(deps.len(), 2);
    assert_eq!(deps["pkg-a"], "^4.17.0");
    assert!(item.ledger.as_ref().unwrap().added_date.contains('T'));
}

#[test]
fn test_update_appendix_dependents_ignore_range_satisfaction() {
    // The requester's range does not match the pinned version; the
    // dependent is recorded anyway.
    let overrides = overrides(&[("lodash", "4.17.21")]);
    let mut tree = DependencyTree::new();
    tree.insert("lodash".to_string(), dependents(&[("pkg-a", "^3.0.0")]));
    let root = root_manifest(r#"{"name": "root"}"#);

    let appendix = update_appendix(&overrides, &tree, &root, None, &BTreeMap::new());
    assert_eq!(
        appendix["lodash@4.17.21"].dependents.as_ref().unwrap()["pkg-a"],
        "^3.0.0"
    );
}

#[test]
fn test_update_appendix_carries_ledger_forward() {
    let overrides = overrides(&[("lodash", "4.17.21")]);
    let tree = DependencyTree::new();
    let root = root_manifest(r#"{"name": "root"}"#);

    let mut previous = Appendix::new();
    previous.insert(
        "lodash@4.17.21".to_string(),
        AppendixItem {
            ledger: Some(Ledger {
                added_date: "2024-03-01T00:00:00Z".to_string(),
                reason: Some("CVE-2021-23337".to_string()),
                ..Ledger::default()
            }),
            ..AppendixItem::default()
        },
    );

    let appendix = update_appendix(&overrides, &tree, &root, Some(&previous), &BTreeMap::new());
    let ledger = appendix["lodash@4.17.21"].ledger.as_ref().unwrap();
    assert_eq!(ledger.added_date, "2024-03-01T00:00:00Z");
    assert_eq!(ledger.reason.as_deref(), Some("CVE-2021-23337"));
}

#[test]
fn test_spec_scenario_lodash_removable() {
    // overrides {lodash: 4.17.21}, appendix entry with no dependents
    // → findRemovableAppendixItems returns ["lodash"].
    let overrides = overrides(&[("lodash", "4.17.21")]);
    let tree = DependencyTree::new();
    let root = root_manifest(r#"{"name": "root"}"#);

    let appendix = update_appendix(&overrides, &tree, &root, None, &BTreeMap::new());
    assert_eq!(find_removable_appendix_items(&appendix), vec!["lodash"]);
}

// ── Dependency tree ────────────────────────────────────────

fn write_manifest(dir: &Path, rel: &str, json: &str) -> std::path::PathBuf {
    let path = dir.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_tree_builder_walks_all_dependency_tables() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_manifest(
        dir.path(),
        "packages/a/package.json",
        r#"{"name": "pkg-a", "dependencies": {"lodash": "^4.17.0"}}"#,
    );
    let b = write_manifest(
        dir.path(),
        "packages/b/package.json",
        r#"{"name": "pkg-b", "devDependencies": {"lodash": "~4.17.20"}, "peerDependencies": {"react": "^18.0.0"}}"#,
    );

    let mut resolver = Resolver::new();
    let mut builder = TreeBuilder::new();
    let names: BTreeSet<String> =
        ["lodash".to_string(), "react".to_string()].into_iter().collect();

    let tree = builder.build(&mut resolver, &[a, b], &names);
    assert_eq!(tree["lodash"].len(), 2);
    assert_eq!(tree["lodash"]["pkg-b"], "~4.17.20");
    assert_eq!(tree["react"]["pkg-b"], "^18.0.0");
}

#[test]
fn test_tree_builder_skips_unreadable_manifests() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_manifest(
        dir.path(),
        "packages/good/package.json",
        r#"{"name": "good", "dependencies": {"lodash": "^4.17.0"}}"#,
    );
    let bad = write_manifest(dir.path(), "packages/bad/package.json", "{ broken");
    let missing = dir.path().join("packages/gone/package.json");

    let mut resolver = Resolver::new();
    let mut builder = TreeBuilder::new();
    let names: BTreeSet<String> = ["lodash".to_string()].into_iter().collect();

    let tree = builder.build(&mut resolver, &[good, bad, missing], &names);
    assert_eq!(tree["lodash"].len(), 1);
    assert!(tree["lodash"].contains_key("good"));
}

#[test]
fn test_tree_builder_matches_scoped_names_whole() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_manifest(
        dir.path(),
        "packages/a/package.json",
        r#"{"name": "pkg-a", "dependencies": {"@babel/core": "^7.0.0", "core": "^1.0.0"}}"#,
    );

    let mut resolver = Resolver::new();
    let mut builder = TreeBuilder::new();
    let names: BTreeSet<String> = ["@babel/core".to_string()].into_iter().collect();

    let tree = builder.build(&mut resolver, &[a], &names);
    assert_eq!(tree["@babel/core"].len(), 1);
    // The unscoped `core` dependency must not leak in.
    assert_eq!(tree.len(), 1);
}

// ── Patch detection ────────────────────────────────────────

#[test]
fn test_find_patch_files() {
    let dir = tempfile::tempdir().unwrap();
    let patches_dir = dir.path().join("patches");
    fs::create_dir_all(&patches_dir).unwrap();
    fs::write(patches_dir.join("lodash+4.17.21.patch"), "").unwrap();
    fs::write(patches_dir.join("@babel+core+7.23.0.patch"), "").unwrap();
    fs::write(patches_dir.join("unrelated.txt"), "").unwrap();

    let names: BTreeSet<String> = ["lodash".to_string(), "@babel/core".to_string()]
        .into_iter()
        .collect();
    let found = find_patch_files(dir.path(), &names);

    assert_eq!(found["lodash"], vec!["patches/lodash+4.17.21.patch"]);
    assert_eq!(found["@babel/core"], vec!["patches/@babel+core+7.23.0.patch"]);
}

#[test]
fn test_find_patch_files_without_patch_dir() {
    let dir = tempfile::tempdir().unwrap();
    let names: BTreeSet<String> = ["lodash".to_string()].into_iter().collect();
    assert!(find_patch_files(dir.path(), &names).is_empty());
}

// ── update_package_json ────────────────────────────────────

fn update_args<'a>(
    path: &'a Path,
    config: &'a Config,
    appendix: Option<&'a Appendix>,
    overrides: Option<&'a BTreeMap<String, String>>,
) -> UpdateArgs<'a> {
    UpdateArgs {
        path,
        config,
        appendix,
        overrides,
        dry_run: false,
        is_testing: false,
    }
}

#[test]
fn test_round_trip_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(dir.path(), "package.json", r#"{"name": "app"}"#);

    let config = Config::default();
    let pins = overrides(&[("lodash", "4.17.21")]);
    let mut resolver = Resolver::new();
    update_package_json(&mut resolver, &update_args(&path, &config, None, Some(&pins))).unwrap();

    // The cache was invalidated by the write, so this is a fresh read.
    let reloaded = resolver.resolve(&path).unwrap();
    assert_eq!(crate::manifest::override_map(&reloaded), pins);
}

#[test]
fn test_update_respects_existing_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "package.json",
        r#"{"name": "app", "resolutions": {"lodash": "4.17.20"}}"#,
    );
    // An npm lockfile would prefer `overrides`, but resolutions exists.
    fs::write(dir.path().join("package-lock.json"), "{}").unwrap();

    let config = Config::default();
    let pins = overrides(&[("lodash", "4.17.21")]);
    let mut resolver = Resolver::new();
    let result =
        update_package_json(&mut resolver, &update_args(&path, &config, None, Some(&pins)))
            .unwrap();

    assert_eq!(result.resolutions.unwrap()["lodash"], "4.17.21");
    assert!(result.overrides.is_none());
}

#[test]
fn test_update_stores_appendix_under_pastoralist() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(dir.path(), "package.json", r#"{"name": "app"}"#);

    let config = Config::default();
    let pins = overrides(&[("lodash", "4.17.21")]);
    let mut appendix = Appendix::new();
    appendix.insert(
        "lodash@4.17.21".to_string(),
        item_with_dependents(&[("pkg-a", "^4.17.0")]),
    );

    let mut resolver = Resolver::new();
    update_package_json(
        &mut resolver,
        &update_args(&path, &config, Some(&appendix), Some(&pins)),
    )
    .unwrap();

    let reloaded = resolver.resolve(&path).unwrap();
    let section = reloaded.pastoralist.as_ref().unwrap();
    let stored: Appendix =
        serde_json::from_value(section["appendix"].clone()).unwrap();
    assert_eq!(stored, appendix);
}

#[test]
fn test_empty_overrides_removes_field_and_appendix_keeps_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "package.json",
        r#"{
            "name": "app",
            "overrides": {"lodash": "4.17.21"},
            "pastoralist": {
                "appendix": {"lodash@4.17.21": {"dependents": {}}},
                "depPaths": ["packages/*/package.json"],
                "security": {"autoFix": true}
            }
        }"#,
    );

    let config = Config::default();
    let mut resolver = Resolver::new();
    let result =
        update_package_json(&mut resolver, &update_args(&path, &config, None, None)).unwrap();

    assert!(result.overrides.is_none());
    let section = result.pastoralist.as_ref().unwrap();
    assert!(!section.contains_key("appendix"));
    assert_eq!(
        section["depPaths"],
        serde_json::json!(["packages/*/package.json"])
    );
    assert_eq!(section["security"], serde_json::json!({"autoFix": true}));
}

#[test]
fn test_spec_scenario_pnpm_sibling_keys_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "package.json",
        r#"{"name": "app", "pnpm": {"overrides": {"lodash": "4.17.21"}, "shamefullyHoist": true}}"#,
    );

    let config = Config::default();
    let mut resolver = Resolver::new();
    let result =
        update_package_json(&mut resolver, &update_args(&path, &config, None, None)).unwrap();

    let pnpm = result.pnpm.unwrap();
    assert!(pnpm.overrides.is_none());
    assert_eq!(pnpm.rest["shamefullyHoist"], serde_json::json!(true));
}

#[test]
fn test_spec_scenario_pnpm_dropped_when_only_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_manifest(
        dir.path(),
        "package.json",
        r#"{"name": "app", "pnpm": {"overrides": {"lodash": "4.17.21"}}}"#,
    );

    let config = Config::default();
    let mut resolver = Resolver::new();
    let result =
        update_package_json(&mut resolver, &update_args(&path, &config, None, None)).unwrap();
    assert!(result.pnpm.is_none());

    let on_disk = fs::read_to_string(&path).unwrap();
    assert!(!on_disk.contains("pnpm"));
}

#[test]
fn test_dry_run_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let original = r#"{"name": "app"}"#;
    let path = write_manifest(dir.path(), "package.json", original);

    let config = Config::default();
    let pins = overrides(&[("lodash", "4.17.21")]);
    let mut resolver = Resolver::new();
    let result = update_package_json(
        &mut resolver,
        &UpdateArgs {
            path: &path,
            config: &config,
            appendix: None,
            overrides: Some(&pins),
            dry_run: true,
            is_testing: false,
        },
    )
    .unwrap();

    // The returned manifest reflects the change; the file does not.
    assert!(result.overrides.is_some());
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_update_missing_manifest_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("package.json");
    let config = Config::default();
    let mut resolver = Resolver::new();
    let err = update_package_json(&mut resolver, &update_args(&path, &config, None, None))
        .unwrap_err();
    assert!(err.contains("cannot read manifest"), "got: {}", err);
}
