use std::path::PathBuf;
use std::process;

use pastoralist::{run_reconciliation, ProviderRegistry};

pub fn cmd_update(path: PathBuf, dep_paths: Vec<String>, dry_run: bool, check_security: bool) {
    let opts = super::run_options(path, dep_paths, dry_run, check_security);

    // Provider transports are supplied by embedders; the CLI starts with
    // an empty registry, so security data degrades to "unavailable".
    let registry = ProviderRegistry::new();

    let report = match run_reconciliation(&opts, &registry, None) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    if report.overrides.is_empty() && report.removed.is_empty() {
        println!("No overrides to reconcile.");
        return;
    }

    if !report.removed.is_empty() {
        println!("Removed {} override(s):", report.removed.len());
        for name in &report.removed {
            println!("  - {} (no dependents)", name);
        }
    }

    if !report.overrides.is_empty() {
        println!("Kept {} override(s):", report.overrides.len());
        for (name, version) in &report.overrides {
            let dependents = report.tree.get(name).map_or(0, |d| d.len());
            println!("  {} = {} ({} dependent(s))", name, version, dependents);
        }
    }

    if let Some(security) = &report.security {
        if !security.applied.is_empty() {
            println!("Security fixes applied: {}", security.applied.len());
        }
        for skipped in &security.skipped {
            println!(
                "  security: {} {} has no applied fix ({:?})",
                skipped.name, skipped.current_version, skipped.severity
            );
        }
        if !report.unavailable.is_empty() {
            println!(
                "  security data unavailable for {} package(s)",
                report.unavailable.len()
            );
        }
    }

    if dry_run {
        println!("\nDry run: nothing written.");
    } else {
        println!("\nUpdated {}.", opts.path.display());
    }
}
