use std::path::PathBuf;
use std::process;

use pastoralist::security::Report;
use pastoralist::{run_reconciliation, ProviderRegistry};

/// Report sink writing to stdout.
struct StdoutReport;

impl Report for StdoutReport {
    fn write(&mut self, text: &str) {
        print!("{}", text);
    }

    fn write_line(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Dry-run review: print each override's dependents and flag the removable
/// ones. Exits 1 when anything is removable, so CI can gate on it.
pub fn cmd_check(path: PathBuf, dep_paths: Vec<String>) {
    let opts = super::run_options(path, dep_paths, true, false);
    let registry = ProviderRegistry::new();

    let report = match run_reconciliation(&opts, &registry, None) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let mut out = StdoutReport;

    if report.overrides.is_empty() && report.removed.is_empty() {
        out.write_line("No overrides declared.");
        return;
    }

    for (name, version) in &report.overrides {
        out.write_line(&format!("{} = {}", name, version));
        if let Some(dependents) = report.tree.get(name) {
            for (requester, range) in dependents {
                out.write_line(&format!("  required by {} ({})", requester, range));
            }
        }
    }

    if report.removed.is_empty() {
        out.write_line("\nAll overrides still have dependents.");
        return;
    }

    out.write_line(&format!("\nRemovable override(s): {}", report.removed.len()));
    for name in &report.removed {
        out.write_line(&format!("  - {}", name));
    }
    out.write_line("\nRun `pastoralist update` to prune them.");
    process::exit(1);
}
