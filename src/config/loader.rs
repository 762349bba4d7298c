use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tracing::{debug, warn};

use super::{merge, validate, Config};

// ─── Config Sources ────────────────────────────────────────────────

/// How a config candidate is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    /// Plain JSON, parsed directly.
    Json,
    /// Executable module, evaluated in one controlled step that must
    /// yield a plain data value.
    ScriptModule,
}

/// A config file candidate.
pub struct ConfigSource {
    pub filename: &'static str,
    pub format: ConfigFormat,
}

/// Candidate files in lookup order; the first that exists, loads, and
/// validates wins.
pub const CONFIG_SOURCES: &[ConfigSource] = &[
    ConfigSource {
        filename: ".pastoralistrc",
        format: ConfigFormat::Json,
    },
    ConfigSource {
        filename: ".pastoralistrc.json",
        format: ConfigFormat::Json,
    },
    ConfigSource {
        filename: "pastoralist.json",
        format: ConfigFormat::Json,
    },
    ConfigSource {
        filename: "pastoralist.config.js",
        format: ConfigFormat::ScriptModule,
    },
    ConfigSource {
        filename: "pastoralist.config.ts",
        format: ConfigFormat::ScriptModule,
    },
];

// ─── Loading ───────────────────────────────────────────────────────

/// Load the external config from `root`, trying candidates in order.
///
/// A candidate that exists but fails to load or validate is skipped in
/// favor of the next one — a broken rc file must not take the run down.
pub fn load_external_config(root: &Path) -> Option<Config> {
    for source in CONFIG_SOURCES {
        let path = root.join(source.filename);
        if !path.is_file() {
            continue;
        }
        let Some(value) = load_source(&path, source.format) else {
            warn!(path = %path.display(), "skipping unloadable config candidate");
            continue;
        };
        match validate::safe_validate_config(&value) {
            Some(config) => {
                debug!(path = %path.display(), "loaded external config");
                return Some(config);
            }
            None => {
                warn!(path = %path.display(), "config candidate failed validation");
            }
        }
    }
    None
}

/// External config merged with the manifest-embedded one; either side
/// may be absent.
pub fn load_config(root: &Path, embedded: Option<&Config>) -> Config {
    let external = load_external_config(root);
    merge::merge_configs(external.as_ref(), embedded)
}

fn load_source(path: &Path, format: ConfigFormat) -> Option<Value> {
    match format {
        ConfigFormat::Json => {
            let content = std::fs::read_to_string(path).ok()?;
            serde_json::from_str(&content).ok()
        }
        ConfigFormat::ScriptModule => eval_script_module(path),
    }
}

/// Evaluate a JS/TS config module by running `node` once, printing the
/// default export as JSON. No runtime on PATH, a failing script, or
/// non-JSON output all skip the candidate.
fn eval_script_module(path: &Path) -> Option<Value> {
    let absolute = std::fs::canonicalize(path).ok()?;
    let script = format!(
        "import('file://{}').then(m => process.stdout.write(JSON.stringify(m.default ?? m)))",
        absolute.display(),
    );

    let mut command = Command::new("node");
    if absolute.extension().is_some_and(|ext| ext == "ts") {
        command.arg("--experimental-strip-types");
    }
    let output = command
        .arg("--input-type=module")
        .arg("-e")
        .arg(&script)
        .output()
        .ok()?;
    if !output.status.success() {
        debug!(path = %path.display(), "config module evaluation failed");
        return None;
    }
    serde_json::from_slice(&output.stdout).ok()
}
