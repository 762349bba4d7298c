use serde_json::Value;

use super::Config;
use crate::workspace::DepPaths;

// ─── Validation ────────────────────────────────────────────────────

/// Strict validation against the closed schema. Unknown fields, wrong
/// field types, and unknown enum values (security provider, severity
/// threshold) are all rejected.
pub fn validate_config(value: &Value) -> Result<Config, String> {
    let config: Config = serde_json::from_value(value.clone())
        .map_err(|e| format!("Invalid config structure: {}", e))?;

    // An untagged string depPaths parses as any sentinel; only the two
    // workspace spellings are legal.
    if let Some(DepPaths::Sentinel(sentinel)) = &config.dep_paths {
        if sentinel != "workspace" && sentinel != "workspaces" {
            return Err(format!(
                "Invalid config structure: unknown depPaths value '{}'",
                sentinel,
            ));
        }
    }

    Ok(config)
}

/// Non-throwing variant: `None` on any validation failure.
pub fn safe_validate_config(value: &Value) -> Option<Config> {
    validate_config(value).ok()
}
