//! One-time hint nudging large appendixes toward an external config file.
//!
//! State: `~/.pastoralist/hint-shown` (or `$PASTORALIST_STATE_DIR`), holding
//! the Unix timestamp of the last time the hint was printed. Informational
//! only — never part of the reconciliation result.

use std::path::PathBuf;

use super::unix_timestamp;

/// Appendix entries in the manifest before the hint fires.
const APPENDIX_HINT_THRESHOLD: usize = 10;
/// Show the hint at most once per week.
const HINT_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Resolve the state directory.
///
/// Priority:
/// 1. `$PASTORALIST_STATE_DIR` environment variable
/// 2. `~/.pastoralist/`
fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("PASTORALIST_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".pastoralist"))
}

pub(super) fn maybe_suggest_external_config(appendix_len: usize) {
    if appendix_len < APPENDIX_HINT_THRESHOLD {
        return;
    }
    let Some(dir) = state_dir() else {
        return;
    };

    let marker = dir.join("hint-shown");
    let now = unix_timestamp();
    if let Ok(previous) = std::fs::read_to_string(&marker) {
        let recently_shown = previous
            .trim()
            .parse::<u64>()
            .is_ok_and(|shown| now.saturating_sub(shown) < HINT_TTL_SECS);
        if recently_shown {
            return;
        }
    }

    println!(
        "tip: {} appendix entries live in package.json — consider moving pastoralist \
         configuration to .pastoralistrc.json",
        appendix_len,
    );

    if std::fs::create_dir_all(&dir).is_ok() {
        let _ = std::fs::write(&marker, now.to_string());
    }
}
