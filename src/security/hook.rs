use std::collections::BTreeMap;

use chrono::Utc;
use tracing::warn;

use super::{Prompt, ProviderName, ProviderRegistry, Severity, VulnerabilityInfo};
use crate::appendix::{Appendix, AppendixItem, Ledger};
use crate::config::SecurityConfig;

// ─── Collection ────────────────────────────────────────────────────

/// A finding together with the provider that reported it.
#[derive(Clone, Debug, PartialEq)]
pub struct Finding {
    pub provider: ProviderName,
    pub info: VulnerabilityInfo,
}

/// Query the configured provider chain for every package.
///
/// Per package the chain is consulted in order and the first provider that
/// answers supplies the data; a provider error falls through to the next.
/// Packages no provider could answer for are returned as unavailable —
/// degraded data, never a run failure.
pub fn collect_findings(
    registry: &ProviderRegistry,
    config: &SecurityConfig,
    packages: &BTreeMap<String, String>,
) -> (Vec<Finding>, Vec<String>) {
    let providers = match config.provider.as_ref() {
        Some(spec) => registry.providers_for(spec),
        None => Vec::new(),
    };
    if providers.is_empty() {
        return (Vec::new(), packages.keys().cloned().collect());
    }

    let mut findings = Vec::new();
    let mut unavailable = Vec::new();

    for (name, version) in packages {
        let mut answered = false;
        for provider in &providers {
            match provider.query_vulnerabilities(name, version) {
                Ok(vulns) => {
                    findings.extend(vulns.into_iter().map(|info| Finding {
                        provider: provider.name(),
                        info,
                    }));
                    answered = true;
                    break;
                }
                Err(e) => {
                    warn!(
                        package = %name,
                        provider = provider.name().as_str(),
                        error = %e,
                        "provider query failed",
                    );
                }
            }
        }
        if !answered {
            unavailable.push(name.clone());
        }
    }

    (findings, unavailable)
}

// ─── Application ───────────────────────────────────────────────────

/// Result of a security pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SecurityOutcome {
    /// Overrides added or retargeted: name → patched version.
    pub applied: BTreeMap<String, String>,
    /// Findings reported but not applied: no patched version, excluded,
    /// rejected at the prompt, or neither auto-fix nor interactive is on.
    pub skipped: Vec<VulnerabilityInfo>,
}

/// Filter findings and turn the accepted ones into overrides.
///
/// Findings below `severityThreshold` or naming an excluded package are
/// dropped. Interactive mode asks the prompt per finding; auto-fix mode
/// accepts anything with a patched version. Accepted findings update
/// `overrides` and stamp the appendix entry's ledger — the only place
/// allowed to overwrite the `security*` fields.
pub fn apply_security_findings(
    findings: &[Finding],
    config: &SecurityConfig,
    overrides: &mut BTreeMap<String, String>,
    appendix: &mut Appendix,
    mut prompt: Option<&mut dyn Prompt>,
) -> SecurityOutcome {
    let threshold = config.severity_threshold.unwrap_or(Severity::Low);
    let excluded = config.exclude_packages.clone().unwrap_or_default();
    let auto_fix = config.auto_fix.unwrap_or(false);
    let interactive = config.interactive.unwrap_or(false);

    let mut outcome = SecurityOutcome::default();

    for finding in findings {
        let info = &finding.info;
        if info.severity < threshold {
            continue;
        }
        if excluded.iter().any(|name| name == &info.name) {
            continue;
        }
        let Some(patched) = info.patched_version.clone() else {
            outcome.skipped.push(info.clone());
            continue;
        };

        let accept = if interactive {
            match prompt.as_mut() {
                Some(p) => {
                    let message = format!(
                        "override {} {} -> {} ({})?",
                        info.name,
                        info.current_version,
                        patched,
                        info.cve.as_deref().unwrap_or("no CVE"),
                    );
                    match p.confirm(&message) {
                        Ok(answer) => answer,
                        Err(e) => {
                            warn!(error = %e, "prompt failed; skipping finding");
                            false
                        }
                    }
                }
                None => false,
            }
        } else {
            auto_fix
        };

        if !accept {
            outcome.skipped.push(info.clone());
            continue;
        }

        overrides.insert(info.name.clone(), patched.clone());
        stamp_ledger(appendix, info, &patched, finding.provider);
        outcome.applied.insert(info.name.clone(), patched);
    }

    outcome
}

/// Stamp the appendix entry for an applied fix. Existing entries keep
/// their `addedDate`/`reason`; the three security fields are overwritten.
fn stamp_ledger(appendix: &mut Appendix, info: &VulnerabilityInfo, patched: &str, provider: ProviderName) {
    let key = format!("{}@{}", info.name, patched);
    let item = appendix.entry(key).or_insert_with(AppendixItem::default);

    let ledger = item.ledger.get_or_insert_with(|| Ledger {
        added_date: Utc::now().to_rfc3339(),
        reason: info
            .cve
            .clone()
            .map(|cve| format!("security fix: {}", cve)),
        ..Ledger::default()
    });
    ledger.security_checked = Some(true);
    ledger.security_check_date = Some(Utc::now().to_rfc3339());
    ledger.security_provider = Some(provider);
}
