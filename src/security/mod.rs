//! Security integration: vulnerability findings in, override proposals out.
//!
//! The core consumes provider *results*, never transport: callers register
//! [`VulnerabilityProvider`] implementations in a [`ProviderRegistry`], and
//! the hook filters findings and injects overrides. A configured provider
//! with no registered implementation degrades that data to "unavailable"
//! without aborting the run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ─── Data Types ────────────────────────────────────────────────────

/// Finding severity, ordered weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

/// Known vulnerability data sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Osv,
    Github,
    Snyk,
    Npm,
    Socket,
}

impl ProviderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Osv => "osv",
            ProviderName::Github => "github",
            ProviderName::Snyk => "snyk",
            ProviderName::Npm => "npm",
            ProviderName::Socket => "socket",
        }
    }
}

/// One provider name, or an ordered chain consulted first-hit-wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderSpec {
    One(ProviderName),
    Many(Vec<ProviderName>),
}

impl ProviderSpec {
    pub fn names(&self) -> Vec<ProviderName> {
        match self {
            ProviderSpec::One(name) => vec![*name],
            ProviderSpec::Many(names) => names.clone(),
        }
    }
}

/// A vulnerability affecting one package, as reported by a provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityInfo {
    pub name: String,
    pub severity: Severity,
    pub current_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patched_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ─── Capability Interfaces ─────────────────────────────────────────

/// A vulnerability data source. One implementation per provider;
/// transport lives with the implementor.
pub trait VulnerabilityProvider {
    fn name(&self) -> ProviderName;
    fn query_vulnerabilities(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Vec<VulnerabilityInfo>, String>;
}

/// Terminal prompt capability, supplied by interactive front ends.
pub trait Prompt {
    fn confirm(&mut self, message: &str) -> Result<bool, String>;
    fn input(&mut self, message: &str) -> Result<String, String>;
    fn list(&mut self, message: &str, choices: &[String]) -> Result<usize, String>;
}

/// Output sink for human-readable reports.
pub trait Report {
    fn write(&mut self, text: &str);
    fn write_line(&mut self, line: &str);
}

// ─── Provider Registry ─────────────────────────────────────────────

/// Registered provider implementations, keyed by name.
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderName, Box<dyn VulnerabilityProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, provider: Box<dyn VulnerabilityProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    pub fn get(&self, name: ProviderName) -> Option<&dyn VulnerabilityProvider> {
        self.providers.get(&name).map(|p| p.as_ref())
    }

    /// The configured chain, in order. Names with no registered
    /// implementation are skipped with a warning.
    pub fn providers_for(&self, spec: &ProviderSpec) -> Vec<&dyn VulnerabilityProvider> {
        let mut chain = Vec::new();
        for name in spec.names() {
            match self.get(name) {
                Some(provider) => chain.push(provider),
                None => warn!(provider = name.as_str(), "no implementation registered"),
            }
        }
        chain
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

mod hook;

pub use hook::{apply_security_findings, collect_findings, Finding, SecurityOutcome};
