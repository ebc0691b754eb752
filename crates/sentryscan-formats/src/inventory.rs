//! The aggregated scan output: `Inventory`, `ScanResult`, and per-plugin status.

use crate::package::Package;
use crate::secret::Secret;
use crate::vuln::{Finding, PackageVuln};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// The aggregated output of a scan: everything extractors and
/// detectors produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub packages: Vec<Package>,
    pub findings: Vec<Finding>,
    pub package_vulns: Vec<PackageVuln>,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

impl Inventory {
    pub fn merge(&mut self, other: Inventory) {
        self.packages.extend(other.packages);
        self.findings.extend(other.findings);
        self.package_vulns.extend(other.package_vulns);
        self.secrets.extend(other.secrets);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStatus {
    Succeeded,
    PartiallySucceeded,
    Failed,
}

/// Outcome of a single plugin's invocation during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginOutcome {
    Succeeded,
    PartiallySucceeded,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginStatus {
    pub name: String,
    pub outcome: PluginOutcome,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Inventory plus overall status, per-plugin status, and scan timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub inventory: Inventory,
    pub status: ScanStatus,
    pub plugin_status: Vec<PluginStatus>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ScanResult {
    /// `Succeeded` if every plugin succeeded, `PartiallySucceeded` if
    /// some plugin failed but the scan still produced output, `Failed`
    /// only for configuration/walk failure (signalled by the caller
    /// passing an empty `plugin_status` with `force_failed`).
    pub fn status_from_plugins(plugin_status: &[PluginStatus], force_failed: bool) -> ScanStatus {
        if force_failed {
            return ScanStatus::Failed;
        }
        if plugin_status
            .iter()
            .all(|p| matches!(p.outcome, PluginOutcome::Succeeded))
        {
            ScanStatus::Succeeded
        } else {
            ScanStatus::PartiallySucceeded
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            ScanStatus::Succeeded => 0,
            _ => 1,
        }
    }
}

/// Convenience grouping of plugin statuses by name, used by formatters
/// and tests that want to assert a specific plugin's outcome.
pub fn index_plugin_status(statuses: &[PluginStatus]) -> HashMap<&str, &PluginStatus> {
    statuses.iter().map(|s| (s.name.as_str(), s)).collect()
}
