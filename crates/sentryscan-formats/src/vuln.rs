//! Advisories, findings, and OSV-shaped package vulnerabilities.

use crate::package::Package;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

/// A namespaced advisory template: what a detector is capable of
/// reporting, without the per-scan target details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub publisher: String,
    pub reference: String,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub severity: Severity,
}

impl Advisory {
    pub fn id(&self) -> String {
        format!("{}/{}", self.publisher, self.reference)
    }
}

/// What a [`Finding`] points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingTarget {
    Paths(Vec<String>),
    Package { name: String, ecosystem: String },
    Extra(String),
}

/// A generic advisory attached to a concrete target, emitted by a
/// detector's `scan` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub advisory: Advisory,
    pub target: FindingTarget,
}

/// An OSV-schema vulnerability entry attached to a discovered package.
///
/// Only the fields this workspace actually produces or consumes are
/// modeled; `OSV` defines many more that pass through untouched for a
/// detector that merely forwards upstream advisory data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageVuln {
    pub id: String,
    pub package: Package,
    pub summary: String,
    pub severity: Severity,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub fixed_versions: Vec<String>,
}
