//! Minimal SPDX 2.3 document skeleton.
//!
//! These types exist so the formatters in [`crate::output`] can emit a
//! real, if small, SPDX document rather than hand-assembled strings.

use serde::{Deserialize, Serialize};

pub const SPDX_VERSION: &str = "SPDX-2.3";
pub const DATA_LICENSE: &str = "CC0-1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxDocument {
    pub spdx_version: String,
    pub data_license: String,
    #[serde(rename = "SPDXID")]
    pub spdxid: String,
    pub name: String,
    pub document_namespace: String,
    pub creation_info: CreationInfo,
    pub packages: Vec<SpdxPackage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreationInfo {
    pub created: String,
    pub creators: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    pub spdxid: String,
    pub name: String,
    pub version_info: String,
    pub download_location: String,
}

impl SpdxDocument {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            spdx_version: SPDX_VERSION.to_string(),
            data_license: DATA_LICENSE.to_string(),
            spdxid: "SPDXRef-DOCUMENT".to_string(),
            name: name.into(),
            document_namespace: namespace.into(),
            creation_info: CreationInfo {
                created: chrono::Utc::now().to_rfc3339(),
                creators: vec!["Tool: sentryscan".to_string()],
            },
            packages: Vec::new(),
        }
    }

    /// Render as SPDX tag-value. Only a subset of fields round-trip;
    /// enough to carry the document's prefix and identity.
    pub fn to_tag_value(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("SPDXVersion: {}\n", self.spdx_version));
        out.push_str(&format!("DataLicense: {}\n", self.data_license));
        out.push_str(&format!("SPDXID: {}\n", self.spdxid));
        out.push_str(&format!("DocumentName: {}\n", self.name));
        out.push_str(&format!(
            "DocumentNamespace: {}\n",
            self.document_namespace
        ));
        for pkg in &self.packages {
            out.push_str(&format!("\nPackageName: {}\n", pkg.name));
            out.push_str(&format!("SPDXID: {}\n", pkg.spdxid));
            out.push_str(&format!("PackageVersion: {}\n", pkg.version_info));
        }
        out
    }
}
