//! `dpkg` package extractor: parses `/var/lib/dpkg/status` stanzas
//! into `Package { ecosystem: "dpkg", .. }`.

use sentryscan_core::capabilities::{Capabilities, OsRequirement};
use sentryscan_core::fs::FileInfo;
use sentryscan_core::{CancellationToken, FilesystemExtractor, Plugin, Result, ScanInput};
use sentryscan_formats::{Inventory, Package};
use std::io::Read;

const STATUS_PATH: &str = "/var/lib/dpkg/status";

pub struct DpkgPackageExtractor;

impl Plugin for DpkgPackageExtractor {
    fn name(&self) -> &str {
        "dpkg"
    }

    fn version(&self) -> u32 {
        1
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            os: OsRequirement::Linux,
            ..Capabilities::none()
        }
    }
}

impl FilesystemExtractor for DpkgPackageExtractor {
    fn file_required(&self, path: &str, _info: &FileInfo) -> bool {
        path == STATUS_PATH
    }

    fn extract(&self, mut input: ScanInput<'_>, _cancel: &CancellationToken) -> Result<Inventory> {
        let mut buf = String::new();
        input.reader.read_to_string(&mut buf)?;

        let mut inventory = Inventory::default();
        for stanza in buf.split("\n\n") {
            if let Some(package) = parse_stanza(stanza, &input.path) {
                inventory.packages.push(package);
            }
        }
        Ok(inventory)
    }

    fn max_file_size_bytes(&self) -> u64 {
        64 * 1024 * 1024
    }
}

/// An installed-package stanza has `Status: install ok installed`; a
/// stanza for a package that was only ever configured then removed
/// does not, and is skipped.
fn parse_stanza(stanza: &str, location: &str) -> Option<Package> {
    let mut name = None;
    let mut version = None;
    let mut architecture = None;
    let mut source = None;
    let mut installed = false;

    for field in unfold_fields(stanza) {
        if let Some(value) = field.strip_prefix("Package: ") {
            name = Some(value.trim().to_string());
        } else if let Some(value) = field.strip_prefix("Version: ") {
            version = Some(value.trim().to_string());
        } else if let Some(value) = field.strip_prefix("Architecture: ") {
            architecture = Some(value.trim().to_string());
        } else if let Some(value) = field.strip_prefix("Source: ") {
            source = Some(value.trim().to_string());
        } else if let Some(value) = field.strip_prefix("Status: ") {
            installed = value.trim().ends_with("installed");
        }
    }

    if !installed {
        return None;
    }

    let name = name?;
    let version = version.unwrap_or_default();
    let mut package = Package::new(name, version, "dpkg").with_location(location);
    if let Some(arch) = architecture {
        package.metadata.insert("architecture".to_string(), arch);
    }
    if let Some(source) = source {
        package.metadata.insert("source".to_string(), source);
    }
    Some(package)
}

/// dpkg status fields may continue onto following lines indented with
/// a space (long `Description:`/`Conffiles:` blocks); join those back
/// onto their owning field before matching prefixes.
fn unfold_fields(stanza: &str) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for line in stanza.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = fields.last_mut() {
                last.push(' ');
                last.push_str(line.trim());
            }
            continue;
        }
        fields.push(line.to_string());
    }
    fields
}
