//! Data model and report formatters shared across the scanner.
//!
//! This crate has no knowledge of how packages are discovered or how
//! findings are produced; it only defines the shapes that the rest of
//! the workspace passes around (`Package`, `PackageIndex`, `Finding`,
//! `Inventory`, `ScanResult`) plus the output writers that serialize a
//! `ScanResult` into one of the formats the CLI exposes.

pub mod inventory;
pub mod output;
pub mod package;
pub mod secret;
pub mod spdx;
pub mod vuln;

pub use inventory::{Inventory, PluginStatus, ScanResult, ScanStatus};
pub use package::{Package, PackageIndex};
pub use secret::Secret;
pub use vuln::{Advisory, Finding, FindingTarget, PackageVuln, Severity};
