//! Builds the [`PluginRegistry`] the CLI runs against.
//!
//! `sentryscan_windows::WindowsWeakCredentialsDetector` is deliberately
//! not wired in here: it takes its registry hives as constructor
//! arguments (see DESIGN.md), and this binary has no live-host hive
//! source to hand it. Wiring it up is left to whatever embeds this
//! registry against a real Windows host or an offline hive dump.

use sentryscan_core::PluginHandle;
use sentryscan_core::PluginRegistry;
use sentryscan_plugins::{DpkgPackageExtractor, LinuxEndOfLifeDetector, ShadowWeakPasswordDetector};
use sentryscan_secrets::SecretScanExtractor;
use std::sync::Arc;

pub fn build() -> PluginRegistry {
    let mut registry = PluginRegistry::new();

    registry.register(PluginHandle::Filesystem(Arc::new(DpkgPackageExtractor)));
    registry.register(PluginHandle::Filesystem(Arc::new(
        SecretScanExtractor::default(),
    )));
    registry.register(PluginHandle::Detector(Arc::new(
        ShadowWeakPasswordDetector,
    )));
    registry.register(PluginHandle::Detector(Arc::new(
        LinuxEndOfLifeDetector::default(),
    )));

    registry.define_group(
        "default",
        ["dpkg", "secrets", "shadow-weak-password", "linux-end-of-life"]
            .iter()
            .map(|s| s.to_string()),
    );

    registry
}
