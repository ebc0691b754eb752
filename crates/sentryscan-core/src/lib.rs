//! Plugin orchestration core.
//!
//! Walks a filesystem once, feeding every interested extractor the
//! files it asks for, aggregates a package index, then runs detectors
//! against that index plus the filesystem.

pub mod cancellation;
pub mod capabilities;
pub mod error;
pub mod fs;
pub mod gate;
pub mod orchestrator;
pub mod path_filter;
pub mod plugin;
pub mod registry;
pub mod resolver;
pub mod walker;

pub use cancellation::CancellationToken;
pub use capabilities::{Capabilities, Environment, Network, OsFamily, OsRequirement};
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, ScanConfig, ScanPhase};
pub use plugin::{
    Detector, FilesystemExtractor, Plugin, PluginHandle, ScanInput, ScanRoot, StandaloneExtractor,
};
pub use registry::PluginRegistry;
