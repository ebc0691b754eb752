//! The plugin contracts and the scan-root handle extractors and
//! detectors are invoked against.
//!
//! Plugins are a small tagged universe behind one vtable each;
//! `PluginHandle` is the tag, `Plugin` the uniform interface.

use crate::capabilities::Capabilities;
use crate::cancellation::CancellationToken;
use crate::error::Result;
use crate::fs::{FileInfo, FileSystem, MaterializedPath};
use sentryscan_formats::Inventory;
use std::io::Read;
use std::sync::Arc;

/// A handle to a filesystem to scan. All paths handed to plugins are
/// relative to `root_path`; the root itself is the logical `/`.
#[derive(Clone)]
pub struct ScanRoot {
    pub fs: Arc<dyn FileSystem>,
    pub root_path: String,
}

impl ScanRoot {
    pub fn new(fs: Arc<dyn FileSystem>, root_path: impl Into<String>) -> Self {
        Self {
            fs,
            root_path: root_path.into(),
        }
    }
}

/// What a `FilesystemExtractor::extract` call receives for one file.
pub struct ScanInput<'a> {
    pub path: String,
    pub info: FileInfo,
    pub reader: Box<dyn Read + Send + 'a>,
    pub root: &'a ScanRoot,
}

impl<'a> ScanInput<'a> {
    /// Materialize this file to a real path on disk, for extractors
    /// whose backing parser requires one. The returned guard deletes
    /// any temp copy it created when dropped.
    pub fn get_real_path(&self) -> std::io::Result<MaterializedPath> {
        self.root.fs.materialize(&self.path)
    }
}

/// Common supertype of every plugin kind.
pub trait Plugin: Send + Sync {
    /// Lowercase, slashes and dashes only; the identity used in
    /// registries and dependency edges.
    fn name(&self) -> &str;
    fn version(&self) -> u32;
    fn capabilities(&self) -> Capabilities;
}

/// A file-scoped package extractor, invoked once per matching file by
/// the walker (C6).
pub trait FilesystemExtractor: Plugin {
    /// A cheap predicate: must not open the file. Returning `true`
    /// costs a later `extract` call.
    fn file_required(&self, path: &str, info: &FileInfo) -> bool;

    fn extract(&self, input: ScanInput<'_>, cancel: &CancellationToken) -> Result<Inventory>;

    /// Files larger than this are denied by `file_required` and, if
    /// `file_required` lets one through anyway, reported to the
    /// plugin's tally as an `Error::SizeLimitExceeded` instead of
    /// being handed to `extract`.
    fn max_file_size_bytes(&self) -> u64 {
        u64::MAX
    }
}

/// An extractor invoked exactly once per `ScanRoot`, for inputs that
/// aren't single files (enumerating processes, reading a system-wide
/// database).
pub trait StandaloneExtractor: Plugin {
    fn extract(&self, root: &ScanRoot) -> Result<Inventory>;
}

/// A filesystem- and/or index-scoped finding producer (C8).
pub trait Detector: Plugin {
    /// Names of extractors whose output this detector consults.
    fn required_extractors(&self) -> Vec<String>;

    /// The advisory template this detector can report, without target
    /// details. Must stay consistent with what `scan` actually emits.
    fn detected_finding(&self) -> sentryscan_formats::Advisory;

    /// Must be safe to call with an empty index.
    ///
    /// Returns whatever `Inventory` it managed to build alongside an
    /// optional error, rather than one or the other: a detector
    /// cancelled partway through (or one that hits a recoverable error
    /// after already finding something) still has findings worth
    /// keeping, the same contract `sentryscan_secrets::Engine::scan`
    /// uses for its own mid-stream cancellation.
    fn scan(
        &self,
        root: &ScanRoot,
        index: &sentryscan_formats::PackageIndex,
        cancel: &crate::cancellation::CancellationToken,
    ) -> (Inventory, Option<crate::error::Error>);
}

/// A named, type-erased plugin as stored in the registry.
#[derive(Clone)]
pub enum PluginHandle {
    Filesystem(Arc<dyn FilesystemExtractor>),
    Standalone(Arc<dyn StandaloneExtractor>),
    Detector(Arc<dyn Detector>),
}

impl PluginHandle {
    pub fn name(&self) -> &str {
        match self {
            PluginHandle::Filesystem(p) => p.name(),
            PluginHandle::Standalone(p) => p.name(),
            PluginHandle::Detector(p) => p.name(),
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            PluginHandle::Filesystem(p) => p.capabilities(),
            PluginHandle::Standalone(p) => p.capabilities(),
            PluginHandle::Detector(p) => p.capabilities(),
        }
    }

    pub fn is_extractor(&self) -> bool {
        matches!(self, PluginHandle::Filesystem(_) | PluginHandle::Standalone(_))
    }

    pub fn is_detector(&self) -> bool {
        matches!(self, PluginHandle::Detector(_))
    }
}
