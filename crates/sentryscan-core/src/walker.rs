//! Filesystem walker & dispatcher: a single, lexicographically ordered
//! traversal that feeds matching files to every enabled
//! [`FilesystemExtractor`].
//!
//! The walker is single-threaded by design: it dispatches to
//! extractors sequentially in the same thread that reads directories,
//! bounding the number of concurrently open files.

use crate::cancellation::CancellationToken;
use crate::error::Error;
use crate::fs::FileInfo;
use crate::path_filter::PathFilter;
use crate::plugin::{FilesystemExtractor, ScanInput, ScanRoot};
use sentryscan_formats::Inventory;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct PluginTally {
    pub successes: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

impl PluginTally {
    pub fn outcome(&self) -> sentryscan_formats::PluginOutcome {
        use sentryscan_formats::PluginOutcome::*;
        match (self.successes, self.failures) {
            (_, 0) => Succeeded,
            (0, _) => Failed {
                reason: self.last_error.clone().unwrap_or_default(),
            },
            _ => PartiallySucceeded,
        }
    }
}

pub struct WalkOutcome {
    pub inventory: Inventory,
    pub tallies: HashMap<String, PluginTally>,
    pub cancelled: bool,
}

/// Walks `root`, matching each visited file against every extractor in
/// `extractors`. `host_root` is the real filesystem path the scan root
/// corresponds to (used only to build filter-comparable absolute
/// paths); it may differ from `root.root_path`'s logical meaning when
/// scanning a virtual root.
pub fn walk(
    root: &ScanRoot,
    host_root: &Path,
    extractors: &[Arc<dyn FilesystemExtractor>],
    filter: &PathFilter,
    cancel: &CancellationToken,
) -> WalkOutcome {
    let mut inventory = Inventory::default();
    let mut tallies: HashMap<String, PluginTally> = extractors
        .iter()
        .map(|e| (e.name().to_string(), PluginTally::default()))
        .collect();

    let cancelled = visit(
        root,
        host_root,
        "/",
        1,
        extractors,
        filter,
        cancel,
        &mut inventory,
        &mut tallies,
    );

    WalkOutcome {
        inventory,
        tallies,
        cancelled,
    }
}

#[allow(clippy::too_many_arguments)]
fn visit(
    root: &ScanRoot,
    host_root: &Path,
    logical_path: &str,
    depth: usize,
    extractors: &[Arc<dyn FilesystemExtractor>],
    filter: &PathFilter,
    cancel: &CancellationToken,
    inventory: &mut Inventory,
    tallies: &mut HashMap<String, PluginTally>,
) -> bool {
    if cancel.is_cancelled() {
        return true;
    }

    let entries = match root.fs.read_dir(logical_path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = logical_path, error = %e, "failed to list directory, skipping subtree");
            return false;
        }
    };

    for entry in entries {
        if cancel.is_cancelled() {
            return true;
        }

        let abs = host_root.join(entry.path.trim_start_matches('/'));
        if filter.should_skip(&abs, entry.info.is_dir, depth) {
            debug!(path = %entry.path, "skipped by path filter");
            continue;
        }

        if entry.info.is_dir {
            if visit(
                root,
                host_root,
                &entry.path,
                depth + 1,
                extractors,
                filter,
                cancel,
                inventory,
                tallies,
            ) {
                return true;
            }
            continue;
        }

        dispatch_file(root, &entry.path, entry.info, extractors, cancel, inventory, tallies);
    }

    false
}

#[allow(clippy::too_many_arguments)]
fn dispatch_file(
    root: &ScanRoot,
    path: &str,
    info: FileInfo,
    extractors: &[Arc<dyn FilesystemExtractor>],
    cancel: &CancellationToken,
    inventory: &mut Inventory,
    tallies: &mut HashMap<String, PluginTally>,
) {
    for extractor in extractors {
        if !extractor.file_required(path, &info) {
            continue;
        }
        if info.size > extractor.max_file_size_bytes() {
            // file_required is expected to deny this itself; reaching
            // here means it claimed an oversized file anyway, which is
            // the extractor's bug to report, not a quiet skip.
            record(
                tallies,
                extractor.name(),
                Err(Error::SizeLimitExceeded {
                    path: path.to_string(),
                }),
            );
            continue;
        }

        let reader = match root.fs.open(path) {
            Ok(r) => r,
            Err(e) => {
                record(tallies, extractor.name(), Err(Error::Io(e)));
                continue;
            }
        };

        let input = ScanInput {
            path: path.to_string(),
            info,
            reader,
            root,
        };

        let result = extractor.extract(input, cancel);
        match &result {
            Ok(extracted) => inventory.merge(extracted.clone()),
            Err(_) => {}
        }
        record(tallies, extractor.name(), result.map(|_| ()));
    }
}

fn record(
    tallies: &mut HashMap<String, PluginTally>,
    name: &str,
    result: Result<(), Error>,
) {
    let tally = tallies.entry(name.to_string()).or_default();
    match result {
        Ok(()) => tally.successes += 1,
        Err(e) => {
            tally.failures += 1;
            tally.last_error = Some(e.to_string());
        }
    }
}

/// Build the absolute path a given logical (root-relative) path would
/// have on the real filesystem backing `host_root`. Exposed for
/// callers (the orchestrator, standalone extractors) that need to
/// reason about the same coordinate space the path filter uses.
pub fn host_path(host_root: &Path, logical_path: &str) -> PathBuf {
    host_root.join(logical_path.trim_start_matches('/'))
}
