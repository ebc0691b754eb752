//! Scan orchestrator: drives the CONFIGURING → WALKING → INDEXING →
//! DETECTING phases and aggregates the final [`ScanResult`].
//!
//! `WRITING`/`DONE` are the CLI's concern (output serialization is an
//! external collaborator); this orchestrator stops once a `ScanResult`
//! has been assembled.

use crate::cancellation::CancellationToken;
use crate::capabilities::Environment;
use crate::error::{Error, Result};
use crate::gate::{self, CapabilityMode};
use crate::path_filter::{PathFilter, PathFilterConfig};
use crate::plugin::{FilesystemExtractor, PluginHandle, ScanRoot, StandaloneExtractor};
use crate::registry::PluginRegistry;
use crate::resolver::{self, ResolutionMode};
use crate::walker;
use chrono::Utc;
use rayon::prelude::*;
use sentryscan_formats::{
    Inventory, PackageIndex, PluginOutcome, PluginStatus, ScanResult, ScanStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Configuring,
    Walking,
    Indexing,
    Detecting,
    Writing,
    Done,
}

pub struct ScanConfig {
    pub root: ScanRoot,
    /// Real filesystem path the scan root corresponds to; used to
    /// build filter-comparable absolute paths.
    pub host_root: PathBuf,
    pub environment: Environment,
    pub capability_mode: CapabilityMode,
    pub resolution_mode: ResolutionMode,
    pub extractor_selection: Vec<String>,
    pub detector_selection: Vec<String>,
    pub path_filter: PathFilterConfig,
}

pub struct Orchestrator<'a> {
    registry: &'a PluginRegistry,
}

impl<'a> Orchestrator<'a> {
    pub fn new(registry: &'a PluginRegistry) -> Self {
        Self { registry }
    }

    pub fn run(&self, config: ScanConfig, cancel: &CancellationToken) -> ScanResult {
        let started_at = Utc::now();

        match self.run_inner(config, cancel) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "scan configuration failed before the walk started");
                ScanResult {
                    inventory: Inventory::default(),
                    status: ScanStatus::Failed,
                    plugin_status: vec![PluginStatus {
                        name: "orchestrator".to_string(),
                        outcome: PluginOutcome::Failed {
                            reason: e.to_string(),
                        },
                        duration: Duration::default(),
                    }],
                    started_at,
                    finished_at: Utc::now(),
                }
            }
        }
    }

    fn run_inner(&self, config: ScanConfig, cancel: &CancellationToken) -> Result<ScanResult> {
        let started_at = Utc::now();
        debug!(phase = ?ScanPhase::Configuring, "starting scan");

        // CONFIGURING: materialize plugins, apply capability gate and
        // dependency resolution, build the path filter.
        let extractor_names = self.registry.resolve_selection(&config.extractor_selection)?;
        let detector_handles = self.registry.resolve_handles(&config.detector_selection)?;

        let detector_handles = gate::apply(detector_handles, &config.environment, config.capability_mode)?;

        let resolved_extractor_names = resolver::resolve(
            self.registry,
            &extractor_names,
            &detector_handles,
            config.resolution_mode,
        )?;

        let extractor_handles = self.registry.resolve_handles(&resolved_extractor_names)?;
        let extractor_handles = gate::apply(extractor_handles, &config.environment, config.capability_mode)?;

        let fs_extractors: Vec<Arc<dyn FilesystemExtractor>> = extractor_handles
            .iter()
            .filter_map(|p| match p {
                PluginHandle::Filesystem(e) => Some(e.clone()),
                _ => None,
            })
            .collect();
        let standalone_extractors: Vec<Arc<dyn StandaloneExtractor>> = extractor_handles
            .iter()
            .filter_map(|p| match p {
                PluginHandle::Standalone(e) => Some(e.clone()),
                _ => None,
            })
            .collect();
        let detectors: Vec<Arc<dyn crate::plugin::Detector>> = detector_handles
            .iter()
            .filter_map(|p| match p {
                PluginHandle::Detector(d) => Some(d.clone()),
                _ => None,
            })
            .collect();

        let os = config.environment.os;
        let filter = PathFilter::new(&config.host_root, os, config.path_filter.clone())?;

        // WALKING + INDEXING
        debug!(phase = ?ScanPhase::Walking, "walking filesystem");
        let walk_start = Instant::now();
        let walk_outcome = walker::walk(
            &config.root,
            &config.host_root,
            &fs_extractors,
            &filter,
            cancel,
        );
        let walk_duration = walk_start.elapsed();

        let mut inventory = walk_outcome.inventory;
        let mut plugin_status: Vec<PluginStatus> = walk_outcome
            .tallies
            .into_iter()
            .map(|(name, tally)| PluginStatus {
                name,
                outcome: tally.outcome(),
                duration: walk_duration,
            })
            .collect();

        for extractor in &standalone_extractors {
            let start = Instant::now();
            let outcome = match extractor.extract(&config.root) {
                Ok(inv) => {
                    inventory.merge(inv);
                    PluginOutcome::Succeeded
                }
                Err(e) => PluginOutcome::Failed {
                    reason: e.to_string(),
                },
            };
            plugin_status.push(PluginStatus {
                name: extractor.name().to_string(),
                outcome,
                duration: start.elapsed(),
            });
        }

        let mut index = PackageIndex::new();
        index.extend(inventory.packages.clone());

        // DETECTING: the index is frozen from here on, so detectors
        // may run in parallel.
        debug!(phase = ?ScanPhase::Detecting, "running detectors");
        let detector_results: Vec<(String, PluginOutcome, Duration, Inventory)> = detectors
            .par_iter()
            .map(|detector| {
                let start = Instant::now();
                let (inv, err) = detector.scan(&config.root, &index, cancel);
                let outcome = match err {
                    None => PluginOutcome::Succeeded,
                    Some(Error::Cancelled) => PluginOutcome::Failed {
                        reason: "cancelled".to_string(),
                    },
                    Some(e) => PluginOutcome::Failed {
                        reason: e.to_string(),
                    },
                };
                (detector.name().to_string(), outcome, start.elapsed(), inv)
            })
            .collect();

        for (name, outcome, duration, inv) in detector_results {
            inventory.merge(inv);
            plugin_status.push(PluginStatus {
                name,
                outcome,
                duration,
            });
        }

        let status = ScanResult::status_from_plugins(&plugin_status, false);
        info!(?status, packages = inventory.packages.len(), findings = inventory.findings.len(), "scan complete");

        Ok(ScanResult {
            inventory,
            status,
            plugin_status,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
