mod cli;
mod registry;
mod validate;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use sentryscan_core::capabilities::{Environment, OsFamily};
use sentryscan_core::fs::RealFileSystem;
use sentryscan_core::gate::CapabilityMode;
use sentryscan_core::path_filter::PathFilterConfig;
use sentryscan_core::resolver::ResolutionMode;
use sentryscan_core::{CancellationToken, Orchestrator, ScanConfig, ScanRoot};
use sentryscan_formats::output;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::strip_scan_verb(std::env::args().collect());
    let cli = Cli::parse_from(args);
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %e, "sentryscan failed");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> Result<i32> {
    let validated = validate::validate(&cli)?;

    let host_root = cli.root.clone().unwrap_or_else(|| "/".to_string());
    let registry = registry::build();

    let fs = Arc::new(RealFileSystem::new(host_root.clone()));
    let root = ScanRoot::new(fs, "/");

    let is_remote_image = cli.remote_image.is_some();
    let environment = Environment {
        os: current_os(),
        direct_fs: !is_remote_image,
        running_system: !is_remote_image,
        online: !cli.offline,
    };

    let capability_mode = if cli.filter_by_capabilities {
        CapabilityMode::FilterByCapabilities
    } else {
        CapabilityMode::Strict
    };
    let resolution_mode = if cli.explicit_extractors {
        ResolutionMode::Strict
    } else {
        ResolutionMode::Auto
    };

    let path_filter = PathFilterConfig {
        skip_dirs: cli.skip_dirs.iter().map(PathBuf::from).collect(),
        skip_dir_regex: cli.skip_dir_regex.clone(),
        skip_dir_glob: cli.skip_dir_glob.clone(),
        use_gitignore: cli.use_gitignore,
        ignore_sub_dirs: cli.ignore_sub_dirs,
    };

    let config = ScanConfig {
        root,
        host_root: PathBuf::from(&host_root),
        environment,
        capability_mode,
        resolution_mode,
        extractor_selection: cli.extractors.clone(),
        detector_selection: cli.detectors.clone(),
        path_filter,
    };

    let orchestrator = Orchestrator::new(&registry);
    let cancel = CancellationToken::new();
    let result = orchestrator.run(config, &cancel);
    let exit_code = result.exit_code();

    if let (Some(format), Some(path)) = (validated.result_format, &validated.result_path) {
        output::write(&result, format, std::path::Path::new(path))?;
    }
    for spec in &validated.outputs {
        output::write(&result, spec.format, std::path::Path::new(&spec.path))?;
    }

    Ok(exit_code)
}

#[cfg(target_os = "windows")]
fn current_os() -> OsFamily {
    OsFamily::Windows
}

#[cfg(target_os = "macos")]
fn current_os() -> OsFamily {
    OsFamily::MacOs
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn current_os() -> OsFamily {
    OsFamily::Linux
}
