//! Flag definitions. Kept as one flat command, no subcommands: `scan`
//! is the only verb this tool defines, so rather than modeling a
//! `Commands` enum with one variant, [`strip_scan_verb`]
//! just removes a leading literal `scan` token before `clap` ever sees
//! it — `sentryscan scan ./root` and `sentryscan ./root` parse
//! identically, and any other leading token is left alone to fall
//! where it may as a path.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sentryscan", version, about = "Package, vulnerability, and secret scanner", long_about = None)]
pub struct Cli {
    /// Scan-root path (defaults to OS root)
    #[arg(long)]
    pub root: Option<String>,

    /// Path for the primary output (textproto/binproto, by extension)
    #[arg(long)]
    pub result: Option<String>,

    /// Additional output: FORMAT=PATH, repeatable
    #[arg(short = 'o', value_name = "FORMAT=PATH")]
    pub outputs: Vec<String>,

    /// Extractor names and/or group aliases, comma-separated
    #[arg(long, value_delimiter = ',', default_value = "default")]
    pub extractors: Vec<String>,

    /// Detector names and/or group aliases, comma-separated
    #[arg(long, value_delimiter = ',', default_value = "default")]
    pub detectors: Vec<String>,

    /// Extra absolute paths to skip, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub skip_dirs: Vec<String>,

    /// Regex of paths to skip
    #[arg(long)]
    pub skip_dir_regex: Option<String>,

    /// Glob of paths to skip
    #[arg(long)]
    pub skip_dir_glob: Option<String>,

    /// Honor .gitignore files while walking
    #[arg(long)]
    pub use_gitignore: bool,

    /// Don't recurse into subdirectories
    #[arg(long)]
    pub ignore_sub_dirs: bool,

    /// Scan a remote container image instead of the local filesystem
    #[arg(long)]
    pub remote_image: Option<String>,

    /// os/arch selector for --remote-image
    #[arg(long)]
    pub image_platform: Option<String>,

    /// Strict dependency mode: every detector's extractors must be explicitly enabled
    #[arg(long)]
    pub explicit_extractors: bool,

    /// Silently drop plugins the environment can't satisfy, instead of erroring
    #[arg(long)]
    pub filter_by_capabilities: bool,

    /// Enumerate every drive (Windows only)
    #[arg(long)]
    pub windows_all_drives: bool,

    /// Force network-offline capability
    #[arg(long)]
    pub offline: bool,

    /// Debug logging
    #[arg(long)]
    pub verbose: bool,

    /// Additional paths to extract
    pub paths: Vec<String>,
}

pub fn strip_scan_verb(mut args: Vec<String>) -> Vec<String> {
    if args.len() > 1 && args[1] == "scan" {
        args.remove(1);
    }
    args
}
