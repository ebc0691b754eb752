//! Path filter: a single predicate, OR-ing together every skip rule,
//! evaluated on each walked entry.

use crate::capabilities::OsFamily;
use crate::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct PathFilterConfig {
    /// Extra absolute paths to skip, as supplied by the user. Only
    /// entries under `root` survive construction.
    pub skip_dirs: Vec<PathBuf>,
    pub skip_dir_regex: Option<String>,
    pub skip_dir_glob: Option<String>,
    pub use_gitignore: bool,
    pub ignore_sub_dirs: bool,
}

pub struct PathFilter {
    root: PathBuf,
    default_ignores: Vec<PathBuf>,
    skip_dirs: Vec<PathBuf>,
    skip_regex: Option<Regex>,
    skip_glob: Option<glob::Pattern>,
    use_gitignore: bool,
    ignore_sub_dirs: bool,
}

impl PathFilter {
    /// Fails with `Error::Config` if `skip_dir_regex` or `skip_dir_glob`
    /// does not parse; a malformed filter must not silently degrade to
    /// "no filter".
    pub fn new(root: impl Into<PathBuf>, os: OsFamily, config: PathFilterConfig) -> Result<Self> {
        let root = normalize(&root.into());

        let default_ignores = match os {
            OsFamily::Linux => vec![
                root.join("dev"),
                root.join("proc"),
                root.join("sys"),
            ],
            OsFamily::Windows => vec![root.join("Windows")],
            OsFamily::MacOs => vec![],
        };

        // Keep only skip-dirs that fall under the scan root.
        let skip_dirs = config
            .skip_dirs
            .into_iter()
            .map(|p| normalize(&p))
            .filter(|p| p.starts_with(&root))
            .collect();

        let skip_regex = config
            .skip_dir_regex
            .as_deref()
            .map(|r| {
                Regex::new(r).map_err(|e| {
                    Error::Config(format!("invalid --skip-dir-regex '{r}': {e}"))
                })
            })
            .transpose()?;
        let skip_glob = config
            .skip_dir_glob
            .as_deref()
            .map(|g| {
                glob::Pattern::new(g).map_err(|e| {
                    Error::Config(format!("invalid --skip-dir-glob '{g}': {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            root,
            default_ignores,
            skip_dirs,
            skip_regex,
            skip_glob,
            use_gitignore: config.use_gitignore,
            ignore_sub_dirs: config.ignore_sub_dirs,
        })
    }

    /// `depth` is the number of path components below the root (the
    /// root's direct children are depth 1).
    pub fn should_skip(&self, abs_path: &Path, is_dir: bool, depth: usize) -> bool {
        if self
            .default_ignores
            .iter()
            .any(|p| abs_path == p || abs_path.starts_with(p))
        {
            return true;
        }
        if self
            .skip_dirs
            .iter()
            .any(|p| abs_path == p || abs_path.starts_with(p))
        {
            return true;
        }
        let path_str = abs_path.to_string_lossy();
        if let Some(re) = &self.skip_regex {
            if re.is_match(&path_str) {
                return true;
            }
        }
        if let Some(pat) = &self.skip_glob {
            if pat.matches(&path_str) {
                return true;
            }
        }
        if self.use_gitignore && self.matches_gitignore(abs_path) {
            return true;
        }
        if is_dir && self.ignore_sub_dirs && depth >= 2 {
            return true;
        }
        false
    }

    /// Best-effort `.gitignore` support: walk from the root down to
    /// the entry's parent, treating each `.gitignore` line as a glob
    /// relative to that file's directory. Not a full gitignore-spec
    /// implementation (negation, `**`, anchoring edge cases are not
    /// handled) — sufficient for a skip-list use case.
    fn matches_gitignore(&self, abs_path: &Path) -> bool {
        let mut dir = self.root.clone();
        let relative = match abs_path.strip_prefix(&self.root) {
            Ok(r) => r,
            Err(_) => return false,
        };
        for component in relative.components() {
            let gitignore = dir.join(".gitignore");
            if let Ok(contents) = std::fs::read_to_string(&gitignore) {
                for line in contents.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Ok(pat) = glob::Pattern::new(line) {
                        if let Some(name) = abs_path.file_name().and_then(|n| n.to_str()) {
                            if pat.matches(name) {
                                return true;
                            }
                        }
                    }
                }
            }
            dir.push(component);
        }
        false
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        use std::path::Component;
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
