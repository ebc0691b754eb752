//! Filesystem abstraction: a real-disk implementation, and an
//! in-memory fake for tests. A tar-backed variant for scanning
//! container image layers would slot in here too, but image-layer
//! flattening is out of scope for this workspace.
//!
//! Paths are forward-slash, root-relative.

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub is_dir: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: String,
    pub info: FileInfo,
}

/// The path of a file materialized to real disk, for extractors whose
/// backing parser needs a real path (native PE parsers, some registry
/// libraries). If the filesystem isn't already real, this is a temp
/// copy that is deleted when the guard drops — a guaranteed release on
/// every exit path, including cancellation or an extractor error.
pub struct MaterializedPath {
    path: PathBuf,
    cleanup: Option<PathBuf>,
}

impl MaterializedPath {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MaterializedPath {
    fn drop(&mut self) {
        if let Some(p) = self.cleanup.take() {
            let _ = std::fs::remove_file(p);
        }
    }
}

pub trait FileSystem: Send + Sync {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>>;
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>>;
    fn stat(&self, path: &str) -> io::Result<FileInfo>;
    fn materialize(&self, path: &str) -> io::Result<MaterializedPath>;
}

/// Backed by the real, local filesystem rooted at `root`.
pub struct RealFileSystem {
    root: PathBuf,
}

impl RealFileSystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl FileSystem for RealFileSystem {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(std::fs::File::open(self.resolve(path))?))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(self.resolve(path))? {
            let entry = entry?;
            let meta = entry.metadata()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let child_path = if path == "/" || path.is_empty() {
                format!("/{name}")
            } else {
                format!("{}/{}", path.trim_end_matches('/'), name)
            };
            out.push(DirEntry {
                path: child_path,
                info: FileInfo {
                    size: meta.len(),
                    is_dir: meta.is_dir(),
                },
            });
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    fn stat(&self, path: &str) -> io::Result<FileInfo> {
        let meta = std::fs::metadata(self.resolve(path))?;
        Ok(FileInfo {
            size: meta.len(),
            is_dir: meta.is_dir(),
        })
    }

    fn materialize(&self, path: &str) -> io::Result<MaterializedPath> {
        Ok(MaterializedPath {
            path: self.resolve(path),
            cleanup: None,
        })
    }
}

/// An in-memory filesystem fake, for unit and integration tests. Not
/// backed by real files, so `materialize` copies content into a real
/// temp file that the caller must (and the guard will) delete.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFileSystem {
    files: Arc<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryFileSystem {
    pub fn new(files: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            files: Arc::new(files.into_iter().collect()),
        }
    }

    fn normalize(path: &str) -> String {
        if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        }
    }
}

impl FileSystem for InMemoryFileSystem {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send>> {
        let key = Self::normalize(path);
        let bytes = self
            .files
            .get(&key)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, key))?
            .clone();
        Ok(Box::new(io::Cursor::new(bytes)))
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let prefix = if path == "/" || path.is_empty() {
            "/".to_string()
        } else {
            format!("{}/", Self::normalize(path).trim_end_matches('/'))
        };
        let mut seen = BTreeMap::new();
        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let (first, remainder) = match rest.split_once('/') {
                Some((a, b)) => (a, Some(b)),
                None => (rest, None),
            };
            let child_path = format!("{prefix}{first}");
            let is_dir = remainder.is_some();
            seen.entry(child_path.clone())
                .or_insert_with(|| DirEntry {
                    path: child_path,
                    info: FileInfo {
                        size: if is_dir {
                            0
                        } else {
                            self.files.get(key).map(Vec::len).unwrap_or(0) as u64
                        },
                        is_dir,
                    },
                });
        }
        Ok(seen.into_values().collect())
    }

    fn stat(&self, path: &str) -> io::Result<FileInfo> {
        let key = Self::normalize(path);
        if let Some(bytes) = self.files.get(&key) {
            return Ok(FileInfo {
                size: bytes.len() as u64,
                is_dir: false,
            });
        }
        let prefix = format!("{}/", key.trim_end_matches('/'));
        if self.files.keys().any(|k| k.starts_with(&prefix)) {
            return Ok(FileInfo {
                size: 0,
                is_dir: true,
            });
        }
        Err(io::Error::new(io::ErrorKind::NotFound, key))
    }

    fn materialize(&self, path: &str) -> io::Result<MaterializedPath> {
        let mut reader = self.open(path)?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        // Computed here, at materialize time, rather than cached at
        // process start, to avoid cross-run temp-path collisions.
        let named = tempfile::Builder::new()
            .prefix("sentryscan-")
            .tempfile()?;
        let (file, tmp_path) = named.keep().map_err(|e| e.error)?;
        drop(file);
        std::fs::write(&tmp_path, bytes)?;
        Ok(MaterializedPath {
            path: tmp_path.clone(),
            cleanup: Some(tmp_path),
        })
    }
}
