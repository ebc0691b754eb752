//! Discovered-package records and the in-memory index that collects them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single discovered software artifact.
///
/// Built by an extractor during the `WALKING`/`INDEXING` phases and
/// inserted into a [`PackageIndex`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    /// Ecosystem-qualified type, e.g. `"pypi"`, `"gem"`, `"nuget"`, `"dpkg"`.
    pub ecosystem: String,
    /// Paths (root-relative) where this package was observed.
    pub locations: Vec<String>,
    /// Free-form per-ecosystem metadata (e.g. architecture, source RPM).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        ecosystem: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            ecosystem: ecosystem.into(),
            locations: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_location(mut self, path: impl Into<String>) -> Self {
        self.locations.push(path.into());
        self
    }

    fn dedup_key(&self) -> (String, String, String, Vec<String>) {
        let mut locations = self.locations.clone();
        locations.sort();
        (
            self.name.clone(),
            self.version.clone(),
            self.ecosystem.clone(),
            locations,
        )
    }
}

/// Multi-map of discovered packages keyed by `(name, ecosystem)`.
///
/// Insertion order is not observable from the outside: [`get_specific`]
/// returns a set-equivalent view, and duplicate inserts (same name,
/// version, ecosystem, and location set) are collapsed.
///
/// [`get_specific`]: PackageIndex::get_specific
#[derive(Debug, Default, Clone)]
pub struct PackageIndex {
    by_key: HashMap<(String, String), Vec<Package>>,
    seen: std::collections::HashSet<(String, String, String, Vec<String>)>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a package, deduplicating identical (name, version,
    /// ecosystem, location-set) tuples.
    pub fn insert(&mut self, package: Package) {
        let key = package.dedup_key();
        if !self.seen.insert(key) {
            return;
        }
        let index_key = (package.name.clone(), package.ecosystem.clone());
        self.by_key.entry(index_key).or_default().push(package);
    }

    pub fn extend(&mut self, packages: impl IntoIterator<Item = Package>) {
        for p in packages {
            self.insert(p);
        }
    }

    /// Exact lookup by `(name, ecosystem)`. Returns an empty slice if
    /// nothing matches; never panics on an empty index.
    pub fn get_specific(&self, name: &str, ecosystem: &str) -> &[Package] {
        self.by_key
            .get(&(name.to_string(), ecosystem.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.by_key.values().flatten()
    }

    pub fn all(&self) -> Vec<Package> {
        self.iter().cloned().collect()
    }
}
