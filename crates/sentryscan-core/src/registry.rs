//! Named plugin catalogue with group aliases.

use crate::error::{Error, Result};
use crate::plugin::PluginHandle;
use std::collections::{HashMap, HashSet};

/// A catalogue of plugins, plus named groups of plugin names
/// (`"cis"`, `"all"`, ...). Selecting a group is equivalent to
/// selecting every plugin it expands to.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, PluginHandle>,
    groups: HashMap<String, Vec<String>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.groups.insert("default".to_string(), Vec::new());
        registry
    }

    /// Register one plugin. Names are case-normalized to lowercase.
    pub fn register(&mut self, plugin: PluginHandle) {
        self.plugins.insert(plugin.name().to_lowercase(), plugin);
    }

    /// Define (or extend) a named group. Duplicate names across groups
    /// are fine; they are deduplicated on lookup.
    pub fn define_group(&mut self, group: impl Into<String>, members: impl IntoIterator<Item = String>) {
        self.groups
            .entry(group.into())
            .or_default()
            .extend(members.into_iter().map(|m| m.to_lowercase()));
    }

    pub fn get(&self, name: &str) -> Option<&PluginHandle> {
        self.plugins.get(&name.to_lowercase())
    }

    pub fn all_names(&self) -> Vec<String> {
        self.plugins.keys().cloned().collect()
    }

    /// Expand a list of names and/or group aliases (e.g. `"cis"`,
    /// `"all"`) into a deduplicated set of concrete plugin names.
    /// Unknown names produce `Error::UnknownPlugin`.
    pub fn resolve_selection(&self, selection: &[String]) -> Result<Vec<String>> {
        let mut resolved = Vec::new();
        let mut seen = HashSet::new();

        let mut push_unique = |name: String, resolved: &mut Vec<String>| {
            if seen.insert(name.clone()) {
                resolved.push(name);
            }
        };

        for raw in selection {
            let name = raw.to_lowercase();
            if name == "all" {
                for n in self.plugins.keys() {
                    push_unique(n.clone(), &mut resolved);
                }
                continue;
            }
            if let Some(members) = self.groups.get(&name) {
                for m in members {
                    if !self.plugins.contains_key(m) {
                        return Err(Error::UnknownPlugin(m.clone()));
                    }
                    push_unique(m.clone(), &mut resolved);
                }
                continue;
            }
            if self.plugins.contains_key(&name) {
                push_unique(name, &mut resolved);
                continue;
            }
            return Err(Error::UnknownPlugin(name));
        }

        Ok(resolved)
    }

    pub fn resolve_handles(&self, selection: &[String]) -> Result<Vec<PluginHandle>> {
        self.resolve_selection(selection)
            .map(|names| names.iter().filter_map(|n| self.get(n).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::plugin::{Detector, Plugin};
    use sentryscan_formats::{Advisory, Inventory, PackageIndex, Severity};
    use std::sync::Arc;

    struct StubDetector(&'static str);

    impl Plugin for StubDetector {
        fn name(&self) -> &str {
            self.0
        }
        fn version(&self) -> u32 {
            1
        }
        fn capabilities(&self) -> Capabilities {
            Capabilities::none()
        }
    }

    impl Detector for StubDetector {
        fn required_extractors(&self) -> Vec<String> {
            vec![]
        }
        fn detected_finding(&self) -> Advisory {
            Advisory {
                publisher: "TEST".into(),
                reference: "stub".into(),
                title: "stub".into(),
                description: "stub".into(),
                recommendation: "stub".into(),
                severity: Severity::Low,
            }
        }
        fn scan(
            &self,
            _root: &crate::plugin::ScanRoot,
            _index: &PackageIndex,
            _cancel: &crate::cancellation::CancellationToken,
        ) -> (Inventory, Option<crate::error::Error>) {
            (Inventory::default(), None)
        }
    }

    fn registry_with_two_detectors() -> PluginRegistry {
        let mut r = PluginRegistry::new();
        r.register(PluginHandle::Detector(Arc::new(StubDetector("cve"))));
        r.register(PluginHandle::Detector(Arc::new(StubDetector("cis-bench"))));
        r.define_group("cis", ["cis-bench".to_string()]);
        r
    }

    #[test]
    fn group_alias_expands_and_dedups() {
        let r = registry_with_two_detectors();
        let resolved = r
            .resolve_selection(&["cis".to_string(), "cis-bench".to_string()])
            .unwrap();
        assert_eq!(resolved, vec!["cis-bench".to_string()]);
    }

    #[test]
    fn unknown_plugin_errors() {
        let r = registry_with_two_detectors();
        assert!(matches!(
            r.resolve_selection(&["nope".to_string()]),
            Err(Error::UnknownPlugin(_))
        ));
    }

    #[test]
    fn all_expands_to_every_plugin() {
        let r = registry_with_two_detectors();
        let mut resolved = r.resolve_selection(&["all".to_string()]).unwrap();
        resolved.sort();
        assert_eq!(resolved, vec!["cis-bench".to_string(), "cve".to_string()]);
    }
}
