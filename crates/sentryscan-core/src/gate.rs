//! Capability gate: drop, or reject, plugins whose declared
//! requirements exceed what the runtime offers.

use crate::capabilities::Environment;
use crate::error::{Error, Result};
use crate::plugin::PluginHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityMode {
    /// Plugins that don't fit the environment are silently dropped.
    FilterByCapabilities,
    /// Any plugin that doesn't fit the environment is a fatal
    /// configuration error.
    Strict,
}

pub fn apply(
    plugins: Vec<PluginHandle>,
    env: &Environment,
    mode: CapabilityMode,
) -> Result<Vec<PluginHandle>> {
    let mut kept = Vec::with_capacity(plugins.len());
    for plugin in plugins {
        if env.satisfies(&plugin.capabilities()) {
            kept.push(plugin);
        } else if mode == CapabilityMode::Strict {
            return Err(Error::Capability(format!(
                "plugin '{}' requires capabilities unavailable in this environment",
                plugin.name()
            )));
        }
    }
    Ok(kept)
}
