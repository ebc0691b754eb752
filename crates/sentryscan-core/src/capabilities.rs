//! What a plugin needs, and what the runtime offers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsRequirement {
    Linux,
    Windows,
    MacOs,
    /// Matches Linux or macOS.
    Unix,
    Any,
}

impl OsRequirement {
    fn matches(self, actual: OsFamily) -> bool {
        match self {
            OsRequirement::Any => true,
            OsRequirement::Unix => matches!(actual, OsFamily::Linux | OsFamily::MacOs),
            OsRequirement::Linux => actual == OsFamily::Linux,
            OsRequirement::Windows => actual == OsFamily::Windows,
            OsRequirement::MacOs => actual == OsFamily::MacOs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsFamily {
    Linux,
    Windows,
    MacOs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Network {
    Online,
    Offline,
}

/// What a plugin declares it needs to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub os: OsRequirement,
    pub direct_fs: bool,
    pub running_system: bool,
    pub network: Network,
}

impl Capabilities {
    pub const fn none() -> Self {
        Self {
            os: OsRequirement::Any,
            direct_fs: false,
            running_system: false,
            network: Network::Offline,
        }
    }
}

/// What the scanning environment actually offers. Used only by the
/// capability gate (C4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    pub os: OsFamily,
    pub direct_fs: bool,
    pub running_system: bool,
    pub online: bool,
}

impl Environment {
    /// A plugin's declared requirement must be a subset of what the
    /// environment offers.
    pub fn satisfies(&self, required: &Capabilities) -> bool {
        if !required.os.matches(self.os) {
            return false;
        }
        if required.direct_fs && !self.direct_fs {
            return false;
        }
        if required.running_system && !self.running_system {
            return false;
        }
        if matches!(required.network, Network::Online) && !self.online {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_requirement_accepts_linux_and_macos_not_windows() {
        let env_linux = Environment {
            os: OsFamily::Linux,
            direct_fs: true,
            running_system: true,
            online: true,
        };
        let env_windows = Environment {
            os: OsFamily::Windows,
            ..env_linux
        };
        let req = Capabilities {
            os: OsRequirement::Unix,
            ..Capabilities::none()
        };
        assert!(env_linux.satisfies(&req));
        assert!(!env_windows.satisfies(&req));
    }

    #[test]
    fn offline_environment_rejects_online_requirement() {
        let env = Environment {
            os: OsFamily::Linux,
            direct_fs: false,
            running_system: false,
            online: false,
        };
        let req = Capabilities {
            network: Network::Online,
            ..Capabilities::none()
        };
        assert!(!env.satisfies(&req));
    }
}
