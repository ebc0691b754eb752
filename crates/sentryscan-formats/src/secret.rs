//! The tagged value returned by secret detectors.

use serde::{Deserialize, Serialize};

/// An opaque, tagged secret value. Each variant is one secret kind;
/// new kinds are added here as new detectors are introduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Secret {
    ApiKey {
        key: String,
    },
    PgpassEntry {
        host: String,
        port: String,
        db: String,
        user: String,
        password: String,
    },
}

/// The outcome of running a [`crate::Secret`] through a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Valid,
    Invalid,
    Failed,
}
