//! Error taxonomy shared by the orchestration core and its downstream
//! crates (`sentryscan-secrets`, `sentryscan-windows`).
//!
//! These are *kinds*, not one type per failure site: per-plugin errors
//! are trapped at the orchestrator boundary and recorded against that
//! plugin's status; only a config error and a walk that never started
//! turn into an overall `FAILED` scan.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    #[error("capability error: {0}")]
    Capability(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("file size limit exceeded: {path}")]
    SizeLimitExceeded { path: String },

    #[error("operation timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;
