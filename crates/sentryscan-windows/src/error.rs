//! Typed errors for the offline SAM/SYSTEM credential-recovery
//! pipeline.

#[derive(Debug, thiserror::Error)]
pub enum WindowsError {
    #[error("registry key not found: {0}")]
    KeyNotFound(String),

    #[error("registry value not found: {key}\\{value}")]
    ValueNotFound { key: String, value: String },

    #[error("unrecognized domain-key revision: {0}")]
    InvalidRevision(u32),

    #[error("domain-key checksum verification failed")]
    ChecksumMismatch,

    #[error("malformed V record")]
    MalformedV,

    #[error("malformed F record")]
    MalformedF,

    #[error("hex decoding failed: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("cipher operation failed")]
    CipherFailure,

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, WindowsError>;
