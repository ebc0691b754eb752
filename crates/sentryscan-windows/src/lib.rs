//! Offline Windows SAM/SYSTEM credential recovery: syskey assembly,
//! SAM domain-key derivation, per-user hash decryption, and a bounded
//! dictionary cracker, wired into a
//! [`Detector`](sentryscan_core::Detector).

pub mod cracker;
pub mod detector;
pub mod domain_key;
pub mod error;
pub mod hashes;
pub mod pipeline;
pub mod primitives;
pub mod registry;
pub mod syskey;
pub mod user;

pub use cracker::{crack, CrackError, HashKind, CANDIDATE_PASSWORDS};
pub use detector::WindowsWeakCredentialsDetector;
pub use error::{Result, WindowsError};
pub use pipeline::{recover, RecoveredUser, RecoveryResult, UserFailure};
pub use registry::{FakeHive, FakeKey, FakeValue, RegistryHive, RegistryKey, RegistryValue};
