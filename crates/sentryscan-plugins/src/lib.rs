//! Concrete extractor and detector instances: one representative
//! [`FilesystemExtractor`] and two representative [`Detector`]s, wired
//! against the orchestration core the same way any other plugin would
//! be.
//!
//! [`FilesystemExtractor`]: sentryscan_core::FilesystemExtractor
//! [`Detector`]: sentryscan_core::Detector

pub mod dpkg;
pub mod eol;
pub mod shadow;

pub use dpkg::DpkgPackageExtractor;
pub use eol::{Clock, LinuxEndOfLifeDetector, SystemClock};
pub use shadow::ShadowWeakPasswordDetector;
