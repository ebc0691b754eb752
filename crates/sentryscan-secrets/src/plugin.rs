//! Wires the streaming engine into the orchestration core as a
//! [`FilesystemExtractor`], the same shape the dpkg extractor uses in
//! `sentryscan-plugins`.

use crate::engine::Engine;
use crate::pgpass::PgpassDetector;
use crate::simple_token::api_key_detector;
use sentryscan_core::capabilities::Capabilities;
use sentryscan_core::fs::FileInfo;
use sentryscan_core::{CancellationToken, FilesystemExtractor, Plugin, Result, ScanInput};
use sentryscan_formats::Inventory;

/// Files above this size are not handed to the secret engine; it
/// already streams in bounded memory, but there is no value scanning
/// multi-gigabyte binaries for line-oriented credential patterns.
const MAX_SECRET_SCAN_BYTES: u64 = 64 * 1024 * 1024;

pub struct SecretScanExtractor {
    engine: Engine,
}

impl Default for SecretScanExtractor {
    fn default() -> Self {
        let detectors: Vec<Box<dyn crate::detector::SecretDetector>> =
            vec![Box::new(api_key_detector()), Box::new(PgpassDetector)];
        Self {
            engine: Engine::new(detectors).expect("at least one built-in secret detector"),
        }
    }
}

impl Plugin for SecretScanExtractor {
    fn name(&self) -> &str {
        "secrets"
    }

    fn version(&self) -> u32 {
        1
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
    }
}

impl FilesystemExtractor for SecretScanExtractor {
    fn file_required(&self, _path: &str, info: &FileInfo) -> bool {
        !info.is_dir && info.size <= MAX_SECRET_SCAN_BYTES
    }

    fn max_file_size_bytes(&self) -> u64 {
        MAX_SECRET_SCAN_BYTES
    }

    fn extract(&self, mut input: ScanInput<'_>, cancel: &CancellationToken) -> Result<Inventory> {
        let (secrets, err) = self.engine.scan(&mut input.reader, cancel);
        if let Some(err) = err {
            return Err(match err {
                crate::engine::EngineError::Cancelled => sentryscan_core::Error::Cancelled,
                other => sentryscan_core::Error::Parse(other.to_string()),
            });
        }
        let mut inventory = Inventory::default();
        inventory.secrets = secrets;
        Ok(inventory)
    }
}
