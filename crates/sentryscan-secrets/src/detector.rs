//! The per-detector contract the streaming engine multiplexes over.

use sentryscan_formats::Secret;

pub trait SecretDetector: Send + Sync {
    /// Upper bound on the length of any secret this detector can
    /// emit. Zero means the detector manages its own buffering and
    /// needs no minimum input length.
    fn max_secret_len(&self) -> u32;

    /// Every match in `data`, paired with the byte offset (relative to
    /// `data`) of its first character. Implementations must return
    /// matches in a stable order for a given input so downstream
    /// deduplication across chunk boundaries behaves predictably.
    fn detect(&self, data: &[u8]) -> Vec<(Secret, usize)>;
}
