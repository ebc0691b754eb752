//! Streaming chunked secret-detection engine.
//!
//! Applies N pattern-based detectors to an input byte stream of
//! arbitrary length, reporting every secret each detector would have
//! found had it seen the full buffer, using bounded memory. The key
//! invariant: every secret whose full extent lies within the stream is
//! emitted exactly once, even if it straddles a chunk boundary.

use crate::detector::SecretDetector;
use sentryscan_core::CancellationToken;
use sentryscan_formats::Secret;
use std::io::Read;
use thiserror::Error;

const MIN_READ_LEN: usize = 64 * 1024;
const MIN_RETAIN_LEN: usize = 1024;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine requires at least one detector")]
    NoDetectors,

    #[error("retain_len ({retain_len}) must be >= the largest detector max_secret_len ({max_secret_len})")]
    RetainLenTooSmall {
        retain_len: usize,
        max_secret_len: usize,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub read_len: usize,
    pub retain_len: usize,
}

fn next_power_of_two(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    n.next_power_of_two()
}

impl EngineConfig {
    /// `max(64 KiB, next_power_of_two(largest max_secret_len))` for
    /// both tunables, with `retain_len` additionally floored at 1 KiB.
    pub fn default_for(detectors: &[Box<dyn SecretDetector>]) -> Self {
        let largest = detectors
            .iter()
            .map(|d| d.max_secret_len() as usize)
            .max()
            .unwrap_or(0);
        let base = MIN_READ_LEN.max(next_power_of_two(largest));
        EngineConfig {
            read_len: base,
            retain_len: base.max(MIN_RETAIN_LEN),
        }
    }
}

pub struct Engine {
    detectors: Vec<Box<dyn SecretDetector>>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(detectors: Vec<Box<dyn SecretDetector>>) -> Result<Self, EngineError> {
        let config = EngineConfig::default_for(&detectors);
        Self::with_config(detectors, config)
    }

    pub fn with_config(
        detectors: Vec<Box<dyn SecretDetector>>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if detectors.is_empty() {
            return Err(EngineError::NoDetectors);
        }
        let max_secret_len = detectors
            .iter()
            .map(|d| d.max_secret_len() as usize)
            .max()
            .unwrap_or(0);
        if config.retain_len < max_secret_len {
            return Err(EngineError::RetainLenTooSmall {
                retain_len: config.retain_len,
                max_secret_len,
            });
        }
        Ok(Self { detectors, config })
    }

    /// Run every detector over `reader` in bounded memory, returning
    /// every secret found. Checks `cancel` between chunk reads; on
    /// cancellation, returns the matches accumulated so far alongside
    /// `EngineError::Cancelled`.
    pub fn scan(
        &self,
        reader: &mut dyn Read,
        cancel: &CancellationToken,
    ) -> (Vec<Secret>, Option<EngineError>) {
        let read_len = self.config.read_len;
        let retain_len = self.config.retain_len;
        let cap = read_len + retain_len;
        let mut buf = vec![0u8; cap];
        let mut found = Vec::new();

        let n = match read_full(reader, &mut buf) {
            Ok(n) => n,
            Err(e) => return (found, Some(e.into())),
        };

        if n < cap {
            // Whole-buffer mode: the entire stream fit in one chunk.
            for d in &self.detectors {
                found.extend(d.detect(&buf[..n]).into_iter().map(|(s, _)| s));
            }
            return (found, None);
        }

        for d in &self.detectors {
            let max_len = d.max_secret_len() as usize;
            let cutoff = cap.saturating_sub(max_len);
            for (secret, start) in d.detect(&buf[..cap]) {
                if start < cutoff {
                    found.push(secret);
                }
            }
        }

        loop {
            if cancel.is_cancelled() {
                return (found, Some(EngineError::Cancelled));
            }

            buf.copy_within(read_len..cap, 0);
            let n2 = match read_full(reader, &mut buf[retain_len..cap]) {
                Ok(n) => n,
                Err(e) => return (found, Some(e.into())),
            };

            if n2 < read_len {
                for d in &self.detectors {
                    let max_len = d.max_secret_len() as usize;
                    let window_start = retain_len.saturating_sub(max_len);
                    let window_end = retain_len + n2;
                    for (secret, _start) in d.detect(&buf[window_start..window_end]) {
                        found.push(secret);
                    }
                }
                break;
            }

            for d in &self.detectors {
                let max_len = d.max_secret_len() as usize;
                let left = retain_len.saturating_sub(max_len);
                let right = cap - left - max_len;
                for (secret, start) in d.detect(&buf[left..cap]) {
                    if start < right {
                        found.push(secret);
                    }
                }
            }
        }

        (found, None)
    }
}

/// Like Go's `io.ReadFull`: fill `buf` completely unless the reader
/// hits EOF first, in which case return the (smaller) number of bytes
/// actually read. Any error other than EOF aborts immediately.
fn read_full(reader: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
