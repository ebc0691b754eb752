//! Simple-token secret detector: a regex-driven detector instance used
//! by most secret kinds (API keys, tokens, …), built on a pattern-table
//! idiom.

use crate::detector::SecretDetector;
use regex::bytes::Regex;
use sentryscan_formats::Secret;

pub struct SimpleTokenDetector {
    max_len: u32,
    regex: Regex,
    from_match: Box<dyn Fn(&str) -> Secret + Send + Sync>,
}

impl SimpleTokenDetector {
    pub fn new(
        max_len: u32,
        regex: Regex,
        from_match: impl Fn(&str) -> Secret + Send + Sync + 'static,
    ) -> Self {
        Self {
            max_len,
            regex,
            from_match: Box::new(from_match),
        }
    }
}

impl SecretDetector for SimpleTokenDetector {
    fn max_secret_len(&self) -> u32 {
        self.max_len
    }

    fn detect(&self, data: &[u8]) -> Vec<(Secret, usize)> {
        self.regex
            .find_iter(data)
            .map(|m| {
                let text = String::from_utf8_lossy(m.as_bytes());
                ((self.from_match)(&text), m.start())
            })
            .collect()
    }
}

/// A generic API-key detector: `key_` followed by 64 base-62
/// characters.
pub fn api_key_detector() -> SimpleTokenDetector {
    SimpleTokenDetector::new(
        68,
        Regex::new(r"key_[A-Za-z0-9]{64}").expect("valid regex"),
        |m| Secret::ApiKey {
            key: m.to_string(),
        },
    )
}
