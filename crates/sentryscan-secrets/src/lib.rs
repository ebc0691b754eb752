//! Secret detection: a streaming engine that runs any number of
//! pattern-based detectors over a byte stream in bounded memory, the
//! two concrete detector kinds built on top of it, and an optional
//! online validation pass.

pub mod detector;
pub mod engine;
pub mod pgpass;
pub mod plugin;
pub mod simple_token;
pub mod validator;

pub use detector::SecretDetector;
pub use engine::{Engine, EngineConfig, EngineError};
pub use pgpass::PgpassDetector;
pub use plugin::SecretScanExtractor;
pub use simple_token::{api_key_detector, SimpleTokenDetector};
pub use validator::{SecretValidator, SimpleHttpValidator};
