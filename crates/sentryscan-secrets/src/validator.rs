//! Liveness validation for discovered secrets: an optional, online-only
//! pass that asks the issuing service whether a found credential is
//! still active.

use sentryscan_formats::{Secret, ValidationStatus};
use std::collections::HashSet;
use std::time::Duration;

pub trait SecretValidator: Send + Sync {
    fn validate(&self, secret: &Secret) -> ValidationStatus;
}

/// Validates a secret with a single HTTP request, classifying the
/// response status code as the secret being live, dead, or the check
/// itself having failed (network error, timeout, unrecognized code).
pub struct SimpleHttpValidator {
    agent: ureq::Agent,
    valid_statuses: HashSet<u16>,
    invalid_statuses: HashSet<u16>,
    send_request: Box<dyn Fn(&ureq::Agent, &Secret) -> Result<u16, ureq::Error> + Send + Sync>,
}

impl SimpleHttpValidator {
    pub fn new(
        valid_statuses: impl IntoIterator<Item = u16>,
        invalid_statuses: impl IntoIterator<Item = u16>,
        send_request: impl Fn(&ureq::Agent, &Secret) -> Result<u16, ureq::Error>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(5)))
            .build()
            .into();
        Self {
            agent,
            valid_statuses: valid_statuses.into_iter().collect(),
            invalid_statuses: invalid_statuses.into_iter().collect(),
            send_request: Box::new(send_request),
        }
    }
}

impl SecretValidator for SimpleHttpValidator {
    fn validate(&self, secret: &Secret) -> ValidationStatus {
        match (self.send_request)(&self.agent, secret) {
            Ok(status) if self.valid_statuses.contains(&status) => ValidationStatus::Valid,
            Ok(status) if self.invalid_statuses.contains(&status) => ValidationStatus::Invalid,
            _ => ValidationStatus::Failed,
        }
    }
}
