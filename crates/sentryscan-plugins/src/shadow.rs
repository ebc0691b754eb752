//! Weak `/etc/shadow` password detector: runs each account's password
//! hash through the bounded dictionary cracker shared with the
//! Windows pipeline and reports any that fall to it.

use sentryscan_core::capabilities::Capabilities;
use sentryscan_core::{CancellationToken, Detector, Error, Plugin, ScanRoot};
use sentryscan_formats::{Advisory, Finding, FindingTarget, Inventory, PackageIndex, Severity};
use sentryscan_windows::{crack, HashKind};
use std::io::Read;

pub const WEAK_PASSWORD_REFERENCE: &str = "WEAK_PASSWORD";
const SHADOW_PATH: &str = "/etc/shadow";

/// Entries with one of these hash fields have no crackable password
/// at all (locked account, password auth disabled, or passwordless
/// login) and are skipped outright.
fn is_uncrackable_placeholder(hash: &str) -> bool {
    hash.is_empty() || hash.starts_with('*') || hash.starts_with('!')
}

pub struct ShadowWeakPasswordDetector;

impl Plugin for ShadowWeakPasswordDetector {
    fn name(&self) -> &str {
        "shadow-weak-password"
    }

    fn version(&self) -> u32 {
        1
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
    }
}

impl ShadowWeakPasswordDetector {
    fn advisory() -> Advisory {
        Advisory {
            publisher: "SENTRYSCAN".into(),
            reference: WEAK_PASSWORD_REFERENCE.into(),
            title: "Weak account password".into(),
            description: "A /etc/shadow password hash was recovered from a bounded dictionary attack."
                .into(),
            recommendation: "Set a stronger password and enforce a password policy.".into(),
            severity: Severity::High,
        }
    }
}

/// This extractor doesn't read the file directly through a
/// `FilesystemExtractor` pass: unlike package manifests, the shadow
/// file's content is security-sensitive and only ever needed by this
/// one detector, so it's read straight from the `ScanRoot` here rather
/// than indexed for general consumption.
impl Detector for ShadowWeakPasswordDetector {
    fn required_extractors(&self) -> Vec<String> {
        Vec::new()
    }

    fn detected_finding(&self) -> Advisory {
        Self::advisory()
    }

    fn scan(
        &self,
        root: &ScanRoot,
        _index: &PackageIndex,
        cancel: &CancellationToken,
    ) -> (Inventory, Option<Error>) {
        let mut inventory = Inventory::default();

        let mut reader = match root.fs.open(SHADOW_PATH) {
            Ok(reader) => reader,
            Err(_) => return (inventory, None),
        };
        let mut buf = String::new();
        if let Err(e) = reader.read_to_string(&mut buf) {
            return (inventory, Some(Error::Io(e)));
        }

        for line in buf.lines() {
            if cancel.is_cancelled() {
                return (inventory, Some(Error::Cancelled));
            }
            let Some((username, hash)) = parse_entry(line) else {
                continue;
            };
            if is_uncrackable_placeholder(hash) {
                continue;
            }
            if let Ok(password) = crack(hash, HashKind::Auto, cancel) {
                inventory.findings.push(Finding {
                    advisory: Self::advisory(),
                    target: FindingTarget::Extra(format!(
                        "account \"{username}\" has password \"{password}\""
                    )),
                });
            }
        }

        (inventory, None)
    }
}

fn parse_entry(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.split(':');
    let username = fields.next()?;
    let hash = fields.next()?;
    if username.is_empty() {
        return None;
    }
    Some((username, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentryscan_core::fs::InMemoryFileSystem;
    use std::sync::Arc;

    fn run(shadow: &str) -> Inventory {
        let fs = InMemoryFileSystem::new([(SHADOW_PATH.to_string(), shadow.as_bytes().to_vec())]);
        let root = ScanRoot::new(Arc::new(fs), "/");
        let (inventory, err) =
            ShadowWeakPasswordDetector.scan(&root, &PackageIndex::default(), &CancellationToken::new());
        assert!(err.is_none());
        inventory
    }

    #[test]
    fn recovers_a_weak_sha512crypt_password() {
        let params = sha_crypt::Sha512Params::new(5_000).unwrap();
        let hash = sha_crypt::sha512_simple("password", &params).unwrap();
        let shadow = format!("alice:{hash}:19000:0:99999:7:::\n");
        let inventory = run(&shadow);
        assert_eq!(inventory.findings.len(), 1);
        assert_eq!(inventory.findings[0].advisory.reference, WEAK_PASSWORD_REFERENCE);
    }

    #[test]
    fn locked_and_passwordless_accounts_are_skipped() {
        let shadow = "root:!:19000:0:99999:7:::\ndaemon:*:19000:0:99999:7:::\nnoauth::19000:0:99999:7:::\n";
        let inventory = run(shadow);
        assert!(inventory.findings.is_empty());
    }

    #[test]
    fn strong_password_is_not_reported() {
        let params = sha_crypt::Sha512Params::new(5_000).unwrap();
        let hash = sha_crypt::sha512_simple(
            "this-is-not-in-the-candidate-list-at-all-9f8a",
            &params,
        )
        .unwrap();
        let shadow = format!("bob:{hash}:19000:0:99999:7:::\n");
        let inventory = run(&shadow);
        assert!(inventory.findings.is_empty());
    }

    #[test]
    fn cancellation_reports_cancelled_without_dropping_the_inventory() {
        let shadow = "root:!:19000:0:99999:7:::\n";
        let fs = InMemoryFileSystem::new([(SHADOW_PATH.to_string(), shadow.as_bytes().to_vec())]);
        let root = ScanRoot::new(Arc::new(fs), "/");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (inventory, err) =
            ShadowWeakPasswordDetector.scan(&root, &PackageIndex::default(), &cancel);

        assert!(matches!(err, Some(Error::Cancelled)));
        assert!(inventory.findings.is_empty());
    }

    #[test]
    fn missing_shadow_file_yields_no_findings_and_no_error() {
        let fs = InMemoryFileSystem::new([]);
        let root = ScanRoot::new(Arc::new(fs), "/");
        let (inventory, err) =
            ShadowWeakPasswordDetector.scan(&root, &PackageIndex::default(), &CancellationToken::new());
        assert!(err.is_none());
        assert!(inventory.findings.is_empty());
    }
}
