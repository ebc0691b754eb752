//! The Windows weak-credentials detector: runs the SAM/SYSTEM recovery
//! pipeline and reports accounts with a cracked password, plus one
//! global finding if any LM hash was stored at all.
//!
//! Unlike the other detectors in this workspace, this one is wired
//! with its hives at construction time rather than discovering them
//! by walking the filesystem: producing a [`RegistryHive`] from a raw
//! on-disk SYSTEM/SAM file is a binary-format-parsing concern of its
//! own (see the module doc on [`crate::registry`]), owned by whatever
//! assembles the plugin registry for a live Windows host.

use crate::error::WindowsError;
use crate::pipeline::{recover, RecoveryResult};
use crate::registry::RegistryHive;
use sentryscan_core::capabilities::{Capabilities, OsRequirement};
use sentryscan_core::{CancellationToken, Detector, Plugin, ScanRoot};
use sentryscan_formats::{Advisory, Finding, FindingTarget, Inventory, PackageIndex, Severity};
use std::sync::Arc;

pub const WEAK_PASSWORD_REFERENCE: &str = "WINDOWS_WEAK_PASSWORD";
pub const LM_STORAGE_PRESENT_REFERENCE: &str = "WINDOWS_LM_STORAGE_PRESENT";

pub struct WindowsWeakCredentialsDetector {
    system: Arc<dyn RegistryHive>,
    sam: Arc<dyn RegistryHive>,
}

impl WindowsWeakCredentialsDetector {
    pub fn new(system: Arc<dyn RegistryHive>, sam: Arc<dyn RegistryHive>) -> Self {
        Self { system, sam }
    }

    fn weak_password_advisory() -> Advisory {
        Advisory {
            publisher: "SENTRYSCAN".into(),
            reference: WEAK_PASSWORD_REFERENCE.into(),
            title: "Weak Windows account password".into(),
            description: "A local account's password hash was recovered from a bounded dictionary attack."
                .into(),
            recommendation: "Set a stronger password and enforce a password policy.".into(),
            severity: Severity::High,
        }
    }

    fn lm_storage_advisory() -> Advisory {
        Advisory {
            publisher: "SENTRYSCAN".into(),
            reference: LM_STORAGE_PRESENT_REFERENCE.into(),
            title: "LM hash storage enabled".into(),
            description: "At least one local account has a non-empty LM hash, a legacy format trivially brute-forced."
                .into(),
            recommendation: "Disable LM hash storage (NoLMHash) and force a password reset.".into(),
            severity: Severity::Medium,
        }
    }

    fn findings_from(result: &RecoveryResult) -> Inventory {
        let mut inventory = Inventory::default();
        let mut any_lm_present = false;

        for user in &result.users {
            if !user.lm_hash.is_empty() {
                any_lm_present = true;
            }
            if let Some(password) = &user.cracked_password {
                inventory.findings.push(Finding {
                    advisory: Self::weak_password_advisory(),
                    target: FindingTarget::Extra(format!(
                        "user {} (RID {:08X}) has password \"{}\"",
                        user.username, user.rid, password
                    )),
                });
            }
        }

        if any_lm_present {
            inventory.findings.push(Finding {
                advisory: Self::lm_storage_advisory(),
                target: FindingTarget::Extra(
                    "one or more accounts store a non-empty LM hash".to_string(),
                ),
            });
        }

        inventory
    }
}

impl Plugin for WindowsWeakCredentialsDetector {
    fn name(&self) -> &str {
        "windows-weak-credentials"
    }

    fn version(&self) -> u32 {
        1
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            os: OsRequirement::Windows,
            ..Capabilities::none()
        }
    }
}

impl Detector for WindowsWeakCredentialsDetector {
    fn required_extractors(&self) -> Vec<String> {
        Vec::new()
    }

    fn detected_finding(&self) -> Advisory {
        Self::weak_password_advisory()
    }

    fn scan(
        &self,
        _root: &ScanRoot,
        _index: &PackageIndex,
        cancel: &CancellationToken,
    ) -> (Inventory, Option<sentryscan_core::Error>) {
        let (result, cancelled_err) =
            match recover(self.system.as_ref(), self.sam.as_ref(), cancel) {
                Ok(result) => (result, None),
                Err((partial, err)) => (partial, Some(err)),
            };

        let inventory = Self::findings_from(&result);

        let err = cancelled_err.map(|err| match err {
            WindowsError::Cancelled => sentryscan_core::Error::Cancelled,
            other => sentryscan_core::Error::Crypto(other.to_string()),
        });

        (inventory, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{utf16le, FakeHive, FakeKey, FakeValue};
    use crate::primitives::{des_ecb_encrypt_block, md5, rc4_apply, str_to_des_keys};

    const SYSKEY: [u8; 16] = [
        0x88, 0x93, 0xae, 0x93, 0x45, 0x13, 0xbd, 0xdd, 0x25, 0x47, 0x35, 0x16, 0x3e, 0x9d, 0x33,
        0x00,
    ];
    const DOMAIN_KEY: [u8; 16] = [
        0x3d, 0x21, 0x2c, 0xe8, 0xa2, 0xda, 0x83, 0x43, 0xbd, 0xad, 0x1e, 0xf2, 0xcf, 0xb6, 0xb3,
        0x1c,
    ];
    const QWERTY: &[u8] = b"!@#$%^&*()qwertyUIOPAzxcvbnmQQQQQQQQQQQQ)(*@&%\0";
    const DIGITS: &[u8] = b"0123456789012345678901234567890123456789\0";

    fn system_hive_fixture() -> FakeHive {
        let lsa = FakeKey::default()
            .with_subkey("JD", FakeKey::default().with_class_name(utf16le("253593dd")))
            .with_subkey("Skew1", FakeKey::default().with_class_name(utf16le("ae934700")))
            .with_subkey("GBG", FakeKey::default().with_class_name(utf16le("88139d45")))
            .with_subkey("Data", FakeKey::default().with_class_name(utf16le("16bd3e33")));
        let control_set =
            FakeKey::default().with_subkey("Control", FakeKey::default().with_subkey("Lsa", lsa));
        let root = FakeKey::default()
            .with_subkey(
                "Select",
                FakeKey::default().with_value(FakeValue::new("Current", 1u32.to_le_bytes())),
            )
            .with_subkey("ControlSet001", control_set);
        FakeHive::new(root)
    }

    fn domain_f_fixture() -> Vec<u8> {
        let salt = [0x11u8; 16];
        let mut rc4_key_material = Vec::new();
        rc4_key_material.extend_from_slice(&salt);
        rc4_key_material.extend_from_slice(QWERTY);
        rc4_key_material.extend_from_slice(&SYSKEY);
        rc4_key_material.extend_from_slice(DIGITS);
        let rc4_key = md5(&rc4_key_material);

        let mut checksum_material = Vec::new();
        checksum_material.extend_from_slice(&DOMAIN_KEY);
        checksum_material.extend_from_slice(DIGITS);
        checksum_material.extend_from_slice(&DOMAIN_KEY);
        checksum_material.extend_from_slice(QWERTY);
        let checksum = md5(&checksum_material);

        let mut plaintext = Vec::with_capacity(32);
        plaintext.extend_from_slice(&DOMAIN_KEY);
        plaintext.extend_from_slice(&checksum);
        let ciphertext = rc4_apply(&rc4_key, &plaintext);

        let mut f_value = vec![0u8; 0x68];
        f_value.extend_from_slice(&1u32.to_le_bytes());
        f_value.extend_from_slice(&56u32.to_le_bytes());
        f_value.extend_from_slice(&salt);
        f_value.extend_from_slice(&ciphertext);
        f_value
    }

    fn rc4_hash_blob(hash: &[u8; 16], rid: u32, constant: &[u8]) -> Vec<u8> {
        let rid_le = rid.to_le_bytes();
        let mut key_material = Vec::new();
        key_material.extend_from_slice(&rid_le);
        key_material.extend_from_slice(constant);
        let (key1, key2) = str_to_des_keys(&key_material);
        let mut intermediate = [0u8; 16];
        des_ecb_encrypt_block(&key1, &hash[0..8], &mut intermediate[0..8]);
        des_ecb_encrypt_block(&key2, &hash[8..16], &mut intermediate[8..16]);

        let mut rc4_material = Vec::new();
        rc4_material.extend_from_slice(&DOMAIN_KEY);
        rc4_material.extend_from_slice(&rid_le);
        rc4_material.extend_from_slice(constant);
        let rc4_key = md5(&rc4_material);
        let ciphertext = rc4_apply(&rc4_key, &intermediate);

        let mut blob = vec![0u8; 4];
        blob[2] = 0x01;
        blob.extend_from_slice(&ciphertext);
        blob
    }

    fn build_v(username: &str, lm_blob: &[u8], nt_blob: &[u8]) -> Vec<u8> {
        let username_bytes = utf16le(username);
        let mut body = Vec::new();
        body.extend_from_slice(&username_bytes);
        let lm_offset = body.len() as u32;
        body.extend_from_slice(lm_blob);
        let nt_offset = body.len() as u32;
        body.extend_from_slice(nt_blob);

        let mut header = vec![0u8; 0xCC];
        header[0x0c..0x10].copy_from_slice(&0u32.to_le_bytes());
        header[0x10..0x14].copy_from_slice(&(username_bytes.len() as u32).to_le_bytes());
        header[0x9c..0xa0].copy_from_slice(&lm_offset.to_le_bytes());
        header[0xa0..0xa4].copy_from_slice(&(lm_blob.len() as u32).to_le_bytes());
        header[0xa8..0xac].copy_from_slice(&nt_offset.to_le_bytes());
        header[0xac..0xb0].copy_from_slice(&(nt_blob.len() as u32).to_le_bytes());

        header.extend_from_slice(&body);
        header
    }

    fn sam_hive_fixture() -> FakeHive {
        // RID 3E8: LM empty, NT = MD4("root" UTF-16-LE), a weak
        // dictionary password that the cracker should recover.
        let nt_hash: [u8; 16] = [
            0x32, 0x91, 0x53, 0xF5, 0x60, 0xEB, 0x32, 0x9C, 0x0E, 0x1D, 0xEE, 0xA5, 0x5E, 0x88,
            0xA1, 0xE9,
        ];
        let nt_blob = rc4_hash_blob(&nt_hash, 0x3E8, b"NTPASSWORD\0");
        let v = build_v("root", &[], &nt_blob);
        let mut f = vec![0u8; 0x50];
        f[0x38] = 0x00; // enabled

        let user = FakeKey::default()
            .with_value(FakeValue::new("V", v))
            .with_value(FakeValue::new("F", f));

        let users = FakeKey::default().with_subkey("000003E8", user);
        let account = FakeKey::default()
            .with_value(FakeValue::new("F", domain_f_fixture()))
            .with_subkey("Users", users);
        let root = FakeKey::default().with_subkey(
            "Domains",
            FakeKey::default().with_subkey("Account", account),
        );
        FakeHive::new(root)
    }

    #[test]
    fn reports_weak_password_and_no_lm_finding() {
        let detector = WindowsWeakCredentialsDetector::new(
            Arc::new(system_hive_fixture()),
            Arc::new(sam_hive_fixture()),
        );
        let root = ScanRoot::new(
            Arc::new(sentryscan_core::fs::InMemoryFileSystem::new([])),
            "/",
        );
        let index = PackageIndex::default();
        let (result, err) = detector.scan(&root, &index, &CancellationToken::new());
        assert!(err.is_none());

        assert_eq!(result.findings.len(), 1);
        assert_eq!(
            result.findings[0].advisory.reference,
            WEAK_PASSWORD_REFERENCE
        );
    }

    #[test]
    fn cancellation_reports_partial_results_instead_of_none() {
        let detector = WindowsWeakCredentialsDetector::new(
            Arc::new(system_hive_fixture()),
            Arc::new(sam_hive_fixture()),
        );
        let root = ScanRoot::new(
            Arc::new(sentryscan_core::fs::InMemoryFileSystem::new([])),
            "/",
        );
        let index = PackageIndex::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (result, err) = detector.scan(&root, &index, &cancel);

        assert!(matches!(err, Some(sentryscan_core::Error::Cancelled)));
        assert!(result.findings.is_empty());
    }
}
