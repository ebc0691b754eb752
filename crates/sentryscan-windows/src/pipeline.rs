//! Ties syskey assembly, domain-key derivation, user enumeration, and
//! hash decryption into one offline credential-recovery pass over a
//! SYSTEM/SAM hive pair.

use crate::cracker::{self, HashKind};
use crate::domain_key::derive_domain_key;
use crate::error::{Result, WindowsError};
use crate::registry::RegistryHive;
use crate::syskey::assemble_syskey;
use crate::user::{parse_f_enabled, parse_v};
use sentryscan_core::CancellationToken;

pub struct RecoveredUser {
    pub rid: u32,
    pub username: String,
    pub enabled: bool,
    pub nt_hash: Vec<u8>,
    pub lm_hash: Vec<u8>,
    pub cracked_password: Option<String>,
}

/// Per-user errors are recorded and do not stop the rest of the pass.
pub struct UserFailure {
    pub rid: String,
    pub error: WindowsError,
}

pub struct RecoveryResult {
    pub users: Vec<RecoveredUser>,
    pub failures: Vec<UserFailure>,
}

/// On cancellation, the partial [`RecoveryResult`] collected so far is
/// returned alongside `WindowsError::Cancelled` rather than discarded.
pub fn recover(
    system: &dyn RegistryHive,
    sam: &dyn RegistryHive,
    cancel: &CancellationToken,
) -> std::result::Result<RecoveryResult, (RecoveryResult, WindowsError)> {
    let syskey = assemble_syskey(system).map_err(|e| (RecoveryResult::empty(), e))?;
    let domain_f = sam
        .open_key("Domains\\Account")
        .and_then(|key| {
            key.value("F").ok_or_else(|| WindowsError::ValueNotFound {
                key: "Domains\\Account".into(),
                value: "F".into(),
            })
        })
        .map(|v| v.data().to_vec())
        .map_err(|e| (RecoveryResult::empty(), e))?;
    let domain_key =
        derive_domain_key(&domain_f, &syskey).map_err(|e| (RecoveryResult::empty(), e))?;

    let users_key = sam
        .open_key("Domains\\Account\\Users")
        .map_err(|e| (RecoveryResult::empty(), e))?;
    let mut users = Vec::new();
    let mut failures = Vec::new();

    for rid_hex in users_key.subkeys() {
        if rid_hex == "Names" {
            continue;
        }
        if cancel.is_cancelled() {
            return Err((RecoveryResult { users, failures }, WindowsError::Cancelled));
        }
        match recover_one(sam, &rid_hex, &domain_key, cancel) {
            Ok(user) => users.push(user),
            Err(error) => failures.push(UserFailure { rid: rid_hex, error }),
        }
    }

    Ok(RecoveryResult { users, failures })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::md5;
    use crate::registry::{utf16le, FakeHive, FakeKey, FakeValue};

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
        let ciphertext = crate::primitives::rc4_apply(&rc4_key, &plaintext);

        let mut f_value = vec![0u8; 0x68];
        f_value.extend_from_slice(&1u32.to_le_bytes());
        f_value.extend_from_slice(&56u32.to_le_bytes());
        f_value.extend_from_slice(&salt);
        f_value.extend_from_slice(&ciphertext);
        f_value
    }

    fn sam_hive_fixture() -> FakeHive {
        let users = FakeKey::default().with_subkey("000003E8", FakeKey::default());
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
    fn cancellation_returns_partial_result_instead_of_discarding_it() {
        let system = system_hive_fixture();
        let sam = sam_hive_fixture();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (partial, error) = recover(&system, &sam, &cancel).unwrap_err();

        assert!(matches!(error, WindowsError::Cancelled));
        assert!(partial.users.is_empty());
        assert!(partial.failures.is_empty());
    }
}

impl RecoveryResult {
    fn empty() -> Self {
        Self {
            users: Vec::new(),
            failures: Vec::new(),
        }
    }
}

fn recover_one(
    sam: &dyn RegistryHive,
    rid_hex: &str,
    domain_key: &[u8; 16],
    cancel: &CancellationToken,
) -> Result<RecoveredUser> {
    let rid = u32::from_str_radix(rid_hex, 16).map_err(|_| WindowsError::MalformedV)?;
    let user_key = sam.open_key(&format!("Domains\\Account\\Users\\{rid_hex}"))?;

    let v = user_key
        .value("V")
        .ok_or_else(|| WindowsError::ValueNotFound {
            key: rid_hex.to_string(),
            value: "V".into(),
        })?
        .data();
    let f = user_key
        .value("F")
        .ok_or_else(|| WindowsError::ValueNotFound {
            key: rid_hex.to_string(),
            value: "F".into(),
        })?
        .data();

    let parsed_v = parse_v(v)?;
    let enabled = parse_f_enabled(f)?;
    let (nt_hash, lm_hash) =
        crate::hashes::decrypt_user_hashes(&parsed_v.nt_hash_blob, &parsed_v.lm_hash_blob, rid, domain_key)?;

    let cracked_password = if !nt_hash.is_empty() {
        cracker::crack(&hex::encode(&nt_hash), HashKind::Nt, cancel).ok()
    } else {
        None
    }
    .or_else(|| {
        if lm_hash.is_empty() {
            None
        } else {
            cracker::crack(&hex::encode(&lm_hash), HashKind::Auto, cancel).ok()
        }
    });

    Ok(RecoveredUser {
        rid,
        username: parsed_v.username,
        enabled,
        nt_hash,
        lm_hash,
        cracked_password,
    })
}
