//! Bounded dictionary password cracker.

use crate::primitives::{des_ecb_encrypt_block, expand_des_key, md4};
use sentryscan_core::CancellationToken;
use thiserror::Error;

/// Fixed, build-time candidate list. Tests depend only on a handful
/// of these being present; order is otherwise not significant.
pub const CANDIDATE_PASSWORDS: &[&str] = &[
    "123456",
    "password",
    "12345678",
    "qwerty",
    "123456789",
    "12345",
    "1234",
    "111111",
    "1234567",
    "dragon",
    "123123",
    "baseball",
    "abc123",
    "football",
    "monkey",
    "letmein",
    "shadow",
    "master",
    "666666",
    "qwertyuiop",
    "123321",
    "mustang",
    "123qwe",
    "michael",
    "654321",
    "superman",
    "1qaz2wsx",
    "7777777",
    "121212",
    "000000",
    "qazwsx",
    "123",
    "admin",
    "guest",
    "changeme",
    "welcome",
    "root",
    "test",
    "Password123",
];

#[derive(Debug, Error)]
pub enum CrackError {
    #[error("no candidate password matched")]
    NotCracked,

    #[error("operation cancelled")]
    Cancelled,
}

/// How to interpret `hash` when it is a fixed-length hex string: LM
/// and NT hashes have the same shape, so format alone can't tell them
/// apart. `Auto` treats a bare hex string as LM, matching the literal
/// convention used elsewhere for bare hex hashes; callers who know
/// they hold an NT hash should pass `Nt` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    Auto,
    Nt,
}

/// Attempts to recover the plaintext behind `hash` from the bounded
/// candidate list, checking `cancel` before each (expensive)
/// candidate comparison.
pub fn crack(hash: &str, kind: HashKind, cancel: &CancellationToken) -> Result<String, CrackError> {
    if hash.starts_with("$2") {
        return crack_bcrypt(hash, cancel);
    }
    if hash.starts_with("$6$") {
        return crack_sha512crypt(hash, cancel);
    }
    if is_fixed_length_hex(hash) {
        return match kind {
            HashKind::Nt => crack_nt(hash, cancel),
            HashKind::Auto => crack_lm(hash, cancel),
        };
    }
    Err(CrackError::NotCracked)
}

fn is_fixed_length_hex(hash: &str) -> bool {
    hash.len() == 32 && hash.chars().all(|c| c.is_ascii_hexdigit())
}

fn crack_bcrypt(hash: &str, cancel: &CancellationToken) -> Result<String, CrackError> {
    for candidate in CANDIDATE_PASSWORDS {
        if cancel.is_cancelled() {
            return Err(CrackError::Cancelled);
        }
        if bcrypt::verify(candidate, hash).unwrap_or(false) {
            return Ok((*candidate).to_string());
        }
    }
    Err(CrackError::NotCracked)
}

fn crack_sha512crypt(hash: &str, cancel: &CancellationToken) -> Result<String, CrackError> {
    for candidate in CANDIDATE_PASSWORDS {
        if cancel.is_cancelled() {
            return Err(CrackError::Cancelled);
        }
        if sha_crypt::sha512_check(candidate, hash).is_ok() {
            return Ok((*candidate).to_string());
        }
    }
    Err(CrackError::NotCracked)
}

fn crack_lm(hash: &str, cancel: &CancellationToken) -> Result<String, CrackError> {
    let target = hex::decode(hash).map_err(|_| CrackError::NotCracked)?;
    for candidate in CANDIDATE_PASSWORDS {
        if cancel.is_cancelled() {
            return Err(CrackError::Cancelled);
        }
        if lm_hash(candidate) == target.as_slice() {
            return Ok((*candidate).to_string());
        }
    }
    Err(CrackError::NotCracked)
}

fn crack_nt(hash: &str, cancel: &CancellationToken) -> Result<String, CrackError> {
    let target = hex::decode(hash).map_err(|_| CrackError::NotCracked)?;
    for candidate in CANDIDATE_PASSWORDS {
        if cancel.is_cancelled() {
            return Err(CrackError::Cancelled);
        }
        if nt_hash(candidate) == target.as_slice() {
            return Ok((*candidate).to_string());
        }
    }
    Err(CrackError::NotCracked)
}

fn nt_hash(password: &str) -> [u8; 16] {
    let utf16: Vec<u8> = password.encode_utf16().flat_map(u16::to_le_bytes).collect();
    md4(&utf16)
}

const LM_MAGIC: &[u8; 8] = b"KGS!@#$%";

fn lm_hash(password: &str) -> [u8; 16] {
    let mut bytes = password.to_uppercase().into_bytes();
    bytes.truncate(14);
    bytes.resize(14, 0);
    let half1: [u8; 7] = bytes[0..7].try_into().unwrap();
    let half2: [u8; 7] = bytes[7..14].try_into().unwrap();
    let key1 = expand_des_key(&half1);
    let key2 = expand_des_key(&half2);
    let mut out = [0u8; 16];
    des_ecb_encrypt_block(&key1, LM_MAGIC, &mut out[0..8]);
    des_ecb_encrypt_block(&key2, LM_MAGIC, &mut out[8..16]);
    out
}
