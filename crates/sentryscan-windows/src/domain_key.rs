//! SAM domain-key derivation from the domain `F` value.

use crate::error::{Result, WindowsError};
use crate::primitives::{aes128_cbc_decrypt, md5, rc4_apply};

/// Offset of the revision-selecting structure within the domain `F`
/// value.
const KEY_OFFSET: usize = 0x68;

const RC4_STRUCT_LEN: usize = 4 + 4 + 16 + 16 + 16;
const AES_HEADER_LEN: usize = 4 + 4 + 4 + 4 + 16;

const QWERTY: &[u8] = b"!@#$%^&*()qwertyUIOPAzxcvbnmQQQQQQQQQQQQ)(*@&%\0";
const DIGITS: &[u8] = b"0123456789012345678901234567890123456789\0";

pub fn derive_domain_key(f_value: &[u8], syskey: &[u8; 16]) -> Result<[u8; 16]> {
    if f_value.len() < KEY_OFFSET + 4 {
        return Err(WindowsError::MalformedF);
    }
    let revision = u32::from_le_bytes(f_value[KEY_OFFSET..KEY_OFFSET + 4].try_into().unwrap());
    match revision {
        1 => derive_rc4(f_value, syskey),
        2 => derive_aes(f_value, syskey),
        other => Err(WindowsError::InvalidRevision(other)),
    }
}

fn derive_rc4(f_value: &[u8], syskey: &[u8; 16]) -> Result<[u8; 16]> {
    if f_value.len() < KEY_OFFSET + RC4_STRUCT_LEN {
        return Err(WindowsError::MalformedF);
    }
    let body = &f_value[KEY_OFFSET..KEY_OFFSET + RC4_STRUCT_LEN];
    let salt = &body[8..24];
    let key = &body[24..40];
    let checksum = &body[40..56];

    let mut rc4_key_material = Vec::with_capacity(salt.len() + QWERTY.len() + 16 + DIGITS.len());
    rc4_key_material.extend_from_slice(salt);
    rc4_key_material.extend_from_slice(QWERTY);
    rc4_key_material.extend_from_slice(syskey);
    rc4_key_material.extend_from_slice(DIGITS);
    let rc4_key = md5(&rc4_key_material);

    let mut combined = Vec::with_capacity(32);
    combined.extend_from_slice(key);
    combined.extend_from_slice(checksum);
    let derived = rc4_apply(&rc4_key, &combined);
    let (derived_key, derived_checksum) = derived.split_at(16);

    let mut verify_material = Vec::with_capacity(16 * 2 + DIGITS.len() + QWERTY.len());
    verify_material.extend_from_slice(derived_key);
    verify_material.extend_from_slice(DIGITS);
    verify_material.extend_from_slice(derived_key);
    verify_material.extend_from_slice(QWERTY);
    if md5(&verify_material).as_slice() != derived_checksum {
        return Err(WindowsError::ChecksumMismatch);
    }

    let mut out = [0u8; 16];
    out.copy_from_slice(derived_key);
    Ok(out)
}

fn derive_aes(f_value: &[u8], syskey: &[u8; 16]) -> Result<[u8; 16]> {
    if f_value.len() < KEY_OFFSET + AES_HEADER_LEN {
        return Err(WindowsError::MalformedF);
    }
    let header = &f_value[KEY_OFFSET..KEY_OFFSET + AES_HEADER_LEN];
    let data_len = u32::from_le_bytes(header[12..16].try_into().unwrap()) as usize;
    let iv = &header[16..32];

    let ciphertext_start = KEY_OFFSET + AES_HEADER_LEN;
    let ciphertext_end = ciphertext_start
        .checked_add(data_len)
        .ok_or(WindowsError::MalformedF)?;
    let ciphertext = f_value
        .get(ciphertext_start..ciphertext_end)
        .ok_or(WindowsError::MalformedF)?;

    let plaintext = aes128_cbc_decrypt(syskey, iv, ciphertext)?;
    if plaintext.len() < 16 {
        return Err(WindowsError::MalformedF);
    }
    let mut out = [0u8; 16];
    out.copy_from_slice(&plaintext[..16]);
    Ok(out)
}
