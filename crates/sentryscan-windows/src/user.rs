//! Per-user `V`/`F` record parsing.

use crate::error::{Result, WindowsError};
use crate::registry::from_utf16le;

/// Size of the fixed pointer-table header every `V` record starts
/// with; pointers are relative to the byte immediately after it.
const V_HEADER_LEN: usize = 0xCC;
const USERNAME_PTR: usize = 0x0c;
const LM_HASH_PTR: usize = 0x9c;
const NT_HASH_PTR: usize = 0xa8;

/// Minimum length of a per-user `F` record and the offset of its
/// account-control flags word within it.
const F_MIN_LEN: usize = 0x50;
const F_FLAGS_OFFSET: usize = 0x38;
const F_DISABLED_BIT: u32 = 0x0001;

pub struct ParsedV {
    pub username: String,
    pub lm_hash_blob: Vec<u8>,
    pub nt_hash_blob: Vec<u8>,
}

fn read_pointer(v: &[u8], header_offset: usize) -> Result<(usize, usize)> {
    let end = header_offset.checked_add(8).ok_or(WindowsError::MalformedV)?;
    let field = v.get(header_offset..end).ok_or(WindowsError::MalformedV)?;
    let offset = u32::from_le_bytes(field[0..4].try_into().unwrap()) as usize;
    let length = u32::from_le_bytes(field[4..8].try_into().unwrap()) as usize;
    Ok((offset, length))
}

fn slice_field<'a>(v: &'a [u8], header_offset: usize) -> Result<&'a [u8]> {
    let (offset, length) = read_pointer(v, header_offset)?;
    let start = V_HEADER_LEN.checked_add(offset).ok_or(WindowsError::MalformedV)?;
    let end = start.checked_add(length).ok_or(WindowsError::MalformedV)?;
    v.get(start..end).ok_or(WindowsError::MalformedV)
}

pub fn parse_v(v: &[u8]) -> Result<ParsedV> {
    if v.len() < V_HEADER_LEN {
        return Err(WindowsError::MalformedV);
    }
    let username = from_utf16le(slice_field(v, USERNAME_PTR)?);
    let lm_hash_blob = slice_field(v, LM_HASH_PTR)?.to_vec();
    let nt_hash_blob = slice_field(v, NT_HASH_PTR)?.to_vec();
    Ok(ParsedV {
        username,
        lm_hash_blob,
        nt_hash_blob,
    })
}

/// Returns whether the account is enabled (the disabled bit is
/// *clear*).
pub fn parse_f_enabled(f: &[u8]) -> Result<bool> {
    if f.len() < F_MIN_LEN {
        return Err(WindowsError::MalformedF);
    }
    let flags = u32::from_le_bytes(
        f[F_FLAGS_OFFSET..F_FLAGS_OFFSET + 4].try_into().unwrap(),
    );
    Ok(flags & F_DISABLED_BIT == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::utf16le;

    fn build_v(username: &str, lm_blob: &[u8], nt_blob: &[u8]) -> Vec<u8> {
        let username_bytes = utf16le(username);
        let mut body = Vec::new();
        body.extend_from_slice(&username_bytes);
        let lm_offset = body.len() as u32;
        body.extend_from_slice(lm_blob);
        let nt_offset = body.len() as u32;
        body.extend_from_slice(nt_blob);

        let mut header = vec![0u8; V_HEADER_LEN];
        header[USERNAME_PTR..USERNAME_PTR + 4].copy_from_slice(&0u32.to_le_bytes());
        header[USERNAME_PTR + 4..USERNAME_PTR + 8]
            .copy_from_slice(&(username_bytes.len() as u32).to_le_bytes());
        header[LM_HASH_PTR..LM_HASH_PTR + 4].copy_from_slice(&lm_offset.to_le_bytes());
        header[LM_HASH_PTR + 4..LM_HASH_PTR + 8]
            .copy_from_slice(&(lm_blob.len() as u32).to_le_bytes());
        header[NT_HASH_PTR..NT_HASH_PTR + 4].copy_from_slice(&nt_offset.to_le_bytes());
        header[NT_HASH_PTR + 4..NT_HASH_PTR + 8]
            .copy_from_slice(&(nt_blob.len() as u32).to_le_bytes());

        header.extend_from_slice(&body);
        header
    }

    #[test]
    fn parses_username_and_hash_blobs() {
        let v = build_v("alice", &[1, 2, 3], &[4, 5, 6, 7]);
        let parsed = parse_v(&v).unwrap();
        assert_eq!(parsed.username, "alice");
        assert_eq!(parsed.lm_hash_blob, vec![1, 2, 3]);
        assert_eq!(parsed.nt_hash_blob, vec![4, 5, 6, 7]);
    }

    #[test]
    fn out_of_bounds_pointer_is_malformed() {
        let mut v = build_v("alice", &[1, 2, 3], &[4, 5, 6, 7]);
        v[NT_HASH_PTR + 4..NT_HASH_PTR + 8].copy_from_slice(&9999u32.to_le_bytes());
        assert!(matches!(parse_v(&v), Err(WindowsError::MalformedV)));
    }

    #[test]
    fn enabled_bit_is_negated_from_the_disabled_flag() {
        let mut f = vec![0u8; F_MIN_LEN];
        assert!(parse_f_enabled(&f).unwrap());
        f[F_FLAGS_OFFSET] = 0x01;
        assert!(!parse_f_enabled(&f).unwrap());
    }

    #[test]
    fn short_f_record_is_malformed() {
        assert!(matches!(parse_f_enabled(&[0u8; 4]), Err(WindowsError::MalformedF)));
    }
}
