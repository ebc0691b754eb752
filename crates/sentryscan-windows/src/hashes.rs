//! NT/LM hash decryption from a user's `V`-record blobs and the SAM
//! domain key.

use crate::error::Result;
use crate::primitives::{aes128_cbc_decrypt, des_ecb_decrypt_block, md5, rc4_apply, str_to_des_keys};

const NT_CONSTANT: &[u8] = b"NTPASSWORD\0";
const LM_CONSTANT: &[u8] = b"LMPASSWORD\0";

/// Decrypts a user's NT and LM hash blobs. The mode (RC4 vs AES) is
/// selected once, from the NT blob's third byte, and applied to both.
/// A blob too short to contain ciphertext yields "no hash present"
/// (an empty vector), not an error.
pub fn decrypt_user_hashes(
    nt_blob: &[u8],
    lm_blob: &[u8],
    rid: u32,
    domain_key: &[u8; 16],
) -> Result<(Vec<u8>, Vec<u8>)> {
    if nt_blob.len() < 3 {
        return Ok((Vec::new(), Vec::new()));
    }
    let rc4_mode = nt_blob[2] == 0x01;
    let rid_le = rid.to_le_bytes();

    let nt_hash = decrypt_one(nt_blob, &rid_le, NT_CONSTANT, domain_key, rc4_mode)?;
    let lm_hash = decrypt_one(lm_blob, &rid_le, LM_CONSTANT, domain_key, rc4_mode)?;
    Ok((nt_hash, lm_hash))
}

fn decrypt_one(
    blob: &[u8],
    rid_le: &[u8; 4],
    constant: &[u8],
    domain_key: &[u8; 16],
    rc4_mode: bool,
) -> Result<Vec<u8>> {
    let intermediate = if rc4_mode {
        if blob.len() < 20 {
            return Ok(Vec::new());
        }
        let ciphertext = &blob[4..20];
        let mut material = Vec::with_capacity(16 + 4 + constant.len());
        material.extend_from_slice(domain_key);
        material.extend_from_slice(rid_le);
        material.extend_from_slice(constant);
        let rc4_key = md5(&material);
        rc4_apply(&rc4_key, ciphertext)
    } else {
        if blob.len() <= 24 {
            return Ok(Vec::new());
        }
        let iv = &blob[8..24];
        let ciphertext = &blob[24..];
        aes128_cbc_decrypt(domain_key, iv, ciphertext)?
    };

    if intermediate.len() < 16 {
        return Ok(Vec::new());
    }

    let mut key_material = Vec::with_capacity(4 + constant.len());
    key_material.extend_from_slice(rid_le);
    key_material.extend_from_slice(constant);
    let (key1, key2) = str_to_des_keys(&key_material);

    let mut out = vec![0u8; 16];
    des_ecb_decrypt_block(&key1, &intermediate[0..8], &mut out[0..8]);
    des_ecb_decrypt_block(&key2, &intermediate[8..16], &mut out[8..16]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{aes128_cbc_encrypt, des_ecb_encrypt_block};

    const DOMAIN_KEY: [u8; 16] = [
        0x3d, 0x21, 0x2c, 0xe8, 0xa2, 0xda, 0x83, 0x43, 0xbd, 0xad, 0x1e, 0xf2, 0xcf, 0xb6, 0xb3,
        0x1c,
    ];

    fn encrypt_rc4_blob(hash: &[u8; 16], rid: u32, constant: &[u8]) -> Vec<u8> {
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
        blob[2] = 0x01; // selects RC4 mode
        blob.extend_from_slice(&ciphertext);
        blob
    }

    #[test]
    fn rc4_mode_round_trips_nt_and_lm() {
        let nt_hash = [0xAAu8; 16];
        let lm_hash = [0xBBu8; 16];
        let nt_blob = encrypt_rc4_blob(&nt_hash, 1000, NT_CONSTANT);
        let lm_blob = encrypt_rc4_blob(&lm_hash, 1000, LM_CONSTANT);

        let (decrypted_nt, decrypted_lm) =
            decrypt_user_hashes(&nt_blob, &lm_blob, 1000, &DOMAIN_KEY).unwrap();
        assert_eq!(decrypted_nt, nt_hash);
        assert_eq!(decrypted_lm, lm_hash);
    }

    #[test]
    fn too_short_blob_yields_no_hash_present() {
        let (nt, lm) = decrypt_user_hashes(&[0, 0, 0], &[], 1000, &DOMAIN_KEY).unwrap();
        assert!(nt.is_empty());
        assert!(lm.is_empty());
    }

    #[test]
    fn aes_mode_round_trips() {
        let nt_hash = [0xCCu8; 16];
        let rid_le = 1001u32.to_le_bytes();
        let mut key_material = Vec::new();
        key_material.extend_from_slice(&rid_le);
        key_material.extend_from_slice(NT_CONSTANT);
        let (key1, key2) = str_to_des_keys(&key_material);
        let mut intermediate = [0u8; 16];
        des_ecb_encrypt_block(&key1, &nt_hash[0..8], &mut intermediate[0..8]);
        des_ecb_encrypt_block(&key2, &nt_hash[8..16], &mut intermediate[8..16]);

        let iv = [0x42u8; 16];
        let ciphertext = aes128_cbc_encrypt(&DOMAIN_KEY, &iv, &intermediate).unwrap();

        let mut blob = vec![0u8; 8];
        blob[2] = 0x00; // selects AES mode
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);

        let (decrypted_nt, _) = decrypt_user_hashes(&blob, &[], 1001, &DOMAIN_KEY).unwrap();
        assert_eq!(decrypted_nt, nt_hash);
    }
}
