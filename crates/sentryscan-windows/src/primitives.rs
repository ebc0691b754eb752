//! Small cryptographic building blocks shared by the syskey, domain
//! key, and hash-decryption stages.

use crate::error::{Result, WindowsError};
use aes::Aes128;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::cipher::{BlockDecrypt, BlockEncrypt, KeyInit as DesKeyInit};
use des::Des;
use digest::Digest;
use md4::Md4;
use md5::Md5;
use rc4::{KeyInit as Rc4KeyInit, Rc4, StreamCipher};

pub fn md5(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn md4(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md4::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// RC4 is a symmetric stream cipher: the same transform encrypts and
/// decrypts.
pub fn rc4_apply(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut cipher = Rc4::new_from_slice(key).expect("rc4 key length");
    let mut buf = data.to_vec();
    cipher.apply_keystream(&mut buf);
    buf
}

pub fn aes128_cbc_decrypt(key: &[u8; 16], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let mut buf = ciphertext.to_vec();
    let plaintext = cbc::Decryptor::<Aes128>::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| WindowsError::CipherFailure)?;
    Ok(plaintext.to_vec())
}

#[allow(dead_code)]
pub fn aes128_cbc_encrypt(key: &[u8; 16], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut buf = plaintext.to_vec();
    let ciphertext = cbc::Encryptor::<Aes128>::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut buf, plaintext.len())
        .map_err(|_| WindowsError::CipherFailure)?;
    Ok(ciphertext.to_vec())
}

pub fn des_ecb_decrypt_block(key: &[u8; 8], input: &[u8], output: &mut [u8]) {
    let cipher = Des::new(key.into());
    let mut block = *des::cipher::generic_array::GenericArray::from_slice(input);
    cipher.decrypt_block(&mut block);
    output.copy_from_slice(&block);
}

pub fn des_ecb_encrypt_block(key: &[u8; 8], input: &[u8], output: &mut [u8]) {
    let cipher = Des::new(key.into());
    let mut block = *des::cipher::generic_array::GenericArray::from_slice(input);
    cipher.encrypt_block(&mut block);
    output.copy_from_slice(&block);
}

/// Expands 7 "raw" key bytes into an 8-byte DES key by inserting an
/// (unused, never-checked) parity bit after each group of 7 source
/// bits -- the classic expansion LM-family hashes and the Windows
/// SAM key-derivation scheme both build on.
pub fn expand_des_key(seven: &[u8; 7]) -> [u8; 8] {
    let mut key = [0u8; 8];
    key[0] = seven[0] >> 1;
    key[1] = ((seven[0] & 0x01) << 6) | (seven[1] >> 2);
    key[2] = ((seven[1] & 0x03) << 5) | (seven[2] >> 3);
    key[3] = ((seven[2] & 0x07) << 4) | (seven[3] >> 4);
    key[4] = ((seven[3] & 0x0F) << 3) | (seven[4] >> 5);
    key[5] = ((seven[4] & 0x1F) << 2) | (seven[5] >> 6);
    key[6] = ((seven[5] & 0x3F) << 1) | (seven[6] >> 7);
    key[7] = seven[6] & 0x7F;
    for b in key.iter_mut() {
        *b <<= 1;
    }
    key
}

/// Splits a 15-byte key-derivation string (RID LE bytes ‖ constant)
/// into two DES keys, using the first 14 bytes as two 7-byte halves.
pub fn str_to_des_keys(data: &[u8]) -> ([u8; 8], [u8; 8]) {
    let half1: [u8; 7] = data[0..7].try_into().expect("at least 7 bytes");
    let half2: [u8; 7] = data[7..14].try_into().expect("at least 14 bytes");
    (expand_des_key(&half1), expand_des_key(&half2))
}
