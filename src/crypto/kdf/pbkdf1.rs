//! PKCS#5 v1.5 PBKDF1.
//!
//! `T_1 = Hash(P || S)`, `T_i = Hash(T_{i-1})`; the key is a prefix of
//! `T_c`, so at most one digest output of material is available.

use sha2::Digest;

use crate::error::{Error, Result};

fn derive<D: Digest>(password: &[u8], salt: &[u8], iterations: u32) -> Result<Vec<u8>> {
    if iterations == 0 {
        return Err(Error::InvalidArgument(
            "iteration count must be at least 1".to_string(),
        ));
    }
    let mut hasher = D::new();
    hasher.update(password);
    hasher.update(salt);
    let mut t = hasher.finalize();
    for _ in 1..iterations {
        t = D::digest(&t);
    }
    Ok(t.to_vec())
}

/// Derive `key_len` bytes. Fails when `key_len` exceeds the digest size.
pub fn pbkdf1<D: Digest>(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    key_len: usize,
) -> Result<Vec<u8>> {
    if key_len > <D as Digest>::output_size() {
        return Err(Error::InvalidArgument(format!(
            "Can't generate a derived key {} bytes long.",
            key_len
        )));
    }
    let mut key = derive::<D>(password, salt, iterations)?;
    key.truncate(key_len);
    Ok(key)
}

/// Derive a key followed by an IV from the same digest output.
pub fn pbkdf1_key_and_iv<D: Digest>(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    key_len: usize,
    iv_len: usize,
) -> Result<(Vec<u8>, Vec<u8>)> {
    if key_len + iv_len > <D as Digest>::output_size() {
        return Err(Error::InvalidArgument(format!(
            "Can't generate a derived key {} bytes long.",
            key_len + iv_len
        )));
    }
    let material = derive::<D>(password, salt, iterations)?;
    Ok((
        material[..key_len].to_vec(),
        material[key_len..key_len + iv_len].to_vec(),
    ))
}
