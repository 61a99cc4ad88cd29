//! PKCS#5 v2.0 PBKDF2 with an HMAC pseudo-random function.

use hmac::digest::core_api::BlockSizeUser;
use hmac::{Mac, SimpleHmac};
use sha2::Digest;

use crate::error::{Error, Result};

/// Derive `key_len` bytes with PBKDF2-HMAC over digest `D`.
pub fn pbkdf2_hmac<D>(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    key_len: usize,
) -> Result<Vec<u8>>
where
    D: Digest + BlockSizeUser + Clone,
{
    if iterations == 0 {
        return Err(Error::InvalidArgument(
            "iteration count must be at least 1".to_string(),
        ));
    }
    let prf = <SimpleHmac<D> as Mac>::new_from_slice(password)
        .map_err(|e| Error::InvalidArgument(format!("HMAC key: {}", e)))?;

    let h_len = <D as Digest>::output_size();
    let mut out = Vec::with_capacity(key_len + h_len);
    let mut block_index: u32 = 1;

    while out.len() < key_len {
        let mut mac = prf.clone();
        mac.update(salt);
        mac.update(&block_index.to_be_bytes());
        let mut u = mac.finalize().into_bytes();
        let mut t = u.clone();

        for _ in 1..iterations {
            let mut mac = prf.clone();
            mac.update(&u);
            u = mac.finalize().into_bytes();
            for (t_byte, u_byte) in t.iter_mut().zip(u.iter()) {
                *t_byte ^= u_byte;
            }
        }

        out.extend_from_slice(&t);
        block_index = block_index.wrapping_add(1);
    }

    out.truncate(key_len);
    Ok(out)
}
