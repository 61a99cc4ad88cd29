//! ISO 18033-2 KDF1 and KDF2.
//!
//! Output is `Hash(Z || counter || iv)` for successive big-endian 32-bit
//! counters. KDF1 counts from 0 and KDF2 from 1.

use sha2::Digest;

use crate::error::{Error, Result};

fn generate<D: Digest>(counter_start: u32, shared: &[u8], iv: &[u8], len: usize) -> Result<Vec<u8>> {
    let h_len = <D as Digest>::output_size();
    if len as u64 > ((1u64 << 32) - 1) * h_len as u64 {
        return Err(Error::InvalidArgument("Output length too large".to_string()));
    }

    let mut out = Vec::with_capacity(len + h_len);
    let mut counter = counter_start;
    while out.len() < len {
        let mut hasher = D::new();
        hasher.update(shared);
        hasher.update(counter.to_be_bytes());
        hasher.update(iv);
        out.extend_from_slice(&hasher.finalize());
        counter = counter.wrapping_add(1);
    }
    out.truncate(len);
    Ok(out)
}

/// KDF1: counter starts at zero.
pub fn kdf1<D: Digest>(shared: &[u8], iv: &[u8], len: usize) -> Result<Vec<u8>> {
    generate::<D>(0, shared, iv, len)
}

/// KDF2: counter starts at one.
pub fn kdf2<D: Digest>(shared: &[u8], iv: &[u8], len: usize) -> Result<Vec<u8>> {
    generate::<D>(1, shared, iv, len)
}
