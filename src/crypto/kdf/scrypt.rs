//! scrypt memory-hard key derivation (RFC 7914).
//!
//! Blocks are kept as little-endian `u32` words between PBKDF2 passes so the
//! Salsa20/8 core works directly on words.

use sha2::Sha256;

use super::pbkdf2::pbkdf2_hmac;
use crate::error::{Error, Result};

/// scrypt cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptParams {
    /// CPU/memory cost, a power of two greater than 1.
    pub n: u32,
    /// Block size.
    pub r: u32,
    /// Parallelisation.
    pub p: u32,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            n: 16384,
            r: 8,
            p: 1,
        }
    }
}

impl ScryptParams {
    /// Create and validate a parameter set.
    pub fn new(n: u32, r: u32, p: u32) -> Result<Self> {
        let params = Self { n, r, p };
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        if self.n <= 1 || !self.n.is_power_of_two() {
            return Err(Error::InvalidArgument(
                "Cost parameter N must be > 1 and a power of 2".to_string(),
            ));
        }
        // only r == 1 lets the 128 * r * N working buffer overflow an i32
        if self.r == 1 && self.n >= 65536 {
            return Err(Error::InvalidArgument(
                "Cost parameter N must be > 1 and < 65536.".to_string(),
            ));
        }
        if self.r < 1 {
            return Err(Error::InvalidArgument(
                "Block size r must be >= 1.".to_string(),
            ));
        }
        let max_parallel = (i32::MAX as u64 / (128 * self.r as u64 * 8)) as u32;
        if self.p < 1 || self.p > max_parallel {
            return Err(Error::InvalidArgument(format!(
                "Parallelisation parameter p must be >= 1 and <= {} (based on block size r of {})",
                max_parallel, self.r
            )));
        }
        Ok(())
    }
}

/// Derive `dk_len` bytes from `password` and `salt`.
pub fn scrypt(password: &[u8], salt: &[u8], params: ScryptParams, dk_len: usize) -> Result<Vec<u8>> {
    params.validate()?;
    if dk_len < 1 {
        return Err(Error::InvalidArgument(
            "Generated key length dkLen must be >= 1.".to_string(),
        ));
    }

    let r = params.r as usize;
    let mf_len_bytes = 128 * r;
    let b = pbkdf2_hmac::<Sha256>(password, salt, 1, params.p as usize * mf_len_bytes)?;

    let mut words: Vec<u32> = b
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let mf_len_words = mf_len_bytes / 4;
    for chunk in words.chunks_mut(mf_len_words) {
        ro_mix(chunk, params.n as usize, r);
    }

    let mut b = Vec::with_capacity(words.len() * 4);
    for w in &words {
        b.extend_from_slice(&w.to_le_bytes());
    }
    words.fill(0);

    pbkdf2_hmac::<Sha256>(password, &b, 1, dk_len)
}

fn ro_mix(b: &mut [u32], n: usize, r: usize) {
    let bc_len = r * 32;
    let mut v = vec![0u32; n * bc_len];
    let mut x = b.to_vec();
    let mut y = vec![0u32; bc_len];

    for i in 0..n {
        v[i * bc_len..(i + 1) * bc_len].copy_from_slice(&x);
        block_mix(&x, &mut y, r);
        std::mem::swap(&mut x, &mut y);
    }

    let mask = n - 1;
    for _ in 0..n {
        let j = x[bc_len - 16] as usize & mask;
        for (xi, vi) in x.iter_mut().zip(&v[j * bc_len..(j + 1) * bc_len]) {
            *xi ^= vi;
        }
        block_mix(&x, &mut y, r);
        std::mem::swap(&mut x, &mut y);
    }

    b.copy_from_slice(&x);
    v.fill(0);
    x.fill(0);
}

/// BlockMix: even Salsa outputs go to the first half of `out`, odd outputs
/// to the second.
fn block_mix(b: &[u32], out: &mut [u32], r: usize) {
    let mut x = [0u32; 16];
    x.copy_from_slice(&b[b.len() - 16..]);

    for i in 0..2 * r {
        for (xk, bk) in x.iter_mut().zip(&b[i * 16..(i + 1) * 16]) {
            *xk ^= bk;
        }
        salsa20_8(&mut x);
        let dest = if i % 2 == 0 { i / 2 } else { r + i / 2 };
        out[dest * 16..(dest + 1) * 16].copy_from_slice(&x);
    }
}

#[inline]
fn quarter(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    x[b] ^= x[a].wrapping_add(x[d]).rotate_left(7);
    x[c] ^= x[b].wrapping_add(x[a]).rotate_left(9);
    x[d] ^= x[c].wrapping_add(x[b]).rotate_left(13);
    x[a] ^= x[d].wrapping_add(x[c]).rotate_left(18);
}

fn salsa20_8(b: &mut [u32; 16]) {
    let mut x = *b;
    for _ in 0..4 {
        // columns
        quarter(&mut x, 0, 4, 8, 12);
        quarter(&mut x, 5, 9, 13, 1);
        quarter(&mut x, 10, 14, 2, 6);
        quarter(&mut x, 15, 3, 7, 11);
        // rows
        quarter(&mut x, 0, 1, 2, 3);
        quarter(&mut x, 5, 6, 7, 4);
        quarter(&mut x, 10, 11, 8, 9);
        quarter(&mut x, 15, 12, 13, 14);
    }
    for (bi, xi) in b.iter_mut().zip(x.iter()) {
        *bi = bi.wrapping_add(*xi);
    }
}
