//! Block cipher chaining modes.
//!
//! Every mode wraps a [`BlockCipher`](super::BlockCipher) and is itself a
//! `BlockCipher`, so modes compose (e.g. CTS over CBC over AES).

pub mod cbc;
pub mod cfb;
pub mod cts;
pub mod gofb;
pub mod ofb;
pub mod openpgp_cfb;
pub mod padded;
pub mod sic;

pub use cbc::CbcBlockCipher;
pub use cfb::CfbBlockCipher;
pub use cts::CtsBlockCipher;
pub use gofb::GOfbBlockCipher;
pub use ofb::OfbBlockCipher;
pub use openpgp_cfb::OpenPgpCfbBlockCipher;
pub use padded::PaddedBlockCipher;
pub use sic::SicBlockCipher;

/// Load `iv` into `target`. A short IV is prepended with zeros (FIPS PUB 81),
/// a long one is truncated.
pub(crate) fn load_iv(target: &mut [u8], iv: &[u8]) {
    if iv.len() < target.len() {
        let pad = target.len() - iv.len();
        target[..pad].fill(0);
        target[pad..].copy_from_slice(iv);
    } else {
        target.copy_from_slice(&iv[..target.len()]);
    }
}

/// Shift `register` left by `input.len()` bytes and append `input`.
pub(crate) fn shift_in(register: &mut [u8], input: &[u8]) {
    let n = input.len();
    register.copy_within(n.., 0);
    let len = register.len();
    register[len - n..].copy_from_slice(input);
}
