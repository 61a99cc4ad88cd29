//! RSA blinding factors.
//!
//! A blinded message `m * r^e mod n` is signed, then the signature is
//! multiplied by `r^-1 mod n` to recover the signature of `m`.

use num_bigint_dig::{BigUint, ModInverse, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use super::rsa::RsaPublicKeyParameters;
use crate::error::{Error, Result};

/// Draws blinding factors for one public key.
#[derive(Debug, Clone)]
pub struct RsaBlindingFactorGenerator {
    key: RsaPublicKeyParameters,
}

impl RsaBlindingFactorGenerator {
    /// Generator for `key`.
    pub fn new(key: RsaPublicKeyParameters) -> Self {
        Self { key }
    }

    /// A random factor of `n.bits() - 1` bits, coprime to `n` and not 0 or 1.
    pub fn generate_blinding_factor<R: CryptoRng + RngCore>(&self, rng: &mut R) -> BigUint {
        let m = &self.key.modulus;
        let length = m.bits() - 1;
        loop {
            let factor = rng.gen_biguint(length);
            if factor.is_zero() || factor.is_one() {
                continue;
            }
            if factor.gcd(m).is_one() {
                return factor;
            }
        }
    }
}

/// Applies and removes a blinding factor.
#[derive(Debug, Clone)]
pub struct RsaBlindingEngine {
    key: RsaPublicKeyParameters,
    factor: BigUint,
    factor_inverse: BigUint,
}

impl RsaBlindingEngine {
    /// Engine for `key` and `factor`; the factor must be invertible mod `n`.
    pub fn new(key: RsaPublicKeyParameters, factor: BigUint) -> Result<Self> {
        let factor_inverse = factor
            .clone()
            .mod_inverse(&key.modulus)
            .and_then(|v| v.to_biguint())
            .ok_or_else(|| {
                Error::InvalidArgument("blinding factor not invertible".to_string())
            })?;
        Ok(Self {
            key,
            factor,
            factor_inverse,
        })
    }

    /// `m * r^e mod n`.
    pub fn blind(&self, message: &BigUint) -> BigUint {
        let n = &self.key.modulus;
        let blind = self.factor.modpow(&self.key.exponent, n);
        (message * blind) % n
    }

    /// `s * r^-1 mod n`.
    pub fn unblind(&self, blinded: &BigUint) -> BigUint {
        (blinded * &self.factor_inverse) % &self.key.modulus
    }
}
