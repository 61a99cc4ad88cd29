//! GOST R 34.10-94 key pairs over caller-supplied domain parameters.

use num_bigint_dig::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

use super::naf_weight;
use crate::error::{Error, Result};

/// GOST R 34.10-94 domain parameters `(p, q, a)` with `a^q = 1 mod p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gost3410Parameters {
    /// Prime modulus.
    pub p: BigUint,
    /// Prime divisor of `p - 1`.
    pub q: BigUint,
    /// Element of order `q`.
    pub a: BigUint,
}

/// A GOST R 34.10-94 key pair.
#[derive(Debug, Clone)]
pub struct Gost3410KeyPair {
    /// Private value in `[1, q - 1]`.
    pub x: BigUint,
    /// Public value `a^x mod p`.
    pub y: BigUint,
}

impl Gost3410Parameters {
    /// Check the structural relations between `p`, `q` and `a`.
    pub fn new(p: BigUint, q: BigUint, a: BigUint) -> Result<Self> {
        let one = BigUint::one();
        if q.is_zero() || !(&p - &one).is_multiple_of(&q) {
            return Err(Error::InvalidArgument("q must divide p - 1".to_string()));
        }
        if a <= one || a >= p || !a.modpow(&q, &p).is_one() {
            return Err(Error::InvalidArgument(
                "a must have order q modulo p".to_string(),
            ));
        }
        Ok(Self { p, q, a })
    }

    /// Generate a key pair. The private value is drawn from at most 256
    /// bits and resampled while out of range or of low NAF weight.
    pub fn generate_key_pair<R: CryptoRng + RngCore>(&self, rng: &mut R) -> Gost3410KeyPair {
        let bits = std::cmp::min(256, self.q.bits());
        let min_weight = std::cmp::min(64, (bits >> 2) as u32);
        let x = loop {
            let x = rng.gen_biguint(bits);
            if x.is_zero() || x >= self.q {
                continue;
            }
            if naf_weight(&x) < min_weight {
                continue;
            }
            break x;
        };
        let y = self.a.modpow(&x, &self.p);
        Gost3410KeyPair { x, y }
    }
}
