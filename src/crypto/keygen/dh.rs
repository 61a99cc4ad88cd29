//! Diffie-Hellman safe-prime parameters and key pairs.

use num_bigint_dig::BigUint;
use num_traits::One;
use rand::{CryptoRng, RngCore};

use super::{is_probable_prime, naf_weight, random_in_range, random_odd_with_top_bit};
use crate::error::{Error, Result};

/// DH group: safe prime `p = 2q + 1` and generator `g`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhParameters {
    /// Safe prime modulus.
    pub p: BigUint,
    /// Sophie Germain prime `(p - 1) / 2`.
    pub q: BigUint,
    /// Generator of the order-`q` subgroup.
    pub g: BigUint,
}

/// A DH key pair.
#[derive(Debug, Clone)]
pub struct DhKeyPair {
    /// Private value.
    pub x: BigUint,
    /// Public value `g^x mod p`.
    pub y: BigUint,
}

/// Generates safe-prime DH groups.
#[derive(Debug, Clone)]
pub struct DhParametersGenerator {
    size: usize,
}

impl DhParametersGenerator {
    /// Generator for `size`-bit primes.
    pub fn new(size: usize) -> Result<Self> {
        if size < 16 {
            return Err(Error::InvalidArgument(
                "DH prime size must be at least 16 bits".to_string(),
            ));
        }
        Ok(Self { size })
    }

    /// Find a safe prime and a generator of its prime-order subgroup.
    pub fn generate<R: CryptoRng + RngCore>(&self, rng: &mut R) -> DhParameters {
        let q_length = self.size - 1;
        let min_weight = (self.size >> 2) as u32;
        let one = BigUint::one();

        let (p, q) = loop {
            let q = random_odd_with_top_bit(rng, q_length);
            let p = (&q << 1usize) + &one;
            if !is_probable_prime(&p) || !is_probable_prime(&q) {
                continue;
            }
            if naf_weight(&p) < min_weight {
                continue;
            }
            break (p, q);
        };

        let p_minus_two = &p - BigUint::from(2u32);
        let g = loop {
            let h = random_in_range(rng, &BigUint::from(2u32), &p_minus_two);
            let g = h.modpow(&BigUint::from(2u32), &p);
            if !g.is_one() {
                break g;
            }
        };

        DhParameters { p, q, g }
    }
}

impl DhParameters {
    /// Generate a key pair with `x` in `[2, q - 1]`.
    pub fn generate_key_pair<R: CryptoRng + RngCore>(&self, rng: &mut R) -> DhKeyPair {
        let min_weight = (self.p.bits() >> 2) as u32;
        let upper = &self.q - BigUint::one();
        let x = loop {
            let x = random_in_range(rng, &BigUint::from(2u32), &upper);
            if naf_weight(&x) >= min_weight {
                break x;
            }
        };
        let y = self.g.modpow(&x, &self.p);
        DhKeyPair { x, y }
    }

    /// Shared secret `peer^x mod p`.
    pub fn agree(&self, private: &DhKeyPair, peer_public: &BigUint) -> Result<BigUint> {
        let one = BigUint::one();
        if peer_public <= &one || peer_public >= &(&self.p - &one) {
            return Err(Error::InvalidArgument(
                "Diffie-Hellman public key is weak".to_string(),
            ));
        }
        Ok(peer_public.modpow(&private.x, &self.p))
    }
}
