//! DSA domain parameters (FIPS 186-2) and key pairs.

use num_bigint_dig::BigUint;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use sha1::{Digest, Sha1};

use super::{is_probable_prime, naf_weight, random_in_range};
use crate::error::{Error, Result};

/// DSA domain parameters with the seed and counter that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaParameters {
    /// Prime modulus.
    pub p: BigUint,
    /// 160-bit prime divisor of `p - 1`.
    pub q: BigUint,
    /// Generator of the order-`q` subgroup.
    pub g: BigUint,
    /// Seed the primes were derived from.
    pub seed: Vec<u8>,
    /// Iteration at which `p` was found.
    pub counter: u32,
}

/// A DSA key pair.
#[derive(Debug, Clone)]
pub struct DsaKeyPair {
    /// Private value `x` in `[1, q - 1]`.
    pub x: BigUint,
    /// Public value `y = g^x mod p`.
    pub y: BigUint,
}

fn increment(buf: &mut [u8]) {
    for byte in buf.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// FIPS 186-2 parameter generator for L in 512..=1024, N = 160.
#[derive(Debug, Clone)]
pub struct DsaParametersGenerator {
    l: usize,
}

impl DsaParametersGenerator {
    /// `l` must be a multiple of 64 between 512 and 1024.
    pub fn new(l: usize) -> Result<Self> {
        if !(512..=1024).contains(&l) || l % 64 != 0 {
            return Err(Error::InvalidArgument(
                "L must be between 512 and 1024 and a multiple of 64".to_string(),
            ));
        }
        Ok(Self { l })
    }

    /// Search for `(p, q, g)`.
    pub fn generate<R: CryptoRng + RngCore>(&self, rng: &mut R) -> DsaParameters {
        let l = self.l;
        let n = (l - 1) / 160;
        let mut w = vec![0u8; l / 8];
        let mut seed = [0u8; 20];

        loop {
            rng.fill_bytes(&mut seed);
            let part1 = Sha1::digest(seed);
            let mut part2 = seed;
            increment(&mut part2);
            let part2 = Sha1::digest(part2);

            let mut u = [0u8; 20];
            for i in 0..20 {
                u[i] = part1[i] ^ part2[i];
            }
            u[0] |= 0x80;
            u[19] |= 0x01;

            let q = BigUint::from_bytes_be(&u);
            if !is_probable_prime(&q) {
                continue;
            }

            let mut offset = seed;
            increment(&mut offset);

            for counter in 0..4096u32 {
                for k in 1..=n {
                    increment(&mut offset);
                    let start = w.len() - k * 20;
                    w[start..start + 20].copy_from_slice(&Sha1::digest(offset));
                }

                let remaining = w.len() - n * 20;
                increment(&mut offset);
                let last = Sha1::digest(offset);
                w[..remaining].copy_from_slice(&last[20 - remaining..]);

                w[0] |= 0x80;

                let x = BigUint::from_bytes_be(&w);
                let c = &x % (&q << 1usize);
                let p = (x + BigUint::one()) - c;

                if p.bits() != l {
                    continue;
                }

                if is_probable_prime(&p) {
                    let g = calculate_generator(&p, &q, rng);
                    log::debug!("DSA parameters found after {} iterations", counter);
                    return DsaParameters {
                        p,
                        q,
                        g,
                        seed: seed.to_vec(),
                        counter,
                    };
                }
            }
        }
    }
}

fn calculate_generator<R: CryptoRng + RngCore>(p: &BigUint, q: &BigUint, rng: &mut R) -> BigUint {
    let one = BigUint::one();
    let e = (p - &one) / q;
    let p_minus_two = p - BigUint::from(2u32);
    loop {
        let h = random_in_range(rng, &BigUint::from(2u32), &p_minus_two);
        let g = h.modpow(&e, p);
        if g.bits() > 1 {
            return g;
        }
    }
}

impl DsaParameters {
    /// Generate a key pair; `x` is resampled until its NAF weight reaches
    /// a quarter of the bit length of `q`.
    pub fn generate_key_pair<R: CryptoRng + RngCore>(&self, rng: &mut R) -> DsaKeyPair {
        let one = BigUint::one();
        let q_minus_one = &self.q - &one;
        let min_weight = (self.q.bits() >> 2) as u32;
        let x = loop {
            let x = random_in_range(rng, &one, &q_minus_one);
            if naf_weight(&x) >= min_weight {
                break x;
            }
        };
        let y = self.g.modpow(&x, &self.p);
        DsaKeyPair { x, y }
    }
}
