//! RSA key-pair generation with structural prime constraints.

use num_bigint_dig::{BigUint, ModInverse};
use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};

use super::{is_probable_prime, naf_weight, random_odd_with_top_bit};
use crate::error::{Error, Result};

/// Public half of an RSA key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKeyParameters {
    /// Modulus `n`.
    pub modulus: BigUint,
    /// Public exponent `e`.
    pub exponent: BigUint,
}

/// RSA private key in CRT form.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateCrtKey {
    /// Modulus `n = p * q`.
    pub modulus: BigUint,
    /// Public exponent `e`.
    pub public_exponent: BigUint,
    /// Private exponent `d`.
    pub private_exponent: BigUint,
    /// Larger prime factor.
    pub p: BigUint,
    /// Smaller prime factor.
    pub q: BigUint,
    /// `d mod (p - 1)`.
    pub dp: BigUint,
    /// `d mod (q - 1)`.
    pub dq: BigUint,
    /// `q^-1 mod p`.
    pub q_inv: BigUint,
}

impl std::fmt::Debug for RsaPrivateCrtKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPrivateCrtKey")
            .field("modulus_bits", &self.modulus.bits())
            .field("public_exponent", &self.public_exponent)
            .finish_non_exhaustive()
    }
}

impl RsaPrivateCrtKey {
    /// The matching public key.
    pub fn public_key(&self) -> RsaPublicKeyParameters {
        RsaPublicKeyParameters {
            modulus: self.modulus.clone(),
            exponent: self.public_exponent.clone(),
        }
    }

    /// Convert to an `rsa` crate key for signing.
    pub fn to_rsa_private_key(&self) -> Result<::rsa::RsaPrivateKey> {
        Ok(::rsa::RsaPrivateKey::from_components(
            self.modulus.clone(),
            self.public_exponent.clone(),
            self.private_exponent.clone(),
            vec![self.p.clone(), self.q.clone()],
        )?)
    }
}

/// Generates RSA key pairs of a fixed modulus size.
///
/// Primes are rejected when `p mod e == 1`, when `gcd(e, p - 1) != 1` or
/// when `p^2 < 2^(strength - 1)`. Prime pairs are rejected when `|p - q|`
/// is too small, when `n` misses the requested size or when the NAF weight
/// of `n` is low. A private exponent not exceeding `2^(strength / 2)` forces
/// a fresh pair.
#[derive(Debug, Clone)]
pub struct RsaKeyPairGenerator {
    strength: usize,
    public_exponent: BigUint,
}

impl RsaKeyPairGenerator {
    /// Default public exponent, 65537.
    pub const DEFAULT_PUBLIC_EXPONENT: u32 = 0x10001;

    /// Generator for `strength`-bit moduli with `e = 65537`.
    pub fn new(strength: usize) -> Result<Self> {
        Self::with_exponent(strength, BigUint::from(Self::DEFAULT_PUBLIC_EXPONENT))
    }

    /// Generator with an explicit odd public exponent.
    pub fn with_exponent(strength: usize, public_exponent: BigUint) -> Result<Self> {
        if strength < 12 {
            return Err(Error::InvalidArgument(
                "key strength must be at least 12 bits".to_string(),
            ));
        }
        if public_exponent.is_even() || public_exponent <= BigUint::one() {
            return Err(Error::InvalidArgument(
                "public exponent must be odd and greater than 1".to_string(),
            ));
        }
        Ok(Self {
            strength,
            public_exponent,
        })
    }

    /// Modulus size in bits.
    pub fn strength(&self) -> usize {
        self.strength
    }

    /// Random `bits`-bit prime `p` with `p mod e != 1`, `gcd(e, p - 1) = 1`
    /// and `p^2 >= 2^(2 * bits - 1)`.
    fn choose_random_prime<R: CryptoRng + RngCore>(&self, rng: &mut R, bits: usize) -> Result<BigUint> {
        let e = &self.public_exponent;
        let one = BigUint::one();
        let squared_bound = BigUint::one() << (2 * bits - 1);
        for _ in 0..5 * bits {
            let p = random_odd_with_top_bit(rng, bits);
            if &p % e == one {
                continue;
            }
            if &p * &p < squared_bound {
                continue;
            }
            if !is_probable_prime(&p) {
                continue;
            }
            if !e.gcd(&(&p - &one)).is_one() {
                continue;
            }
            return Ok(p);
        }
        Err(Error::IllegalState(
            "unable to generate prime number for RSA key".to_string(),
        ))
    }

    /// Generate a key pair.
    pub fn generate<R: CryptoRng + RngCore>(&self, rng: &mut R) -> Result<RsaPrivateCrtKey> {
        let strength = self.strength;
        let p_bits = (strength + 1) / 2;
        let q_bits = strength - p_bits;
        let min_diff_bits = std::cmp::max((strength / 2).saturating_sub(100), strength / 3);
        let min_weight = (strength >> 2) as u32;
        let one = BigUint::one();
        let d_lower_bound = BigUint::one() << (strength / 2);
        let min_diff = BigUint::one() << min_diff_bits;
        let e = &self.public_exponent;

        loop {
            let mut p = self.choose_random_prime(rng, p_bits)?;
            let mut q;
            let mut n;

            loop {
                q = self.choose_random_prime(rng, q_bits)?;

                let diff = if q > p { &q - &p } else { &p - &q };
                if diff.bits() < min_diff_bits || diff <= min_diff {
                    continue;
                }

                n = &p * &q;
                if n.bits() != strength {
                    p = std::cmp::max(p, q.clone());
                    continue;
                }

                if naf_weight(&n) < min_weight {
                    log::trace!("RSA modulus rejected for low NAF weight");
                    p = self.choose_random_prime(rng, p_bits)?;
                    continue;
                }
                break;
            }

            if p < q {
                std::mem::swap(&mut p, &mut q);
            }

            let p_sub1 = &p - &one;
            let q_sub1 = &q - &one;
            let lcm = p_sub1.lcm(&q_sub1);

            let d = match e.clone().mod_inverse(&lcm).and_then(|d| d.to_biguint()) {
                Some(d) => d,
                None => continue,
            };
            if d <= d_lower_bound {
                continue;
            }

            let dp = &d % &p_sub1;
            let dq = &d % &q_sub1;
            let q_inv = match q.clone().mod_inverse(&p).and_then(|v| v.to_biguint()) {
                Some(v) => v,
                None => continue,
            };

            return Ok(RsaPrivateCrtKey {
                modulus: n,
                public_exponent: e.clone(),
                private_exponent: d,
                p,
                q,
                dp,
                dq,
                q_inv,
            });
        }
    }
}

impl Default for RsaKeyPairGenerator {
    fn default() -> Self {
        Self {
            strength: 2048,
            public_exponent: BigUint::from(Self::DEFAULT_PUBLIC_EXPONENT),
        }
    }
}
