//! Randomised key-pair and domain-parameter generation.
//!
//! All generators draw candidates from the caller's RNG and resample until
//! the structural constraints hold, so a weak candidate is never returned.

pub mod blinding;
pub mod dh;
pub mod dsa;
pub mod gost3410;
pub mod rsa;

pub use blinding::{RsaBlindingEngine, RsaBlindingFactorGenerator};
pub use dh::{DhKeyPair, DhParameters, DhParametersGenerator};
pub use dsa::{DsaKeyPair, DsaParameters, DsaParametersGenerator};
pub use gost3410::{Gost3410KeyPair, Gost3410Parameters};
pub use self::rsa::{RsaKeyPairGenerator, RsaPrivateCrtKey, RsaPublicKeyParameters};

use num_bigint_dig::{BigUint, RandBigInt};
use num_traits::One;
use rand::RngCore;

/// Miller-Rabin rounds applied on top of the Baillie-PSW test.
pub(crate) const PRIME_TEST_ROUNDS: usize = 20;

pub(crate) fn is_probable_prime(candidate: &BigUint) -> bool {
    num_bigint_dig::prime::probably_prime(candidate, PRIME_TEST_ROUNDS)
}

/// Non-adjacent-form weight, computed as the popcount of `3k ^ k`.
pub(crate) fn naf_weight(k: &BigUint) -> u32 {
    let three_k: BigUint = (k << 1usize) + k;
    let diff = three_k ^ k;
    diff.to_bytes_be().iter().map(|b| b.count_ones()).sum()
}

/// Uniform value in `[min, max]`.
pub(crate) fn random_in_range<R: RngCore + ?Sized>(
    rng: &mut R,
    min: &BigUint,
    max: &BigUint,
) -> BigUint {
    rng.gen_biguint_range(min, &(max + BigUint::one()))
}

/// Random odd integer with exactly `bits` bits.
pub(crate) fn random_odd_with_top_bit<R: RngCore + ?Sized>(rng: &mut R, bits: usize) -> BigUint {
    let candidate = rng.gen_biguint(bits);
    candidate | (BigUint::one() << (bits - 1)) | BigUint::one()
}
