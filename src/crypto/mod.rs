//! Symmetric and asymmetric primitives used by the trust layer.
//!
//! - [`block_cipher`]: the block-cipher abstraction and key parameters
//! - [`engines`]: AES and DESede engines
//! - [`modes`]: chaining modes, ciphertext stealing and padding
//! - [`kdf`]: PBKDF1/2, scrypt and ISO 18033 KDFs
//! - [`keygen`]: RSA, DSA, DH and GOST key generation

pub mod block_cipher;
pub mod engines;
pub mod kdf;
pub mod keygen;
pub mod modes;

pub use block_cipher::{BlockCipher, CipherParameters, KeyParameter, ParametersWithIv};
pub use engines::{AesEngine, DesEdeEngine};
