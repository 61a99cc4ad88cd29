//! Signature creation and verification primitives.
//!
//! Every signed structure in this crate (certificates, CRLs, OCSP responses,
//! time-stamp tokens) funnels through [`verify_signature`] or
//! [`verify_signature_with_digest`]. Signing goes through the
//! [`ExternalSignature`] abstraction so that keys held elsewhere can be
//! plugged in.
//!
//! ## Supported algorithms
//!
//! - RSA PKCS#1 v1.5 with MD5, SHA-1, SHA-224, SHA-256, SHA-384 and SHA-512

mod external;
mod verify;

pub use external::{ExternalSignature, PrivateKeySignature};
pub use verify::{verify_signature, verify_signature_with_digest};
