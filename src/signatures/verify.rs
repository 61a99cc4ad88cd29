//! Public-key signature verification.

use pkcs1::DecodeRsaPublicKey;
use rsa::RsaPublicKey;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::digests::{self, DigestAlgorithm};
use crate::error::{Error, Result};
use crate::oids;

fn rsa_key(spki: &SubjectPublicKeyInfoOwned) -> Result<RsaPublicKey> {
    if spki.algorithm.oid != oids::RSA_ENCRYPTION {
        return Err(Error::UnsupportedAlgorithm(format!(
            "public key algorithm {}",
            spki.algorithm.oid
        )));
    }
    let bits = spki.subject_public_key.as_bytes().ok_or_else(|| {
        Error::InvalidCertificate("RSA public key is not a whole number of bytes".to_string())
    })?;
    RsaPublicKey::from_pkcs1_der(bits)
        .map_err(|e| Error::InvalidCertificate(format!("bad RSA public key: {}", e)))
}

/// Verify `signature` over `message` with the key in `spki`.
///
/// `algorithm` is a `<digest>WithRSAEncryption` identifier; the digest is
/// taken from it.
pub fn verify_signature(
    spki: &SubjectPublicKeyInfoOwned,
    algorithm: &AlgorithmIdentifierOwned,
    message: &[u8],
    signature: &[u8],
) -> Result<()> {
    let (digest, encryption) = digests::signature_algorithm(&algorithm.oid).ok_or_else(|| {
        Error::UnsupportedAlgorithm(format!("signature algorithm {}", algorithm.oid))
    })?;
    log::trace!("verifying {}with{} signature", digest, encryption);
    verify_signature_with_digest(spki, digest, &digest.digest(message), signature)
}

/// Verify an RSA PKCS#1 v1.5 signature over a precomputed digest.
pub fn verify_signature_with_digest(
    spki: &SubjectPublicKeyInfoOwned,
    digest: DigestAlgorithm,
    hashed: &[u8],
    signature: &[u8],
) -> Result<()> {
    let key = rsa_key(spki)?;
    key.verify(digest.pkcs1v15(), hashed, signature)
        .map_err(|_| Error::SignatureInvalid)
}
