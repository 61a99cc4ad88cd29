//! Signing through an abstract key holder.

use der::asn1::Any;
use pkcs1::DecodeRsaPrivateKey;
use pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use spki::AlgorithmIdentifierOwned;

use crate::digests::DigestAlgorithm;
use crate::error::{Error, Result};

/// A signer whose private key may live outside this process.
pub trait ExternalSignature {
    /// Digest algorithm name, e.g. "SHA-256".
    fn digest_algorithm(&self) -> &str;

    /// Encryption algorithm name, e.g. "RSA".
    fn encryption_algorithm(&self) -> &str;

    /// Hash `message` and sign the digest.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// RSA PKCS#1 v1.5 signer over an in-memory private key.
#[derive(Clone)]
pub struct PrivateKeySignature {
    key: RsaPrivateKey,
    digest: DigestAlgorithm,
}

impl PrivateKeySignature {
    /// Create a signer; `hash_algorithm` is resolved through the digest
    /// registry ("SHA256", "sha-256" and "SHA-256" are equivalent).
    pub fn new(key: RsaPrivateKey, hash_algorithm: &str) -> Result<Self> {
        let digest = DigestAlgorithm::from_name(hash_algorithm).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("{} is not a supported digest", hash_algorithm))
        })?;
        Ok(Self { key, digest })
    }

    /// Load a DER `PrivateKeyInfo` (PKCS#8) holding an RSA key.
    pub fn from_pkcs8_der(der: &[u8], hash_algorithm: &str) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| Error::InvalidArgument(format!("bad PKCS#8 private key: {}", e)))?;
        Self::new(key, hash_algorithm)
    }

    /// Load a DER `RSAPrivateKey` (PKCS#1).
    pub fn from_pkcs1_der(der: &[u8], hash_algorithm: &str) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs1_der(der)
            .map_err(|e| Error::InvalidArgument(format!("bad PKCS#1 private key: {}", e)))?;
        Self::new(key, hash_algorithm)
    }

    /// Signer with an already resolved digest.
    pub fn with_digest(key: RsaPrivateKey, digest: DigestAlgorithm) -> Self {
        Self { key, digest }
    }

    /// The digest used for signing.
    pub fn digest(&self) -> DigestAlgorithm {
        self.digest
    }

    /// The signing key.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.key
    }

    /// `<digest>WithRSAEncryption` identifier with NULL parameters.
    pub fn signature_algorithm_identifier(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.digest.rsa_signature_oid(),
            parameters: Some(Any::null()),
        }
    }

    /// Sign a digest computed elsewhere.
    pub fn sign_digest(&self, hashed: &[u8]) -> Result<Vec<u8>> {
        if hashed.len() != self.digest.output_len() {
            return Err(Error::DataLength(format!(
                "{} digest must be {} bytes, got {}",
                self.digest,
                self.digest.output_len(),
                hashed.len()
            )));
        }
        Ok(self.key.sign(self.digest.pkcs1v15(), hashed)?)
    }
}

impl ExternalSignature for PrivateKeySignature {
    fn digest_algorithm(&self) -> &str {
        self.digest.name()
    }

    fn encryption_algorithm(&self) -> &str {
        "RSA"
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.sign_digest(&self.digest.digest(message))
    }
}

impl std::fmt::Debug for PrivateKeySignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeySignature")
            .field("modulus_bits", &self.key.n().bits())
            .field("digest", &self.digest)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
