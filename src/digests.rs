//! Digest algorithms and the OID/name registries built around them.
//!
//! The tables are process-wide and read-only: they are filled on first use
//! and offer no mutation API.

use std::collections::HashMap;

use der::asn1::{Any, ObjectIdentifier};
use lazy_static::lazy_static;
use rsa::Pkcs1v15Sign;
use sha2::Digest;
use spki::AlgorithmIdentifierOwned;

use crate::oids;

/// Digest algorithm usable for signatures, OCSP certificate IDs and TSP imprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    /// MD5 (legacy, verification only)
    Md5,
    /// SHA-1 (deprecated, but still common in OCSP and legacy tokens)
    Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256 (recommended)
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// Every supported algorithm, weakest first.
    pub const ALL: [DigestAlgorithm; 6] = [
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha224,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
    ];

    /// Get the OID for this digest algorithm.
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Md5 => oids::MD5,
            DigestAlgorithm::Sha1 => oids::SHA1,
            DigestAlgorithm::Sha224 => oids::SHA224,
            DigestAlgorithm::Sha256 => oids::SHA256,
            DigestAlgorithm::Sha384 => oids::SHA384,
            DigestAlgorithm::Sha512 => oids::SHA512,
        }
    }

    /// Get the name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha224 => "SHA-224",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Digest output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 16,
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Hash `data` in one shot.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Md5 => md5::Md5::digest(data).to_vec(),
            DigestAlgorithm::Sha1 => sha1::Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha224 => sha2::Sha224::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => sha2::Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => sha2::Sha512::digest(data).to_vec(),
        }
    }

    /// Look up a digest by OID. Signature OIDs resolve to their digest.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        DIGEST_BY_OID.get(oid).copied()
    }

    /// Look up a digest by name, ignoring case and dashes ("sha256", "SHA-256").
    pub fn from_name(name: &str) -> Option<Self> {
        DIGEST_BY_NAME.get(normalize_name(name).as_str()).copied()
    }

    /// AlgorithmIdentifier with NULL parameters, as emitted in CertIDs and imprints.
    pub fn algorithm_identifier(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: Some(Any::null()),
        }
    }

    /// PKCS#1 v1.5 signature scheme with this digest's DigestInfo prefix.
    pub(crate) fn pkcs1v15(&self) -> Pkcs1v15Sign {
        match self {
            DigestAlgorithm::Md5 => Pkcs1v15Sign::new::<md5::Md5>(),
            DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
            DigestAlgorithm::Sha224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
            DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
            DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
            DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
        }
    }

    /// RSA signature algorithm OID pairing this digest with PKCS#1 v1.5.
    pub fn rsa_signature_oid(&self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Md5 => oids::MD5_WITH_RSA,
            DigestAlgorithm::Sha1 => oids::SHA1_WITH_RSA,
            DigestAlgorithm::Sha224 => oids::SHA224_WITH_RSA,
            DigestAlgorithm::Sha256 => oids::SHA256_WITH_RSA,
            DigestAlgorithm::Sha384 => oids::SHA384_WITH_RSA,
            DigestAlgorithm::Sha512 => oids::SHA512_WITH_RSA,
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect::<String>()
        .to_ascii_uppercase()
}

lazy_static! {
    static ref DIGEST_BY_OID: HashMap<ObjectIdentifier, DigestAlgorithm> = {
        let mut m = HashMap::new();
        for alg in DigestAlgorithm::ALL {
            m.insert(alg.oid(), alg);
            m.insert(alg.rsa_signature_oid(), alg);
        }
        m
    };

    static ref DIGEST_BY_NAME: HashMap<&'static str, DigestAlgorithm> = {
        let mut m = HashMap::new();
        m.insert("MD5", DigestAlgorithm::Md5);
        m.insert("SHA1", DigestAlgorithm::Sha1);
        m.insert("SHA224", DigestAlgorithm::Sha224);
        m.insert("SHA256", DigestAlgorithm::Sha256);
        m.insert("SHA384", DigestAlgorithm::Sha384);
        m.insert("SHA512", DigestAlgorithm::Sha512);
        m
    };

    /// Signature algorithm OID -> (digest, encryption algorithm name).
    static ref SIGNATURE_ALGORITHMS: HashMap<ObjectIdentifier, (DigestAlgorithm, &'static str)> = {
        let mut m = HashMap::new();
        for alg in DigestAlgorithm::ALL {
            m.insert(alg.rsa_signature_oid(), (alg, "RSA"));
        }
        m
    };
}

/// Name of the digest behind a digest or signature OID.
pub fn digest_name(oid: &ObjectIdentifier) -> Option<&'static str> {
    DigestAlgorithm::from_oid(oid).map(|d| d.name())
}

/// OID registered for a digest name.
pub fn digest_oid(name: &str) -> Option<ObjectIdentifier> {
    DigestAlgorithm::from_name(name).map(|d| d.oid())
}

/// Expected digest length for a digest OID, used to check TSP imprints.
pub fn digest_length(oid: &ObjectIdentifier) -> Option<usize> {
    DigestAlgorithm::ALL
        .iter()
        .find(|d| d.oid() == *oid)
        .map(|d| d.output_len())
}

/// Split a signature algorithm OID into its digest and encryption algorithm.
pub fn signature_algorithm(oid: &ObjectIdentifier) -> Option<(DigestAlgorithm, &'static str)> {
    SIGNATURE_ALGORITHMS.get(oid).copied()
}
