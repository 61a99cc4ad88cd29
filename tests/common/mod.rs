//! Shared fixtures for the integration tests.
//!
//! Keys are generated once per test binary from fixed seeds. Certificates,
//! CRLs and OCSP responses are built and signed in memory.

#![allow(dead_code)]

use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use der::asn1::{BitString, Ia5String, ObjectIdentifier, OctetString};
use der::{Decode, Encode};
use pdf_oxide_pki::cert::{X500Name, X509Certificate, X509Crl};
use pdf_oxide_pki::digests::DigestAlgorithm;
use pdf_oxide_pki::oids;
use pdf_oxide_pki::signatures::{ExternalSignature, PrivateKeySignature};
use pdf_oxide_pki::util::to_x509_time;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rsa::RsaPrivateKey;
use spki::{EncodePublicKey, SubjectPublicKeyInfoOwned};
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::pkix::constraints::name::GeneralSubtree;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    AccessDescription, AuthorityInfoAccessSyntax, BasicConstraints, ExtendedKeyUsage, KeyUsage,
    KeyUsages, NameConstraints,
};
use x509_cert::ext::Extension;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Validity;
use x509_cert::{Certificate, TbsCertificate, Version};

/// Install a test logger once.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Deterministic 1024-bit RSA key for `slot`.
pub fn key(slot: usize) -> &'static RsaPrivateKey {
    static KEYS: OnceLock<Vec<OnceLock<RsaPrivateKey>>> = OnceLock::new();
    let keys = KEYS.get_or_init(|| (0..16).map(|_| OnceLock::new()).collect());
    keys[slot].get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(0x5eed_0000 + slot as u64);
        RsaPrivateKey::new(&mut rng, 1024).unwrap()
    })
}

/// SubjectPublicKeyInfo of `key`.
pub fn spki(key: &RsaPrivateKey) -> SubjectPublicKeyInfoOwned {
    let der = key.to_public_key().to_public_key_der().unwrap();
    SubjectPublicKeyInfoOwned::from_der(der.as_bytes()).unwrap()
}

/// SHA-256 signer over `key`.
pub fn signer(key: &RsaPrivateKey) -> PrivateKeySignature {
    PrivateKeySignature::with_digest(key.clone(), DigestAlgorithm::Sha256)
}

/// UTC instant at midnight.
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// A point in time inside every default validity window.
pub fn now() -> DateTime<Utc> {
    date(2030, 6, 1)
}

/// Minimal big-endian serial number.
pub fn serial(n: u64) -> SerialNumber {
    let bytes = n.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    SerialNumber::new(&bytes[start..]).unwrap()
}

fn extension<T: Encode>(oid: ObjectIdentifier, critical: bool, value: &T) -> Extension {
    Extension {
        extn_id: oid,
        critical,
        extn_value: OctetString::new(value.to_der().unwrap()).unwrap(),
    }
}

fn directory_subtree(name: &str) -> GeneralSubtree {
    GeneralSubtree {
        base: GeneralName::DirectoryName(X500Name::parse(name).unwrap().as_name().clone()),
        minimum: 0,
        maximum: None,
    }
}

/// Builds and signs test certificates.
#[derive(Clone)]
pub struct CertBuilder {
    subject: X500Name,
    serial: u64,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    version: Version,
    extensions: Vec<Extension>,
}

impl CertBuilder {
    /// Certificate for `subject` valid 2020 through 2039.
    pub fn new(subject: &str, serial: u64) -> Self {
        Self {
            subject: X500Name::parse(subject).unwrap(),
            serial,
            not_before: date(2020, 1, 1),
            not_after: date(2040, 1, 1),
            version: Version::V3,
            extensions: Vec::new(),
        }
    }

    pub fn validity(mut self, not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// CA: critical basic constraints and keyCertSign/cRLSign key usage.
    pub fn ca(mut self, path_len: Option<u8>) -> Self {
        self.extensions.push(extension(
            oids::BASIC_CONSTRAINTS,
            true,
            &BasicConstraints {
                ca: true,
                path_len_constraint: path_len,
            },
        ));
        self.key_usage(KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign))
    }

    pub fn key_usage(mut self, usage: KeyUsage) -> Self {
        self.extensions.push(extension(oids::KEY_USAGE, true, &usage));
        self
    }

    pub fn extended_key_usage(mut self, purposes: Vec<ObjectIdentifier>, critical: bool) -> Self {
        self.extensions.push(extension(
            oids::EXTENDED_KEY_USAGE,
            critical,
            &ExtendedKeyUsage(purposes),
        ));
        self
    }

    pub fn name_constraints(mut self, permitted: &[&str], excluded: &[&str]) -> Self {
        let subtrees = |names: &[&str]| {
            if names.is_empty() {
                None
            } else {
                Some(names.iter().map(|n| directory_subtree(n)).collect())
            }
        };
        self.extensions.push(extension(
            oids::NAME_CONSTRAINTS,
            true,
            &NameConstraints {
                permitted_subtrees: subtrees(permitted),
                excluded_subtrees: subtrees(excluded),
            },
        ));
        self
    }

    pub fn ocsp_url(mut self, url: &str) -> Self {
        self.extensions.push(extension(
            oids::AUTHORITY_INFO_ACCESS,
            false,
            &AuthorityInfoAccessSyntax(vec![AccessDescription {
                access_method: oids::AD_OCSP,
                access_location: GeneralName::UniformResourceIdentifier(
                    Ia5String::new(url).unwrap(),
                ),
            }]),
        ));
        self
    }

    /// Raw extension; `value` is the DER of the extension value.
    pub fn raw_extension(mut self, oid: ObjectIdentifier, critical: bool, value: &[u8]) -> Self {
        self.extensions.push(Extension {
            extn_id: oid,
            critical,
            extn_value: OctetString::new(value).unwrap(),
        });
        self
    }

    fn sign(
        self,
        subject_key: &RsaPrivateKey,
        issuer: X500Name,
        issuer_key: &RsaPrivateKey,
    ) -> X509Certificate {
        let signer = signer(issuer_key);
        let algorithm = signer.signature_algorithm_identifier();
        let tbs = TbsCertificate {
            version: self.version,
            serial_number: serial(self.serial),
            signature: algorithm.clone(),
            issuer: issuer.as_name().clone(),
            validity: Validity {
                not_before: to_x509_time(&self.not_before).unwrap(),
                not_after: to_x509_time(&self.not_after).unwrap(),
            },
            subject: self.subject.as_name().clone(),
            subject_public_key_info: spki(subject_key),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: if self.extensions.is_empty() {
                None
            } else {
                Some(self.extensions)
            },
        };
        let signature = signer.sign(&tbs.to_der().unwrap()).unwrap();
        X509Certificate::from_certificate(Certificate {
            tbs_certificate: tbs,
            signature_algorithm: algorithm,
            signature: BitString::from_bytes(&signature).unwrap(),
        })
        .unwrap()
    }

    pub fn self_signed(self, key: &RsaPrivateKey) -> X509Certificate {
        let issuer = self.subject.clone();
        self.sign(key, issuer, key)
    }

    pub fn issued_by(
        self,
        subject_key: &RsaPrivateKey,
        issuer: &X509Certificate,
        issuer_key: &RsaPrivateKey,
    ) -> X509Certificate {
        self.sign(subject_key, issuer.subject().clone(), issuer_key)
    }
}

/// Builds and signs test CRLs.
pub struct CrlBuilder {
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
    revoked: Vec<(u64, DateTime<Utc>)>,
}

impl CrlBuilder {
    pub fn new(this_update: DateTime<Utc>) -> Self {
        Self {
            this_update,
            next_update: None,
            revoked: Vec::new(),
        }
    }

    pub fn next_update(mut self, next_update: DateTime<Utc>) -> Self {
        self.next_update = Some(next_update);
        self
    }

    pub fn revoke(mut self, serial: u64, at: DateTime<Utc>) -> Self {
        self.revoked.push((serial, at));
        self
    }

    pub fn sign(self, issuer: &X509Certificate, issuer_key: &RsaPrivateKey) -> X509Crl {
        let signer = signer(issuer_key);
        let algorithm = signer.signature_algorithm_identifier();
        let revoked: Vec<RevokedCert> = self
            .revoked
            .iter()
            .map(|(s, at)| RevokedCert {
                serial_number: serial(*s),
                revocation_date: to_x509_time(at).unwrap(),
                crl_entry_extensions: None,
            })
            .collect();
        let tbs = TbsCertList {
            version: Version::V2,
            signature: algorithm.clone(),
            issuer: issuer.subject().as_name().clone(),
            this_update: to_x509_time(&self.this_update).unwrap(),
            next_update: self.next_update.map(|t| to_x509_time(&t).unwrap()),
            revoked_certificates: if revoked.is_empty() { None } else { Some(revoked) },
            crl_extensions: None,
        };
        let signature = signer.sign(&tbs.to_der().unwrap()).unwrap();
        X509Crl::from_certificate_list(CertificateList {
            tbs_cert_list: tbs,
            signature_algorithm: algorithm,
            signature: BitString::from_bytes(&signature).unwrap(),
        })
        .unwrap()
    }
}

/// Root CA, intermediate CA and an end-entity certificate.
pub struct Pki {
    pub root: X509Certificate,
    pub intermediate: X509Certificate,
    pub leaf: X509Certificate,
}

/// Keys: 0 root, 1 intermediate, 2 leaf.
pub fn three_level_pki() -> Pki {
    let root = CertBuilder::new("CN=Test Root CA, O=Acme, C=US", 1)
        .ca(None)
        .self_signed(key(0));
    let intermediate = CertBuilder::new("CN=Test Intermediate CA, O=Acme, C=US", 2)
        .ca(Some(0))
        .issued_by(key(1), &root, key(0));
    let leaf = CertBuilder::new("CN=Signer, O=Acme, C=US", 3)
        .key_usage(KeyUsage(KeyUsages::DigitalSignature.into()))
        .issued_by(key(2), &intermediate, key(1));
    Pki {
        root,
        intermediate,
        leaf,
    }
}
