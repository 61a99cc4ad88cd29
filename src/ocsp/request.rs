//! OCSP requests.

use der::asn1::OctetString;
use der::Encode;
use rand::RngCore;
use x509_cert::ext::Extension;
use x509_cert::serial_number::SerialNumber;

use super::asn1::{CertId, OcspRequest, Request, TbsRequest, Version};
use crate::cert::X509Certificate;
use crate::digests::DigestAlgorithm;
use crate::error::{Error, Result};
use crate::oids;

/// Identifies a certificate by issuer name hash, issuer key hash and serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateId {
    inner: CertId,
}

impl CertificateId {
    /// Identify `serial` issued by `issuer`, hashing with `digest`.
    pub fn new(digest: DigestAlgorithm, issuer: &X509Certificate, serial: SerialNumber) -> Result<Self> {
        let name_hash = digest.digest(issuer.subject().encoded());
        let key_hash = digest.digest(issuer_key_bytes(issuer)?);
        Ok(Self {
            inner: CertId {
                hash_algorithm: digest.algorithm_identifier(),
                issuer_name_hash: OctetString::new(name_hash)?,
                issuer_key_hash: OctetString::new(key_hash)?,
                serial_number: serial,
            },
        })
    }

    /// SHA-1 identifier for `cert` issued by `issuer`.
    pub fn for_certificate(cert: &X509Certificate, issuer: &X509Certificate) -> Result<Self> {
        Self::new(DigestAlgorithm::Sha1, issuer, cert.serial().clone())
    }

    /// Wrap a decoded `CertID`.
    pub fn from_asn1(inner: CertId) -> Self {
        Self { inner }
    }

    /// The underlying structure.
    pub fn as_asn1(&self) -> &CertId {
        &self.inner
    }

    /// Serial number of the identified certificate.
    pub fn serial_number(&self) -> &SerialNumber {
        &self.inner.serial_number
    }

    /// Digest used for the issuer hashes, if supported.
    pub fn digest_algorithm(&self) -> Option<DigestAlgorithm> {
        DigestAlgorithm::from_oid(&self.inner.hash_algorithm.oid)
    }

    /// True when both issuer hashes match `issuer`.
    pub fn matches_issuer(&self, issuer: &X509Certificate) -> Result<bool> {
        let digest = self.digest_algorithm().ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!(
                "CertID hash algorithm {}",
                self.inner.hash_algorithm.oid
            ))
        })?;
        let expected = Self::new(digest, issuer, self.inner.serial_number.clone())?;
        Ok(expected.inner.issuer_name_hash == self.inner.issuer_name_hash
            && expected.inner.issuer_key_hash == self.inner.issuer_key_hash)
    }
}

fn issuer_key_bytes(issuer: &X509Certificate) -> Result<&[u8]> {
    issuer
        .public_key()
        .subject_public_key
        .as_bytes()
        .ok_or_else(|| Error::InvalidCertificate("public key has unused bits".to_string()))
}

/// Random nonce of `length` bytes.
pub fn generate_nonce(length: usize) -> Vec<u8> {
    let mut nonce = vec![0u8; length];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Nonce extension: the extension value wraps the nonce in an OCTET STRING.
pub(crate) fn nonce_extension(nonce: &[u8]) -> Result<Extension> {
    let inner = OctetString::new(nonce)?;
    Ok(Extension {
        extn_id: oids::OCSP_NONCE,
        critical: false,
        extn_value: OctetString::new(inner.to_der()?)?,
    })
}

/// Unsigned OCSP request builder.
#[derive(Debug, Clone, Default)]
pub struct OcspRequestBuilder {
    requests: Vec<CertificateId>,
    nonce: Option<Vec<u8>>,
}

impl OcspRequestBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for the status of `id`.
    pub fn add_request(mut self, id: CertificateId) -> Self {
        self.requests.push(id);
        self
    }

    /// Attach a nonce extension.
    pub fn with_nonce(mut self, nonce: Vec<u8>) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Assemble the request.
    pub fn build(self) -> Result<OcspRequest> {
        if self.requests.is_empty() {
            return Err(Error::IllegalState("no requests specified".to_string()));
        }
        let request_extensions = match &self.nonce {
            Some(nonce) => Some(vec![nonce_extension(nonce)?]),
            None => None,
        };
        Ok(OcspRequest {
            tbs_request: TbsRequest {
                version: Version::V1,
                requestor_name: None,
                request_list: self
                    .requests
                    .into_iter()
                    .map(|id| Request {
                        req_cert: id.inner,
                        single_request_extensions: None,
                    })
                    .collect(),
                request_extensions,
            },
            optional_signature: None,
        })
    }
}

/// Nonce carried by a request, unwrapped from its OCTET STRING.
pub fn request_nonce(request: &OcspRequest) -> Option<Vec<u8>> {
    extension_nonce(request.tbs_request.request_extensions.as_deref())
}

pub(crate) fn extension_nonce(extensions: Option<&[Extension]>) -> Option<Vec<u8>> {
    use der::Decode;

    let ext = extensions?.iter().find(|e| e.extn_id == oids::OCSP_NONCE)?;
    match OctetString::from_der(ext.extn_value.as_bytes()) {
        Ok(inner) => Some(inner.as_bytes().to_vec()),
        Err(_) => Some(ext.extn_value.as_bytes().to_vec()),
    }
}
