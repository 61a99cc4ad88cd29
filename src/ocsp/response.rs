//! OCSP responses: parsing, signature checks and building.

use chrono::{DateTime, Utc};
use der::asn1::{BitString, Null, OctetString};
use der::{Decode, Encode};
use log::debug;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::ext::pkix::CrlReason;

use super::asn1::{
    BasicOcspResponse, CertStatus, OcspResponse, OcspResponseStatus, ResponderId, ResponseBytes,
    ResponseData, RevokedInfo, SingleResponse, Version,
};
use super::request::{extension_nonce, nonce_extension, CertificateId};
use crate::cert::X509Certificate;
use crate::digests::DigestAlgorithm;
use crate::error::{Error, Result};
use crate::oids;
use crate::signatures::{verify_signature, ExternalSignature, PrivateKeySignature};
use crate::util::{generalized_to_date_time, to_generalized_time};

/// Outer OCSP response.
#[derive(Debug, Clone)]
pub struct OcspResp {
    inner: OcspResponse,
}

impl OcspResp {
    /// Decode a DER `OCSPResponse`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = OcspResponse::from_der(der)
            .map_err(|e| Error::InvalidOcsp(format!("malformed response: {}", e)))?;
        Ok(Self { inner })
    }

    /// Successful response carrying `basic`.
    pub fn successful(basic: &BasicOcspResp) -> Result<Self> {
        Ok(Self {
            inner: OcspResponse {
                response_status: OcspResponseStatus::Successful,
                response_bytes: Some(ResponseBytes {
                    response_type: oids::OCSP_BASIC,
                    response: OctetString::new(basic.encoded.clone())?,
                }),
            },
        })
    }

    /// Error response without a body.
    pub fn error(status: OcspResponseStatus) -> Self {
        Self {
            inner: OcspResponse {
                response_status: status,
                response_bytes: None,
            },
        }
    }

    /// Response status.
    pub fn status(&self) -> OcspResponseStatus {
        self.inner.response_status
    }

    /// Basic response body; `None` when the response carries no body.
    pub fn basic(&self) -> Result<Option<BasicOcspResp>> {
        let bytes = match &self.inner.response_bytes {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        if bytes.response_type != oids::OCSP_BASIC {
            return Err(Error::InvalidOcsp(format!(
                "unsupported response type {}",
                bytes.response_type
            )));
        }
        BasicOcspResp::from_der(bytes.response.as_bytes()).map(Some)
    }

    /// DER encoding.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }
}

/// Status of one certificate in a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateStatus {
    /// Not revoked.
    Good,
    /// Revoked at the given instant.
    Revoked {
        /// Revocation time
        time: DateTime<Utc>,
        /// Reason code, when given
        reason: Option<CrlReason>,
    },
    /// The responder does not know the certificate.
    Unknown,
}

/// One entry of a basic response.
#[derive(Debug, Clone)]
pub struct SingleResp {
    cert_id: CertificateId,
    status: CertificateStatus,
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
}

impl SingleResp {
    fn from_asn1(single: &SingleResponse) -> Result<Self> {
        let status = match &single.cert_status {
            CertStatus::Good(_) => CertificateStatus::Good,
            CertStatus::Revoked(info) => CertificateStatus::Revoked {
                time: generalized_to_date_time(&info.revocation_time)?,
                reason: info.revocation_reason,
            },
            CertStatus::Unknown(_) => CertificateStatus::Unknown,
        };
        Ok(Self {
            cert_id: CertificateId::from_asn1(single.cert_id.clone()),
            status,
            this_update: generalized_to_date_time(&single.this_update)?,
            next_update: single
                .next_update
                .as_ref()
                .map(generalized_to_date_time)
                .transpose()?,
        })
    }

    /// Certificate this entry is about.
    pub fn cert_id(&self) -> &CertificateId {
        &self.cert_id
    }

    /// Reported status.
    pub fn status(&self) -> &CertificateStatus {
        &self.status
    }

    /// Time the status was known to be correct.
    pub fn this_update(&self) -> DateTime<Utc> {
        self.this_update
    }

    /// Time newer information will be available.
    pub fn next_update(&self) -> Option<DateTime<Utc>> {
        self.next_update
    }
}

/// A signed basic OCSP response.
#[derive(Debug, Clone)]
pub struct BasicOcspResp {
    inner: BasicOcspResponse,
    encoded: Vec<u8>,
    responses: Vec<SingleResp>,
    produced_at: DateTime<Utc>,
}

impl BasicOcspResp {
    /// Decode a DER `BasicOCSPResponse`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = BasicOcspResponse::from_der(der)
            .map_err(|e| Error::InvalidOcsp(format!("malformed basic response: {}", e)))?;
        Self::build(inner, der.to_vec())
    }

    fn build(inner: BasicOcspResponse, encoded: Vec<u8>) -> Result<Self> {
        let data = &inner.tbs_response_data;
        let responses = data
            .responses
            .iter()
            .map(SingleResp::from_asn1)
            .collect::<Result<Vec<_>>>()?;
        let produced_at = generalized_to_date_time(&data.produced_at)?;
        Ok(Self {
            inner,
            encoded,
            responses,
            produced_at,
        })
    }

    /// The decoded structure.
    pub fn as_asn1(&self) -> &BasicOcspResponse {
        &self.inner
    }

    /// DER encoding.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Per-certificate entries.
    pub fn responses(&self) -> &[SingleResp] {
        &self.responses
    }

    /// When the responder signed the response.
    pub fn produced_at(&self) -> DateTime<Utc> {
        self.produced_at
    }

    /// Responder identification.
    pub fn responder_id(&self) -> &ResponderId {
        &self.inner.tbs_response_data.responder_id
    }

    /// Nonce echoed by the responder.
    pub fn nonce(&self) -> Option<Vec<u8>> {
        extension_nonce(self.inner.tbs_response_data.response_extensions.as_deref())
    }

    /// Certificates included by the responder. Undecodable ones are skipped.
    pub fn certs(&self) -> Vec<X509Certificate> {
        self.inner
            .certs
            .iter()
            .flatten()
            .filter_map(|c| match X509Certificate::from_certificate(c.clone()) {
                Ok(cert) => Some(cert),
                Err(e) => {
                    debug!("skipping responder certificate: {}", e);
                    None
                },
            })
            .collect()
    }

    /// Verify the response signature with `key`.
    pub fn verify(&self, key: &SubjectPublicKeyInfoOwned) -> Result<()> {
        let tbs = self.inner.tbs_response_data.to_der()?;
        let signature = self
            .inner
            .signature
            .as_bytes()
            .ok_or_else(|| Error::InvalidOcsp("signature has unused bits".to_string()))?;
        verify_signature(key, &self.inner.signature_algorithm, &tbs, signature)
    }

    /// True when the response signature verifies under `cert`'s key.
    pub fn is_signed_by(&self, cert: &X509Certificate) -> bool {
        self.verify(cert.public_key()).is_ok()
    }
}

/// How the responder identifies itself in built responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderIdKind {
    /// By subject name.
    ByName,
    /// By SHA-1 hash of the public key.
    ByKey,
}

/// Builds signed basic OCSP responses.
#[derive(Debug, Clone)]
pub struct BasicOcspRespBuilder {
    responder_id: ResponderId,
    responses: Vec<SingleResponse>,
    nonce: Option<Vec<u8>>,
}

impl BasicOcspRespBuilder {
    /// Builder for a response signed by `responder`.
    pub fn new(responder: &X509Certificate, kind: ResponderIdKind) -> Result<Self> {
        let responder_id = match kind {
            ResponderIdKind::ByName => ResponderId::ByName(responder.subject().as_name().clone()),
            ResponderIdKind::ByKey => {
                let key = responder.public_key().subject_public_key.raw_bytes();
                ResponderId::ByKey(OctetString::new(DigestAlgorithm::Sha1.digest(key))?)
            },
        };
        Ok(Self {
            responder_id,
            responses: Vec::new(),
            nonce: None,
        })
    }

    /// Add a status entry.
    pub fn add_response(
        mut self,
        id: CertificateId,
        status: CertificateStatus,
        this_update: DateTime<Utc>,
        next_update: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let cert_status = match status {
            CertificateStatus::Good => CertStatus::Good(Null),
            CertificateStatus::Revoked { time, reason } => CertStatus::Revoked(RevokedInfo {
                revocation_time: to_generalized_time(&time)?,
                revocation_reason: reason,
            }),
            CertificateStatus::Unknown => CertStatus::Unknown(Null),
        };
        self.responses.push(SingleResponse {
            cert_id: id.as_asn1().clone(),
            cert_status,
            this_update: to_generalized_time(&this_update)?,
            next_update: next_update.as_ref().map(to_generalized_time).transpose()?,
            single_extensions: None,
        });
        Ok(self)
    }

    /// Echo a request nonce.
    pub fn with_nonce(mut self, nonce: Vec<u8>) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Sign the response, embedding `certs`.
    pub fn build(
        self,
        signer: &PrivateKeySignature,
        certs: &[X509Certificate],
        produced_at: DateTime<Utc>,
    ) -> Result<BasicOcspResp> {
        let response_extensions = match &self.nonce {
            Some(nonce) => Some(vec![nonce_extension(nonce)?]),
            None => None,
        };
        let tbs = ResponseData {
            version: Version::V1,
            responder_id: self.responder_id,
            produced_at: to_generalized_time(&produced_at)?,
            responses: self.responses,
            response_extensions,
        };
        let signature = signer.sign(&tbs.to_der()?)?;
        let algorithm: AlgorithmIdentifierOwned = signer.signature_algorithm_identifier();
        let inner = BasicOcspResponse {
            tbs_response_data: tbs,
            signature_algorithm: algorithm,
            signature: BitString::from_bytes(&signature)?,
            certs: if certs.is_empty() {
                None
            } else {
                Some(certs.iter().map(|c| c.certificate().clone()).collect())
            },
        };
        let encoded = inner.to_der()?;
        BasicOcspResp::build(inner, encoded)
    }
}
