//! Time-stamp token and response generation for a TSA.

use chrono::{DateTime, Utc};
use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{
    CertificateSet, EncapsulatedContentInfo, SignedData, SignerIdentifier, SignerInfo,
    SignerInfos,
};
use der::asn1::{Any, ObjectIdentifier, OctetString, SetOfVec, Uint};
use der::{Encode, EncodeValue, Tagged};
use log::{debug, warn};
use num_bigint_dig::BigUint;
use spki::AlgorithmIdentifierOwned;
use x509_cert::attr::Attribute;
use x509_cert::ext::pkix::name::GeneralName;

use super::asn1::{
    Accuracy, EssCertId, EssCertIdV2, IssuerSerial, MessageImprint, SigningCertificate,
    SigningCertificateV2, TstInfo, TspVersion,
};
use super::failure::PkiFailureInfo;
use super::request::TimeStampRequest;
use super::response::TimeStampResponse;
use super::token::{validate_tsa_certificate, TimeStampToken};
use crate::cert::{X500Name, X509Certificate};
use crate::digests::DigestAlgorithm;
use crate::error::{Error, Result};
use crate::oids;
use crate::signatures::ExternalSignature;
use crate::util::{to_generalized_time, to_x509_time};

fn attribute<T: Tagged + EncodeValue>(oid: ObjectIdentifier, value: &T) -> Result<Attribute> {
    Ok(Attribute {
        oid,
        values: SetOfVec::try_from(vec![Any::encode_from(value)?])?,
    })
}

/// Produces signed time-stamp tokens.
pub struct TimeStampTokenGenerator {
    signer: Box<dyn ExternalSignature>,
    digest: DigestAlgorithm,
    certificate: X509Certificate,
    chain: Vec<X509Certificate>,
    policy: ObjectIdentifier,
    accuracy: Option<Accuracy>,
    ordering: bool,
    tsa: Option<GeneralName>,
    issuer_serial_included: bool,
}

impl TimeStampTokenGenerator {
    /// Generator signing with `signer` on behalf of `certificate`.
    ///
    /// The certificate must be usable as a TSA certificate. `policy` is used
    /// when a request names none.
    pub fn new(
        signer: impl ExternalSignature + 'static,
        certificate: X509Certificate,
        policy: ObjectIdentifier,
    ) -> Result<Self> {
        validate_tsa_certificate(&certificate)?;
        let digest = DigestAlgorithm::from_name(signer.digest_algorithm()).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!(
                "{} is not a supported digest",
                signer.digest_algorithm()
            ))
        })?;
        if signer.encryption_algorithm() != "RSA" {
            return Err(Error::UnsupportedAlgorithm(format!(
                "{} signatures",
                signer.encryption_algorithm()
            )));
        }
        Ok(Self {
            signer: Box::new(signer),
            digest,
            certificate,
            chain: Vec::new(),
            policy,
            accuracy: None,
            ordering: false,
            tsa: None,
            issuer_serial_included: true,
        })
    }

    /// Extra certificates embedded after the TSA certificate when the
    /// request sets `certReq`.
    pub fn with_certificates(mut self, chain: Vec<X509Certificate>) -> Self {
        self.chain = chain;
        self
    }

    /// Accuracy of the time source. Millis and micros must lie in 1..=999.
    pub fn with_accuracy(
        mut self,
        seconds: Option<u32>,
        millis: Option<u16>,
        micros: Option<u16>,
    ) -> Result<Self> {
        for part in [millis, micros].into_iter().flatten() {
            if !(1..=999).contains(&part) {
                return Err(Error::InvalidArgument(format!(
                    "accuracy component {} out of range 1..999",
                    part
                )));
            }
        }
        self.accuracy = if seconds.is_none() && millis.is_none() && micros.is_none() {
            None
        } else {
            Some(Accuracy {
                seconds,
                millis,
                micros,
            })
        };
        Ok(self)
    }

    /// Claim that tokens can be ordered by generation time.
    pub fn with_ordering(mut self, ordering: bool) -> Self {
        self.ordering = ordering;
        self
    }

    /// Name the TSA inside each token.
    pub fn with_tsa(mut self, name: &X500Name) -> Self {
        self.tsa = Some(GeneralName::DirectoryName(name.as_name().clone()));
        self
    }

    /// Whether ESS certificate IDs carry the issuer and serial number.
    pub fn with_issuer_serial(mut self, included: bool) -> Self {
        self.issuer_serial_included = included;
        self
    }

    /// The TSA certificate.
    pub fn certificate(&self) -> &X509Certificate {
        &self.certificate
    }

    fn issuer_serial(&self) -> Option<IssuerSerial> {
        if !self.issuer_serial_included {
            return None;
        }
        Some(IssuerSerial {
            issuer: vec![GeneralName::DirectoryName(
                self.certificate.issuer().as_name().clone(),
            )],
            serial_number: self.certificate.serial().clone(),
        })
    }

    fn signing_certificate_attribute(&self) -> Result<Attribute> {
        let cert_hash = OctetString::new(self.digest.digest(self.certificate.encoded()))?;
        if self.digest == DigestAlgorithm::Sha1 {
            let value = SigningCertificate {
                certs: vec![EssCertId {
                    cert_hash,
                    issuer_serial: self.issuer_serial(),
                }],
                policies: None,
            };
            attribute(oids::ATTR_SIGNING_CERTIFICATE, &value)
        } else {
            let hash_algorithm = if self.digest == DigestAlgorithm::Sha256 {
                None
            } else {
                Some(self.digest.algorithm_identifier())
            };
            let value = SigningCertificateV2 {
                certs: vec![EssCertIdV2 {
                    hash_algorithm,
                    cert_hash,
                    issuer_serial: self.issuer_serial(),
                }],
                policies: None,
            };
            attribute(oids::ATTR_SIGNING_CERTIFICATE_V2, &value)
        }
    }

    /// Sign a token answering `request`.
    ///
    /// The request is not validated here; `gen_time` is truncated to whole
    /// seconds.
    pub fn generate(
        &self,
        request: &TimeStampRequest,
        serial_number: &BigUint,
        gen_time: DateTime<Utc>,
    ) -> Result<TimeStampToken> {
        let imprint = &request.as_asn1().message_imprint;
        let nonce = match request.nonce() {
            Some(n) => Some(Uint::new(n)?),
            None => None,
        };
        let tst = TstInfo {
            version: TspVersion::V1,
            policy: request.req_policy().copied().unwrap_or(self.policy),
            message_imprint: MessageImprint {
                hash_algorithm: imprint.hash_algorithm.clone(),
                hashed_message: imprint.hashed_message.clone(),
            },
            serial_number: Uint::new(&serial_number.to_bytes_be())?,
            gen_time: to_generalized_time(&gen_time)?,
            accuracy: self.accuracy,
            ordering: self.ordering,
            nonce,
            tsa: self.tsa.clone(),
            extensions: None,
        };
        let tst_der = tst.to_der()?;

        let signed_attrs: SetOfVec<Attribute> = SetOfVec::try_from(vec![
            attribute(oids::ATTR_CONTENT_TYPE, &oids::CT_TST_INFO)?,
            attribute(oids::ATTR_SIGNING_TIME, &to_x509_time(&gen_time)?)?,
            attribute(
                oids::ATTR_MESSAGE_DIGEST,
                &OctetString::new(self.digest.digest(&tst_der))?,
            )?,
            self.signing_certificate_attribute()?,
        ])?;
        let signature = self.signer.sign(&signed_attrs.to_der()?)?;

        let digest_alg = self.digest.algorithm_identifier();
        let signer_info = SignerInfo {
            version: CmsVersion::V1,
            sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
                issuer: self.certificate.issuer().as_name().clone(),
                serial_number: self.certificate.serial().clone(),
            }),
            digest_alg: digest_alg.clone(),
            signed_attrs: Some(signed_attrs),
            signature_algorithm: AlgorithmIdentifierOwned {
                oid: self.digest.rsa_signature_oid(),
                parameters: Some(Any::null()),
            },
            signature: OctetString::new(signature)?,
            unsigned_attrs: None,
        };

        let certificates = if request.cert_req() {
            let choices = std::iter::once(&self.certificate)
                .chain(self.chain.iter())
                .map(|c| CertificateChoices::Certificate(c.certificate().clone()))
                .collect::<Vec<_>>();
            Some(CertificateSet(SetOfVec::try_from(choices)?))
        } else {
            None
        };

        let signed_data = SignedData {
            version: CmsVersion::V3,
            digest_algorithms: SetOfVec::try_from(vec![digest_alg])?,
            encap_content_info: EncapsulatedContentInfo {
                econtent_type: oids::CT_TST_INFO,
                econtent: Some(Any::encode_from(&OctetString::new(tst_der)?)?),
            },
            certificates,
            crls: None,
            signer_infos: SignerInfos(SetOfVec::try_from(vec![signer_info])?),
        };

        debug!(
            "issued time-stamp token serial {} at {}",
            serial_number, gen_time
        );
        TimeStampToken::from_content_info(ContentInfo {
            content_type: oids::CMS_SIGNED_DATA,
            content: Any::encode_from(&signed_data)?,
        })
    }
}

impl std::fmt::Debug for TimeStampTokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeStampTokenGenerator")
            .field("certificate", &self.certificate)
            .field("digest", &self.digest)
            .field("policy", &self.policy)
            .field("ordering", &self.ordering)
            .finish()
    }
}

/// Answers time-stamp requests, turning every failure into a rejection.
#[derive(Debug)]
pub struct TimeStampResponseGenerator {
    token_generator: TimeStampTokenGenerator,
    accepted_algorithms: Vec<ObjectIdentifier>,
    accepted_policies: Option<Vec<ObjectIdentifier>>,
    accepted_extensions: Option<Vec<ObjectIdentifier>>,
}

impl TimeStampResponseGenerator {
    /// Generator accepting imprints hashed with `accepted_algorithms`.
    pub fn new(
        token_generator: TimeStampTokenGenerator,
        accepted_algorithms: Vec<ObjectIdentifier>,
    ) -> Self {
        Self {
            token_generator,
            accepted_algorithms,
            accepted_policies: None,
            accepted_extensions: None,
        }
    }

    /// Restrict the policies a request may name.
    pub fn with_accepted_policies(mut self, policies: Vec<ObjectIdentifier>) -> Self {
        self.accepted_policies = Some(policies);
        self
    }

    /// Restrict the critical extensions a request may carry.
    pub fn with_accepted_extensions(mut self, extensions: Vec<ObjectIdentifier>) -> Self {
        self.accepted_extensions = Some(extensions);
        self
    }

    /// Answer `request`. A missing `gen_time` means the time source is
    /// unavailable.
    pub fn generate(
        &self,
        request: &TimeStampRequest,
        serial_number: &BigUint,
        gen_time: Option<DateTime<Utc>>,
    ) -> TimeStampResponse {
        match self.try_generate(request, serial_number, gen_time) {
            Ok(response) => response,
            Err(Error::Tsp { failure, message }) => {
                debug!("rejecting time-stamp request: {} ({})", message, failure);
                TimeStampResponse::rejection(failure, message)
            },
            Err(e) => {
                warn!("time-stamp generation failed: {}", e);
                TimeStampResponse::rejection(PkiFailureInfo::SYSTEM_FAILURE, e.to_string())
            },
        }
    }

    fn try_generate(
        &self,
        request: &TimeStampRequest,
        serial_number: &BigUint,
        gen_time: Option<DateTime<Utc>>,
    ) -> Result<TimeStampResponse> {
        let gen_time = gen_time.ok_or_else(|| {
            Error::tsp(
                PkiFailureInfo::TIME_NOT_AVAILABLE,
                "The time source is not available.",
            )
        })?;
        request.validate(
            &self.accepted_algorithms,
            self.accepted_policies.as_deref(),
            self.accepted_extensions.as_deref(),
        )?;
        let token = self
            .token_generator
            .generate(request, serial_number, gen_time)?;
        Ok(TimeStampResponse::granted(token))
    }
}
