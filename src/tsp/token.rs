//! Time-stamp tokens: CMS SignedData wrapping a `TSTInfo`.

use chrono::{DateTime, Utc};
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use der::asn1::{ObjectIdentifier, OctetString, SetOfVec};
use der::{Decode, Encode};
use log::debug;
use x509_cert::attr::Attribute;
use x509_cert::ext::pkix::name::GeneralName;

use super::asn1::{Accuracy, IssuerSerial, SigningCertificate, SigningCertificateV2, TstInfo};
use crate::cert::{X500Name, X509Certificate};
use crate::digests::DigestAlgorithm;
use crate::error::{Error, Result};
use crate::oids;
use crate::signatures::{verify_signature, verify_signature_with_digest};
use crate::util::{constant_time_eq, generalized_to_date_time};

/// Check that `cert` may act as a TSA: version 3 with a critical extended
/// key usage extension listing time stamping and nothing else.
pub fn validate_tsa_certificate(cert: &X509Certificate) -> Result<()> {
    if cert.certificate().tbs_certificate.version != x509_cert::Version::V3 {
        return Err(Error::TspValidation(
            "Certificate must have an ExtendedKeyUsage extension.".to_string(),
        ));
    }
    let ext = cert.extension(&oids::EXTENDED_KEY_USAGE).ok_or_else(|| {
        Error::TspValidation("Certificate must have an ExtendedKeyUsage extension.".to_string())
    })?;
    if !ext.critical {
        return Err(Error::TspValidation(
            "Certificate must have an ExtendedKeyUsage extension marked as critical.".to_string(),
        ));
    }
    let solely_time_stamping = match cert.extended_key_usage()? {
        Some(eku) => eku.0.len() == 1 && eku.0[0] == oids::KP_TIME_STAMPING,
        None => false,
    };
    if !solely_time_stamping {
        return Err(Error::TspValidation(
            "ExtendedKeyUsage not solely time stamping.".to_string(),
        ));
    }
    Ok(())
}

/// Decoded `TSTInfo` with its generation time converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeStampTokenInfo {
    inner: TstInfo,
    gen_time: DateTime<Utc>,
}

impl TimeStampTokenInfo {
    /// Decode a DER `TSTInfo`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = TstInfo::from_der(der)
            .map_err(|e| Error::InvalidTsp(format!("malformed TSTInfo: {}", e)))?;
        Self::from_asn1(inner)
    }

    /// Wrap a decoded structure.
    pub fn from_asn1(inner: TstInfo) -> Result<Self> {
        let gen_time = generalized_to_date_time(&inner.gen_time)?;
        Ok(Self { inner, gen_time })
    }

    /// The underlying structure.
    pub fn as_asn1(&self) -> &TstInfo {
        &self.inner
    }

    /// TSA policy under which the token was issued.
    pub fn policy(&self) -> &ObjectIdentifier {
        &self.inner.policy
    }

    /// Hash algorithm of the message imprint.
    pub fn message_imprint_alg_oid(&self) -> &ObjectIdentifier {
        &self.inner.message_imprint.hash_algorithm.oid
    }

    /// Hash value of the message imprint.
    pub fn message_imprint_digest(&self) -> &[u8] {
        self.inner.message_imprint.hashed_message.as_bytes()
    }

    /// Serial number as unsigned big-endian bytes.
    pub fn serial_number(&self) -> &[u8] {
        self.inner.serial_number.as_bytes()
    }

    /// Generation time.
    pub fn gen_time(&self) -> DateTime<Utc> {
        self.gen_time
    }

    /// Accuracy of the generation time.
    pub fn accuracy(&self) -> Option<&Accuracy> {
        self.inner.accuracy.as_ref()
    }

    /// Whether tokens from this TSA can be ordered by generation time.
    pub fn is_ordered(&self) -> bool {
        self.inner.ordering
    }

    /// Nonce copied from the request.
    pub fn nonce(&self) -> Option<&[u8]> {
        self.inner.nonce.as_ref().map(|n| n.as_bytes())
    }

    /// Name of the TSA.
    pub fn tsa(&self) -> Option<&GeneralName> {
        self.inner.tsa.as_ref()
    }
}

/// Identifier of the signing certificate taken from an ESS attribute.
#[derive(Debug, Clone)]
struct SigningCertId {
    digest: DigestAlgorithm,
    hash: Vec<u8>,
    issuer_serial: Option<IssuerSerial>,
}

fn attribute_value<'a>(attrs: &'a SetOfVec<Attribute>, oid: &ObjectIdentifier) -> Option<&'a der::Any> {
    attrs
        .iter()
        .find(|a| a.oid == *oid)
        .and_then(|a| a.values.iter().next())
}

fn signing_cert_ids(attrs: &SetOfVec<Attribute>) -> Result<Vec<SigningCertId>> {
    let mut ids = Vec::new();

    if let Some(value) = attribute_value(attrs, &oids::ATTR_SIGNING_CERTIFICATE) {
        let sc: SigningCertificate = value.decode_as()?;
        let first = sc.certs.into_iter().next().ok_or_else(|| {
            Error::InvalidTsp("empty signing certificate attribute".to_string())
        })?;
        ids.push(SigningCertId {
            digest: DigestAlgorithm::Sha1,
            hash: first.cert_hash.as_bytes().to_vec(),
            issuer_serial: first.issuer_serial,
        });
    }

    if let Some(value) = attribute_value(attrs, &oids::ATTR_SIGNING_CERTIFICATE_V2) {
        let sc: SigningCertificateV2 = value.decode_as()?;
        let first = sc.certs.into_iter().next().ok_or_else(|| {
            Error::InvalidTsp("empty signing certificate attribute".to_string())
        })?;
        let digest = match &first.hash_algorithm {
            None => DigestAlgorithm::Sha256,
            Some(alg) => DigestAlgorithm::from_oid(&alg.oid).ok_or_else(|| {
                Error::UnsupportedAlgorithm(format!("ESSCertIDv2 hash algorithm {}", alg.oid))
            })?,
        };
        ids.push(SigningCertId {
            digest,
            hash: first.cert_hash.as_bytes().to_vec(),
            issuer_serial: first.issuer_serial,
        });
    }

    if ids.is_empty() {
        return Err(Error::TspValidation(
            "no signing certificate attribute found, time stamp invalid.".to_string(),
        ));
    }
    Ok(ids)
}

/// An RFC 3161 time-stamp token.
///
/// When both the v1 and the v2 signing certificate attributes are present
/// each one is checked on its own against the verifying certificate.
#[derive(Debug, Clone)]
pub struct TimeStampToken {
    content_info: ContentInfo,
    signed_data: SignedData,
    signer_info: SignerInfo,
    tst_der: Vec<u8>,
    tst_info: TimeStampTokenInfo,
    cert_ids: Vec<SigningCertId>,
}

impl TimeStampToken {
    /// Decode a DER `ContentInfo` holding the token.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let content_info = ContentInfo::from_der(der)
            .map_err(|e| Error::InvalidTsp(format!("malformed token: {}", e)))?;
        Self::from_content_info(content_info)
    }

    /// Interpret a decoded `ContentInfo`.
    pub fn from_content_info(content_info: ContentInfo) -> Result<Self> {
        if content_info.content_type != oids::CMS_SIGNED_DATA {
            return Err(Error::InvalidTsp(format!(
                "expected SignedData, found content type {}",
                content_info.content_type
            )));
        }
        let signed_data: SignedData = content_info.content.decode_as()?;

        if signed_data.encap_content_info.econtent_type != oids::CT_TST_INFO {
            return Err(Error::TspValidation(
                "ContentInfo object not for a time stamp.".to_string(),
            ));
        }

        let signers: Vec<&SignerInfo> = signed_data.signer_infos.0.iter().collect();
        if signers.len() != 1 {
            return Err(Error::InvalidArgument(format!(
                "Time-stamp token signed by {} signers, but it must contain just the TSA signature.",
                signers.len()
            )));
        }
        let signer_info = signers[0].clone();

        let econtent = signed_data
            .encap_content_info
            .econtent
            .as_ref()
            .ok_or_else(|| Error::InvalidTsp("time-stamp token has no content".to_string()))?;
        let tst_der = econtent.decode_as::<OctetString>()?.into_bytes();
        let tst_info = TimeStampTokenInfo::from_der(&tst_der)?;

        let attrs = signer_info.signed_attrs.as_ref().ok_or_else(|| {
            Error::TspValidation(
                "no signing certificate attribute found, time stamp invalid.".to_string(),
            )
        })?;
        let cert_ids = signing_cert_ids(attrs)?;

        Ok(Self {
            content_info,
            signed_data,
            signer_info,
            tst_der,
            tst_info,
            cert_ids,
        })
    }

    /// The outer `ContentInfo`.
    pub fn content_info(&self) -> &ContentInfo {
        &self.content_info
    }

    /// DER encoding of the token.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.content_info.to_der()?)
    }

    /// The decoded `TSTInfo`.
    pub fn tst_info(&self) -> &TimeStampTokenInfo {
        &self.tst_info
    }

    /// The TSA's signer info.
    pub fn signer_info(&self) -> &SignerInfo {
        &self.signer_info
    }

    /// How the TSA's signer info names its certificate.
    pub fn signer_id(&self) -> &SignerIdentifier {
        &self.signer_info.sid
    }

    /// Signed attribute with the given type.
    pub fn signed_attribute(&self, oid: &ObjectIdentifier) -> Option<&Attribute> {
        self.signer_info
            .signed_attrs
            .as_ref()
            .and_then(|attrs| attrs.iter().find(|a| a.oid == *oid))
    }

    /// Certificates embedded in the token.
    pub fn certificates(&self) -> Result<Vec<X509Certificate>> {
        let mut certs = Vec::new();
        if let Some(set) = &self.signed_data.certificates {
            for choice in set.0.iter() {
                if let CertificateChoices::Certificate(cert) = choice {
                    certs.push(X509Certificate::from_certificate(cert.clone())?);
                }
            }
        }
        Ok(certs)
    }

    /// Check that `cert` is the TSA certificate named by the token, that it
    /// was usable at the generation time and that it produced the signature.
    pub fn validate(&self, cert: &X509Certificate) -> Result<()> {
        for id in &self.cert_ids {
            let hash = id.digest.digest(cert.encoded());
            if !constant_time_eq(&id.hash, &hash) {
                return Err(Error::TspValidation(
                    "certificate hash does not match certID hash.".to_string(),
                ));
            }

            if let Some(issuer_serial) = &id.issuer_serial {
                if issuer_serial.serial_number != *cert.serial() {
                    return Err(Error::TspValidation(
                        "certificate serial number does not match certID for signature."
                            .to_string(),
                    ));
                }
                let found = issuer_serial.issuer.iter().any(|name| match name {
                    GeneralName::DirectoryName(name) => X500Name::new(name.clone())
                        .map(|n| &n == cert.issuer())
                        .unwrap_or(false),
                    _ => false,
                });
                if !found {
                    return Err(Error::TspValidation(
                        "certificate name does not match certID for signature.".to_string(),
                    ));
                }
            }
        }

        validate_tsa_certificate(cert)?;

        match cert.check_validity(self.tst_info.gen_time()) {
            Ok(()) => {},
            Err(Error::CertificateExpired(_)) => {
                return Err(Error::TspValidation("certificate expired.".to_string()))
            },
            Err(Error::CertificateNotYetValid(_)) => {
                return Err(Error::TspValidation("certificate not yet valid.".to_string()))
            },
            Err(e) => return Err(e),
        }

        if let Err(e) = self.verify_signer(cert) {
            debug!("time-stamp signature check failed: {}", e);
            return Err(Error::TspValidation(
                "signature not created by certificate.".to_string(),
            ));
        }
        Ok(())
    }

    fn verify_signer(&self, cert: &X509Certificate) -> Result<()> {
        let si = &self.signer_info;
        let digest = DigestAlgorithm::from_oid(&si.digest_alg.oid).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("digest algorithm {}", si.digest_alg.oid))
        })?;
        let attrs = si
            .signed_attrs
            .as_ref()
            .ok_or(Error::SignatureInvalid)?;

        let content_type: ObjectIdentifier = attribute_value(attrs, &oids::ATTR_CONTENT_TYPE)
            .ok_or(Error::SignatureInvalid)?
            .decode_as()?;
        if content_type != oids::CT_TST_INFO {
            return Err(Error::SignatureInvalid);
        }

        let message_digest: OctetString = attribute_value(attrs, &oids::ATTR_MESSAGE_DIGEST)
            .ok_or(Error::SignatureInvalid)?
            .decode_as()?;
        if !constant_time_eq(message_digest.as_bytes(), &digest.digest(&self.tst_der)) {
            return Err(Error::SignatureInvalid);
        }

        let signed = attrs.to_der()?;
        let signature = si.signature.as_bytes();
        if si.signature_algorithm.oid == oids::RSA_ENCRYPTION {
            verify_signature_with_digest(cert.public_key(), digest, &digest.digest(&signed), signature)
        } else {
            verify_signature(cert.public_key(), &si.signature_algorithm, &signed, signature)
        }
    }
}
