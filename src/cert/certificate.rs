//! Parsed X.509 certificates.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use der::asn1::ObjectIdentifier;
use der::{Decode, Encode};
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    AuthorityInfoAccessSyntax, BasicConstraints, ExtendedKeyUsage, KeyUsage, NameConstraints,
};
use x509_cert::ext::Extension;
use x509_cert::serial_number::SerialNumber;
use x509_cert::Certificate;

use super::name::X500Name;
use crate::error::{Error, Result};
use crate::oids;
use crate::signatures::verify_signature;
use crate::util::time_to_date_time;

/// A certificate decoded once, keeping its DER bytes and converted fields.
///
/// Equality and hashing use the DER encoding.
#[derive(Clone)]
pub struct X509Certificate {
    inner: Certificate,
    encoded: Vec<u8>,
    subject: X500Name,
    issuer: X500Name,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl X509Certificate {
    /// Decode a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = Certificate::from_der(der)
            .map_err(|e| Error::InvalidCertificate(format!("cannot decode certificate: {}", e)))?;
        Self::build(inner, der.to_vec())
    }

    /// Wrap an already decoded certificate.
    pub fn from_certificate(inner: Certificate) -> Result<Self> {
        let encoded = inner.to_der()?;
        Self::build(inner, encoded)
    }

    fn build(inner: Certificate, encoded: Vec<u8>) -> Result<Self> {
        let tbs = &inner.tbs_certificate;
        let subject = X500Name::new(tbs.subject.clone())?;
        let issuer = X500Name::new(tbs.issuer.clone())?;
        let not_before = time_to_date_time(&tbs.validity.not_before)?;
        let not_after = time_to_date_time(&tbs.validity.not_after)?;
        Ok(Self {
            inner,
            encoded,
            subject,
            issuer,
            not_before,
            not_after,
        })
    }

    /// The decoded structure.
    pub fn certificate(&self) -> &Certificate {
        &self.inner
    }

    /// DER encoding.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Subject distinguished name.
    pub fn subject(&self) -> &X500Name {
        &self.subject
    }

    /// Issuer distinguished name.
    pub fn issuer(&self) -> &X500Name {
        &self.issuer
    }

    /// Serial number.
    pub fn serial(&self) -> &SerialNumber {
        &self.inner.tbs_certificate.serial_number
    }

    /// Start of the validity window.
    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// End of the validity window.
    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Check that `at` lies inside the validity window.
    pub fn check_validity(&self, at: DateTime<Utc>) -> Result<()> {
        if at > self.not_after {
            return Err(Error::CertificateExpired(self.not_after));
        }
        if at < self.not_before {
            return Err(Error::CertificateNotYetValid(self.not_before));
        }
        Ok(())
    }

    /// True when `at` lies inside the validity window.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.check_validity(at).is_ok()
    }

    /// All extensions, in encoding order.
    pub fn extensions(&self) -> &[Extension] {
        self.inner
            .tbs_certificate
            .extensions
            .as_deref()
            .unwrap_or(&[])
    }

    /// The extension with `oid`, if present.
    pub fn extension(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.extensions().iter().find(|e| e.extn_id == *oid)
    }

    /// Raw DER value of the extension with `oid`.
    pub fn extension_value(&self, oid: &ObjectIdentifier) -> Option<&[u8]> {
        self.extension(oid).map(|e| e.extn_value.as_bytes())
    }

    /// OIDs of every extension marked critical.
    pub fn critical_extension_oids(&self) -> Vec<ObjectIdentifier> {
        self.extensions()
            .iter()
            .filter(|e| e.critical)
            .map(|e| e.extn_id)
            .collect()
    }

    fn decode_extension<T>(&self, oid: &ObjectIdentifier) -> Result<Option<T>>
    where
        T: for<'a> Decode<'a>,
    {
        match self.extension_value(oid) {
            Some(value) => T::from_der(value).map(Some).map_err(|e| {
                Error::InvalidCertificate(format!("malformed extension {}: {}", oid, e))
            }),
            None => Ok(None),
        }
    }

    /// Basic constraints, if present.
    pub fn basic_constraints(&self) -> Result<Option<BasicConstraints>> {
        self.decode_extension(&oids::BASIC_CONSTRAINTS)
    }

    /// Key usage, if present.
    pub fn key_usage(&self) -> Result<Option<KeyUsage>> {
        self.decode_extension(&oids::KEY_USAGE)
    }

    /// Extended key usage, if present.
    pub fn extended_key_usage(&self) -> Result<Option<ExtendedKeyUsage>> {
        self.decode_extension(&oids::EXTENDED_KEY_USAGE)
    }

    /// Name constraints, if present.
    pub fn name_constraints(&self) -> Result<Option<NameConstraints>> {
        self.decode_extension(&oids::NAME_CONSTRAINTS)
    }

    /// True when basic constraints mark this certificate as a CA.
    pub fn is_ca(&self) -> bool {
        matches!(self.basic_constraints(), Ok(Some(bc)) if bc.ca)
    }

    /// True when the EKU extension lists `purpose`.
    pub fn has_extended_key_usage(&self, purpose: &ObjectIdentifier) -> bool {
        matches!(self.extended_key_usage(), Ok(Some(eku)) if eku.0.contains(purpose))
    }

    /// First OCSP responder URL from the authority information access extension.
    pub fn ocsp_url(&self) -> Option<String> {
        let aia: AuthorityInfoAccessSyntax =
            self.decode_extension(&oids::AUTHORITY_INFO_ACCESS).ok()??;
        aia.0
            .iter()
            .filter(|ad| ad.access_method == oids::AD_OCSP)
            .find_map(|ad| match &ad.access_location {
                GeneralName::UniformResourceIdentifier(uri) => Some(uri.to_string()),
                _ => None,
            })
    }

    /// True when subject and issuer are the same name.
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    /// Subject public key.
    pub fn public_key(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    /// Verify this certificate's signature with `issuer_key`.
    pub fn verify(&self, issuer_key: &SubjectPublicKeyInfoOwned) -> Result<()> {
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            Error::InvalidCertificate("signature has unused bits".to_string())
        })?;
        verify_signature(issuer_key, &self.inner.signature_algorithm, &tbs, signature)
    }

    /// Verify this certificate against a candidate issuer certificate.
    pub fn verify_by(&self, issuer: &X509Certificate) -> Result<()> {
        self.verify(issuer.public_key())
    }
}

impl PartialEq for X509Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for X509Certificate {}

impl Hash for X509Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl fmt::Debug for X509Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X509Certificate")
            .field("subject", &self.subject.to_string())
            .field("issuer", &self.issuer.to_string())
            .field("serial", &hex::encode(self.serial().as_bytes()))
            .finish()
    }
}

impl fmt::Display for X509Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subject)
    }
}
