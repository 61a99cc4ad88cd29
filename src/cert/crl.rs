//! Parsed certificate revocation lists.

use chrono::{DateTime, Utc};
use der::{Decode, Encode};
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::crl::{CertificateList, RevokedCert};
use x509_cert::serial_number::SerialNumber;

use super::certificate::X509Certificate;
use super::name::X500Name;
use crate::error::{Error, Result};
use crate::signatures::verify_signature;
use crate::util::time_to_date_time;

/// A CRL decoded once, with its issuer and update times converted.
#[derive(Clone, Debug)]
pub struct X509Crl {
    inner: CertificateList,
    encoded: Vec<u8>,
    issuer: X500Name,
    this_update: DateTime<Utc>,
    next_update: Option<DateTime<Utc>>,
}

impl X509Crl {
    /// Decode a DER CRL.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateList::from_der(der)
            .map_err(|e| Error::InvalidCrl(format!("cannot decode CRL: {}", e)))?;
        Self::build(inner, der.to_vec())
    }

    /// Wrap an already decoded CRL.
    pub fn from_certificate_list(inner: CertificateList) -> Result<Self> {
        let encoded = inner.to_der()?;
        Self::build(inner, encoded)
    }

    fn build(inner: CertificateList, encoded: Vec<u8>) -> Result<Self> {
        let tbs = &inner.tbs_cert_list;
        let issuer = X500Name::new(tbs.issuer.clone())?;
        let this_update = time_to_date_time(&tbs.this_update)?;
        let next_update = tbs.next_update.as_ref().map(time_to_date_time).transpose()?;
        Ok(Self {
            inner,
            encoded,
            issuer,
            this_update,
            next_update,
        })
    }

    /// The decoded structure.
    pub fn certificate_list(&self) -> &CertificateList {
        &self.inner
    }

    /// DER encoding.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// CRL issuer.
    pub fn issuer(&self) -> &X500Name {
        &self.issuer
    }

    /// Issue time.
    pub fn this_update(&self) -> DateTime<Utc> {
        self.this_update
    }

    /// Time by which the next CRL is due.
    pub fn next_update(&self) -> Option<DateTime<Utc>> {
        self.next_update
    }

    /// Revoked entries.
    pub fn revoked_certificates(&self) -> &[RevokedCert] {
        self.inner
            .tbs_cert_list
            .revoked_certificates
            .as_deref()
            .unwrap_or(&[])
    }

    /// The entry for `serial`, if listed.
    pub fn revoked_entry(&self, serial: &SerialNumber) -> Option<&RevokedCert> {
        self.revoked_certificates()
            .iter()
            .find(|entry| entry.serial_number == *serial)
    }

    /// Revocation time of `serial`, if listed.
    pub fn revocation_date(&self, serial: &SerialNumber) -> Option<DateTime<Utc>> {
        self.revoked_entry(serial)
            .and_then(|entry| time_to_date_time(&entry.revocation_date).ok())
    }

    /// True when `cert` was issued by this CRL's issuer and is listed.
    pub fn is_revoked(&self, cert: &X509Certificate) -> bool {
        cert.issuer() == &self.issuer && self.revoked_entry(cert.serial()).is_some()
    }

    /// Verify the CRL signature with `issuer_key`.
    pub fn verify(&self, issuer_key: &SubjectPublicKeyInfoOwned) -> Result<()> {
        let tbs = self.inner.tbs_cert_list.to_der()?;
        let signature = self
            .inner
            .signature
            .as_bytes()
            .ok_or_else(|| Error::InvalidCrl("signature has unused bits".to_string()))?;
        verify_signature(issuer_key, &self.inner.signature_algorithm, &tbs, signature)
    }
}

impl PartialEq for X509Crl {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for X509Crl {}
