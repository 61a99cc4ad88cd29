//! In-memory certificate and CRL stores.

use chrono::{DateTime, Utc};
use x509_cert::serial_number::SerialNumber;

use crate::cert::{X500Name, X509Certificate, X509Crl};

/// Criteria a certificate must meet; unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct X509CertStoreSelector {
    /// Exact certificate.
    pub certificate: Option<X509Certificate>,
    /// Subject name.
    pub subject: Option<X500Name>,
    /// Issuer name.
    pub issuer: Option<X500Name>,
    /// Serial number.
    pub serial_number: Option<SerialNumber>,
    /// Instant the certificate must be valid at.
    pub valid_at: Option<DateTime<Utc>>,
}

impl X509CertStoreSelector {
    /// Selector matching everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector for one certificate.
    pub fn for_certificate(cert: &X509Certificate) -> Self {
        Self {
            certificate: Some(cert.clone()),
            ..Self::default()
        }
    }

    /// Require a subject.
    pub fn with_subject(mut self, subject: X500Name) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Require an issuer.
    pub fn with_issuer(mut self, issuer: X500Name) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// Require a serial number.
    pub fn with_serial_number(mut self, serial: SerialNumber) -> Self {
        self.serial_number = Some(serial);
        self
    }

    /// Require validity at `at`.
    pub fn with_valid_at(mut self, at: DateTime<Utc>) -> Self {
        self.valid_at = Some(at);
        self
    }

    /// True when `cert` meets every criterion set.
    pub fn matches(&self, cert: &X509Certificate) -> bool {
        if let Some(expected) = &self.certificate {
            if expected != cert {
                return false;
            }
        }
        if let Some(subject) = &self.subject {
            if subject != cert.subject() {
                return false;
            }
        }
        if let Some(issuer) = &self.issuer {
            if issuer != cert.issuer() {
                return false;
            }
        }
        if let Some(serial) = &self.serial_number {
            if serial != cert.serial() {
                return false;
            }
        }
        if let Some(at) = self.valid_at {
            if !cert.is_valid_at(at) {
                return false;
            }
        }
        true
    }
}

/// A collection of certificates and CRLs searched during path building.
#[derive(Debug, Clone, Default)]
pub struct CertStore {
    certificates: Vec<X509Certificate>,
    crls: Vec<X509Crl>,
}

impl CertStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store over the given certificates and CRLs.
    pub fn from_parts(certificates: Vec<X509Certificate>, crls: Vec<X509Crl>) -> Self {
        Self { certificates, crls }
    }

    /// Add a certificate; duplicates are ignored.
    pub fn add_certificate(&mut self, cert: X509Certificate) {
        if !self.certificates.contains(&cert) {
            self.certificates.push(cert);
        }
    }

    /// Add a CRL; duplicates are ignored.
    pub fn add_crl(&mut self, crl: X509Crl) {
        if !self.crls.contains(&crl) {
            self.crls.push(crl);
        }
    }

    /// Certificates matching `selector`, in insertion order.
    pub fn certificates<'a>(
        &'a self,
        selector: &'a X509CertStoreSelector,
    ) -> impl Iterator<Item = &'a X509Certificate> + 'a {
        self.certificates.iter().filter(move |c| selector.matches(c))
    }

    /// Every certificate.
    pub fn all_certificates(&self) -> &[X509Certificate] {
        &self.certificates
    }

    /// CRLs issued by `issuer`.
    pub fn crls_for_issuer<'a>(
        &'a self,
        issuer: &'a X500Name,
    ) -> impl Iterator<Item = &'a X509Crl> + 'a {
        self.crls.iter().filter(move |crl| crl.issuer() == issuer)
    }

    /// Every CRL.
    pub fn all_crls(&self) -> &[X509Crl] {
        &self.crls
    }
}
