//! Ordered certification paths.

use std::ops::Index;

use crate::cert::X509Certificate;

/// Certificates ordered from the target (index 0) towards the trust anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificatePath {
    certificates: Vec<X509Certificate>,
}

impl CertificatePath {
    /// Wrap certificates already in target-first order.
    pub fn new(certificates: Vec<X509Certificate>) -> Self {
        Self { certificates }
    }

    /// The certificates, target first.
    pub fn certificates(&self) -> &[X509Certificate] {
        &self.certificates
    }

    /// Number of certificates.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// True for an empty path.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// The certificate being validated.
    pub fn target(&self) -> Option<&X509Certificate> {
        self.certificates.first()
    }

    /// The certificate issued by the trust anchor.
    pub fn top(&self) -> Option<&X509Certificate> {
        self.certificates.last()
    }

    /// Iterate target first.
    pub fn iter(&self) -> std::slice::Iter<'_, X509Certificate> {
        self.certificates.iter()
    }

    /// Unwrap the certificates.
    pub fn into_certificates(self) -> Vec<X509Certificate> {
        self.certificates
    }
}

impl Index<usize> for CertificatePath {
    type Output = X509Certificate;

    fn index(&self, index: usize) -> &X509Certificate {
        &self.certificates[index]
    }
}

impl<'a> IntoIterator for &'a CertificatePath {
    type Item = &'a X509Certificate;
    type IntoIter = std::slice::Iter<'a, X509Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}
