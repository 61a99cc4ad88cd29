//! Quick certificate and chain checks used before full path validation.
//!
//! Problems are returned as values so callers can collect every reason a
//! chain is unacceptable instead of stopping at the first.

use std::fmt;

use chrono::{DateTime, Utc};
use der::asn1::ObjectIdentifier;

use super::certificate::X509Certificate;
use super::crl::X509Crl;
use crate::oids;

/// Critical extensions understood without further configuration.
pub const SUPPORTED_CRITICAL_EXTENSIONS: [ObjectIdentifier; 11] = [
    oids::KEY_USAGE,
    oids::CERTIFICATE_POLICIES,
    oids::POLICY_MAPPINGS,
    oids::INHIBIT_ANY_POLICY,
    oids::CRL_DISTRIBUTION_POINTS,
    oids::ISSUING_DISTRIBUTION_POINT,
    oids::DELTA_CRL_INDICATOR,
    oids::POLICY_CONSTRAINTS,
    oids::BASIC_CONSTRAINTS,
    oids::SUBJECT_ALT_NAME,
    oids::NAME_CONSTRAINTS,
];

/// True when the critical extension `oid` on `cert` is acceptable.
///
/// Extended key usage is only accepted as critical when it contains
/// time-stamping.
pub fn is_supported_critical_extension(cert: &X509Certificate, oid: &ObjectIdentifier) -> bool {
    if SUPPORTED_CRITICAL_EXTENSIONS.contains(oid) {
        return true;
    }
    *oid == oids::EXTENDED_KEY_USAGE && cert.has_extended_key_usage(&oids::KP_TIME_STAMPING)
}

/// Why a single certificate, or a chain, was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateProblem {
    /// A critical extension outside the supported set.
    UnsupportedCriticalExtension,
    /// The reference instant is outside the validity window.
    ExpiredOrNotYetValid,
    /// A supplied CRL lists the certificate.
    Revoked,
    /// No trusted certificate or chain member signed the certificate.
    CannotBeVerified,
    /// No certificate reached a trusted one and none was rejected either.
    ///
    /// This does not prove a cycle exists: a chain whose members all sign
    /// each other but never reach a trusted certificate ends up here too.
    PossibleCircularChain,
}

impl CertificateProblem {
    /// Human-readable description.
    pub fn message(&self) -> &'static str {
        match self {
            CertificateProblem::UnsupportedCriticalExtension => "Has unsupported critical extension",
            CertificateProblem::ExpiredOrNotYetValid => {
                "The certificate has expired or is not yet valid"
            },
            CertificateProblem::Revoked => "Certificate revoked",
            CertificateProblem::CannotBeVerified => {
                "Cannot be verified against the KeyStore or the certificate chain"
            },
            CertificateProblem::PossibleCircularChain => {
                "Invalid state. Possible circular certificate chain"
            },
        }
    }
}

impl fmt::Display for CertificateProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A problem tied to the certificate it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateVerificationError {
    /// The offending certificate; `None` for chain-level problems.
    pub certificate: Option<X509Certificate>,
    /// What went wrong.
    pub problem: CertificateProblem,
}

impl CertificateVerificationError {
    fn new(certificate: Option<&X509Certificate>, problem: CertificateProblem) -> Self {
        Self {
            certificate: certificate.cloned(),
            problem,
        }
    }
}

impl fmt::Display for CertificateVerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.certificate {
            Some(cert) => write!(f, "Certificate {} failed: {}", cert.subject(), self.problem),
            None => write!(f, "Certificate Unknown failed: {}", self.problem),
        }
    }
}

impl std::error::Error for CertificateVerificationError {}

/// Check one certificate: critical extensions, validity at `at`, and
/// revocation by any of `crls`. Returns the first problem found.
pub fn verify_certificate(
    cert: &X509Certificate,
    crls: &[X509Crl],
    at: DateTime<Utc>,
) -> Option<CertificateProblem> {
    for oid in cert.critical_extension_oids() {
        if !is_supported_critical_extension(cert, &oid) {
            log::debug!("{}: unsupported critical extension {}", cert.subject(), oid);
            return Some(CertificateProblem::UnsupportedCriticalExtension);
        }
    }
    if !cert.is_valid_at(at) {
        return Some(CertificateProblem::ExpiredOrNotYetValid);
    }
    if crls.iter().any(|crl| crl.is_revoked(cert)) {
        return Some(CertificateProblem::Revoked);
    }
    None
}

/// Check a chain, leaf first, against trusted certificates.
///
/// Each certificate is checked on its own, then against the trusted set:
/// the first certificate signed by a valid trusted certificate ends the
/// walk and the problems gathered so far are returned. Otherwise the
/// certificate must be signed by another chain member. When nothing was
/// recorded and nothing reached a trusted certificate the result is a
/// single [`CertificateProblem::PossibleCircularChain`].
pub fn verify_certificates(
    certs: &[X509Certificate],
    trusted: &[X509Certificate],
    crls: &[X509Crl],
    at: DateTime<Utc>,
) -> Vec<CertificateVerificationError> {
    let mut result = Vec::new();

    for (k, cert) in certs.iter().enumerate() {
        if let Some(problem) = verify_certificate(cert, crls, at) {
            result.push(CertificateVerificationError::new(Some(cert), problem));
        }

        for anchor in trusted {
            if verify_certificate(anchor, crls, at).is_some() {
                continue;
            }
            if cert.verify_by(anchor).is_ok() {
                log::debug!("{} verified against trusted {}", cert.subject(), anchor.subject());
                return result;
            }
        }

        let chained = certs
            .iter()
            .enumerate()
            .any(|(j, next)| j != k && cert.verify_by(next).is_ok());
        if !chained {
            result.push(CertificateVerificationError::new(
                Some(cert),
                CertificateProblem::CannotBeVerified,
            ));
        }
    }

    if result.is_empty() {
        result.push(CertificateVerificationError::new(
            None,
            CertificateProblem::PossibleCircularChain,
        ));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_messages() {
        assert_eq!(
            CertificateProblem::ExpiredOrNotYetValid.to_string(),
            "The certificate has expired or is not yet valid"
        );
        assert_eq!(CertificateProblem::Revoked.message(), "Certificate revoked");
        let err = CertificateVerificationError::new(None, CertificateProblem::PossibleCircularChain);
        assert_eq!(
            err.to_string(),
            "Certificate Unknown failed: Invalid state. Possible circular certificate chain"
        );
    }

    #[test]
    fn test_empty_chain_reports_circular_state() {
        let result = verify_certificates(&[], &[], &[], Utc::now());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].problem, CertificateProblem::PossibleCircularChain);
        assert!(result[0].certificate.is_none());
    }
}
