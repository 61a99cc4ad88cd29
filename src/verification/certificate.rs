use chrono::{DateTime, Utc};

use super::{VerificationOk, Verifier};
use crate::cert::X509Certificate;
use crate::error::Result;

/// Checks validity at the signing date and the signature by the issuer.
///
/// Produces no witness; failures are errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateVerifier;

impl CertificateVerifier {
    /// Create the verifier.
    pub fn new() -> Self {
        Self
    }
}

impl Verifier for CertificateVerifier {
    fn verify(
        &self,
        sign_cert: &X509Certificate,
        issuer_cert: Option<&X509Certificate>,
        sign_date: DateTime<Utc>,
    ) -> Result<Vec<VerificationOk>> {
        sign_cert.check_validity(sign_date)?;
        sign_cert.verify_by(issuer_cert.unwrap_or(sign_cert))?;
        Ok(Vec::new())
    }
}
