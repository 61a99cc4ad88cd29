use chrono::{DateTime, Utc};
use log::trace;

use super::{VerificationOk, Verifier};
use crate::cert::X509Certificate;
use crate::error::Result;

/// Looks for a trusted certificate whose key verifies the signature.
#[derive(Debug, Clone, Default)]
pub struct RootStoreVerifier {
    root_store: Vec<X509Certificate>,
}

impl RootStoreVerifier {
    /// Verifier over `root_store`.
    pub fn new(root_store: Vec<X509Certificate>) -> Self {
        Self { root_store }
    }

    /// Trusted certificates.
    pub fn root_store(&self) -> &[X509Certificate] {
        &self.root_store
    }
}

impl Verifier for RootStoreVerifier {
    fn verify(
        &self,
        sign_cert: &X509Certificate,
        _issuer_cert: Option<&X509Certificate>,
        _sign_date: DateTime<Utc>,
    ) -> Result<Vec<VerificationOk>> {
        for anchor in &self.root_store {
            if sign_cert.verify_by(anchor).is_ok() {
                trace!("{} signed by trusted {}", sign_cert.subject(), anchor.subject());
                return Ok(vec![VerificationOk::new(
                    sign_cert,
                    "RootStoreVerifier",
                    "Certificate verified against root store.",
                )]);
            }
        }
        Ok(Vec::new())
    }
}
