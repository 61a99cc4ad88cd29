//! Cooperating verifiers collecting positive evidence about a certificate.
//!
//! Each [`Verifier`] looks at one kind of evidence and returns the witnesses
//! it found. A [`VerifierChain`] runs its verifiers in order and concatenates
//! their witnesses. An empty result is not a failure by itself; errors are
//! reserved for evidence against the certificate.

mod certificate;
mod crl;
mod root_store;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::cert::X509Certificate;
use crate::error::Result;

pub use certificate::CertificateVerifier;
pub use crl::CrlVerifier;
pub use root_store::RootStoreVerifier;

/// Positive verification witness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOk {
    /// Subject of the verified certificate.
    pub subject: String,
    /// Name of the verifier that produced the witness.
    pub verifier: &'static str,
    /// What was established.
    pub message: String,
}

impl VerificationOk {
    /// Witness for `cert`.
    pub fn new(cert: &X509Certificate, verifier: &'static str, message: impl Into<String>) -> Self {
        Self {
            subject: cert.subject().to_string(),
            verifier,
            message: message.into(),
        }
    }
}

impl fmt::Display for VerificationOk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} verified with {}: {}", self.subject, self.verifier, self.message)
    }
}

/// One source of evidence.
pub trait Verifier {
    /// Check `sign_cert`, issued by `issuer_cert` (or self-issued when
    /// `None`), as of `sign_date`.
    fn verify(
        &self,
        sign_cert: &X509Certificate,
        issuer_cert: Option<&X509Certificate>,
        sign_date: DateTime<Utc>,
    ) -> Result<Vec<VerificationOk>>;
}

/// Ordered list of verifiers.
#[derive(Default)]
pub struct VerifierChain {
    verifiers: Vec<Box<dyn Verifier>>,
}

impl VerifierChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a verifier.
    pub fn with(mut self, verifier: impl Verifier + 'static) -> Self {
        self.verifiers.push(Box::new(verifier));
        self
    }

    /// Append a boxed verifier.
    pub fn push(&mut self, verifier: Box<dyn Verifier>) {
        self.verifiers.push(verifier);
    }

    /// Number of verifiers.
    pub fn len(&self) -> usize {
        self.verifiers.len()
    }

    /// True when the chain has no verifiers.
    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }

    /// Verify every certificate of `chain` (target first) against its successor.
    pub fn verify_chain(
        &self,
        chain: &[X509Certificate],
        sign_date: DateTime<Utc>,
    ) -> Result<Vec<VerificationOk>> {
        let mut result = Vec::new();
        for (i, cert) in chain.iter().enumerate() {
            result.extend(self.verify(cert, chain.get(i + 1), sign_date)?);
        }
        Ok(result)
    }
}

impl Verifier for VerifierChain {
    fn verify(
        &self,
        sign_cert: &X509Certificate,
        issuer_cert: Option<&X509Certificate>,
        sign_date: DateTime<Utc>,
    ) -> Result<Vec<VerificationOk>> {
        let mut result = Vec::new();
        for verifier in &self.verifiers {
            result.extend(verifier.verify(sign_cert, issuer_cert, sign_date)?);
        }
        Ok(result)
    }
}

impl fmt::Debug for VerifierChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierChain")
            .field("verifiers", &self.verifiers.len())
            .finish()
    }
}
