use chrono::{DateTime, Utc};
use log::debug;

use super::{VerificationOk, Verifier};
use crate::cert::{X509Certificate, X509Crl};
use crate::error::{Error, Result};

/// Checks the certificate against supplied CRLs.
///
/// A CRL counts when it was issued by the certificate's issuer, is still
/// current at the signing date and its signature verifies under the issuer
/// or a trusted certificate.
#[derive(Debug, Clone, Default)]
pub struct CrlVerifier {
    crls: Vec<X509Crl>,
    root_store: Vec<X509Certificate>,
}

impl CrlVerifier {
    /// Verifier over `crls`.
    pub fn new(crls: Vec<X509Crl>) -> Self {
        Self {
            crls,
            root_store: Vec::new(),
        }
    }

    /// Also accept CRLs signed by these trusted certificates.
    pub fn with_root_store(mut self, root_store: Vec<X509Certificate>) -> Self {
        self.root_store = root_store;
        self
    }

    fn is_signature_valid(&self, crl: &X509Crl, issuer: Option<&X509Certificate>) -> bool {
        if let Some(issuer) = issuer {
            if crl.verify(issuer.public_key()).is_ok() {
                return true;
            }
        }
        self.root_store
            .iter()
            .any(|anchor| crl.verify(anchor.public_key()).is_ok())
    }

    /// True when `crl` is usable for `sign_cert`; an error when it lists it.
    pub fn verify_crl(
        &self,
        crl: &X509Crl,
        sign_cert: &X509Certificate,
        issuer_cert: Option<&X509Certificate>,
        sign_date: DateTime<Utc>,
    ) -> Result<bool> {
        if crl.issuer() != sign_cert.issuer() {
            return Ok(false);
        }
        if crl.next_update().is_some_and(|next| sign_date >= next) {
            debug!("CRL from {} expired before {}", crl.issuer(), sign_date);
            return Ok(false);
        }
        if !self.is_signature_valid(crl, issuer_cert) {
            debug!("CRL from {} has no verifiable signature", crl.issuer());
            return Ok(false);
        }
        if let Some(revoked_at) = crl.revocation_date(sign_cert.serial()) {
            if revoked_at <= sign_date {
                return Err(Error::CertificateRevoked(Some(revoked_at)));
            }
        }
        Ok(true)
    }
}

impl Verifier for CrlVerifier {
    fn verify(
        &self,
        sign_cert: &X509Certificate,
        issuer_cert: Option<&X509Certificate>,
        sign_date: DateTime<Utc>,
    ) -> Result<Vec<VerificationOk>> {
        let mut valid = 0;
        for crl in &self.crls {
            if self.verify_crl(crl, sign_cert, issuer_cert, sign_date)? {
                valid += 1;
            }
        }
        if valid == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![VerificationOk::new(
            sign_cert,
            "CrlVerifier",
            format!("Valid CRLs found: {}", valid),
        )])
    }
}
