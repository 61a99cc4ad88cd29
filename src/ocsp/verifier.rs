//! Revocation evidence from OCSP responses.

use chrono::{DateTime, Duration, Utc};
use log::{debug, trace};

use super::client::OcspClient;
use super::response::{BasicOcspResp, CertificateStatus};
use crate::cert::X509Certificate;
use crate::config::VerificationConfig;
use crate::error::{Error, Result};
use crate::oids;
use crate::verification::{VerificationOk, Verifier};

/// Matches a certificate against supplied (or fetched) OCSP responses.
pub struct OcspVerifier {
    responses: Vec<BasicOcspResp>,
    root_store: Vec<X509Certificate>,
    online_checking_allowed: bool,
    grace_period: Duration,
    client: Option<OcspClient>,
}

impl OcspVerifier {
    /// Verifier over pre-supplied responses, offline.
    pub fn new(responses: Vec<BasicOcspResp>) -> Self {
        Self::from_config(responses, &VerificationConfig::default())
    }

    /// Verifier taking the online flag and grace period from `config`.
    pub fn from_config(responses: Vec<BasicOcspResp>, config: &VerificationConfig) -> Self {
        Self {
            responses,
            root_store: Vec::new(),
            online_checking_allowed: config.online_checking_allowed,
            grace_period: config.ocsp_grace_period,
            client: None,
        }
    }

    /// Trusted certificates that may sign responses or responder certificates.
    pub fn with_root_store(mut self, root_store: Vec<X509Certificate>) -> Self {
        self.root_store = root_store;
        self
    }

    /// Client used when online checking is allowed.
    pub fn with_client(mut self, client: OcspClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Allow or forbid fetching a response.
    pub fn with_online_checking(mut self, allowed: bool) -> Self {
        self.online_checking_allowed = allowed;
        self
    }

    /// True when `ocsp` holds a good, fresh entry for `sign_cert`.
    ///
    /// Entries for other certificates, stale entries and non-good statuses
    /// are skipped. A matching good entry whose signer cannot be traced to
    /// the issuer or the root store is an error.
    pub fn verify_response(
        &self,
        ocsp: &BasicOcspResp,
        sign_cert: &X509Certificate,
        issuer_cert: Option<&X509Certificate>,
        sign_date: DateTime<Utc>,
    ) -> Result<bool> {
        let issuer = issuer_cert.unwrap_or(sign_cert);
        for single in ocsp.responses() {
            let id = single.cert_id();
            if id.serial_number() != sign_cert.serial() {
                continue;
            }
            match id.matches_issuer(issuer) {
                Ok(true) => {},
                Ok(false) => {
                    trace!("OCSP entry issuer hash does not match {}", issuer.subject());
                    continue;
                },
                Err(e) => {
                    debug!("skipping OCSP entry: {}", e);
                    continue;
                },
            }

            let deadline = single
                .next_update()
                .unwrap_or_else(|| single.this_update() + self.grace_period);
            if sign_date > deadline {
                debug!("OCSP entry for {} is stale at {}", sign_cert.subject(), sign_date);
                continue;
            }

            if *single.status() == CertificateStatus::Good {
                self.check_responder(ocsp, issuer)?;
                return Ok(true);
            }
            debug!("OCSP status for {}: {:?}", sign_cert.subject(), single.status());
        }
        Ok(false)
    }

    /// Establish that `ocsp` was signed by the issuer, by an authorised
    /// responder the issuer or a trusted certificate signed, or by a
    /// trusted certificate.
    fn check_responder(&self, ocsp: &BasicOcspResp, issuer: &X509Certificate) -> Result<()> {
        if ocsp.is_signed_by(issuer) {
            return Ok(());
        }

        for responder in ocsp.certs() {
            if !ocsp.is_signed_by(&responder) {
                continue;
            }
            if !responder.has_extended_key_usage(&oids::KP_OCSP_SIGNING) {
                debug!("responder {} lacks id-kp-OCSPSigning", responder.subject());
                continue;
            }
            let trusted = responder.verify_by(issuer).is_ok()
                || self
                    .root_store
                    .iter()
                    .any(|anchor| responder.verify_by(anchor).is_ok());
            if trusted && responder.is_valid_at(ocsp.produced_at()) {
                return Ok(());
            }
        }

        if self.root_store.iter().any(|anchor| ocsp.is_signed_by(anchor)) {
            return Ok(());
        }
        Err(Error::OcspResponderNotTrusted)
    }
}

impl Verifier for OcspVerifier {
    fn verify(
        &self,
        sign_cert: &X509Certificate,
        issuer_cert: Option<&X509Certificate>,
        sign_date: DateTime<Utc>,
    ) -> Result<Vec<VerificationOk>> {
        let mut valid = 0;
        for ocsp in &self.responses {
            if self.verify_response(ocsp, sign_cert, issuer_cert, sign_date)? {
                valid += 1;
            }
        }

        let mut online = false;
        if valid == 0 && self.online_checking_allowed {
            if let Some(client) = &self.client {
                let issuer = issuer_cert.unwrap_or(sign_cert);
                if let Some(ocsp) = client.get_basic_ocsp_response(sign_cert, issuer) {
                    if self.verify_response(&ocsp, sign_cert, issuer_cert, sign_date)? {
                        valid += 1;
                        online = true;
                    }
                }
            }
        }

        if valid == 0 {
            return Ok(Vec::new());
        }
        let message = format!(
            "Valid OCSPs Found: {}{}",
            valid,
            if online { " (online)" } else { "" }
        );
        Ok(vec![VerificationOk::new(sign_cert, "OcspVerifier", message)])
    }
}

impl std::fmt::Debug for OcspVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcspVerifier")
            .field("responses", &self.responses.len())
            .field("root_store", &self.root_store.len())
            .field("online_checking_allowed", &self.online_checking_allowed)
            .field("grace_period", &self.grace_period)
            .finish()
    }
}
