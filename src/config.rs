//! Configuration for certificate and revocation verification.

use chrono::Duration;

/// Verification configuration shared by path building and the revocation
/// verifiers.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Allow OCSP requests over the network when no supplied response matches.
    pub online_checking_allowed: bool,

    /// Freshness window applied to OCSP responses without `nextUpdate`.
    pub ocsp_grace_period: Duration,

    /// Responder URL used instead of the certificate's AIA entry.
    pub ocsp_url: Option<String>,

    /// Length in bytes of the nonce placed in OCSP requests.
    pub nonce_length: usize,

    /// Maximum number of intermediate certificates in a built path
    /// (`None` = unlimited).
    pub max_path_length: Option<usize>,

    /// Check CRLs found in the certificate stores during path validation.
    pub revocation_enabled: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationConfig {
    /// Default OCSP freshness window in seconds.
    pub const DEFAULT_OCSP_GRACE_SECONDS: i64 = 180;

    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            online_checking_allowed: false,
            ocsp_grace_period: Duration::seconds(Self::DEFAULT_OCSP_GRACE_SECONDS),
            ocsp_url: None,
            nonce_length: 16,
            max_path_length: Some(5),
            revocation_enabled: true,
        }
    }

    /// Allow or forbid online OCSP checks.
    pub fn with_online_checking(mut self, allowed: bool) -> Self {
        self.online_checking_allowed = allowed;
        self
    }

    /// Set the OCSP freshness window.
    pub fn with_ocsp_grace_period(mut self, period: Duration) -> Self {
        self.ocsp_grace_period = period;
        self
    }

    /// Override the OCSP responder URL.
    pub fn with_ocsp_url(mut self, url: impl Into<String>) -> Self {
        self.ocsp_url = Some(url.into());
        self
    }

    /// Set the OCSP nonce length.
    pub fn with_nonce_length(mut self, length: usize) -> Self {
        self.nonce_length = length;
        self
    }

    /// Limit built path length.
    pub fn with_max_path_length(mut self, max: Option<usize>) -> Self {
        self.max_path_length = max;
        self
    }

    /// Enable CRL checking during path validation.
    pub fn with_revocation(mut self, enabled: bool) -> Self {
        self.revocation_enabled = enabled;
        self
    }
}
