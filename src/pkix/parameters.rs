//! Inputs to path validation and path building.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use der::asn1::ObjectIdentifier;

use super::store::{CertStore, X509CertStoreSelector};
use super::trust_anchor::TrustAnchor;
use crate::cert::X509Certificate;
use crate::config::VerificationConfig;
use crate::error::{Error, Result};

/// Parameters for validating a certification path.
#[derive(Debug, Clone)]
pub struct PkixParameters {
    trust_anchors: Vec<TrustAnchor>,
    stores: Vec<CertStore>,
    date: Option<DateTime<Utc>>,
    revocation_enabled: bool,
    additional_critical_extensions: HashSet<ObjectIdentifier>,
}

impl PkixParameters {
    /// Parameters over a non-empty set of trust anchors.
    pub fn new(trust_anchors: Vec<TrustAnchor>) -> Result<Self> {
        if trust_anchors.is_empty() {
            return Err(Error::InvalidArgument(
                "the trustAnchors parameter must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            trust_anchors,
            stores: Vec::new(),
            date: None,
            revocation_enabled: true,
            additional_critical_extensions: HashSet::new(),
        })
    }

    /// Add a certificate/CRL store.
    pub fn with_store(mut self, store: CertStore) -> Self {
        self.stores.push(store);
        self
    }

    /// Validate at `date` instead of now.
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Turn CRL checking on or off.
    pub fn with_revocation(mut self, enabled: bool) -> Self {
        self.revocation_enabled = enabled;
        self
    }

    /// Accept `oid` as a critical extension.
    pub fn with_critical_extension(mut self, oid: ObjectIdentifier) -> Self {
        self.additional_critical_extensions.insert(oid);
        self
    }

    /// Trusted anchors.
    pub fn trust_anchors(&self) -> &[TrustAnchor] {
        &self.trust_anchors
    }

    /// Stores searched for issuers and CRLs.
    pub fn stores(&self) -> &[CertStore] {
        &self.stores
    }

    /// Fixed validation date, if any.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    /// The validation instant: the fixed date or the current time.
    pub fn validity_date(&self) -> DateTime<Utc> {
        self.date.unwrap_or_else(Utc::now)
    }

    /// Whether CRLs are checked.
    pub fn is_revocation_enabled(&self) -> bool {
        self.revocation_enabled
    }

    /// True when `oid` was registered as an additional critical extension.
    pub fn accepts_critical_extension(&self, oid: &ObjectIdentifier) -> bool {
        self.additional_critical_extensions.contains(oid)
    }
}

/// Parameters for building a path to a selected target certificate.
#[derive(Debug, Clone)]
pub struct PkixBuilderParameters {
    base: PkixParameters,
    target: X509CertStoreSelector,
    max_path_length: Option<usize>,
    excluded_certificates: Vec<X509Certificate>,
}

impl PkixBuilderParameters {
    /// Build towards certificates matching `target`.
    pub fn new(trust_anchors: Vec<TrustAnchor>, target: X509CertStoreSelector) -> Result<Self> {
        Ok(Self {
            base: PkixParameters::new(trust_anchors)?,
            target,
            max_path_length: Some(5),
            excluded_certificates: Vec::new(),
        })
    }

    /// Builder parameters taking path length and revocation settings from `config`.
    pub fn from_config(
        trust_anchors: Vec<TrustAnchor>,
        target: X509CertStoreSelector,
        config: &VerificationConfig,
    ) -> Result<Self> {
        let mut params = Self::new(trust_anchors, target)?;
        params.base.revocation_enabled = config.revocation_enabled;
        params.max_path_length = config.max_path_length;
        Ok(params)
    }

    /// Add a certificate/CRL store.
    pub fn with_store(mut self, store: CertStore) -> Self {
        self.base = self.base.with_store(store);
        self
    }

    /// Validate at `date` instead of now.
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.base = self.base.with_date(date);
        self
    }

    /// Turn CRL checking on or off.
    pub fn with_revocation(mut self, enabled: bool) -> Self {
        self.base = self.base.with_revocation(enabled);
        self
    }

    /// Limit the path length (`None` = unlimited).
    pub fn with_max_path_length(mut self, max: Option<usize>) -> Self {
        self.max_path_length = max;
        self
    }

    /// Never use `cert` in a built path.
    pub fn with_excluded_certificate(mut self, cert: X509Certificate) -> Self {
        self.excluded_certificates.push(cert);
        self
    }

    /// Validation parameters.
    pub fn parameters(&self) -> &PkixParameters {
        &self.base
    }

    /// Target selector.
    pub fn target(&self) -> &X509CertStoreSelector {
        &self.target
    }

    /// Maximum path length.
    pub fn max_path_length(&self) -> Option<usize> {
        self.max_path_length
    }

    /// True when `cert` must not appear in a built path.
    pub fn is_excluded(&self, cert: &X509Certificate) -> bool {
        self.excluded_certificates.contains(cert)
    }
}
