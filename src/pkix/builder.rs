//! Certification path building.
//!
//! Depth-first search from each target certificate towards a trust anchor.
//! Candidate issuers come from the configured stores, in store order. The
//! first path that validates is returned; it is not necessarily the shortest.

use log::debug;
use spki::SubjectPublicKeyInfoOwned;

use super::parameters::PkixBuilderParameters;
use super::path::CertificatePath;
use super::store::X509CertStoreSelector;
use super::trust_anchor::{find_trust_anchor, TrustAnchor};
use super::validator::PkixCertPathValidator;
use crate::cert::X509Certificate;
use crate::error::{Error, Result};

/// Outcome of a successful build.
#[derive(Debug, Clone)]
pub struct PkixCertPathBuilderResult {
    /// The validated path, target first.
    pub path: CertificatePath,
    /// Anchor the path chains to.
    pub trust_anchor: TrustAnchor,
    /// Public key of the target certificate.
    pub subject_public_key: SubjectPublicKeyInfoOwned,
}

/// Builds validated certification paths.
#[derive(Debug, Default)]
pub struct PkixCertPathBuilder {
    validator: PkixCertPathValidator,
    last_error: Option<Error>,
    // anchor lookups made during the current build, keyed by certificate
    anchor_cache: Vec<(X509Certificate, Option<TrustAnchor>)>,
}

impl PkixCertPathBuilder {
    /// Create a builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path for the first target certificate that reaches an anchor.
    ///
    /// Fails with [`Error::NoCertificateChain`] carrying the last
    /// rejection seen when the search space is exhausted.
    pub fn build(&mut self, params: &PkixBuilderParameters) -> Result<PkixCertPathBuilderResult> {
        self.last_error = None;
        self.anchor_cache.clear();
        let targets = find_targets(params);
        if targets.is_empty() {
            return Err(Error::InvalidArgument(
                "No certificate found matching targetConstraints.".to_string(),
            ));
        }

        let mut path = Vec::new();
        for target in &targets {
            if let Some(result) = self.build_from(target, params, &mut path) {
                return Ok(result);
            }
        }

        Err(Error::NoCertificateChain {
            cause: self.last_error.take().map(Box::new),
        })
    }

    fn build_from(
        &mut self,
        cert: &X509Certificate,
        params: &PkixBuilderParameters,
        path: &mut Vec<X509Certificate>,
    ) -> Option<PkixCertPathBuilderResult> {
        if path.contains(cert) || params.is_excluded(cert) {
            return None;
        }
        if let Some(max) = params.max_path_length() {
            if path.len().saturating_sub(1) > max {
                return None;
            }
        }

        path.push(cert.clone());
        let result = if let Some(anchor) = self.anchor_for(cert, params) {
            self.validate(path, params, &anchor)
        } else {
            let issuers = self.find_issuers(cert, params);
            if issuers.is_empty() {
                debug!("no issuer found for {}", cert.subject());
                self.last_error = Some(Error::path(
                    path.len() - 1,
                    "No issuer certificate for certificate in certification path found.",
                ));
                None
            } else {
                issuers
                    .iter()
                    .find_map(|issuer| self.build_from(issuer, params, path))
            }
        };

        if result.is_none() {
            path.pop();
        }
        result
    }

    /// Anchor that issued and signed `cert`, looked up once per build.
    fn anchor_for(
        &mut self,
        cert: &X509Certificate,
        params: &PkixBuilderParameters,
    ) -> Option<TrustAnchor> {
        if let Some((_, anchor)) = self.anchor_cache.iter().find(|(c, _)| c == cert) {
            return anchor.clone();
        }
        let anchor = find_trust_anchor(cert, params.parameters().trust_anchors()).cloned();
        self.anchor_cache.push((cert.clone(), anchor.clone()));
        anchor
    }

    /// Store certificates whose subject is the issuer of `cert`.
    ///
    /// Self-issued candidates are skipped unless a trust anchor issued them.
    fn find_issuers(
        &mut self,
        cert: &X509Certificate,
        params: &PkixBuilderParameters,
    ) -> Vec<X509Certificate> {
        let selector = X509CertStoreSelector::new().with_subject(cert.issuer().clone());
        let mut issuers: Vec<X509Certificate> = Vec::new();
        for store in params.parameters().stores() {
            for candidate in store.certificates(&selector) {
                if candidate.is_self_issued() && self.anchor_for(candidate, params).is_none() {
                    continue;
                }
                if !issuers.contains(candidate) {
                    issuers.push(candidate.clone());
                }
            }
        }
        issuers
    }

    fn validate(
        &mut self,
        path: &[X509Certificate],
        params: &PkixBuilderParameters,
        anchor: &TrustAnchor,
    ) -> Option<PkixCertPathBuilderResult> {
        let candidate = CertificatePath::new(path.to_vec());
        match self
            .validator
            .validate_from_anchor(&candidate, params.parameters(), anchor)
        {
            Ok(validated) => Some(PkixCertPathBuilderResult {
                path: candidate,
                trust_anchor: validated.trust_anchor,
                subject_public_key: validated.subject_public_key,
            }),
            Err(e) => {
                debug!("candidate path rejected: {}", e);
                self.last_error = Some(e);
                None
            },
        }
    }
}

fn find_targets(params: &PkixBuilderParameters) -> Vec<X509Certificate> {
    let selector = params.target();
    let mut targets: Vec<X509Certificate> = Vec::new();
    for store in params.parameters().stores() {
        for cert in store.certificates(selector) {
            if !targets.contains(cert) {
                targets.push(cert.clone());
            }
        }
    }
    if let Some(cert) = &selector.certificate {
        if !targets.contains(cert) {
            targets.push(cert.clone());
        }
    }
    targets
}
