//! Certification path validation.
//!
//! The path is processed from the certificate issued by the trust anchor
//! down to the target, carrying the working public key, the working issuer
//! name, the remaining path length and the accumulated name constraints.

use chrono::{DateTime, Utc};
use log::{debug, trace};
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::ext::pkix::constraints::name::GeneralSubtree;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::NameConstraints;

use super::parameters::PkixParameters;
use super::path::CertificatePath;
use super::trust_anchor::{find_trust_anchor, TrustAnchor};
use crate::cert::{is_supported_critical_extension, X500Name, X509Certificate};
use crate::error::{Error, Result};

/// Outcome of a successful validation.
#[derive(Debug, Clone)]
pub struct PkixCertPathValidatorResult {
    /// Anchor the path chains to.
    pub trust_anchor: TrustAnchor,
    /// Public key of the target certificate.
    pub subject_public_key: SubjectPublicKeyInfoOwned,
}

/// Directory name subtrees accumulated along the path.
#[derive(Debug, Clone, Default)]
pub(crate) struct NameConstraintState {
    // every set must contain a base the name lies within
    permitted: Vec<Vec<X500Name>>,
    excluded: Vec<X500Name>,
}

fn directory_names(subtrees: &[GeneralSubtree]) -> Result<Vec<X500Name>> {
    let mut names = Vec::new();
    for subtree in subtrees {
        if let GeneralName::DirectoryName(name) = &subtree.base {
            names.push(X500Name::new(name.clone())?);
        }
    }
    Ok(names)
}

impl NameConstraintState {
    pub(crate) fn add(&mut self, constraints: &NameConstraints) -> Result<()> {
        if let Some(permitted) = &constraints.permitted_subtrees {
            let names = directory_names(permitted)?;
            if !names.is_empty() {
                self.permitted.push(names);
            }
        }
        if let Some(excluded) = &constraints.excluded_subtrees {
            self.excluded.extend(directory_names(excluded)?);
        }
        Ok(())
    }

    pub(crate) fn check(&self, subject: &X500Name) -> std::result::Result<(), String> {
        if subject.is_empty() {
            return Ok(());
        }
        for permitted in &self.permitted {
            if !permitted.iter().any(|base| subject.is_within(base)) {
                return Err(format!(
                    "Subject distinguished name is not from a permitted subtree: {}",
                    subject
                ));
            }
        }
        if let Some(base) = self.excluded.iter().find(|base| subject.is_within(base)) {
            return Err(format!(
                "Subject distinguished name is from an excluded subtree: {} ({})",
                subject, base
            ));
        }
        Ok(())
    }
}

/// Validates certification paths against [`PkixParameters`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PkixCertPathValidator;

impl PkixCertPathValidator {
    /// Create a validator.
    pub fn new() -> Self {
        Self
    }

    /// Validate `path`, returning the anchor it chains to.
    ///
    /// Errors name the index of the offending certificate.
    pub fn validate(
        &self,
        path: &CertificatePath,
        params: &PkixParameters,
    ) -> Result<PkixCertPathValidatorResult> {
        let n = path.len();
        let top = path
            .top()
            .ok_or_else(|| Error::path(0, "Certification path is empty."))?;
        let anchor = find_trust_anchor(top, params.trust_anchors())
            .ok_or_else(|| Error::path(n - 1, "Trust anchor for certification path not found."))?;
        self.validate_from_anchor(path, params, anchor)
    }

    /// Validate `path` whose top certificate is already known to be signed
    /// by `anchor`; that signature is not checked again.
    pub(crate) fn validate_from_anchor(
        &self,
        path: &CertificatePath,
        params: &PkixParameters,
        anchor: &TrustAnchor,
    ) -> Result<PkixCertPathValidatorResult> {
        let n = path.len();
        if n == 0 {
            return Err(Error::path(0, "Certification path is empty."));
        }

        let date = params.validity_date();
        let mut working_key = anchor.public_key().clone();
        let mut working_issuer = anchor.name().clone();
        let mut max_path_length = n;
        let mut constraints = NameConstraintState::default();
        if let Some(anchor_constraints) = anchor.name_constraints() {
            constraints.add(anchor_constraints)?;
        }

        for index in (0..n).rev() {
            let cert = &path[index];
            trace!("validating {} at index {}", cert.subject(), index);

            let signer = if index + 1 == n { None } else { Some(&working_key) };
            self.check_basic(cert, index, signer, &working_issuer, date)?;
            if params.is_revocation_enabled() {
                check_crls(cert, index, &working_key, date, params)?;
            }

            if !cert.is_self_issued() || index == 0 {
                constraints
                    .check(cert.subject())
                    .map_err(|reason| Error::path(index, reason))?;
            }

            for oid in cert.critical_extension_oids() {
                if !is_supported_critical_extension(cert, &oid)
                    && !params.accepts_critical_extension(&oid)
                {
                    return Err(Error::path(
                        index,
                        format!("Certificate has unsupported critical extension: {}", oid),
                    ));
                }
            }

            if index == 0 {
                break;
            }
            self.prepare_next(cert, index, &mut max_path_length, &mut constraints)?;
            working_key = cert.public_key().clone();
            working_issuer = cert.subject().clone();
        }

        let subject_public_key = path
            .target()
            .map(|c| c.public_key().clone())
            .ok_or_else(|| Error::path(0, "Certification path is empty."))?;
        debug!("certification path of length {} validated", n);
        Ok(PkixCertPathValidatorResult {
            trust_anchor: anchor.clone(),
            subject_public_key,
        })
    }

    fn check_basic(
        &self,
        cert: &X509Certificate,
        index: usize,
        working_key: Option<&SubjectPublicKeyInfoOwned>,
        working_issuer: &X500Name,
        date: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(key) = working_key {
            cert.verify(key)
                .map_err(|_| Error::path(index, "Could not validate certificate signature."))?;
        }
        cert.check_validity(date).map_err(|e| {
            Error::path(index, format!("Could not validate certificate: {}", e))
        })?;
        if cert.issuer() != working_issuer {
            return Err(Error::path(
                index,
                format!(
                    "IssuerName({}) does not match SubjectName({}) of signing certificate.",
                    cert.issuer(),
                    working_issuer
                ),
            ));
        }
        Ok(())
    }

    fn prepare_next(
        &self,
        cert: &X509Certificate,
        index: usize,
        max_path_length: &mut usize,
        constraints: &mut NameConstraintState,
    ) -> Result<()> {
        let invalid = |e: Error| Error::path(index, format!("Could not decode extension: {}", e));

        if let Some(nc) = cert.name_constraints().map_err(invalid)? {
            constraints.add(&nc)?;
        }

        let basic = cert.basic_constraints().map_err(invalid)?;
        if !basic.as_ref().map(|bc| bc.ca).unwrap_or(false) {
            return Err(Error::path(index, "Not a CA certificate"));
        }

        if !cert.is_self_issued() {
            if *max_path_length == 0 {
                return Err(Error::path(index, "Max path length not greater than zero"));
            }
            *max_path_length -= 1;
        }
        if let Some(limit) = basic.and_then(|bc| bc.path_len_constraint) {
            *max_path_length = (*max_path_length).min(limit as usize);
        }

        if let Some(usage) = cert.key_usage().map_err(invalid)? {
            if !usage.key_cert_sign() {
                return Err(Error::path(
                    index,
                    "Issuer certificate keyusage extension is critical and does not permit key signing.",
                ));
            }
        }
        Ok(())
    }
}

/// Reject `cert` when a CRL issued under `working_key` lists it as revoked at `date`.
///
/// CRLs that are not yet issued at `date` or whose signature does not verify
/// are ignored.
fn check_crls(
    cert: &X509Certificate,
    index: usize,
    working_key: &SubjectPublicKeyInfoOwned,
    date: DateTime<Utc>,
    params: &PkixParameters,
) -> Result<()> {
    for store in params.stores() {
        for crl in store.crls_for_issuer(cert.issuer()) {
            if crl.this_update() > date {
                continue;
            }
            if crl.verify(working_key).is_err() {
                debug!("ignoring CRL from {} with bad signature", crl.issuer());
                continue;
            }
            if let Some(revoked_at) = crl.revocation_date(cert.serial()) {
                if revoked_at <= date {
                    return Err(Error::path(
                        index,
                        format!("Certificate revocation after {}, reason: revoked", revoked_at),
                    ));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::asn1::Ia5String;

    fn subtree(name: &str) -> GeneralSubtree {
        GeneralSubtree {
            base: GeneralName::DirectoryName(X500Name::parse(name).unwrap().as_name().clone()),
            minimum: 0,
            maximum: None,
        }
    }

    #[test]
    fn test_permitted_subtree() {
        let mut state = NameConstraintState::default();
        state
            .add(&NameConstraints {
                permitted_subtrees: Some(vec![subtree("O=Acme,C=US")]),
                excluded_subtrees: None,
            })
            .unwrap();

        let inside = X500Name::parse("CN=Alice,OU=Sales,O=Acme,C=US").unwrap();
        let outside = X500Name::parse("CN=Mallory,O=Evil,C=US").unwrap();
        assert!(state.check(&inside).is_ok());
        assert!(state.check(&outside).is_err());
    }

    #[test]
    fn test_permitted_sets_intersect() {
        let mut state = NameConstraintState::default();
        state
            .add(&NameConstraints {
                permitted_subtrees: Some(vec![subtree("C=US")]),
                excluded_subtrees: None,
            })
            .unwrap();
        state
            .add(&NameConstraints {
                permitted_subtrees: Some(vec![subtree("O=Acme,C=US")]),
                excluded_subtrees: None,
            })
            .unwrap();

        assert!(state.check(&X500Name::parse("CN=Bob,O=Acme,C=US").unwrap()).is_ok());
        assert!(state.check(&X500Name::parse("CN=Bob,O=Other,C=US").unwrap()).is_err());
    }

    #[test]
    fn test_excluded_subtree() {
        let mut state = NameConstraintState::default();
        state
            .add(&NameConstraints {
                permitted_subtrees: None,
                excluded_subtrees: Some(vec![subtree("OU=Revoked,O=Acme,C=US")]),
            })
            .unwrap();

        let err = state
            .check(&X500Name::parse("CN=Eve,OU=Revoked,O=Acme,C=US").unwrap())
            .unwrap_err();
        assert!(err.contains("excluded"));
        assert!(state.check(&X500Name::parse("CN=Eve,O=Acme,C=US").unwrap()).is_ok());
    }

    #[test]
    fn test_non_directory_subtrees_ignored() {
        let uri = GeneralSubtree {
            base: GeneralName::UniformResourceIdentifier(
                Ia5String::new("http://example.com").unwrap(),
            ),
            minimum: 0,
            maximum: None,
        };
        let mut state = NameConstraintState::default();
        state
            .add(&NameConstraints {
                permitted_subtrees: Some(vec![uri]),
                excluded_subtrees: None,
            })
            .unwrap();
        assert!(state.check(&X500Name::parse("CN=Anyone").unwrap()).is_ok());
    }

    #[test]
    fn test_empty_subject_always_passes() {
        let mut state = NameConstraintState::default();
        state
            .add(&NameConstraints {
                permitted_subtrees: Some(vec![subtree("C=US")]),
                excluded_subtrees: None,
            })
            .unwrap();
        let empty = X500Name::new(Default::default()).unwrap();
        assert!(state.check(&empty).is_ok());
    }

    #[test]
    fn test_empty_path_rejected() {
        let anchor = TrustAnchor::new(
            X500Name::parse("CN=Root").unwrap(),
            SubjectPublicKeyInfoOwned {
                algorithm: spki::AlgorithmIdentifierOwned {
                    oid: crate::oids::RSA_ENCRYPTION,
                    parameters: None,
                },
                subject_public_key: der::asn1::BitString::from_bytes(&[0]).unwrap(),
            },
        );
        let params = PkixParameters::new(vec![anchor]).unwrap();
        let err = PkixCertPathValidator::new()
            .validate(&CertificatePath::default(), &params)
            .unwrap_err();
        assert!(matches!(err, Error::PathValidation { index: 0, .. }));
    }
}
