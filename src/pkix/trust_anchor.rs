//! Trust anchors.

use spki::SubjectPublicKeyInfoOwned;
use x509_cert::ext::pkix::NameConstraints;

use crate::cert::{X500Name, X509Certificate};

/// A trusted certificate, or a trusted name and public key pair.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    certificate: Option<X509Certificate>,
    name: X500Name,
    public_key: SubjectPublicKeyInfoOwned,
    name_constraints: Option<NameConstraints>,
}

impl TrustAnchor {
    /// Anchor on a trusted certificate.
    pub fn from_certificate(certificate: X509Certificate) -> Self {
        Self {
            name: certificate.subject().clone(),
            public_key: certificate.public_key().clone(),
            certificate: Some(certificate),
            name_constraints: None,
        }
    }

    /// Anchor on a name and public key.
    pub fn new(name: X500Name, public_key: SubjectPublicKeyInfoOwned) -> Self {
        Self {
            certificate: None,
            name,
            public_key,
            name_constraints: None,
        }
    }

    /// Restrict every path through this anchor by `constraints`.
    pub fn with_name_constraints(mut self, constraints: NameConstraints) -> Self {
        self.name_constraints = Some(constraints);
        self
    }

    /// The trusted certificate, for certificate anchors.
    pub fn certificate(&self) -> Option<&X509Certificate> {
        self.certificate.as_ref()
    }

    /// Subject name of the anchor.
    pub fn name(&self) -> &X500Name {
        &self.name
    }

    /// Trusted public key.
    pub fn public_key(&self) -> &SubjectPublicKeyInfoOwned {
        &self.public_key
    }

    /// Initial name constraints.
    pub fn name_constraints(&self) -> Option<&NameConstraints> {
        self.name_constraints.as_ref()
    }

    /// True when `cert` names this anchor as issuer and its signature verifies.
    pub fn is_issuer_of(&self, cert: &X509Certificate) -> bool {
        cert.issuer() == &self.name && cert.verify(&self.public_key).is_ok()
    }
}

/// First anchor that issued and signed `cert`.
pub fn find_trust_anchor<'a>(
    cert: &X509Certificate,
    anchors: &'a [TrustAnchor],
) -> Option<&'a TrustAnchor> {
    anchors.iter().find(|anchor| anchor.is_issuer_of(cert))
}
