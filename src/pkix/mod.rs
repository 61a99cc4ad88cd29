//! Certification path building and validation.
//!
//! A [`PkixCertPathBuilder`] searches [`CertStore`]s for issuers of a target
//! certificate until it reaches a [`TrustAnchor`], then hands the candidate
//! path to the [`PkixCertPathValidator`]. Rejected candidates are discarded
//! and the search backtracks.

mod builder;
mod parameters;
mod path;
mod store;
mod trust_anchor;
mod validator;

pub use builder::{PkixCertPathBuilder, PkixCertPathBuilderResult};
pub use parameters::{PkixBuilderParameters, PkixParameters};
pub use path::CertificatePath;
pub use store::{CertStore, X509CertStoreSelector};
pub use trust_anchor::{find_trust_anchor, TrustAnchor};
pub use validator::{PkixCertPathValidator, PkixCertPathValidatorResult};
