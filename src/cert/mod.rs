//! X.509 certificates, CRLs and distinguished names.

mod certificate;
mod crl;
pub mod name;
mod verification;

pub use certificate::X509Certificate;
pub use crl::X509Crl;
pub use name::X500Name;
pub use verification::{
    is_supported_critical_extension, verify_certificate, verify_certificates, CertificateProblem,
    CertificateVerificationError, SUPPORTED_CRITICAL_EXTENSIONS,
};
