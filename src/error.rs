//! Error types for trust verification and cryptographic primitives.
//!
//! Parse errors are fatal and propagate to the caller. Validation failures are
//! carried as values so that path building can backtrack. Trust failures end
//! the operation in progress. Transport failures are downgraded to "no
//! evidence" by the revocation verifiers.

use chrono::{DateTime, Utc};

use crate::tsp::PkiFailureInfo;

/// Result type alias for trust and crypto operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while verifying certificates or running primitives.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)] // "Invalid" prefix is intentional for clarity
pub enum Error {
    /// Malformed DER
    #[error("ASN.1 error: {0}")]
    Asn1(#[from] der::Error),

    /// Certificate could not be parsed or has an unexpected shape
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// CRL could not be parsed or has an unexpected shape
    #[error("Invalid CRL: {0}")]
    InvalidCrl(String),

    /// OCSP request or response could not be parsed
    #[error("Invalid OCSP structure: {0}")]
    InvalidOcsp(String),

    /// Time-stamp request, response or token could not be parsed
    #[error("Invalid time-stamp structure: {0}")]
    InvalidTsp(String),

    /// Certificate `notAfter` lies before the reference instant
    #[error("Certificate expired on {0}")]
    CertificateExpired(DateTime<Utc>),

    /// Certificate `notBefore` lies after the reference instant
    #[error("Certificate not valid till {0}")]
    CertificateNotYetValid(DateTime<Utc>),

    /// A CRL lists the certificate as revoked
    #[error("Certificate revoked{}", .0.map(|d| format!(" on {}", d)).unwrap_or_default())]
    CertificateRevoked(Option<DateTime<Utc>>),

    /// Certificate carries a critical extension nobody here understands
    #[error("Unsupported critical extension: {0}")]
    UnsupportedCriticalExtension(String),

    /// Signature did not verify under the given key
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// A certification path failed validation
    #[error("Certification path invalid at index {index}: {reason}")]
    PathValidation {
        /// Position in the path, 0 = target certificate
        index: usize,
        /// Why the certificate was rejected
        reason: String,
    },

    /// Exhaustive search found no path to a trust anchor
    #[error("No certificate chain found")]
    NoCertificateChain {
        /// Last validation error seen during the search
        #[source]
        cause: Option<Box<Error>>,
    },

    /// A good OCSP response could not be traced back to a trusted signer
    #[error("OCSP response could not be verified")]
    OcspResponderNotTrusted,

    /// Time-stamp response or token did not match the request or certificate
    #[error("Time-stamp validation failed: {0}")]
    TspValidation(String),

    /// Time-stamp request rejected with a PKIFailureInfo code
    #[error("Time-stamp request rejected ({failure}): {message}")]
    Tsp {
        /// Failure bit reported to the requester
        failure: PkiFailureInfo,
        /// Human readable status text
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Responder answered with a non-200 HTTP status
    #[error("Invalid HTTP response: {0}")]
    HttpStatus(u16),

    /// HTTP transport failed before a status was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid parameter passed to a primitive
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Buffer too short for the requested operation
    #[error("Data length error: {0}")]
    DataLength(String),

    /// Decrypted data failed a structural check (e.g. padding)
    #[error("Invalid cipher text: {0}")]
    InvalidCipherText(String),

    /// Operation called on an object in the wrong state
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// RSA key handling failed
    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    /// Algorithm OID or name has no registered implementation
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl Error {
    /// Build a TSP rejection error.
    pub fn tsp(failure: PkiFailureInfo, message: impl Into<String>) -> Self {
        Error::Tsp {
            failure,
            message: message.into(),
        }
    }

    /// Build a path validation error for the certificate at `index`.
    pub fn path(index: usize, reason: impl Into<String>) -> Self {
        Error::PathValidation {
            index,
            reason: reason.into(),
        }
    }
}
