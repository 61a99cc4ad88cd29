//! Time-Stamp Protocol (RFC 3161).
//!
//! Clients build a [`TimeStampRequest`], a TSA answers it with
//! [`TimeStampResponseGenerator::generate`], and the client checks the
//! answer with [`TimeStampResponse::validate`] followed by
//! [`TimeStampToken::validate`] against the TSA certificate.
//!
//! ## Example
//!
//! ```ignore
//! use pdf_oxide_pki::digests::DigestAlgorithm;
//! use pdf_oxide_pki::oids;
//! use pdf_oxide_pki::tsp::TimeStampRequestGenerator;
//!
//! let digest = DigestAlgorithm::Sha256.digest(b"document bytes");
//! let request = TimeStampRequestGenerator::new()
//!     .with_cert_req(true)
//!     .generate(oids::SHA256, &digest, Some(&nonce))?;
//! let response = TimeStampResponse::from_der(&http_body)?;
//! response.validate(&request)?;
//! ```

pub mod asn1;
mod failure;
mod generator;
mod request;
mod response;
mod token;

pub use failure::{PkiFailureInfo, PkiStatus};
pub use generator::{TimeStampResponseGenerator, TimeStampTokenGenerator};
pub use request::{TimeStampRequest, TimeStampRequestGenerator};
pub use response::TimeStampResponse;
pub use token::{validate_tsa_certificate, TimeStampToken, TimeStampTokenInfo};
