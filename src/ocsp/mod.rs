//! Online Certificate Status Protocol (RFC 6960).
//!
//! Requests identify certificates by SHA-1 hashes of the issuer's name and
//! key. Responses are checked for freshness and for a signer that can be
//! traced to the issuer or a trusted certificate.

pub mod asn1;
mod client;
mod request;
mod response;
mod verifier;

#[cfg(feature = "online")]
pub use client::ReqwestTransport;
pub use client::{
    HttpResponse, HttpTransport, OcspClient, OCSP_REQUEST_CONTENT_TYPE,
    OCSP_RESPONSE_CONTENT_TYPE,
};
pub use request::{generate_nonce, request_nonce, CertificateId, OcspRequestBuilder};
pub use response::{
    BasicOcspResp, BasicOcspRespBuilder, CertificateStatus, OcspResp, ResponderIdKind, SingleResp,
};
pub use verifier::OcspVerifier;
