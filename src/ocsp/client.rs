//! Fetching OCSP responses over HTTP.

use der::Encode;
use log::{debug, warn};

use super::asn1::OcspResponseStatus;
use super::request::{generate_nonce, CertificateId, OcspRequestBuilder};
use super::response::{BasicOcspResp, OcspResp};
use crate::cert::X509Certificate;
use crate::config::VerificationConfig;
use crate::error::{Error, Result};

/// Content type of OCSP request bodies.
pub const OCSP_REQUEST_CONTENT_TYPE: &str = "application/ocsp-request";
/// Accepted content type of OCSP responses.
pub const OCSP_RESPONSE_CONTENT_TYPE: &str = "application/ocsp-response";

/// Status and body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
}

/// Blocking "send bytes, receive bytes" transport.
pub trait HttpTransport {
    /// POST `body` to `url`.
    fn post(&self, url: &str, content_type: &str, accept: &str, body: &[u8])
        -> Result<HttpResponse>;
}

/// Transport over a blocking reqwest client.
#[cfg(feature = "online")]
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "online")]
impl ReqwestTransport {
    /// Transport with a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport over a preconfigured client (timeouts, proxies).
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "online")]
impl HttpTransport for ReqwestTransport {
    fn post(
        &self,
        url: &str,
        content_type: &str,
        accept: &str,
        body: &[u8],
    ) -> Result<HttpResponse> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::ACCEPT, accept)
            .body(body.to_vec())
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| Error::Transport(e.to_string()))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// OCSP client: builds a SHA-1 request with a nonce and posts it.
pub struct OcspClient {
    transport: Box<dyn HttpTransport>,
    url: Option<String>,
    nonce_length: usize,
}

impl OcspClient {
    /// Client over `transport`, URLs taken from certificates.
    pub fn new(transport: Box<dyn HttpTransport>) -> Self {
        Self {
            transport,
            url: None,
            nonce_length: 16,
        }
    }

    /// Client honouring the URL override and nonce length from `config`.
    pub fn from_config(transport: Box<dyn HttpTransport>, config: &VerificationConfig) -> Self {
        Self {
            transport,
            url: config.ocsp_url.clone(),
            nonce_length: config.nonce_length,
        }
    }

    /// Always query `url`.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    fn responder_url(&self, cert: &X509Certificate) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }
        cert.ocsp_url().ok_or_else(|| {
            Error::InvalidArgument(format!("no OCSP URL for certificate {}", cert.subject()))
        })
    }

    /// Query the responder and parse the outer response.
    ///
    /// Non-200 statuses are errors.
    pub fn fetch(&self, cert: &X509Certificate, issuer: &X509Certificate) -> Result<OcspResp> {
        let url = self.responder_url(cert)?;
        let request = OcspRequestBuilder::new()
            .add_request(CertificateId::for_certificate(cert, issuer)?)
            .with_nonce(generate_nonce(self.nonce_length))
            .build()?;
        let body = request.to_der()?;

        debug!("posting OCSP request for {} to {}", cert.subject(), url);
        let response = self.transport.post(
            &url,
            OCSP_REQUEST_CONTENT_TYPE,
            OCSP_RESPONSE_CONTENT_TYPE,
            &body,
        )?;
        if response.status != 200 {
            return Err(Error::HttpStatus(response.status));
        }
        OcspResp::from_der(&response.body)
    }

    /// DER of the basic response for `cert`.
    pub fn get_encoded(&self, cert: &X509Certificate, issuer: &X509Certificate) -> Result<Vec<u8>> {
        let response = self.fetch(cert, issuer)?;
        if response.status() != OcspResponseStatus::Successful {
            return Err(Error::InvalidOcsp(format!(
                "invalid status: {:?}",
                response.status()
            )));
        }
        let basic = response
            .basic()?
            .ok_or_else(|| Error::InvalidOcsp("response has no body".to_string()))?;
        Ok(basic.encoded().to_vec())
    }

    /// Basic response for `cert`, or `None` on any failure.
    pub fn get_basic_ocsp_response(
        &self,
        cert: &X509Certificate,
        issuer: &X509Certificate,
    ) -> Option<BasicOcspResp> {
        let response = match self.fetch(cert, issuer) {
            Ok(response) => response,
            Err(e) => {
                warn!("OCSP fetch for {} failed: {}", cert.subject(), e);
                return None;
            },
        };
        if response.status() != OcspResponseStatus::Successful {
            warn!("OCSP responder answered {:?}", response.status());
            return None;
        }
        match response.basic() {
            Ok(basic) => basic,
            Err(e) => {
                warn!("unparsable OCSP response: {}", e);
                None
            },
        }
    }
}

impl std::fmt::Debug for OcspClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcspClient")
            .field("url", &self.url)
            .field("nonce_length", &self.nonce_length)
            .finish_non_exhaustive()
    }
}
