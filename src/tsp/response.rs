//! Time-stamp responses and their match against the originating request.

use der::{Decode, Encode};

use super::asn1::{PkiStatusInfo, TimeStampResp};
use super::failure::{PkiFailureInfo, PkiStatus};
use super::request::TimeStampRequest;
use super::token::TimeStampToken;
use crate::error::{Error, Result};
use crate::oids;
use crate::util::constant_time_eq;

/// A parsed `TimeStampResp`.
#[derive(Debug, Clone)]
pub struct TimeStampResponse {
    inner: TimeStampResp,
    token: Option<TimeStampToken>,
}

impl TimeStampResponse {
    /// Decode a DER `TimeStampResp`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = TimeStampResp::from_der(der)
            .map_err(|e| Error::InvalidTsp(format!("malformed response: {}", e)))?;
        Self::from_asn1(inner)
    }

    /// Wrap a decoded structure, parsing the token if present.
    pub fn from_asn1(inner: TimeStampResp) -> Result<Self> {
        let token = match &inner.time_stamp_token {
            Some(ci) => Some(TimeStampToken::from_content_info(ci.clone())?),
            None => None,
        };
        Ok(Self { inner, token })
    }

    /// A granted response carrying `token`.
    pub fn granted(token: TimeStampToken) -> Self {
        Self {
            inner: TimeStampResp {
                status: PkiStatusInfo {
                    status: PkiStatus::Granted as u8,
                    status_string: Some(vec!["Operation Okay".to_string()]),
                    fail_info: None,
                },
                time_stamp_token: Some(token.content_info().clone()),
            },
            token: Some(token),
        }
    }

    /// A rejection carrying `failure` and `message`.
    pub fn rejection(failure: PkiFailureInfo, message: impl Into<String>) -> Self {
        Self {
            inner: TimeStampResp {
                status: PkiStatusInfo {
                    status: PkiStatus::Rejection as u8,
                    status_string: Some(vec![message.into()]),
                    fail_info: failure.to_bit_string().ok(),
                },
                time_stamp_token: None,
            },
            token: None,
        }
    }

    /// The underlying structure.
    pub fn as_asn1(&self) -> &TimeStampResp {
        &self.inner
    }

    /// DER encoding.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    /// Raw status value.
    pub fn status(&self) -> u8 {
        self.inner.status.status
    }

    /// Status as a known `PKIStatus`.
    pub fn pki_status(&self) -> Option<PkiStatus> {
        PkiStatus::from_u8(self.status())
    }

    /// First status text, if any.
    pub fn status_string(&self) -> Option<&str> {
        self.inner
            .status
            .status_string
            .as_ref()
            .and_then(|s| s.first())
            .map(String::as_str)
    }

    /// Failure bits, if reported.
    pub fn failure_info(&self) -> Option<PkiFailureInfo> {
        self.inner
            .status
            .fail_info
            .as_ref()
            .and_then(|bits| PkiFailureInfo::from_bit_string(bits).ok())
    }

    /// The token, present on success.
    pub fn time_stamp_token(&self) -> Option<&TimeStampToken> {
        self.token.as_ref()
    }

    /// Check the response answers `request`: nonce, imprint and policy must
    /// match, and a token must be present exactly when the status grants one.
    pub fn validate(&self, request: &TimeStampRequest) -> Result<()> {
        let granted = self.pki_status().map(|s| s.is_granted()).unwrap_or(false);
        let token = match &self.token {
            Some(token) => token,
            None if granted => {
                return Err(Error::TspValidation(
                    "no time stamp token found and one expected.".to_string(),
                ))
            },
            None => return Ok(()),
        };
        let info = token.tst_info();

        if let Some(nonce) = request.nonce() {
            if info.nonce() != Some(nonce) {
                return Err(Error::TspValidation(
                    "response contains wrong nonce value.".to_string(),
                ));
            }
        }

        if !granted {
            return Err(Error::TspValidation(
                "time stamp token found in failed request.".to_string(),
            ));
        }

        if !constant_time_eq(request.message_imprint_digest(), info.message_imprint_digest()) {
            return Err(Error::TspValidation(
                "response for different message imprint digest.".to_string(),
            ));
        }

        if info.message_imprint_alg_oid() != request.message_imprint_alg_oid() {
            return Err(Error::TspValidation(
                "response for different message imprint algorithm.".to_string(),
            ));
        }

        if token.signed_attribute(&oids::ATTR_SIGNING_CERTIFICATE).is_none()
            && token
                .signed_attribute(&oids::ATTR_SIGNING_CERTIFICATE_V2)
                .is_none()
        {
            return Err(Error::TspValidation(
                "no signing certificate attribute present.".to_string(),
            ));
        }

        if let Some(policy) = request.req_policy() {
            if policy != info.policy() {
                return Err(Error::TspValidation("TSA policy wrong for request.".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsp::TimeStampRequestGenerator;

    #[test]
    fn test_rejection_round_trip() {
        let resp = TimeStampResponse::rejection(
            PkiFailureInfo::BAD_ALG,
            "request contains unknown algorithm",
        );
        let decoded = TimeStampResponse::from_der(&resp.to_der().unwrap()).unwrap();
        assert_eq!(decoded.pki_status(), Some(PkiStatus::Rejection));
        assert_eq!(decoded.failure_info(), Some(PkiFailureInfo::BAD_ALG));
        assert_eq!(
            decoded.status_string(),
            Some("request contains unknown algorithm")
        );
        assert!(decoded.time_stamp_token().is_none());
    }

    #[test]
    fn test_validate_rejection_without_token() {
        let req = TimeStampRequestGenerator::new()
            .generate(oids::SHA256, &[0u8; 32], None)
            .unwrap();
        let resp = TimeStampResponse::rejection(PkiFailureInfo::SYSTEM_FAILURE, "down");
        resp.validate(&req).unwrap();
    }

    #[test]
    fn test_validate_granted_without_token() {
        let req = TimeStampRequestGenerator::new()
            .generate(oids::SHA256, &[0u8; 32], None)
            .unwrap();
        let resp = TimeStampResponse {
            inner: TimeStampResp {
                status: PkiStatusInfo {
                    status: 0,
                    status_string: None,
                    fail_info: None,
                },
                time_stamp_token: None,
            },
            token: None,
        };
        match resp.validate(&req) {
            Err(Error::TspValidation(msg)) => assert!(msg.contains("no time stamp token")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
