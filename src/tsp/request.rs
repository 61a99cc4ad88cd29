//! Time-stamp requests and their acceptance checks.

use der::asn1::{Any, ObjectIdentifier, OctetString, Uint};
use der::{Decode, Encode};
use spki::AlgorithmIdentifierOwned;
use x509_cert::ext::Extension;

use super::asn1::{MessageImprint, TimeStampReq, TspVersion};
use super::failure::PkiFailureInfo;
use crate::digests;
use crate::error::{Error, Result};

/// A parsed `TimeStampReq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeStampRequest {
    inner: TimeStampReq,
}

impl TimeStampRequest {
    /// Decode a DER `TimeStampReq`.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = TimeStampReq::from_der(der)
            .map_err(|e| Error::InvalidTsp(format!("malformed request: {}", e)))?;
        Ok(Self { inner })
    }

    /// Wrap a decoded structure.
    pub fn from_asn1(inner: TimeStampReq) -> Self {
        Self { inner }
    }

    /// The underlying structure.
    pub fn as_asn1(&self) -> &TimeStampReq {
        &self.inner
    }

    /// DER encoding.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.inner.to_der()?)
    }

    /// Request syntax version, always 1.
    pub fn version(&self) -> u8 {
        self.inner.version as u8
    }

    /// Hash algorithm of the message imprint.
    pub fn message_imprint_alg_oid(&self) -> &ObjectIdentifier {
        &self.inner.message_imprint.hash_algorithm.oid
    }

    /// Hash value of the message imprint.
    pub fn message_imprint_digest(&self) -> &[u8] {
        self.inner.message_imprint.hashed_message.as_bytes()
    }

    /// Policy the requester asked for.
    pub fn req_policy(&self) -> Option<&ObjectIdentifier> {
        self.inner.req_policy.as_ref()
    }

    /// Requester nonce as unsigned big-endian bytes.
    pub fn nonce(&self) -> Option<&[u8]> {
        self.inner.nonce.as_ref().map(|n| n.as_bytes())
    }

    /// Whether the TSA should include its certificate in the token.
    pub fn cert_req(&self) -> bool {
        self.inner.cert_req
    }

    /// Request extensions, empty when absent.
    pub fn extensions(&self) -> &[Extension] {
        self.inner.extensions.as_deref().unwrap_or(&[])
    }

    /// Extension with the given OID.
    pub fn extension(&self, oid: &ObjectIdentifier) -> Option<&Extension> {
        self.extensions().iter().find(|e| e.extn_id == *oid)
    }

    /// OIDs of the extensions marked critical.
    pub fn critical_extension_oids(&self) -> Vec<ObjectIdentifier> {
        self.extensions()
            .iter()
            .filter(|e| e.critical)
            .map(|e| e.extn_id)
            .collect()
    }

    /// OIDs of the extensions not marked critical.
    pub fn non_critical_extension_oids(&self) -> Vec<ObjectIdentifier> {
        self.extensions()
            .iter()
            .filter(|e| !e.critical)
            .map(|e| e.extn_id)
            .collect()
    }

    /// Check the request against what a TSA is willing to serve.
    ///
    /// `accepted_policies` and `accepted_extensions` are only enforced when
    /// given. Only critical extensions are checked. Failures carry the
    /// `PKIFailureInfo` bit a response should report.
    pub fn validate(
        &self,
        accepted_algorithms: &[ObjectIdentifier],
        accepted_policies: Option<&[ObjectIdentifier]>,
        accepted_extensions: Option<&[ObjectIdentifier]>,
    ) -> Result<()> {
        let alg = self.message_imprint_alg_oid();
        if !accepted_algorithms.contains(alg) {
            return Err(Error::tsp(
                PkiFailureInfo::BAD_ALG,
                "request contains unknown algorithm",
            ));
        }

        if let (Some(policies), Some(policy)) = (accepted_policies, self.req_policy()) {
            if !policies.contains(policy) {
                return Err(Error::tsp(
                    PkiFailureInfo::UNACCEPTED_POLICY,
                    "request contains unknown policy",
                ));
            }
        }

        if let Some(accepted) = accepted_extensions {
            if self
                .critical_extension_oids()
                .iter()
                .any(|oid| !accepted.contains(oid))
            {
                return Err(Error::tsp(
                    PkiFailureInfo::UNACCEPTED_EXTENSION,
                    "request contains unknown extension",
                ));
            }
        }

        let expected = digests::digest_length(alg).ok_or_else(|| {
            Error::tsp(PkiFailureInfo::BAD_ALG, "request contains unknown algorithm")
        })?;
        if expected != self.message_imprint_digest().len() {
            return Err(Error::tsp(
                PkiFailureInfo::BAD_DATA_FORMAT,
                "imprint digest the wrong length",
            ));
        }
        Ok(())
    }
}

/// Builds `TimeStampReq` structures.
#[derive(Debug, Clone, Default)]
pub struct TimeStampRequestGenerator {
    req_policy: Option<ObjectIdentifier>,
    cert_req: bool,
    extensions: Vec<Extension>,
}

impl TimeStampRequestGenerator {
    /// Generator with no policy, no extensions and `certReq` false.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a specific TSA policy.
    pub fn with_req_policy(mut self, policy: ObjectIdentifier) -> Self {
        self.req_policy = Some(policy);
        self
    }

    /// Ask the TSA to include its certificate.
    pub fn with_cert_req(mut self, cert_req: bool) -> Self {
        self.cert_req = cert_req;
        self
    }

    /// Add an extension; `value` is the DER of the extension value.
    pub fn with_extension(
        mut self,
        oid: ObjectIdentifier,
        critical: bool,
        value: &[u8],
    ) -> Result<Self> {
        self.extensions.push(Extension {
            extn_id: oid,
            critical,
            extn_value: OctetString::new(value)?,
        });
        Ok(self)
    }

    /// Build a request for a precomputed digest.
    pub fn generate(
        &self,
        digest_algorithm: ObjectIdentifier,
        digest: &[u8],
        nonce: Option<&[u8]>,
    ) -> Result<TimeStampRequest> {
        let nonce = match nonce {
            Some(n) => Some(Uint::new(n)?),
            None => None,
        };
        let extensions = if self.extensions.is_empty() {
            None
        } else {
            Some(self.extensions.clone())
        };
        Ok(TimeStampRequest {
            inner: TimeStampReq {
                version: TspVersion::V1,
                message_imprint: MessageImprint {
                    hash_algorithm: AlgorithmIdentifierOwned {
                        oid: digest_algorithm,
                        parameters: Some(Any::null()),
                    },
                    hashed_message: OctetString::new(digest)?,
                },
                req_policy: self.req_policy,
                nonce,
                cert_req: self.cert_req,
                extensions,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digests::DigestAlgorithm;
    use crate::oids;

    const POLICY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.3.4.5");
    const OTHER_POLICY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.3.4.6");
    const EXT: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.3.9");

    fn failure_of(result: Result<()>) -> PkiFailureInfo {
        match result {
            Err(Error::Tsp { failure, .. }) => failure,
            other => panic!("expected TSP rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_and_decode() {
        let digest = DigestAlgorithm::Sha256.digest(b"hello");
        let req = TimeStampRequestGenerator::new()
            .with_cert_req(true)
            .with_req_policy(POLICY)
            .generate(oids::SHA256, &digest, Some(&[0x00, 0x7f, 0x01]))
            .unwrap();
        let decoded = TimeStampRequest::from_der(&req.to_der().unwrap()).unwrap();
        assert_eq!(decoded, req);
        assert_eq!(decoded.version(), 1);
        assert!(decoded.cert_req());
        assert_eq!(decoded.req_policy(), Some(&POLICY));
        assert_eq!(decoded.message_imprint_digest(), &digest[..]);
        // leading zero is not part of the value
        assert_eq!(decoded.nonce(), Some(&[0x7f, 0x01][..]));
    }

    #[test]
    fn test_validate_accepts() {
        let req = TimeStampRequestGenerator::new()
            .generate(oids::SHA1, &[0u8; 20], None)
            .unwrap();
        req.validate(&[oids::SHA1, oids::SHA256], None, None).unwrap();
    }

    #[test]
    fn test_validate_unknown_algorithm() {
        let req = TimeStampRequestGenerator::new()
            .generate(oids::MD5, &[0u8; 16], None)
            .unwrap();
        assert_eq!(
            failure_of(req.validate(&[oids::SHA256], None, None)),
            PkiFailureInfo::BAD_ALG
        );
    }

    #[test]
    fn test_validate_policy() {
        let req = TimeStampRequestGenerator::new()
            .with_req_policy(OTHER_POLICY)
            .generate(oids::SHA256, &[0u8; 32], None)
            .unwrap();
        req.validate(&[oids::SHA256], None, None).unwrap();
        assert_eq!(
            failure_of(req.validate(&[oids::SHA256], Some(&[POLICY]), None)),
            PkiFailureInfo::UNACCEPTED_POLICY
        );
    }

    #[test]
    fn test_validate_critical_extension_only() {
        let non_critical = TimeStampRequestGenerator::new()
            .with_extension(EXT, false, &[0x05, 0x00])
            .unwrap()
            .generate(oids::SHA256, &[0u8; 32], None)
            .unwrap();
        non_critical.validate(&[oids::SHA256], None, Some(&[])).unwrap();

        let critical = TimeStampRequestGenerator::new()
            .with_extension(EXT, true, &[0x05, 0x00])
            .unwrap()
            .generate(oids::SHA256, &[0u8; 32], None)
            .unwrap();
        assert_eq!(critical.critical_extension_oids(), vec![EXT]);
        assert_eq!(
            failure_of(critical.validate(&[oids::SHA256], None, Some(&[]))),
            PkiFailureInfo::UNACCEPTED_EXTENSION
        );
        critical.validate(&[oids::SHA256], None, Some(&[EXT])).unwrap();
    }

    #[test]
    fn test_validate_digest_length() {
        let req = TimeStampRequestGenerator::new()
            .generate(oids::SHA256, &[0u8; 20], None)
            .unwrap();
        assert_eq!(
            failure_of(req.validate(&[oids::SHA256], None, None)),
            PkiFailureInfo::BAD_DATA_FORMAT
        );
    }
}
