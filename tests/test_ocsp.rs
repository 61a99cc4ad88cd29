//! Integration tests for OCSP requests, responses and verification.
//!
//! Tests cover:
//! - Certificate identifiers and request building
//! - Building and parsing signed responses
//! - Freshness (inclusive of nextUpdate) and responder authorization in the verifier
//! - The client over a scripted HTTP transport

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Duration;
use der::{Decode, Encode};
use pdf_oxide_pki::config::VerificationConfig;
use pdf_oxide_pki::digests::DigestAlgorithm;
use pdf_oxide_pki::error::{Error, Result};
use pdf_oxide_pki::ocsp::asn1::{OcspRequest, OcspResponseStatus};
use pdf_oxide_pki::ocsp::{
    generate_nonce, request_nonce, BasicOcspResp, BasicOcspRespBuilder, CertificateId,
    CertificateStatus, HttpResponse, HttpTransport, OcspClient, OcspRequestBuilder, OcspResp,
    OcspVerifier, ResponderIdKind, OCSP_REQUEST_CONTENT_TYPE,
};
use pdf_oxide_pki::oids;
use pdf_oxide_pki::verification::Verifier;
use pdf_oxide_pki::X509Certificate;

use common::{date, key, now, signer, three_level_pki, CertBuilder, Pki};

const RESPONDER_URL: &str = "http://ocsp.example.com/";

/// Response for `pki.leaf` signed directly by the intermediate.
fn issuer_signed(pki: &Pki, status: CertificateStatus) -> BasicOcspResp {
    let id = CertificateId::for_certificate(&pki.leaf, &pki.intermediate).unwrap();
    BasicOcspRespBuilder::new(&pki.intermediate, ResponderIdKind::ByName)
        .unwrap()
        .add_response(id, status, now() - Duration::days(1), Some(now() + Duration::days(6)))
        .unwrap()
        .build(&signer(key(1)), &[], now() - Duration::days(1))
        .unwrap()
}

/// Response for `pki.leaf` signed by `responder` (key 6), embedding it.
fn responder_signed(pki: &Pki, responder: &X509Certificate) -> BasicOcspResp {
    let id = CertificateId::for_certificate(&pki.leaf, &pki.intermediate).unwrap();
    BasicOcspRespBuilder::new(responder, ResponderIdKind::ByKey)
        .unwrap()
        .add_response(id, CertificateStatus::Good, now(), None)
        .unwrap()
        .build(&signer(key(6)), &[responder.clone()], now())
        .unwrap()
}

fn ocsp_signing_responder(issuer: &X509Certificate, issuer_key: &rsa::RsaPrivateKey) -> X509Certificate {
    CertBuilder::new("CN=OCSP Responder, O=Acme, C=US", 60)
        .extended_key_usage(vec![oids::KP_OCSP_SIGNING], false)
        .issued_by(key(6), issuer, issuer_key)
}

/// Transport answering every request with a fixed response, recording calls.
struct ScriptedTransport {
    status: u16,
    body: Vec<u8>,
    calls: Rc<RefCell<Vec<(String, String, Vec<u8>)>>>,
}

impl HttpTransport for ScriptedTransport {
    fn post(&self, url: &str, content_type: &str, _accept: &str, body: &[u8]) -> Result<HttpResponse> {
        self.calls
            .borrow_mut()
            .push((url.to_string(), content_type.to_string(), body.to_vec()));
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

struct FailingTransport;

impl HttpTransport for FailingTransport {
    fn post(&self, _: &str, _: &str, _: &str, _: &[u8]) -> Result<HttpResponse> {
        Err(Error::Transport("connection refused".to_string()))
    }
}

#[allow(clippy::type_complexity)]
fn scripted(status: u16, body: Vec<u8>) -> (OcspClient, Rc<RefCell<Vec<(String, String, Vec<u8>)>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let transport = ScriptedTransport {
        status,
        body,
        calls: Rc::clone(&calls),
    };
    (OcspClient::new(Box::new(transport)), calls)
}

mod request_tests {
    use super::*;

    #[test]
    fn test_certificate_id_matches_issuer() {
        let pki = three_level_pki();
        let id = CertificateId::for_certificate(&pki.leaf, &pki.intermediate).unwrap();
        assert_eq!(id.serial_number(), pki.leaf.serial());
        assert_eq!(id.digest_algorithm(), Some(DigestAlgorithm::Sha1));
        assert!(id.matches_issuer(&pki.intermediate).unwrap());
        assert!(!id.matches_issuer(&pki.root).unwrap());
    }

    #[test]
    fn test_certificate_id_with_sha256() {
        let pki = three_level_pki();
        let id =
            CertificateId::new(DigestAlgorithm::Sha256, &pki.intermediate, pki.leaf.serial().clone())
                .unwrap();
        assert_eq!(id.as_asn1().issuer_name_hash.as_bytes().len(), 32);
        assert!(id.matches_issuer(&pki.intermediate).unwrap());
    }

    #[test]
    fn test_request_with_nonce() {
        let pki = three_level_pki();
        let nonce = generate_nonce(16);
        assert_eq!(nonce.len(), 16);

        let request = OcspRequestBuilder::new()
            .add_request(CertificateId::for_certificate(&pki.leaf, &pki.intermediate).unwrap())
            .with_nonce(nonce.clone())
            .build()
            .unwrap();
        let decoded = OcspRequest::from_der(&request.to_der().unwrap()).unwrap();
        assert_eq!(decoded.tbs_request.request_list.len(), 1);
        assert_eq!(request_nonce(&decoded), Some(nonce));
    }

    #[test]
    fn test_empty_request_rejected() {
        assert!(matches!(
            OcspRequestBuilder::new().build(),
            Err(Error::IllegalState(_))
        ));
    }
}

mod response_tests {
    use super::*;

    #[test]
    fn test_basic_response_round_trip() {
        let pki = three_level_pki();
        let id = CertificateId::for_certificate(&pki.leaf, &pki.intermediate).unwrap();
        let basic = BasicOcspRespBuilder::new(&pki.intermediate, ResponderIdKind::ByKey)
            .unwrap()
            .add_response(
                id.clone(),
                CertificateStatus::Revoked {
                    time: date(2029, 1, 1),
                    reason: None,
                },
                now(),
                None,
            )
            .unwrap()
            .with_nonce(vec![7; 8])
            .build(&signer(key(1)), &[], now())
            .unwrap();

        let decoded = BasicOcspResp::from_der(basic.encoded()).unwrap();
        assert_eq!(decoded.produced_at(), now());
        assert_eq!(decoded.nonce(), Some(vec![7; 8]));
        assert!(decoded.certs().is_empty());
        assert!(decoded.is_signed_by(&pki.intermediate));
        assert!(!decoded.is_signed_by(&pki.root));

        let single = &decoded.responses()[0];
        assert_eq!(single.cert_id(), &id);
        assert_eq!(single.this_update(), now());
        assert_eq!(single.next_update(), None);
        assert_eq!(
            single.status(),
            &CertificateStatus::Revoked {
                time: date(2029, 1, 1),
                reason: None
            }
        );
    }

    #[test]
    fn test_outer_response() {
        let pki = three_level_pki();
        let basic = issuer_signed(&pki, CertificateStatus::Good);
        let outer = OcspResp::successful(&basic).unwrap();
        let decoded = OcspResp::from_der(&outer.to_der().unwrap()).unwrap();
        assert_eq!(decoded.status(), OcspResponseStatus::Successful);
        assert_eq!(decoded.basic().unwrap().unwrap().encoded(), basic.encoded());

        let error = OcspResp::error(OcspResponseStatus::TryLater);
        let decoded = OcspResp::from_der(&error.to_der().unwrap()).unwrap();
        assert_eq!(decoded.status(), OcspResponseStatus::TryLater);
        assert!(decoded.basic().unwrap().is_none());
    }
}

mod verifier_tests {
    use super::*;

    #[test]
    fn test_good_response_from_issuer() {
        common::init_logging();
        let pki = three_level_pki();
        let basic = issuer_signed(&pki, CertificateStatus::Good);
        let verifier = OcspVerifier::new(vec![basic]);

        let witnesses = verifier
            .verify(&pki.leaf, Some(&pki.intermediate), now())
            .unwrap();
        assert_eq!(witnesses.len(), 1);
        assert_eq!(witnesses[0].verifier, "OcspVerifier");
        assert_eq!(witnesses[0].message, "Valid OCSPs Found: 1");
    }

    #[test]
    fn test_revoked_and_unknown_give_no_witness() {
        let pki = three_level_pki();
        let revoked = issuer_signed(
            &pki,
            CertificateStatus::Revoked {
                time: date(2029, 1, 1),
                reason: None,
            },
        );
        let unknown = issuer_signed(&pki, CertificateStatus::Unknown);
        let verifier = OcspVerifier::new(vec![revoked, unknown]);
        assert!(verifier
            .verify(&pki.leaf, Some(&pki.intermediate), now())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_stale_response_skipped() {
        let pki = three_level_pki();
        let basic = issuer_signed(&pki, CertificateStatus::Good);
        let verifier = OcspVerifier::new(vec![basic.clone()]);
        let later = now() + Duration::days(30);
        assert!(!verifier
            .verify_response(&basic, &pki.leaf, Some(&pki.intermediate), later)
            .unwrap());
    }

    #[test]
    fn test_next_update_is_inclusive() {
        let pki = three_level_pki();
        let basic = issuer_signed(&pki, CertificateStatus::Good);
        let verifier = OcspVerifier::new(Vec::new());
        let next_update = now() + Duration::days(6);
        assert!(verifier
            .verify_response(&basic, &pki.leaf, Some(&pki.intermediate), next_update)
            .unwrap());
        assert!(!verifier
            .verify_response(
                &basic,
                &pki.leaf,
                Some(&pki.intermediate),
                next_update + Duration::seconds(1)
            )
            .unwrap());
    }

    #[test]
    fn test_grace_period_without_next_update() {
        let pki = three_level_pki();
        let id = CertificateId::for_certificate(&pki.leaf, &pki.intermediate).unwrap();
        let basic = BasicOcspRespBuilder::new(&pki.intermediate, ResponderIdKind::ByName)
            .unwrap()
            .add_response(id, CertificateStatus::Good, now(), None)
            .unwrap()
            .build(&signer(key(1)), &[], now())
            .unwrap();

        let verifier = OcspVerifier::new(Vec::new());
        let within = now() + Duration::seconds(60);
        let beyond = now() + Duration::seconds(600);
        assert!(verifier
            .verify_response(&basic, &pki.leaf, Some(&pki.intermediate), within)
            .unwrap());
        assert!(!verifier
            .verify_response(&basic, &pki.leaf, Some(&pki.intermediate), beyond)
            .unwrap());

        let generous = OcspVerifier::from_config(
            Vec::new(),
            &VerificationConfig::default().with_ocsp_grace_period(Duration::hours(1)),
        );
        assert!(generous
            .verify_response(&basic, &pki.leaf, Some(&pki.intermediate), beyond)
            .unwrap());
    }

    #[test]
    fn test_entry_for_other_certificate_ignored() {
        let pki = three_level_pki();
        let basic = issuer_signed(&pki, CertificateStatus::Good);
        let other = CertBuilder::new("CN=Other Signer, O=Acme, C=US", 99)
            .issued_by(key(2), &pki.intermediate, key(1));
        let verifier = OcspVerifier::new(vec![basic]);
        assert!(verifier
            .verify(&other, Some(&pki.intermediate), now())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_untrusted_signer() {
        let pki = three_level_pki();
        let id = CertificateId::for_certificate(&pki.leaf, &pki.intermediate).unwrap();
        let forged = BasicOcspRespBuilder::new(&pki.intermediate, ResponderIdKind::ByName)
            .unwrap()
            .add_response(id, CertificateStatus::Good, now(), Some(now() + Duration::days(1)))
            .unwrap()
            .build(&signer(key(7)), &[], now())
            .unwrap();
        let verifier = OcspVerifier::new(vec![forged]);
        assert!(matches!(
            verifier.verify(&pki.leaf, Some(&pki.intermediate), now()),
            Err(Error::OcspResponderNotTrusted)
        ));
    }

    #[test]
    fn test_delegated_responder() {
        let pki = three_level_pki();
        let responder = ocsp_signing_responder(&pki.intermediate, key(1));
        let basic = responder_signed(&pki, &responder);
        assert!(OcspVerifier::new(Vec::new())
            .verify_response(&basic, &pki.leaf, Some(&pki.intermediate), now())
            .unwrap());
    }

    #[test]
    fn test_responder_without_ocsp_signing() {
        let pki = three_level_pki();
        let responder = CertBuilder::new("CN=OCSP Responder, O=Acme, C=US", 61)
            .issued_by(key(6), &pki.intermediate, key(1));
        let basic = responder_signed(&pki, &responder);
        assert!(matches!(
            OcspVerifier::new(Vec::new()).verify_response(
                &basic,
                &pki.leaf,
                Some(&pki.intermediate),
                now()
            ),
            Err(Error::OcspResponderNotTrusted)
        ));
    }

    #[test]
    fn test_responder_trusted_through_root_store() {
        let pki = three_level_pki();
        let responder = ocsp_signing_responder(&pki.root, key(0));
        let basic = responder_signed(&pki, &responder);

        let untrusting = OcspVerifier::new(Vec::new());
        assert!(untrusting
            .verify_response(&basic, &pki.leaf, Some(&pki.intermediate), now())
            .is_err());

        let trusting = OcspVerifier::new(Vec::new()).with_root_store(vec![pki.root.clone()]);
        assert!(trusting
            .verify_response(&basic, &pki.leaf, Some(&pki.intermediate), now())
            .unwrap());
    }

    #[test]
    fn test_expired_responder_rejected() {
        let pki = three_level_pki();
        let responder = CertBuilder::new("CN=OCSP Responder, O=Acme, C=US", 62)
            .validity(date(2020, 1, 1), date(2025, 1, 1))
            .extended_key_usage(vec![oids::KP_OCSP_SIGNING], false)
            .issued_by(key(6), &pki.intermediate, key(1));
        let basic = responder_signed(&pki, &responder);
        assert!(OcspVerifier::new(Vec::new())
            .verify_response(&basic, &pki.leaf, Some(&pki.intermediate), now())
            .is_err());
    }
}

mod client_tests {
    use super::*;

    fn leaf_with_url(pki: &Pki) -> X509Certificate {
        CertBuilder::new("CN=Signer, O=Acme, C=US", 3)
            .ocsp_url(RESPONDER_URL)
            .issued_by(key(2), &pki.intermediate, key(1))
    }

    #[test]
    fn test_fetch_posts_request() {
        let pki = three_level_pki();
        let leaf = leaf_with_url(&pki);
        let basic = issuer_signed(&pki, CertificateStatus::Good);
        let body = OcspResp::successful(&basic).unwrap().to_der().unwrap();
        let (client, calls) = scripted(200, body);

        let encoded = client.get_encoded(&leaf, &pki.intermediate).unwrap();
        assert_eq!(encoded, basic.encoded());

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        let (url, content_type, request_body) = &calls[0];
        assert_eq!(url, RESPONDER_URL);
        assert_eq!(content_type, OCSP_REQUEST_CONTENT_TYPE);
        let request = OcspRequest::from_der(request_body).unwrap();
        assert_eq!(request_nonce(&request).map(|n| n.len()), Some(16));
    }

    #[test]
    fn test_url_override_and_nonce_length() {
        let pki = three_level_pki();
        let basic = issuer_signed(&pki, CertificateStatus::Good);
        let body = OcspResp::successful(&basic).unwrap().to_der().unwrap();
        let calls = Rc::new(RefCell::new(Vec::new()));
        let transport = ScriptedTransport {
            status: 200,
            body,
            calls: Rc::clone(&calls),
        };
        let config = VerificationConfig::default()
            .with_ocsp_url("http://override.example.com/")
            .with_nonce_length(8);
        let client = OcspClient::from_config(Box::new(transport), &config);

        client.fetch(&pki.leaf, &pki.intermediate).unwrap();
        let calls = calls.borrow();
        assert_eq!(calls[0].0, "http://override.example.com/");
        let request = OcspRequest::from_der(&calls[0].2).unwrap();
        assert_eq!(request_nonce(&request).map(|n| n.len()), Some(8));
    }

    #[test]
    fn test_missing_url() {
        let pki = three_level_pki();
        let (client, calls) = scripted(200, Vec::new());
        assert!(matches!(
            client.fetch(&pki.leaf, &pki.intermediate),
            Err(Error::InvalidArgument(_))
        ));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_http_error_status() {
        let pki = three_level_pki();
        let leaf = leaf_with_url(&pki);
        let (client, _) = scripted(500, Vec::new());
        assert!(matches!(
            client.fetch(&leaf, &pki.intermediate),
            Err(Error::HttpStatus(500))
        ));
        assert!(client.get_basic_ocsp_response(&leaf, &pki.intermediate).is_none());
    }

    #[test]
    fn test_responder_error_status() {
        let pki = three_level_pki();
        let leaf = leaf_with_url(&pki);
        let body = OcspResp::error(OcspResponseStatus::InternalError)
            .to_der()
            .unwrap();
        let (client, _) = scripted(200, body);
        assert!(matches!(
            client.get_encoded(&leaf, &pki.intermediate),
            Err(Error::InvalidOcsp(_))
        ));
        assert!(client.get_basic_ocsp_response(&leaf, &pki.intermediate).is_none());
    }

    #[test]
    fn test_transport_failure() {
        let pki = three_level_pki();
        let leaf = leaf_with_url(&pki);
        let client = OcspClient::new(Box::new(FailingTransport));
        assert!(matches!(
            client.fetch(&leaf, &pki.intermediate),
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn test_online_verification() {
        let pki = three_level_pki();
        let leaf = leaf_with_url(&pki);
        let basic = issuer_signed(&pki, CertificateStatus::Good);
        let body = OcspResp::successful(&basic).unwrap().to_der().unwrap();

        let (client, _) = scripted(200, body.clone());
        let online = OcspVerifier::new(Vec::new())
            .with_client(client)
            .with_online_checking(true);
        let witnesses = online.verify(&leaf, Some(&pki.intermediate), now()).unwrap();
        assert_eq!(witnesses.len(), 1);
        assert_eq!(witnesses[0].message, "Valid OCSPs Found: 1 (online)");

        let (client, calls) = scripted(200, body);
        let offline = OcspVerifier::new(Vec::new()).with_client(client);
        assert!(offline
            .verify(&leaf, Some(&pki.intermediate), now())
            .unwrap()
            .is_empty());
        assert!(calls.borrow().is_empty());
    }
}
