//! Integration tests for the RFC 3161 time-stamp protocol.
//!
//! Tests cover:
//! - Request, response and token generation by a TSA
//! - Client-side response and token validation
//! - Rejections for unacceptable requests
//! - TSA certificate requirements

mod common;

use common::{date, key, now, signer, three_level_pki, CertBuilder};
use der::asn1::ObjectIdentifier;
use num_bigint_dig::BigUint;
use pdf_oxide_pki::digests::DigestAlgorithm;
use pdf_oxide_pki::error::Error;
use pdf_oxide_pki::oids;
use pdf_oxide_pki::signatures::PrivateKeySignature;
use pdf_oxide_pki::tsp::{
    validate_tsa_certificate, PkiFailureInfo, PkiStatus, TimeStampRequest,
    TimeStampRequestGenerator, TimeStampResponse, TimeStampResponseGenerator, TimeStampToken,
    TimeStampTokenGenerator,
};
use pdf_oxide_pki::X509Certificate;
use x509_cert::Version;

const POLICY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.3.4.1");
const OTHER_POLICY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.3.4.2");
const NONCE: &[u8] = &[0x01, 0x23, 0x45, 0x67, 0x89, 0xab];

fn tsa_certificate() -> X509Certificate {
    let pki = three_level_pki();
    CertBuilder::new("CN=Test TSA, O=Acme, C=US", 40)
        .extended_key_usage(vec![oids::KP_TIME_STAMPING], true)
        .issued_by(key(3), &pki.intermediate, key(1))
}

fn token_generator(cert: &X509Certificate) -> TimeStampTokenGenerator {
    TimeStampTokenGenerator::new(signer(key(3)), cert.clone(), POLICY).unwrap()
}

fn response_generator(cert: &X509Certificate) -> TimeStampResponseGenerator {
    TimeStampResponseGenerator::new(token_generator(cert), vec![oids::SHA1, oids::SHA256])
}

fn sha256_request(nonce: Option<&[u8]>) -> TimeStampRequest {
    let digest = DigestAlgorithm::Sha256.digest(b"hello world");
    TimeStampRequestGenerator::new()
        .with_cert_req(true)
        .generate(oids::SHA256, &digest, nonce)
        .unwrap()
}

fn failure_of(response: &TimeStampResponse) -> PkiFailureInfo {
    assert_eq!(response.pki_status(), Some(PkiStatus::Rejection));
    response.failure_info().unwrap()
}

fn validation_message(result: pdf_oxide_pki::Result<()>) -> String {
    match result {
        Err(Error::TspValidation(msg)) => msg,
        other => panic!("expected TspValidation, got {:?}", other),
    }
}

mod round_trip_tests {
    use super::*;

    #[test]
    fn test_granted_response_validates() {
        common::init_logging();
        let cert = tsa_certificate();
        let request = sha256_request(Some(NONCE));
        let response =
            response_generator(&cert).generate(&request, &BigUint::from(23u32), Some(now()));

        assert_eq!(response.pki_status(), Some(PkiStatus::Granted));
        assert_eq!(response.status_string(), Some("Operation Okay"));

        let decoded = TimeStampResponse::from_der(&response.to_der().unwrap()).unwrap();
        decoded.validate(&request).unwrap();

        let token = decoded.time_stamp_token().unwrap();
        token.validate(&cert).unwrap();

        let info = token.tst_info();
        assert_eq!(info.policy(), &POLICY);
        assert_eq!(info.gen_time(), now());
        assert_eq!(info.nonce(), Some(NONCE));
        assert_eq!(info.serial_number(), &[23]);
        assert_eq!(info.message_imprint_alg_oid(), &oids::SHA256);
        assert_eq!(info.message_imprint_digest(), request.message_imprint_digest());
        assert!(!info.is_ordered());
        assert!(info.accuracy().is_none());
    }

    #[test]
    fn test_certificates_embedded_on_request() {
        let pki = three_level_pki();
        let cert = tsa_certificate();
        let generator = token_generator(&cert).with_certificates(vec![pki.intermediate.clone()]);

        let with_certs = generator
            .generate(&sha256_request(None), &BigUint::from(1u32), now())
            .unwrap();
        let embedded = with_certs.certificates().unwrap();
        assert_eq!(embedded.len(), 2);
        assert!(embedded.contains(&cert));
        assert!(embedded.contains(&pki.intermediate));

        let digest = DigestAlgorithm::Sha256.digest(b"hello world");
        let bare_request = TimeStampRequestGenerator::new()
            .generate(oids::SHA256, &digest, None)
            .unwrap();
        let without = generator
            .generate(&bare_request, &BigUint::from(2u32), now())
            .unwrap();
        assert!(without.certificates().unwrap().is_empty());
    }

    #[test]
    fn test_token_der_round_trip() {
        let cert = tsa_certificate();
        let token = token_generator(&cert)
            .generate(&sha256_request(None), &BigUint::from(7u32), now())
            .unwrap();
        let decoded = TimeStampToken::from_der(&token.to_der().unwrap()).unwrap();
        assert_eq!(decoded.tst_info(), token.tst_info());
        decoded.validate(&cert).unwrap();
    }

    #[test]
    fn test_accuracy_ordering_and_tsa_name() {
        let cert = tsa_certificate();
        let token = token_generator(&cert)
            .with_accuracy(Some(1), Some(500), None)
            .unwrap()
            .with_ordering(true)
            .with_tsa(cert.subject())
            .generate(&sha256_request(None), &BigUint::from(8u32), now())
            .unwrap();

        let info = token.tst_info();
        let accuracy = info.accuracy().unwrap();
        assert_eq!(accuracy.seconds, Some(1));
        assert_eq!(accuracy.millis, Some(500));
        assert_eq!(accuracy.micros, None);
        assert!(info.is_ordered());
        assert!(info.tsa().is_some());
    }

    #[test]
    fn test_accuracy_out_of_range() {
        let cert = tsa_certificate();
        assert!(token_generator(&cert)
            .with_accuracy(None, Some(0), None)
            .is_err());
        assert!(token_generator(&cert)
            .with_accuracy(None, None, Some(1000))
            .is_err());
    }

    #[test]
    fn test_sha1_signer_uses_v1_attribute() {
        let cert = tsa_certificate();
        let sha1 = PrivateKeySignature::with_digest(key(3).clone(), DigestAlgorithm::Sha1);
        let token = TimeStampTokenGenerator::new(sha1, cert.clone(), POLICY)
            .unwrap()
            .generate(&sha256_request(None), &BigUint::from(9u32), now())
            .unwrap();

        assert!(token
            .signed_attribute(&oids::ATTR_SIGNING_CERTIFICATE)
            .is_some());
        assert!(token
            .signed_attribute(&oids::ATTR_SIGNING_CERTIFICATE_V2)
            .is_none());
        token.validate(&cert).unwrap();
    }

    #[test]
    fn test_sha512_signer_uses_v2_attribute() {
        let cert = tsa_certificate();
        let sha512 = PrivateKeySignature::with_digest(key(3).clone(), DigestAlgorithm::Sha512);
        let token = TimeStampTokenGenerator::new(sha512, cert.clone(), POLICY)
            .unwrap()
            .with_issuer_serial(false)
            .generate(&sha256_request(None), &BigUint::from(10u32), now())
            .unwrap();

        assert!(token
            .signed_attribute(&oids::ATTR_SIGNING_CERTIFICATE_V2)
            .is_some());
        token.validate(&cert).unwrap();
    }

    #[test]
    fn test_request_policy_overrides_default() {
        let cert = tsa_certificate();
        let digest = DigestAlgorithm::Sha1.digest(b"data");
        let request = TimeStampRequestGenerator::new()
            .with_req_policy(OTHER_POLICY)
            .generate(oids::SHA1, &digest, None)
            .unwrap();
        let response = response_generator(&cert)
            .with_accepted_policies(vec![POLICY, OTHER_POLICY])
            .generate(&request, &BigUint::from(11u32), Some(now()));

        response.validate(&request).unwrap();
        assert_eq!(
            response.time_stamp_token().unwrap().tst_info().policy(),
            &OTHER_POLICY
        );
    }
}

mod rejection_tests {
    use super::*;

    #[test]
    fn test_unknown_algorithm() {
        let cert = tsa_certificate();
        let digest = DigestAlgorithm::Sha512.digest(b"data");
        let request = TimeStampRequestGenerator::new()
            .generate(oids::SHA512, &digest, None)
            .unwrap();
        let response =
            response_generator(&cert).generate(&request, &BigUint::from(1u32), Some(now()));

        assert_eq!(failure_of(&response), PkiFailureInfo::BAD_ALG);
        assert_eq!(
            response.status_string(),
            Some("request contains unknown algorithm")
        );
        response.validate(&request).unwrap();
    }

    #[test]
    fn test_wrong_digest_length() {
        let cert = tsa_certificate();
        let request = TimeStampRequestGenerator::new()
            .generate(oids::SHA256, &[0u8; 20], None)
            .unwrap();
        let response =
            response_generator(&cert).generate(&request, &BigUint::from(1u32), Some(now()));
        assert_eq!(failure_of(&response), PkiFailureInfo::BAD_DATA_FORMAT);
    }

    #[test]
    fn test_time_not_available() {
        let cert = tsa_certificate();
        let response =
            response_generator(&cert).generate(&sha256_request(None), &BigUint::from(1u32), None);
        assert_eq!(failure_of(&response), PkiFailureInfo::TIME_NOT_AVAILABLE);
        assert_eq!(
            response.status_string(),
            Some("The time source is not available.")
        );
    }

    #[test]
    fn test_unaccepted_policy() {
        let cert = tsa_certificate();
        let digest = DigestAlgorithm::Sha256.digest(b"data");
        let request = TimeStampRequestGenerator::new()
            .with_req_policy(OTHER_POLICY)
            .generate(oids::SHA256, &digest, None)
            .unwrap();
        let response = response_generator(&cert)
            .with_accepted_policies(vec![POLICY])
            .generate(&request, &BigUint::from(1u32), Some(now()));
        assert_eq!(failure_of(&response), PkiFailureInfo::UNACCEPTED_POLICY);
    }

    #[test]
    fn test_unaccepted_critical_extension() {
        let cert = tsa_certificate();
        let custom = ObjectIdentifier::new_unwrap("1.2.3.99");
        let digest = DigestAlgorithm::Sha256.digest(b"data");
        let request = TimeStampRequestGenerator::new()
            .with_extension(custom, true, &[0x05, 0x00])
            .unwrap()
            .generate(oids::SHA256, &digest, None)
            .unwrap();

        let strict = response_generator(&cert).with_accepted_extensions(Vec::new());
        let response = strict.generate(&request, &BigUint::from(1u32), Some(now()));
        assert_eq!(failure_of(&response), PkiFailureInfo::UNACCEPTED_EXTENSION);

        let lenient = response_generator(&cert).with_accepted_extensions(vec![custom]);
        let response = lenient.generate(&request, &BigUint::from(1u32), Some(now()));
        assert_eq!(response.pki_status(), Some(PkiStatus::Granted));
    }

    #[test]
    fn test_non_critical_extension_ignored() {
        let cert = tsa_certificate();
        let digest = DigestAlgorithm::Sha256.digest(b"data");
        let request = TimeStampRequestGenerator::new()
            .with_extension(ObjectIdentifier::new_unwrap("1.2.3.98"), false, &[0x05, 0x00])
            .unwrap()
            .generate(oids::SHA256, &digest, None)
            .unwrap();
        let response = response_generator(&cert)
            .with_accepted_extensions(Vec::new())
            .generate(&request, &BigUint::from(1u32), Some(now()));
        assert_eq!(response.pki_status(), Some(PkiStatus::Granted));
    }
}

mod client_validation_tests {
    use super::*;

    #[test]
    fn test_wrong_nonce() {
        let cert = tsa_certificate();
        let response = response_generator(&cert).generate(
            &sha256_request(Some(NONCE)),
            &BigUint::from(1u32),
            Some(now()),
        );
        let other = sha256_request(Some(&[0x42]));
        assert_eq!(
            validation_message(response.validate(&other)),
            "response contains wrong nonce value."
        );
    }

    #[test]
    fn test_different_imprint() {
        let cert = tsa_certificate();
        let response = response_generator(&cert).generate(
            &sha256_request(None),
            &BigUint::from(1u32),
            Some(now()),
        );
        let digest = DigestAlgorithm::Sha256.digest(b"something else");
        let other = TimeStampRequestGenerator::new()
            .generate(oids::SHA256, &digest, None)
            .unwrap();
        assert_eq!(
            validation_message(response.validate(&other)),
            "response for different message imprint digest."
        );
    }

    #[test]
    fn test_policy_mismatch() {
        let cert = tsa_certificate();
        let response = response_generator(&cert).generate(
            &sha256_request(None),
            &BigUint::from(1u32),
            Some(now()),
        );
        let digest = DigestAlgorithm::Sha256.digest(b"hello world");
        let other = TimeStampRequestGenerator::new()
            .with_req_policy(OTHER_POLICY)
            .generate(oids::SHA256, &digest, None)
            .unwrap();
        assert_eq!(
            validation_message(response.validate(&other)),
            "TSA policy wrong for request."
        );
    }

    #[test]
    fn test_token_checked_against_other_certificate() {
        let pki = three_level_pki();
        let cert = tsa_certificate();
        let token = token_generator(&cert)
            .generate(&sha256_request(None), &BigUint::from(1u32), now())
            .unwrap();
        assert_eq!(
            validation_message(token.validate(&pki.leaf)),
            "certificate hash does not match certID hash."
        );
    }

    #[test]
    fn test_token_signed_by_other_key() {
        let cert = tsa_certificate();
        // claims the TSA certificate but signs with an unrelated key
        let token = TimeStampTokenGenerator::new(signer(key(8)), cert.clone(), POLICY)
            .unwrap()
            .generate(&sha256_request(None), &BigUint::from(1u32), now())
            .unwrap();
        assert_eq!(
            validation_message(token.validate(&cert)),
            "signature not created by certificate."
        );
    }

    #[test]
    fn test_token_outside_certificate_validity() {
        let pki = three_level_pki();
        let cert = CertBuilder::new("CN=Short Lived TSA, O=Acme, C=US", 41)
            .validity(date(2025, 1, 1), date(2026, 1, 1))
            .extended_key_usage(vec![oids::KP_TIME_STAMPING], true)
            .issued_by(key(3), &pki.intermediate, key(1));
        let generator = token_generator(&cert);

        let late = generator
            .generate(&sha256_request(None), &BigUint::from(1u32), now())
            .unwrap();
        assert_eq!(
            validation_message(late.validate(&cert)),
            "certificate expired."
        );

        let early = generator
            .generate(&sha256_request(None), &BigUint::from(2u32), date(2024, 1, 1))
            .unwrap();
        assert_eq!(
            validation_message(early.validate(&cert)),
            "certificate not yet valid."
        );

        let inside = generator
            .generate(&sha256_request(None), &BigUint::from(3u32), date(2025, 6, 1))
            .unwrap();
        inside.validate(&cert).unwrap();
    }
}

mod tsa_certificate_tests {
    use super::*;

    #[test]
    fn test_valid_tsa_certificate() {
        validate_tsa_certificate(&tsa_certificate()).unwrap();
    }

    #[test]
    fn test_missing_extended_key_usage() {
        let pki = three_level_pki();
        assert_eq!(
            validation_message(validate_tsa_certificate(&pki.leaf)),
            "Certificate must have an ExtendedKeyUsage extension."
        );
    }

    #[test]
    fn test_non_critical_extended_key_usage() {
        let pki = three_level_pki();
        let cert = CertBuilder::new("CN=TSA", 42)
            .extended_key_usage(vec![oids::KP_TIME_STAMPING], false)
            .issued_by(key(3), &pki.intermediate, key(1));
        assert_eq!(
            validation_message(validate_tsa_certificate(&cert)),
            "Certificate must have an ExtendedKeyUsage extension marked as critical."
        );
    }

    #[test]
    fn test_extra_purposes_rejected() {
        let pki = three_level_pki();
        let cert = CertBuilder::new("CN=TSA", 43)
            .extended_key_usage(vec![oids::KP_TIME_STAMPING, oids::KP_OCSP_SIGNING], true)
            .issued_by(key(3), &pki.intermediate, key(1));
        assert_eq!(
            validation_message(validate_tsa_certificate(&cert)),
            "ExtendedKeyUsage not solely time stamping."
        );
    }

    #[test]
    fn test_v1_certificate_rejected() {
        let pki = three_level_pki();
        let cert = CertBuilder::new("CN=Old TSA", 44)
            .version(Version::V1)
            .issued_by(key(3), &pki.intermediate, key(1));
        assert_eq!(
            validation_message(validate_tsa_certificate(&cert)),
            "Certificate must have an ExtendedKeyUsage extension."
        );
    }

    #[test]
    fn test_generator_refuses_unsuitable_certificate() {
        let pki = three_level_pki();
        assert!(TimeStampTokenGenerator::new(signer(key(2)), pki.leaf.clone(), POLICY).is_err());
    }
}
