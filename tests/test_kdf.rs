//! Integration tests for the key derivation functions.
//!
//! Tests cover:
//! - Published PBKDF2 and scrypt vectors
//! - Prefix consistency of every KDF across output lengths
//! - Parameter validation

use md5::Md5;
use pdf_oxide_pki::crypto::kdf::{
    kdf1, kdf2, pbkdf1, pbkdf1_key_and_iv, pbkdf2_hmac, scrypt, ScryptParams,
};
use pdf_oxide_pki::error::Error;
use proptest::prelude::*;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

fn unhex(s: &str) -> Vec<u8> {
    hex::decode(s.replace(' ', "")).unwrap()
}

mod vector_tests {
    use super::*;

    #[test]
    fn test_pbkdf2_sha1_rfc6070() {
        assert_eq!(
            pbkdf2_hmac::<Sha1>(b"password", b"salt", 2, 20).unwrap(),
            unhex("ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957")
        );
        assert_eq!(
            pbkdf2_hmac::<Sha1>(b"password", b"salt", 4096, 20).unwrap(),
            unhex("4b007901b765489abead49d926f721d065a429c1")
        );
    }

    #[test]
    fn test_pbkdf2_sha256_rfc7914() {
        let expected = unhex(
            "55 ac 04 6e 56 e3 08 9f ec 16 91 c2 25 44 b6 05 \
             f9 41 85 21 6d de 04 65 e6 8b 9d 57 c2 0d ac bc \
             49 ca 9c cc f1 79 b6 45 99 16 64 b3 9d 77 ef 31 \
             7c 71 b8 45 b1 e3 0b d5 09 11 20 41 d3 a1 97 83",
        );
        assert_eq!(
            pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 1, 64).unwrap(),
            expected
        );
    }

    #[test]
    #[ignore = "allocates 16 MiB and is slow without optimisations"]
    fn test_scrypt_rfc7914_sodium_chloride() {
        let expected = unhex(
            "70 23 bd cb 3a fd 73 48 46 1c 06 cd 81 fd 38 eb \
             fd a8 fb ba 90 4f 8e 3e a9 b5 43 f6 54 5d a1 f2 \
             d5 43 29 55 61 3f 0f cf 62 d4 97 05 24 2a 9a f9 \
             e6 1e 85 dc 0d 65 1e 40 df cf 01 7b 45 57 58 87",
        );
        let params = ScryptParams::new(16384, 8, 1).unwrap();
        assert_eq!(
            scrypt(b"pleaseletmein", b"SodiumChloride", params, 64).unwrap(),
            expected
        );
    }

    #[test]
    fn test_scrypt_default_params() {
        assert_eq!(ScryptParams::default(), ScryptParams::new(16384, 8, 1).unwrap());
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn test_scrypt_parameter_errors() {
        for (n, r, p) in [(0, 8, 1), (1, 8, 1), (1000, 8, 1), (65536, 1, 1), (16, 0, 1), (16, 8, 0)] {
            assert!(
                matches!(ScryptParams::new(n, r, p), Err(Error::InvalidArgument(_))),
                "N={} r={} p={}",
                n,
                r,
                p
            );
        }
        assert!(ScryptParams::new(65536, 2, 1).is_ok());
    }

    #[test]
    fn test_scrypt_validates_params_passed_directly() {
        let bad = ScryptParams { n: 3, r: 1, p: 1 };
        assert!(scrypt(b"pw", b"salt", bad, 16).is_err());
    }

    #[test]
    fn test_pbkdf_errors() {
        assert!(pbkdf2_hmac::<Sha256>(b"pw", b"salt", 0, 32).is_err());
        assert!(pbkdf1::<Sha1>(b"pw", b"salt", 1, 21).is_err());
        assert!(pbkdf1_key_and_iv::<Md5>(b"pw", b"salt", 1, 16, 1).is_err());
    }
}

mod property_tests {
    use super::*;

    proptest! {
        #[test]
        fn pbkdf2_shorter_output_is_prefix(
            password in prop::collection::vec(any::<u8>(), 0..32),
            salt in prop::collection::vec(any::<u8>(), 0..16),
            short in 1usize..40,
            extra in 0usize..80,
        ) {
            let long = pbkdf2_hmac::<Sha512>(&password, &salt, 3, short + extra).unwrap();
            let short_key = pbkdf2_hmac::<Sha512>(&password, &salt, 3, short).unwrap();
            prop_assert_eq!(&long[..short], &short_key[..]);
        }

        #[test]
        fn kdf2_is_kdf1_without_first_block(
            shared in prop::collection::vec(any::<u8>(), 1..48),
            iv in prop::collection::vec(any::<u8>(), 0..16),
            len in 1usize..100,
        ) {
            let k1 = kdf1::<Sha256>(&shared, &iv, len + 32).unwrap();
            let k2 = kdf2::<Sha256>(&shared, &iv, len).unwrap();
            prop_assert_eq!(&k1[32..32 + len], &k2[..]);
        }

        #[test]
        fn pbkdf1_key_and_iv_split_the_digest(
            password in prop::collection::vec(any::<u8>(), 0..32),
            key_len in 1usize..16,
        ) {
            let iv_len = 16 - key_len;
            let (key, iv) = pbkdf1_key_and_iv::<Md5>(&password, b"saltsalt", 2, key_len, iv_len).unwrap();
            let full = pbkdf1::<Md5>(&password, b"saltsalt", 2, 16).unwrap();
            prop_assert_eq!(key, full[..key_len].to_vec());
            prop_assert_eq!(iv, full[key_len..].to_vec());
        }

        #[test]
        fn scrypt_shorter_output_is_prefix(
            password in prop::collection::vec(any::<u8>(), 0..16),
            len in 1usize..64,
        ) {
            let params = ScryptParams::new(16, 1, 1).unwrap();
            let long = scrypt(&password, b"salt", params, 64).unwrap();
            let short = scrypt(&password, b"salt", params, len).unwrap();
            prop_assert_eq!(&long[..len], &short[..]);
        }
    }
}
