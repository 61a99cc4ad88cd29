//! Raw block cipher engines (ECB) adapted from the RustCrypto ciphers.
//!
//! The engines pick the key schedule at `init` time from the key length, so
//! a single type covers AES-128/192/256 and two- or three-key DESede.

use aes::cipher::{Block, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use des::{TdesEde2, TdesEde3};

use super::block_cipher::{check_block_buffers, BlockCipher, CipherParameters};
use crate::error::{Error, Result};

fn crypt<C>(cipher: &C, for_encryption: bool, input: &[u8], output: &mut [u8]) -> usize
where
    C: BlockEncrypt + BlockDecrypt,
{
    let size = C::block_size();
    let mut block = Block::<C>::clone_from_slice(&input[..size]);
    if for_encryption {
        cipher.encrypt_block(&mut block);
    } else {
        cipher.decrypt_block(&mut block);
    }
    output[..size].copy_from_slice(&block);
    size
}

fn key_bytes<'a>(params: &'a CipherParameters, engine: &str) -> Result<&'a [u8]> {
    match params {
        CipherParameters::Key(key) => Ok(key.key()),
        CipherParameters::WithIv(_) => Err(Error::InvalidArgument(format!(
            "invalid parameter passed to {} init - ParametersWithIv",
            engine
        ))),
    }
}

enum AesKey {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

/// AES engine.
#[derive(Default)]
pub struct AesEngine {
    key: Option<AesKey>,
    for_encryption: bool,
}

impl AesEngine {
    /// AES block size in bytes.
    pub const BLOCK_SIZE: usize = 16;

    /// Create an uninitialised engine.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockCipher for AesEngine {
    fn algorithm_name(&self) -> String {
        "AES".to_string()
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<()> {
        let key = key_bytes(params, "AES")?;
        let invalid = |_| Error::InvalidArgument("Key length not 128/192/256 bits.".to_string());
        self.key = Some(match key.len() {
            16 => AesKey::Aes128(Aes128::new_from_slice(key).map_err(invalid)?),
            24 => AesKey::Aes192(Aes192::new_from_slice(key).map_err(invalid)?),
            32 => AesKey::Aes256(Aes256::new_from_slice(key).map_err(invalid)?),
            _ => {
                return Err(Error::InvalidArgument(
                    "Key length not 128/192/256 bits.".to_string(),
                ))
            },
        });
        self.for_encryption = for_encryption;
        Ok(())
    }

    fn block_size(&self) -> usize {
        Self::BLOCK_SIZE
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| Error::IllegalState("AES engine not initialised".to_string()))?;
        check_block_buffers(input, output, Self::BLOCK_SIZE)?;
        Ok(match key {
            AesKey::Aes128(c) => crypt(c, self.for_encryption, input, output),
            AesKey::Aes192(c) => crypt(c, self.for_encryption, input, output),
            AesKey::Aes256(c) => crypt(c, self.for_encryption, input, output),
        })
    }

    fn reset(&mut self) {}
}

enum DesEdeKey {
    TwoKey(TdesEde2),
    ThreeKey(TdesEde3),
}

/// Triple-DES (encrypt-decrypt-encrypt) engine.
#[derive(Default)]
pub struct DesEdeEngine {
    key: Option<DesEdeKey>,
    for_encryption: bool,
}

impl DesEdeEngine {
    /// DES block size in bytes.
    pub const BLOCK_SIZE: usize = 8;

    /// Create an uninitialised engine.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockCipher for DesEdeEngine {
    fn algorithm_name(&self) -> String {
        "DESede".to_string()
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<()> {
        let key = key_bytes(params, "DESede")?;
        let invalid =
            |_| Error::InvalidArgument("key size must be 16 or 24 bytes.".to_string());
        self.key = Some(match key.len() {
            16 => DesEdeKey::TwoKey(TdesEde2::new_from_slice(key).map_err(invalid)?),
            24 => DesEdeKey::ThreeKey(TdesEde3::new_from_slice(key).map_err(invalid)?),
            _ => {
                return Err(Error::InvalidArgument(
                    "key size must be 16 or 24 bytes.".to_string(),
                ))
            },
        });
        self.for_encryption = for_encryption;
        Ok(())
    }

    fn block_size(&self) -> usize {
        Self::BLOCK_SIZE
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| Error::IllegalState("DESede engine not initialised".to_string()))?;
        check_block_buffers(input, output, Self::BLOCK_SIZE)?;
        Ok(match key {
            DesEdeKey::TwoKey(c) => crypt(c, self.for_encryption, input, output),
            DesEdeKey::ThreeKey(c) => crypt(c, self.for_encryption, input, output),
        })
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_block(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    #[test]
    fn test_aes128_fips197_vector() {
        let mut engine = AesEngine::new();
        engine
            .init(true, &CipherParameters::key(&hex_block("000102030405060708090a0b0c0d0e0f")))
            .unwrap();
        let mut out = [0u8; 16];
        engine
            .process_block(&hex_block("00112233445566778899aabbccddeeff"), &mut out)
            .unwrap();
        assert_eq!(hex::encode(out), "69c4e0d86a7b0430d8cdb78070b4c55a");

        engine
            .init(false, &CipherParameters::key(&hex_block("000102030405060708090a0b0c0d0e0f")))
            .unwrap();
        let mut back = [0u8; 16];
        engine.process_block(&out, &mut back).unwrap();
        assert_eq!(hex::encode(back), "00112233445566778899aabbccddeeff");
    }

    #[test]
    fn test_aes256_fips197_vector() {
        let key = hex_block("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f");
        let mut engine = AesEngine::new();
        engine.init(true, &CipherParameters::key(&key)).unwrap();
        let mut out = [0u8; 16];
        engine
            .process_block(&hex_block("00112233445566778899aabbccddeeff"), &mut out)
            .unwrap();
        assert_eq!(hex::encode(out), "8ea2b7ca516745bfeafc49904b496089");
    }

    #[test]
    fn test_aes_rejects_bad_key_length() {
        let mut engine = AesEngine::new();
        assert!(matches!(
            engine.init(true, &CipherParameters::key(&[0u8; 15])),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_aes_rejects_iv_parameters() {
        let mut engine = AesEngine::new();
        assert!(engine
            .init(true, &CipherParameters::key_with_iv(&[0u8; 16], &[0u8; 16]))
            .is_err());
    }

    #[test]
    fn test_uninitialised_engine() {
        let mut engine = AesEngine::new();
        let mut out = [0u8; 16];
        assert!(matches!(
            engine.process_block(&[0u8; 16], &mut out),
            Err(Error::IllegalState(_))
        ));
    }

    #[test]
    fn test_desede_round_trip() {
        for key_len in [16usize, 24] {
            let key: Vec<u8> = (0..key_len as u8).collect();
            let mut engine = DesEdeEngine::new();
            engine.init(true, &CipherParameters::key(&key)).unwrap();
            let mut ct = [0u8; 8];
            engine.process_block(b"8 bytes!", &mut ct).unwrap();
            assert_ne!(&ct, b"8 bytes!");

            engine.init(false, &CipherParameters::key(&key)).unwrap();
            let mut pt = [0u8; 8];
            engine.process_block(&ct, &mut pt).unwrap();
            assert_eq!(&pt, b"8 bytes!");
        }
    }

    #[test]
    fn test_short_input() {
        let mut engine = DesEdeEngine::new();
        engine.init(true, &CipherParameters::key(&[7u8; 24])).unwrap();
        let mut out = [0u8; 8];
        assert!(matches!(
            engine.process_block(&[0u8; 4], &mut out),
            Err(Error::DataLength(_))
        ));
    }
}
