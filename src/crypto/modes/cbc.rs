//! Cipher Block Chaining mode.

use crate::crypto::block_cipher::{check_block_buffers, BlockCipher, CipherParameters};
use crate::error::{Error, Result};

/// CBC over any block cipher.
pub struct CbcBlockCipher {
    cipher: Box<dyn BlockCipher>,
    block_size: usize,
    iv: Vec<u8>,
    cbc_v: Vec<u8>,
    cbc_next_v: Vec<u8>,
    encrypting: bool,
}

impl CbcBlockCipher {
    /// Wrap `cipher`. The IV starts as all zeros until `init` supplies one.
    pub fn new(cipher: Box<dyn BlockCipher>) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            block_size,
            iv: vec![0; block_size],
            cbc_v: vec![0; block_size],
            cbc_next_v: vec![0; block_size],
            encrypting: false,
        }
    }

    fn encrypt_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        for (v, b) in self.cbc_v.iter_mut().zip(&input[..self.block_size]) {
            *v ^= b;
        }
        let length = self.cipher.process_block(&self.cbc_v, output)?;
        self.cbc_v.copy_from_slice(&output[..self.block_size]);
        Ok(length)
    }

    fn decrypt_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        self.cbc_next_v.copy_from_slice(&input[..self.block_size]);
        let length = self.cipher.process_block(input, output)?;
        for (o, v) in output[..self.block_size].iter_mut().zip(&self.cbc_v) {
            *o ^= v;
        }
        std::mem::swap(&mut self.cbc_v, &mut self.cbc_next_v);
        Ok(length)
    }
}

impl BlockCipher for CbcBlockCipher {
    fn algorithm_name(&self) -> String {
        format!("{}/CBC", self.cipher.algorithm_name())
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<()> {
        let was_encrypting = self.encrypting;
        self.encrypting = for_encryption;

        match params {
            CipherParameters::WithIv(with_iv) => {
                if with_iv.iv().len() != self.block_size {
                    return Err(Error::InvalidArgument(
                        "initialisation vector must be the same length as block size".to_string(),
                    ));
                }
                self.iv.copy_from_slice(with_iv.iv());
                self.reset();
                match with_iv.parameters() {
                    Some(inner) => self.cipher.init(for_encryption, inner)?,
                    None if was_encrypting != for_encryption => {
                        return Err(Error::InvalidArgument(
                            "cannot change encrypting state without providing key.".to_string(),
                        ))
                    },
                    None => {}
                }
            },
            key => {
                self.reset();
                self.cipher.init(for_encryption, key)?;
            },
        }
        Ok(())
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        check_block_buffers(input, output, self.block_size)?;
        if self.encrypting {
            self.encrypt_block(input, output)
        } else {
            self.decrypt_block(input, output)
        }
    }

    fn reset(&mut self) {
        self.cbc_v.copy_from_slice(&self.iv);
        self.cbc_next_v.fill(0);
        self.cipher.reset();
    }

    fn underlying_cipher(&mut self) -> Option<&mut dyn BlockCipher> {
        Some(self.cipher.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::engines::AesEngine;

    fn aes_cbc() -> CbcBlockCipher {
        CbcBlockCipher::new(Box::new(AesEngine::new()))
    }

    #[test]
    fn test_sp800_38a_cbc_aes128() {
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let pt = hex::decode("6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51").unwrap();

        let mut cbc = aes_cbc();
        cbc.init(true, &CipherParameters::key_with_iv(&key, &iv)).unwrap();
        let mut ct = vec![0u8; pt.len()];
        for i in (0..pt.len()).step_by(16) {
            cbc.process_block(&pt[i..], &mut ct[i..]).unwrap();
        }
        assert_eq!(
            hex::encode(&ct),
            "7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2"
        );
    }

    #[test]
    fn test_reset_restores_iv() {
        let mut cbc = aes_cbc();
        cbc.init(true, &CipherParameters::key_with_iv(&[1u8; 16], &[2u8; 16]))
            .unwrap();
        let mut first = [0u8; 16];
        cbc.process_block(&[3u8; 16], &mut first).unwrap();
        cbc.reset();
        let mut again = [0u8; 16];
        cbc.process_block(&[3u8; 16], &mut again).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_iv_length_must_match_block() {
        let mut cbc = aes_cbc();
        let result = cbc.init(true, &CipherParameters::key_with_iv(&[1u8; 16], &[2u8; 8]));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_direction_change_requires_key() {
        let mut cbc = aes_cbc();
        cbc.init(true, &CipherParameters::key_with_iv(&[1u8; 16], &[2u8; 16]))
            .unwrap();
        let iv_only = CipherParameters::WithIv(
            crate::crypto::block_cipher::ParametersWithIv::iv_only(&[5u8; 16]),
        );
        assert!(cbc.init(true, &iv_only).is_ok());
        assert!(cbc.init(false, &iv_only).is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(aes_cbc().algorithm_name(), "AES/CBC");
    }
}
