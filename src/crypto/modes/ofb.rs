//! Output Feedback mode with a configurable feedback size.

use super::{load_iv, shift_in};
use crate::crypto::block_cipher::{check_block_buffers, BlockCipher, CipherParameters};
use crate::error::{Error, Result};

/// OFB-n over any block cipher.
pub struct OfbBlockCipher {
    cipher: Box<dyn BlockCipher>,
    block_size: usize,
    iv: Vec<u8>,
    ofb_v: Vec<u8>,
    ofb_out_v: Vec<u8>,
}

impl OfbBlockCipher {
    /// Wrap `cipher` with a feedback size of `bit_block_size` bits (a multiple of 8).
    pub fn new(cipher: Box<dyn BlockCipher>, bit_block_size: usize) -> Result<Self> {
        let cipher_block = cipher.block_size();
        if bit_block_size == 0 || bit_block_size % 8 != 0 || bit_block_size / 8 > cipher_block {
            return Err(Error::InvalidArgument(format!(
                "OFB{} not supported",
                bit_block_size
            )));
        }
        Ok(Self {
            cipher,
            block_size: bit_block_size / 8,
            iv: vec![0; cipher_block],
            ofb_v: vec![0; cipher_block],
            ofb_out_v: vec![0; cipher_block],
        })
    }
}

impl BlockCipher for OfbBlockCipher {
    fn algorithm_name(&self) -> String {
        format!("{}/OFB{}", self.cipher.algorithm_name(), self.block_size * 8)
    }

    fn init(&mut self, _for_encryption: bool, params: &CipherParameters) -> Result<()> {
        match params {
            CipherParameters::WithIv(with_iv) => {
                load_iv(&mut self.iv, with_iv.iv());
                self.reset();
                if let Some(inner) = with_iv.parameters() {
                    self.cipher.init(true, inner)?;
                }
            },
            key => {
                self.reset();
                self.cipher.init(true, key)?;
            },
        }
        Ok(())
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.block_size;
        check_block_buffers(input, output, bs)?;
        self.cipher.process_block(&self.ofb_v, &mut self.ofb_out_v)?;
        for i in 0..bs {
            output[i] = self.ofb_out_v[i] ^ input[i];
        }
        shift_in(&mut self.ofb_v, &self.ofb_out_v[..bs]);
        Ok(bs)
    }

    fn reset(&mut self) {
        self.ofb_v.copy_from_slice(&self.iv);
        self.cipher.reset();
    }

    fn is_partial_block_okay(&self) -> bool {
        true
    }
}
