//! Cipher Feedback mode with a configurable feedback size.

use super::{load_iv, shift_in};
use crate::crypto::block_cipher::{check_block_buffers, BlockCipher, CipherParameters};
use crate::error::{Error, Result};

/// CFB-n over any block cipher. The underlying cipher always runs forwards.
pub struct CfbBlockCipher {
    cipher: Box<dyn BlockCipher>,
    block_size: usize,
    iv: Vec<u8>,
    cfb_v: Vec<u8>,
    cfb_out_v: Vec<u8>,
    encrypting: bool,
}

impl CfbBlockCipher {
    /// Wrap `cipher` with a feedback size of `bit_block_size` bits (a multiple of 8).
    pub fn new(cipher: Box<dyn BlockCipher>, bit_block_size: usize) -> Result<Self> {
        let cipher_block = cipher.block_size();
        if bit_block_size == 0 || bit_block_size % 8 != 0 || bit_block_size / 8 > cipher_block {
            return Err(Error::InvalidArgument(format!(
                "CFB{} not supported",
                bit_block_size
            )));
        }
        Ok(Self {
            cipher,
            block_size: bit_block_size / 8,
            iv: vec![0; cipher_block],
            cfb_v: vec![0; cipher_block],
            cfb_out_v: vec![0; cipher_block],
            encrypting: false,
        })
    }
}

impl BlockCipher for CfbBlockCipher {
    fn algorithm_name(&self) -> String {
        format!("{}/CFB{}", self.cipher.algorithm_name(), self.block_size * 8)
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<()> {
        self.encrypting = for_encryption;
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
        self.cipher.process_block(&self.cfb_v, &mut self.cfb_out_v)?;
        if self.encrypting {
            for i in 0..bs {
                output[i] = self.cfb_out_v[i] ^ input[i];
            }
            shift_in(&mut self.cfb_v, &output[..bs]);
        } else {
            shift_in(&mut self.cfb_v, &input[..bs]);
            for i in 0..bs {
                output[i] = self.cfb_out_v[i] ^ input[i];
            }
        }
        Ok(bs)
    }

    fn reset(&mut self) {
        self.cfb_v.copy_from_slice(&self.iv);
        self.cipher.reset();
    }

    fn is_partial_block_okay(&self) -> bool {
        true
    }
}
