//! Ciphertext stealing over ECB or CBC.
//!
//! Output has the same length as the input. The last two blocks are
//! rearranged instead of padded, so at least one full block is required.

use crate::crypto::block_cipher::{BlockCipher, CipherParameters};
use crate::error::{Error, Result};

/// A buffered cipher applying ciphertext stealing to the final two blocks.
pub struct CtsBlockCipher {
    cipher: Box<dyn BlockCipher>,
    block_size: usize,
    buf: Vec<u8>,
    buf_off: usize,
    for_encryption: bool,
}

/// Run one block through the raw cipher beneath a chaining mode, or through
/// `cipher` itself when it has none (ECB).
fn process_raw(cipher: &mut dyn BlockCipher, input: &[u8], output: &mut [u8]) -> Result<usize> {
    if let Some(raw) = cipher.underlying_cipher() {
        return raw.process_block(input, output);
    }
    cipher.process_block(input, output)
}

impl CtsBlockCipher {
    /// Wrap an ECB engine or a CBC mode. Stream-like modes are rejected.
    pub fn new(cipher: Box<dyn BlockCipher>) -> Result<Self> {
        if cipher.is_partial_block_okay() {
            return Err(Error::InvalidArgument(
                "CtsBlockCipher can only accept ECB, or CBC ciphers".to_string(),
            ));
        }
        let block_size = cipher.block_size();
        Ok(Self {
            cipher,
            block_size,
            buf: vec![0; block_size * 2],
            buf_off: 0,
            for_encryption: false,
        })
    }

    /// Algorithm name of the wrapped cipher.
    pub fn algorithm_name(&self) -> String {
        format!("{}/CTS", self.cipher.algorithm_name())
    }

    /// Block size of the wrapped cipher.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Initialise for encryption or decryption and clear buffered input.
    pub fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<()> {
        self.for_encryption = for_encryption;
        self.reset();
        self.cipher.init(for_encryption, params)
    }

    /// Bytes `process_bytes` would emit for `len` more input bytes.
    pub fn update_output_size(&self, len: usize) -> usize {
        let total = len + self.buf_off;
        let left_over = total % self.buf.len();
        if left_over == 0 {
            total.saturating_sub(self.buf.len())
        } else {
            total - left_over
        }
    }

    /// Bytes `process_bytes` plus `do_final` would emit for `len` more input bytes.
    pub fn output_size(&self, len: usize) -> usize {
        len + self.buf_off
    }

    /// Feed input; emits every block except the last two, which are held back.
    pub fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.block_size;
        let out_len = self.update_output_size(input.len());
        if out_len > output.len() {
            return Err(Error::DataLength("output buffer too short".to_string()));
        }

        let mut result_len = 0;
        let mut input = input;
        let gap_len = self.buf.len() - self.buf_off;

        if input.len() > gap_len {
            self.buf[self.buf_off..].copy_from_slice(&input[..gap_len]);
            result_len += self.cipher.process_block(&self.buf, output)?;
            self.buf.copy_within(bs.., 0);
            self.buf_off = bs;
            input = &input[gap_len..];

            while input.len() > bs {
                self.buf[self.buf_off..].copy_from_slice(&input[..bs]);
                result_len += self
                    .cipher
                    .process_block(&self.buf, &mut output[result_len..])?;
                self.buf.copy_within(bs.., 0);
                input = &input[bs..];
            }
        }

        self.buf[self.buf_off..self.buf_off + input.len()].copy_from_slice(input);
        self.buf_off += input.len();
        Ok(result_len)
    }

    /// Flush the held-back blocks, stealing ciphertext for a short last block.
    pub fn do_final(&mut self, output: &mut [u8]) -> Result<usize> {
        let bs = self.block_size;
        if self.buf_off > output.len() {
            return Err(Error::DataLength("output buffer too short".to_string()));
        }
        if self.buf_off < bs {
            return Err(Error::DataLength(
                "need at least one block of input for CTS".to_string(),
            ));
        }

        let length = self.buf_off - bs;
        let mut block = vec![0u8; bs];

        if self.for_encryption {
            self.cipher.process_block(&self.buf, &mut block)?;

            if self.buf_off > bs {
                for i in self.buf_off..self.buf.len() {
                    self.buf[i] = block[i - bs];
                }
                for i in bs..self.buf_off {
                    self.buf[i] ^= block[i - bs];
                }
                process_raw(self.cipher.as_mut(), &self.buf[bs..], output)?;
                output[bs..bs + length].copy_from_slice(&block[..length]);
            } else {
                output[..bs].copy_from_slice(&block);
            }
        } else {
            let mut last_block = vec![0u8; bs];

            if self.buf_off > bs {
                process_raw(self.cipher.as_mut(), &self.buf, &mut block)?;

                for i in bs..self.buf_off {
                    last_block[i - bs] = block[i - bs] ^ self.buf[i];
                }
                block[..length].copy_from_slice(&self.buf[bs..bs + length]);

                self.cipher.process_block(&block, output)?;
                output[bs..bs + length].copy_from_slice(&last_block[..length]);
            } else {
                self.cipher.process_block(&self.buf, &mut block)?;
                output[..bs].copy_from_slice(&block);
            }
        }

        let written = self.buf_off;
        self.reset();
        Ok(written)
    }

    /// Clear buffered input and reset the wrapped cipher.
    pub fn reset(&mut self) {
        self.buf.fill(0);
        self.buf_off = 0;
        self.cipher.reset();
    }

    /// Process a whole message in one call.
    pub fn process_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = vec![0u8; self.output_size(input.len())];
        let n = self.process_bytes(input, &mut out)?;
        let m = self.do_final(&mut out[n..])?;
        out.truncate(n + m);
        Ok(out)
    }
}
