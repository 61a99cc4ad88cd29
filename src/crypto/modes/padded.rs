//! Buffered block cipher with PKCS#7 padding.
//!
//! Encryption always appends a padding block when the input is block aligned,
//! so decryption can strip the padding unambiguously.

use crate::crypto::block_cipher::{BlockCipher, CipherParameters};
use crate::error::{Error, Result};

/// Append PKCS#7 padding to `data` for `block_size`.
pub fn pkcs7_pad(data: &mut Vec<u8>, block_size: usize) {
    let padding_len = block_size - (data.len() % block_size);
    data.extend(std::iter::repeat_n(padding_len as u8, padding_len));
}

/// Number of padding bytes at the end of a decrypted block.
pub fn pkcs7_pad_count(block: &[u8]) -> Result<usize> {
    let padding_len = block[block.len() - 1] as usize;
    if padding_len == 0 || padding_len > block.len() {
        return Err(Error::InvalidCipherText("pad block corrupted".to_string()));
    }

    // Verify padding
    let data_len = block.len() - padding_len;
    if block[data_len..].iter().any(|&b| b as usize != padding_len) {
        return Err(Error::InvalidCipherText("pad block corrupted".to_string()));
    }
    Ok(padding_len)
}

/// A block cipher or mode fed with arbitrary-length input and PKCS#7 padding.
pub struct PaddedBlockCipher {
    cipher: Box<dyn BlockCipher>,
    block_size: usize,
    buf: Vec<u8>,
    buf_off: usize,
    for_encryption: bool,
}

impl PaddedBlockCipher {
    /// Wrap `cipher`.
    pub fn new(cipher: Box<dyn BlockCipher>) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            block_size,
            buf: vec![0; block_size],
            buf_off: 0,
            for_encryption: false,
        }
    }

    /// Algorithm name of the wrapped cipher.
    pub fn algorithm_name(&self) -> String {
        format!("{}/PKCS7Padding", self.cipher.algorithm_name())
    }

    /// Initialise for encryption or decryption and clear buffered input.
    pub fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<()> {
        self.for_encryption = for_encryption;
        self.reset();
        self.cipher.init(for_encryption, params)
    }

    /// Upper bound for `process_bytes` plus `do_final` output for `len` more bytes.
    pub fn output_size(&self, len: usize) -> usize {
        let total = len + self.buf_off;
        let left_over = total % self.block_size;
        if left_over == 0 {
            if self.for_encryption {
                total + self.block_size
            } else {
                total
            }
        } else {
            total - left_over + self.block_size
        }
    }

    /// Feed input. The last block is always held back for `do_final`.
    pub fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.block_size;
        let mut result_len = 0;
        let mut input = input;
        let gap_len = bs - self.buf_off;

        if input.len() > gap_len {
            self.buf[self.buf_off..].copy_from_slice(&input[..gap_len]);
            result_len += self.process_buffered(&mut output[result_len..])?;
            self.buf_off = 0;
            input = &input[gap_len..];

            while input.len() > bs {
                if output.len() < result_len + bs {
                    return Err(Error::DataLength("output buffer too short".to_string()));
                }
                result_len += self
                    .cipher
                    .process_block(&input[..bs], &mut output[result_len..])?;
                input = &input[bs..];
            }
        }

        self.buf[self.buf_off..self.buf_off + input.len()].copy_from_slice(input);
        self.buf_off += input.len();
        Ok(result_len)
    }

    fn process_buffered(&mut self, output: &mut [u8]) -> Result<usize> {
        if output.len() < self.block_size {
            return Err(Error::DataLength("output buffer too short".to_string()));
        }
        self.cipher.process_block(&self.buf, output)
    }

    /// Pad (encryption) or unpad (decryption) the final block.
    pub fn do_final(&mut self, output: &mut [u8]) -> Result<usize> {
        let bs = self.block_size;
        let result = if self.for_encryption {
            let mut written = 0;
            if self.buf_off == bs {
                written += self.process_buffered(output)?;
                self.buf_off = 0;
            }
            let mut last = self.buf[..self.buf_off].to_vec();
            pkcs7_pad(&mut last, bs);
            self.buf.copy_from_slice(&last);
            written += self.process_buffered(&mut output[written..])?;
            Ok(written)
        } else if self.buf_off == bs {
            let mut block = vec![0u8; bs];
            self.cipher.process_block(&self.buf, &mut block)?;
            let pad = pkcs7_pad_count(&block)?;
            if output.len() < bs - pad {
                return Err(Error::DataLength("output buffer too short".to_string()));
            }
            output[..bs - pad].copy_from_slice(&block[..bs - pad]);
            Ok(bs - pad)
        } else {
            Err(Error::DataLength(
                "last block incomplete in decryption".to_string(),
            ))
        };
        self.reset();
        result
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
