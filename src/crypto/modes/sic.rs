//! Segmented Integer Counter mode (CTR).

use crate::crypto::block_cipher::{check_block_buffers, BlockCipher, CipherParameters};
use crate::error::{Error, Result};

/// SIC/CTR over any block cipher.
///
/// The IV fills the leading bytes of the counter block; the remaining bytes
/// start at zero and the whole block increments as a big-endian integer.
pub struct SicBlockCipher {
    cipher: Box<dyn BlockCipher>,
    block_size: usize,
    iv: Vec<u8>,
    counter: Vec<u8>,
    counter_out: Vec<u8>,
}

impl SicBlockCipher {
    /// Wrap `cipher`.
    pub fn new(cipher: Box<dyn BlockCipher>) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            block_size,
            iv: vec![0; block_size],
            counter: vec![0; block_size],
            counter_out: vec![0; block_size],
        }
    }

    fn increment_counter(&mut self) {
        for byte in self.counter.iter_mut().rev() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                break;
            }
        }
    }
}

impl BlockCipher for SicBlockCipher {
    fn algorithm_name(&self) -> String {
        format!("{}/SIC", self.cipher.algorithm_name())
    }

    fn init(&mut self, _for_encryption: bool, params: &CipherParameters) -> Result<()> {
        let with_iv = match params {
            CipherParameters::WithIv(with_iv) => with_iv,
            CipherParameters::Key(_) => {
                return Err(Error::InvalidArgument(
                    "CTR/SIC mode requires ParametersWithIv".to_string(),
                ))
            },
        };

        let iv = with_iv.iv();
        if iv.len() > self.block_size {
            return Err(Error::InvalidArgument(format!(
                "CTR/SIC mode requires IV no greater than: {} bytes.",
                self.block_size
            )));
        }
        let max_counter_size = std::cmp::min(8, self.block_size / 2);
        if self.block_size - iv.len() > max_counter_size {
            return Err(Error::InvalidArgument(format!(
                "CTR/SIC mode requires IV of at least: {} bytes.",
                self.block_size - max_counter_size
            )));
        }
        self.iv = iv.to_vec();

        if let Some(inner) = with_iv.parameters() {
            self.cipher.init(true, inner)?;
        }
        self.reset();
        Ok(())
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.block_size;
        check_block_buffers(input, output, bs)?;
        self.cipher.process_block(&self.counter, &mut self.counter_out)?;
        for i in 0..bs {
            output[i] = self.counter_out[i] ^ input[i];
        }
        self.increment_counter();
        Ok(bs)
    }

    fn reset(&mut self) {
        self.counter.fill(0);
        self.counter[..self.iv.len()].copy_from_slice(&self.iv);
        self.cipher.reset();
    }

    fn is_partial_block_okay(&self) -> bool {
        true
    }
}
