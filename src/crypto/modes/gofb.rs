//! GOST 28147-89 output feedback (gamma) mode.

use super::load_iv;
use crate::crypto::block_cipher::{check_block_buffers, BlockCipher, CipherParameters};
use crate::error::{Error, Result};

const C1: i32 = 16843012; // 00000001000000010000000100000100
const C2: i32 = 16843009; // 00000001000000010000000100000001

fn bytes_to_int(input: &[u8]) -> i32 {
    i32::from_le_bytes([input[0], input[1], input[2], input[3]])
}

fn int_to_bytes(num: i32, out: &mut [u8]) {
    out[..4].copy_from_slice(&num.to_le_bytes());
}

/// GCTR over a 64-bit block cipher.
pub struct GOfbBlockCipher {
    cipher: Box<dyn BlockCipher>,
    block_size: usize,
    iv: Vec<u8>,
    ofb_v: Vec<u8>,
    ofb_out_v: Vec<u8>,
    first_step: bool,
    n3: i32,
    n4: i32,
}

impl GOfbBlockCipher {
    /// Wrap `cipher`, which must have an 8-byte block.
    pub fn new(cipher: Box<dyn BlockCipher>) -> Result<Self> {
        let block_size = cipher.block_size();
        if block_size != 8 {
            return Err(Error::InvalidArgument(
                "GCTR only for 64 bit block ciphers".to_string(),
            ));
        }
        Ok(Self {
            cipher,
            block_size,
            iv: vec![0; block_size],
            ofb_v: vec![0; block_size],
            ofb_out_v: vec![0; block_size],
            first_step: true,
            n3: 0,
            n4: 0,
        })
    }
}

impl BlockCipher for GOfbBlockCipher {
    fn algorithm_name(&self) -> String {
        format!("{}/GCTR", self.cipher.algorithm_name())
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

        if self.first_step {
            self.first_step = false;
            self.cipher.process_block(&self.ofb_v, &mut self.ofb_out_v)?;
            self.n3 = bytes_to_int(&self.ofb_out_v[0..4]);
            self.n4 = bytes_to_int(&self.ofb_out_v[4..8]);
        }
        self.n3 = self.n3.wrapping_add(C2);
        self.n4 = self.n4.wrapping_add(C1);
        // addition is mod (2**32 - 1)
        if self.n4 < C1 && self.n4 > 0 {
            self.n4 += 1;
        }
        int_to_bytes(self.n3, &mut self.ofb_v[0..4]);
        int_to_bytes(self.n4, &mut self.ofb_v[4..8]);

        self.cipher.process_block(&self.ofb_v, &mut self.ofb_out_v)?;
        for i in 0..bs {
            output[i] = self.ofb_out_v[i] ^ input[i];
        }
        self.ofb_v.copy_from_slice(&self.ofb_out_v);
        Ok(bs)
    }

    fn reset(&mut self) {
        self.first_step = true;
        self.n3 = 0;
        self.n4 = 0;
        self.ofb_v.copy_from_slice(&self.iv);
        self.cipher.reset();
    }

    fn is_partial_block_okay(&self) -> bool {
        true
    }
}
