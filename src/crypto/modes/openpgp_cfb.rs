//! OpenPGP flavoured CFB (RFC 4880 section 13.9).
//!
//! The first two blocks are handled specially: after the random prefix plus
//! its two repeated check bytes, the feedback register is resynchronised.

use super::load_iv;
use crate::crypto::block_cipher::{check_block_buffers, BlockCipher, CipherParameters};
use crate::error::Result;

/// OpenPGP CFB over any block cipher.
pub struct OpenPgpCfbBlockCipher {
    cipher: Box<dyn BlockCipher>,
    block_size: usize,
    iv: Vec<u8>,
    fr: Vec<u8>,
    fre: Vec<u8>,
    count: usize,
    for_encryption: bool,
}

impl OpenPgpCfbBlockCipher {
    /// Wrap `cipher`.
    pub fn new(cipher: Box<dyn BlockCipher>) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            block_size,
            iv: vec![0; block_size],
            fr: vec![0; block_size],
            fre: vec![0; block_size],
            count: 0,
            for_encryption: false,
        }
    }

    fn encrypt_byte(&self, data: u8, block_off: usize) -> u8 {
        self.fre[block_off] ^ data
    }

    fn encrypt_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.block_size;
        if self.count > bs {
            output[0] = self.encrypt_byte(input[0], bs - 2);
            self.fr[bs - 2] = output[0];
            output[1] = self.encrypt_byte(input[1], bs - 1);
            self.fr[bs - 1] = output[1];

            self.cipher.process_block(&self.fr, &mut self.fre)?;

            for n in 2..bs {
                output[n] = self.encrypt_byte(input[n], n - 2);
                self.fr[n - 2] = output[n];
            }
        } else if self.count == 0 {
            self.cipher.process_block(&self.fr, &mut self.fre)?;

            for n in 0..bs {
                output[n] = self.encrypt_byte(input[n], n);
                self.fr[n] = output[n];
            }

            self.count += bs;
        } else if self.count == bs {
            self.cipher.process_block(&self.fr, &mut self.fre)?;

            output[0] = self.encrypt_byte(input[0], 0);
            output[1] = self.encrypt_byte(input[1], 1);

            // resynchronise
            self.fr.copy_within(2.., 0);
            self.fr[bs - 2..].copy_from_slice(&output[..2]);

            self.cipher.process_block(&self.fr, &mut self.fre)?;

            for n in 2..bs {
                output[n] = self.encrypt_byte(input[n], n - 2);
                self.fr[n - 2] = output[n];
            }

            self.count += bs;
        }
        Ok(bs)
    }

    fn decrypt_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let bs = self.block_size;
        if self.count > bs {
            self.fr[bs - 2] = input[0];
            output[0] = self.encrypt_byte(input[0], bs - 2);
            self.fr[bs - 1] = input[1];
            output[1] = self.encrypt_byte(input[1], bs - 1);

            self.cipher.process_block(&self.fr, &mut self.fre)?;

            for n in 2..bs {
                self.fr[n - 2] = input[n];
                output[n] = self.encrypt_byte(input[n], n - 2);
            }
        } else if self.count == 0 {
            self.cipher.process_block(&self.fr, &mut self.fre)?;

            for n in 0..bs {
                self.fr[n] = input[n];
                output[n] = self.encrypt_byte(input[n], n);
            }

            self.count += bs;
        } else if self.count == bs {
            self.cipher.process_block(&self.fr, &mut self.fre)?;

            let (in0, in1) = (input[0], input[1]);
            output[0] = self.encrypt_byte(in0, 0);
            output[1] = self.encrypt_byte(in1, 1);

            self.fr.copy_within(2.., 0);
            self.fr[bs - 2] = in0;
            self.fr[bs - 1] = in1;

            self.cipher.process_block(&self.fr, &mut self.fre)?;

            for n in 2..bs {
                self.fr[n - 2] = input[n];
                output[n] = self.encrypt_byte(input[n], n - 2);
            }

            self.count += bs;
        }
        Ok(bs)
    }
}

impl BlockCipher for OpenPgpCfbBlockCipher {
    fn algorithm_name(&self) -> String {
        format!("{}/OpenPGPCFB", self.cipher.algorithm_name())
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<()> {
        self.for_encryption = for_encryption;
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
        check_block_buffers(input, output, self.block_size)?;
        if self.for_encryption {
            self.encrypt_block(input, output)
        } else {
            self.decrypt_block(input, output)
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.fr.copy_from_slice(&self.iv);
        self.cipher.reset();
    }

    fn is_partial_block_okay(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::engines::AesEngine;

    fn run(for_encryption: bool, data: &[u8]) -> Vec<u8> {
        let mut cipher = OpenPgpCfbBlockCipher::new(Box::new(AesEngine::new()));
        cipher
            .init(for_encryption, &CipherParameters::key_with_iv(&[0x11; 16], &[0u8; 16]))
            .unwrap();
        let mut out = vec![0u8; data.len()];
        for i in (0..data.len()).step_by(16) {
            cipher.process_block(&data[i..], &mut out[i..]).unwrap();
        }
        out
    }

    #[test]
    fn test_round_trip_across_resync() {
        let data: Vec<u8> = (0..64u8).collect();
        let ct = run(true, &data);
        assert_ne!(ct, data);
        assert_eq!(run(false, &ct), data);
    }

    #[test]
    fn test_first_block_is_plain_cfb() {
        let data = [0x5au8; 16];
        let ct = run(true, &data);

        let mut engine = AesEngine::new();
        engine.init(true, &CipherParameters::key(&[0x11; 16])).unwrap();
        let mut keystream = [0u8; 16];
        engine.process_block(&[0u8; 16], &mut keystream).unwrap();
        let expected: Vec<u8> = keystream.iter().map(|k| k ^ 0x5a).collect();
        assert_eq!(ct, expected);
    }
}
