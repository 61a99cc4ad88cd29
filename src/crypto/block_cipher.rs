//! Block cipher abstraction shared by the engines and chaining modes.

use zeroize::Zeroize;

use crate::error::{Error, Result};

/// A fixed-block-size cipher, either a raw engine or a mode wrapping one.
///
/// Modes own their chaining state exclusively; `reset` returns that state to
/// the initialization vector given at `init`.
pub trait BlockCipher {
    /// Algorithm name, e.g. `AES/CBC`.
    fn algorithm_name(&self) -> String;

    /// Initialise for encryption or decryption.
    fn init(&mut self, for_encryption: bool, params: &CipherParameters) -> Result<()>;

    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Process one block from the start of `input` into the start of `output`.
    ///
    /// Returns the number of bytes written (always `block_size()`).
    fn process_block(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Restore the chaining state to the initialization vector.
    fn reset(&mut self);

    /// Whether the mode can emit a partial final block (stream-like modes).
    fn is_partial_block_okay(&self) -> bool {
        false
    }

    /// Raw cipher beneath a mode that chains blocks through XOR feedback.
    ///
    /// Ciphertext stealing uses it to bypass the chaining on the last two blocks.
    fn underlying_cipher(&mut self) -> Option<&mut dyn BlockCipher> {
        None
    }
}

/// Check that `input` and `output` can hold one block of `block_size` bytes.
pub(crate) fn check_block_buffers(input: &[u8], output: &[u8], block_size: usize) -> Result<()> {
    if input.len() < block_size {
        return Err(Error::DataLength("input buffer too short".to_string()));
    }
    if output.len() < block_size {
        return Err(Error::DataLength("output buffer too short".to_string()));
    }
    Ok(())
}

/// Raw key bytes. Wiped when dropped.
#[derive(Clone)]
pub struct KeyParameter {
    key: Vec<u8>,
}

impl KeyParameter {
    /// Wrap a copy of `key`.
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }

    /// Key bytes.
    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl Drop for KeyParameter {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for KeyParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyParameter")
            .field("key", &format!("[REDACTED {} bytes]", self.key.len()))
            .finish()
    }
}

/// An IV together with optional inner parameters.
///
/// Without inner parameters the mode keeps its current key and only swaps the IV.
#[derive(Clone, Debug)]
pub struct ParametersWithIv {
    parameters: Option<Box<CipherParameters>>,
    iv: Vec<u8>,
}

impl ParametersWithIv {
    /// IV plus the parameters for the wrapped cipher.
    pub fn new(parameters: CipherParameters, iv: &[u8]) -> Self {
        Self {
            parameters: Some(Box::new(parameters)),
            iv: iv.to_vec(),
        }
    }

    /// IV only; the wrapped cipher keeps its key.
    pub fn iv_only(iv: &[u8]) -> Self {
        Self {
            parameters: None,
            iv: iv.to_vec(),
        }
    }

    /// Initialization vector.
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Parameters for the wrapped cipher, if any.
    pub fn parameters(&self) -> Option<&CipherParameters> {
        self.parameters.as_deref()
    }
}

/// Parameters accepted by [`BlockCipher::init`].
#[derive(Clone, Debug)]
pub enum CipherParameters {
    /// A bare key
    Key(KeyParameter),
    /// An IV, optionally wrapping a key
    WithIv(ParametersWithIv),
}

impl CipherParameters {
    /// Shorthand for a bare key.
    pub fn key(key: &[u8]) -> Self {
        CipherParameters::Key(KeyParameter::new(key))
    }

    /// Shorthand for key plus IV.
    pub fn key_with_iv(key: &[u8], iv: &[u8]) -> Self {
        CipherParameters::WithIv(ParametersWithIv::new(Self::key(key), iv))
    }
}
