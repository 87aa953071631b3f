//! OFB (Output Feedback) mode of operation.
//!
//! The keystream is produced by repeatedly encrypting the IV register with
//! no dependence on the data, so encryption and decryption are the same
//! XOR and keystream blocks can be generated ahead of use.

use ciphermode_types::CryptoError;
use zeroize::Zeroize;

use crate::modes::keystream::KeyStream;
use crate::provider::{BlockCipher, MAX_BLOCK_SIZE};

/// Streaming OFB context.
pub struct Ofb<'c, C: BlockCipher> {
    cipher: &'c C,
    /// Feedback register; each self-encryption yields a keystream block.
    register: [u8; MAX_BLOCK_SIZE],
    keystream: KeyStream,
}

impl<C: BlockCipher> Drop for Ofb<'_, C> {
    fn drop(&mut self) {
        self.register.zeroize();
    }
}

impl<'c, C: BlockCipher> Ofb<'c, C> {
    /// Create a context with the stream's IV and a keystream ring of
    /// `keystream_capacity` bytes (a multiple of the block size).
    pub fn new(cipher: &'c C, iv: &[u8], keystream_capacity: usize) -> Result<Self, CryptoError> {
        let bs = cipher.block_size();
        if bs == 0 || bs > MAX_BLOCK_SIZE {
            return Err(CryptoError::UnsupportedBlockSize);
        }
        if iv.len() != bs {
            return Err(CryptoError::InvalidIvLength);
        }
        let mut register = [0u8; MAX_BLOCK_SIZE];
        register[..bs].copy_from_slice(iv);
        Ok(Self {
            cipher,
            register,
            keystream: KeyStream::new(keystream_capacity),
        })
    }

    /// Restart the context for a new stream under a fresh IV, discarding
    /// any buffered keystream.
    pub fn reset(&mut self, iv: &[u8]) -> Result<(), CryptoError> {
        let bs = self.cipher.block_size();
        if iv.len() != bs {
            return Err(CryptoError::InvalidIvLength);
        }
        self.register.zeroize();
        self.register[..bs].copy_from_slice(iv);
        self.keystream.clear();
        Ok(())
    }

    /// Unconsumed keystream bytes buffered in the ring.
    pub fn keystream_available(&self) -> usize {
        self.keystream.available()
    }

    /// Generate `num_blocks` keystream blocks ahead of use.
    ///
    /// Fails with [`CryptoError::KeyStreamOutOfSpace`] once the ring
    /// cannot hold another block; blocks generated before the failure
    /// remain buffered.
    pub fn keystream_generate(&mut self, num_blocks: usize) -> Result<(), CryptoError> {
        let bs = self.cipher.block_size();
        for _ in 0..num_blocks {
            if self.keystream.capacity() - self.keystream.available() < bs {
                return Err(CryptoError::KeyStreamOutOfSpace);
            }
            self.cipher.encrypt_block(&mut self.register[..bs])?;
            self.keystream.push_block(&self.register[..bs])?;
        }
        Ok(())
    }

    /// Encrypt a chunk of plaintext. Output length equals input length.
    pub fn encrypt(&mut self, ciphertext: &mut [u8], plaintext: &[u8]) -> Result<(), CryptoError> {
        self.crypt(ciphertext, plaintext)
    }

    /// Decrypt a chunk of ciphertext (the same XOR as encryption).
    pub fn decrypt(&mut self, plaintext: &mut [u8], ciphertext: &[u8]) -> Result<(), CryptoError> {
        self.crypt(plaintext, ciphertext)
    }

    fn crypt(&mut self, output: &mut [u8], input: &[u8]) -> Result<(), CryptoError> {
        if output.len() < input.len() {
            return Err(CryptoError::BufferTooSmall {
                need: input.len(),
                got: output.len(),
            });
        }
        for (o, &b) in output.iter_mut().zip(input.iter()) {
            if self.keystream.available() == 0 {
                self.keystream_generate(1)?;
            }
            *o = b ^ self.keystream.next_byte();
        }
        Ok(())
    }
}
