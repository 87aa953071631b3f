//! XTEA block cipher.
//!
//! 64-bit-block Feistel cipher with a 128-bit key. Bundled as the second
//! mode-engine primitive; its 8-byte block exercises the engine's
//! block-size genericity. Words are handled big-endian.

use ciphermode_types::CryptoError;
use zeroize::Zeroize;

use crate::provider::BlockCipher;

/// XTEA block size in bytes (64 bits).
pub const XTEA_BLOCK_SIZE: usize = 8;

/// XTEA key size in bytes (128 bits).
pub const XTEA_KEY_SIZE: usize = 16;

/// The usual number of Feistel iterations.
pub const XTEA_DEFAULT_ROUNDS: u32 = 32;

const DELTA: u32 = 0x9e37_79b9;

/// An XTEA key with its iteration count.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct XteaKey {
    key: [u32; 4],
    rounds: u32,
}

impl XteaKey {
    /// Create a key from 16 raw bytes using the default 32 iterations.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        Self::with_rounds(key, XTEA_DEFAULT_ROUNDS)
    }

    /// Create a key with an explicit iteration count.
    ///
    /// Fewer than 32 iterations weakens the cipher; the count exists for
    /// interoperability with implementations that configure it.
    pub fn with_rounds(key: &[u8], rounds: u32) -> Result<Self, CryptoError> {
        if key.len() != XTEA_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: XTEA_KEY_SIZE,
                got: key.len(),
            });
        }
        if rounds == 0 {
            return Err(CryptoError::InvalidArg);
        }
        let mut k = [0u32; 4];
        for (i, w) in k.iter_mut().enumerate() {
            *w = u32::from_be_bytes(key[4 * i..4 * i + 4].try_into().unwrap());
        }
        Ok(Self { key: k, rounds })
    }

    /// Iteration count in use.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

impl BlockCipher for XteaKey {
    fn block_size(&self) -> usize {
        XTEA_BLOCK_SIZE
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        if block.len() != XTEA_BLOCK_SIZE {
            return Err(CryptoError::InvalidArg);
        }
        let mut v0 = u32::from_be_bytes(block[..4].try_into().unwrap());
        let mut v1 = u32::from_be_bytes(block[4..].try_into().unwrap());
        let mut sum = 0u32;

        for _ in 0..self.rounds {
            v0 = v0.wrapping_add(
                ((v1 << 4 ^ v1 >> 5).wrapping_add(v1))
                    ^ sum.wrapping_add(self.key[(sum & 3) as usize]),
            );
            sum = sum.wrapping_add(DELTA);
            v1 = v1.wrapping_add(
                ((v0 << 4 ^ v0 >> 5).wrapping_add(v0))
                    ^ sum.wrapping_add(self.key[(sum >> 11 & 3) as usize]),
            );
        }

        block[..4].copy_from_slice(&v0.to_be_bytes());
        block[4..].copy_from_slice(&v1.to_be_bytes());
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        if block.len() != XTEA_BLOCK_SIZE {
            return Err(CryptoError::InvalidArg);
        }
        let mut v0 = u32::from_be_bytes(block[..4].try_into().unwrap());
        let mut v1 = u32::from_be_bytes(block[4..].try_into().unwrap());
        let mut sum = DELTA.wrapping_mul(self.rounds);

        for _ in 0..self.rounds {
            v1 = v1.wrapping_sub(
                ((v0 << 4 ^ v0 >> 5).wrapping_add(v0))
                    ^ sum.wrapping_add(self.key[(sum >> 11 & 3) as usize]),
            );
            sum = sum.wrapping_sub(DELTA);
            v0 = v0.wrapping_sub(
                ((v1 << 4 ^ v1 >> 5).wrapping_add(v1))
                    ^ sum.wrapping_add(self.key[(sum & 3) as usize]),
            );
        }

        block[..4].copy_from_slice(&v0.to_be_bytes());
        block[4..].copy_from_slice(&v1.to_be_bytes());
        Ok(())
    }
}
