//! Trait-based provider mechanism for block cipher primitives.
//!
//! The mode engine consumes primitives only through [`BlockCipher`]. This
//! replaces C-style function-pointer pairs plus an opaque key pointer with
//! Rust's trait system: the implementing object *is* the expanded key, and
//! its internal layout is owned by the primitive, not the mode engine.

use ciphermode_types::CryptoError;

/// Largest cipher block size the mode contexts accommodate, in bytes.
pub const MAX_BLOCK_SIZE: usize = 32;

/// A block cipher with a precomputed key schedule (e.g. AES, XTEA).
///
/// Implementations operate on exactly one block of `block_size()` bytes,
/// in place. A single instance may back any number of mode contexts
/// concurrently; `encrypt_block`/`decrypt_block` take `&self` and must not
/// mutate the key schedule.
pub trait BlockCipher {
    /// Block size in bytes. Must be constant for the lifetime of the
    /// instance and at most [`MAX_BLOCK_SIZE`].
    fn block_size(&self) -> usize;

    /// Encrypt a single block in place.
    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError>;

    /// Decrypt a single block in place.
    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError>;
}

impl<C: BlockCipher + ?Sized> BlockCipher for &C {
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        (**self).encrypt_block(block)
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        (**self).decrypt_block(block)
    }
}
