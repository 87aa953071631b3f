//! Fixed-capacity keystream ring buffer.
//!
//! OFB, CTR, and GCM decouple keystream production from consumption: blocks
//! of cipher output are pushed ahead of use and consumed byte by byte. The
//! ring owns its storage and cursors; availability is governed by the
//! tracked byte count, never by cursor comparison, so the read position can
//! never overtake the write frontier.

use ciphermode_types::CryptoError;
use zeroize::Zeroize;

/// Ring buffer of pre-computed cipher output.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct KeyStream {
    buf: Vec<u8>,
    /// Read cursor, always `< buf.len()`.
    read: usize,
    /// Unconsumed bytes between the read cursor and the write frontier.
    available: usize,
}

impl KeyStream {
    /// Allocate a ring with a fixed capacity in bytes.
    ///
    /// Capacity should be a multiple of the cipher block size; a ring that
    /// cannot hold one block makes every generate call fail with
    /// [`CryptoError::KeyStreamOutOfSpace`].
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity],
            read: 0,
            available: 0,
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Unconsumed keystream bytes.
    pub fn available(&self) -> usize {
        self.available
    }

    /// Discard all buffered keystream and rewind the cursors.
    pub fn clear(&mut self) {
        self.read = 0;
        self.available = 0;
    }

    /// Append one block of cipher output at the write frontier.
    ///
    /// Fails with [`CryptoError::KeyStreamOutOfSpace`] when the unused
    /// capacity cannot hold the whole block; the ring is left unchanged so
    /// the caller can consume keystream and retry.
    pub fn push_block(&mut self, block: &[u8]) -> Result<(), CryptoError> {
        if self.buf.len() - self.available < block.len() {
            return Err(CryptoError::KeyStreamOutOfSpace);
        }
        let mut write = (self.read + self.available) % self.buf.len();
        for &b in block {
            self.buf[write] = b;
            write += 1;
            if write == self.buf.len() {
                write = 0;
            }
        }
        self.available += block.len();
        Ok(())
    }

    /// Consume one keystream byte. Caller must have checked `available()`.
    pub fn next_byte(&mut self) -> u8 {
        debug_assert!(self.available > 0);
        let b = self.buf[self.read];
        self.read += 1;
        if self.read == self.buf.len() {
            self.read = 0;
        }
        self.available -= 1;
        b
    }
}
