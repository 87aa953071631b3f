//! GCM (Galois/Counter Mode) authenticated encryption.
//!
//! CTR-mode encryption combined with a GHASH polynomial authenticator over
//! GF(2^128), per NIST SP 800-38D. The streaming context moves through an
//! explicit state machine: IV setup, an optional authenticate-only phase
//! for associated data, the encrypt/authenticate phase, and finalization,
//! which hashes the data lengths and produces (or verifies) the tag.
//!
//! GMAC falls out as the degenerate case: feed associated data only and
//! finalize without encrypting anything.

use ciphermode_types::CryptoError;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::modes::keystream::KeyStream;
use crate::provider::BlockCipher;

/// GCM operates on 128-bit-block ciphers only.
pub const GCM_BLOCK_SIZE: usize = 16;

/// Maximum (and default) authentication tag size in bytes.
pub const GCM_TAG_SIZE: usize = 16;

/// GF(2^128) element as (high, low) u64 pair.
#[derive(Clone, Copy, Default)]
struct Gf128 {
    h: u64,
    l: u64,
}

impl Gf128 {
    fn from_bytes(b: &[u8; 16]) -> Self {
        Self {
            h: u64::from_be_bytes(b[..8].try_into().unwrap()),
            l: u64::from_be_bytes(b[8..].try_into().unwrap()),
        }
    }

    fn to_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.h.to_be_bytes());
        out[8..].copy_from_slice(&self.l.to_be_bytes());
        out
    }

    fn xor(self, other: Self) -> Self {
        Self {
            h: self.h ^ other.h,
            l: self.l ^ other.l,
        }
    }
}

/// Multiply `a * b` in GF(2^128) with the GCM reduction polynomial.
///
/// Bit-serial: the multiplicand is scanned MSB to LSB; the multiplier is
/// repeatedly halved, folding in the reduction constant (0xE1 in the top
/// byte) whenever a 1-bit falls off the bottom.
fn gf128_mul(a: &[u8; 16], b: &[u8; 16]) -> [u8; 16] {
    let mut v = Gf128::from_bytes(b);
    let mut product = Gf128::default();

    for i in 0..128 {
        if a[i / 8] >> (7 - i % 8) & 1 != 0 {
            product = product.xor(v);
        }
        let carry = v.l & 1 != 0;
        v.l = v.l >> 1 | v.h << 63;
        v.h >>= 1;
        if carry {
            v.h ^= 0xE1u64 << 56;
        }
    }
    product.to_bytes()
}

/// Increment the low 32 bits of a counter block, big-endian.
fn inc32(counter: &mut [u8; 16]) {
    let word = u32::from_be_bytes(counter[12..].try_into().unwrap()).wrapping_add(1);
    counter[12..].copy_from_slice(&word.to_be_bytes());
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Accepting authenticate-only (associated) data.
    Aad,
    /// Encrypting/decrypting; no further associated data may be added.
    Crypt,
}

/// Streaming GCM context.
///
/// One context drives one direction of one message. Associated data, if
/// any, must be fed with [`Gcm::update_aad`] before the first
/// [`Gcm::encrypt`]/[`Gcm::decrypt`] call; the phase transition is
/// one-way. Plaintext produced by `decrypt` must not be used until
/// [`Gcm::finish_verify`] has accepted the tag.
pub struct Gcm<'c, C: BlockCipher> {
    cipher: &'c C,
    /// H = E(0^128), the GHASH subkey.
    hash_subkey: [u8; 16],
    /// IV-derived pre-counter block, reserved for tag masking.
    j0: [u8; 16],
    /// Current keystream counter.
    counter: [u8; 16],
    /// Running GHASH accumulator.
    tag_acc: [u8; 16],
    /// Data pending a full-block hash (AAD, then ciphertext).
    auth_buf: [u8; 16],
    auth_len: usize,
    /// Byte totals for the final length block.
    aad_bytes: u64,
    ct_bytes: u64,
    phase: Phase,
    keystream: KeyStream,
}

impl<C: BlockCipher> Drop for Gcm<'_, C> {
    fn drop(&mut self) {
        self.hash_subkey.zeroize();
        self.j0.zeroize();
        self.counter.zeroize();
        self.tag_acc.zeroize();
        self.auth_buf.zeroize();
    }
}

impl<'c, C: BlockCipher> Gcm<'c, C> {
    /// Create a context for one message under the given IV.
    ///
    /// A 96-bit IV is used directly per SP 800-38D §8.2; any other length
    /// is GHASH-folded into the pre-counter block. `keystream_capacity`
    /// sizes the keystream ring (a multiple of 16).
    pub fn new(cipher: &'c C, iv: &[u8], keystream_capacity: usize) -> Result<Self, CryptoError> {
        if cipher.block_size() != GCM_BLOCK_SIZE {
            return Err(CryptoError::UnsupportedBlockSize);
        }
        if iv.is_empty() {
            return Err(CryptoError::InvalidIvLength);
        }

        let mut hash_subkey = [0u8; 16];
        cipher.encrypt_block(&mut hash_subkey)?;

        let mut ctx = Self {
            cipher,
            hash_subkey,
            j0: [0u8; 16],
            counter: [0u8; 16],
            tag_acc: [0u8; 16],
            auth_buf: [0u8; 16],
            auth_len: 0,
            aad_bytes: 0,
            ct_bytes: 0,
            phase: Phase::Aad,
            keystream: KeyStream::new(keystream_capacity),
        };

        if iv.len() == 12 {
            ctx.j0[..12].copy_from_slice(iv);
            ctx.j0[15] = 0x01;
        } else {
            // Fold the IV through GHASH, then its bit length.
            for chunk in iv.chunks(16) {
                let mut block = [0u8; 16];
                block[..chunk.len()].copy_from_slice(chunk);
                ctx.ghash_block(&block);
            }
            let mut len_block = [0u8; 16];
            len_block[8..].copy_from_slice(&((iv.len() as u64) * 8).to_be_bytes());
            ctx.ghash_block(&len_block);
            ctx.j0 = ctx.tag_acc;
            ctx.tag_acc = [0u8; 16];
        }

        ctx.counter = ctx.j0;
        inc32(&mut ctx.counter);
        Ok(ctx)
    }

    fn ghash_block(&mut self, block: &[u8; 16]) {
        for (acc, b) in self.tag_acc.iter_mut().zip(block.iter()) {
            *acc ^= b;
        }
        self.tag_acc = gf128_mul(&self.tag_acc, &self.hash_subkey);
    }

    // Zero-pad and hash whatever is pending in the auth buffer.
    fn ghash_pending(&mut self) {
        if self.auth_len == 0 {
            return;
        }
        self.auth_buf[self.auth_len..].fill(0);
        let block = self.auth_buf;
        self.ghash_block(&block);
        self.auth_len = 0;
    }

    /// Feed associated data: authenticated, never encrypted.
    ///
    /// Only legal before the first `encrypt`/`decrypt` call; afterwards it
    /// fails with [`CryptoError::InvalidArg`].
    pub fn update_aad(&mut self, mut data: &[u8]) -> Result<(), CryptoError> {
        if self.phase != Phase::Aad {
            return Err(CryptoError::InvalidArg);
        }
        self.aad_bytes += data.len() as u64;
        while !data.is_empty() {
            let take = (GCM_BLOCK_SIZE - self.auth_len).min(data.len());
            self.auth_buf[self.auth_len..self.auth_len + take].copy_from_slice(&data[..take]);
            self.auth_len += take;
            if self.auth_len == GCM_BLOCK_SIZE {
                self.ghash_pending();
            }
            data = &data[take..];
        }
        Ok(())
    }

    // First data byte closes the AAD phase: pad and hash the remainder.
    fn close_aad_phase(&mut self) {
        if self.phase == Phase::Aad {
            self.ghash_pending();
            self.phase = Phase::Crypt;
        }
    }

    /// Generate `num_blocks` keystream blocks ahead of use.
    ///
    /// Fails with [`CryptoError::CounterExpired`] when the counter has
    /// wrapped back to the IV-derived start value, and with
    /// [`CryptoError::KeyStreamOutOfSpace`] when the ring cannot hold
    /// another block.
    pub fn keystream_generate(&mut self, num_blocks: usize) -> Result<(), CryptoError> {
        for _ in 0..num_blocks {
            if self.counter == self.j0 {
                return Err(CryptoError::CounterExpired);
            }
            if self.keystream.capacity() - self.keystream.available() < GCM_BLOCK_SIZE {
                return Err(CryptoError::KeyStreamOutOfSpace);
            }
            let mut block = self.counter;
            self.cipher.encrypt_block(&mut block)?;
            self.keystream.push_block(&block)?;
            inc32(&mut self.counter);
        }
        Ok(())
    }

    /// Encrypt a chunk of plaintext. Output length equals input length.
    pub fn encrypt(&mut self, ciphertext: &mut [u8], plaintext: &[u8]) -> Result<(), CryptoError> {
        if ciphertext.len() < plaintext.len() {
            return Err(CryptoError::BufferTooSmall {
                need: plaintext.len(),
                got: ciphertext.len(),
            });
        }
        self.close_aad_phase();
        self.ct_bytes += plaintext.len() as u64;

        for (c, &p) in ciphertext.iter_mut().zip(plaintext.iter()) {
            if self.keystream.available() == 0 {
                self.keystream_generate(1)?;
            }
            *c = p ^ self.keystream.next_byte();
            self.absorb_cipher_byte(*c);
        }
        Ok(())
    }

    /// Decrypt a chunk of ciphertext. Output length equals input length.
    pub fn decrypt(&mut self, plaintext: &mut [u8], ciphertext: &[u8]) -> Result<(), CryptoError> {
        if plaintext.len() < ciphertext.len() {
            return Err(CryptoError::BufferTooSmall {
                need: ciphertext.len(),
                got: plaintext.len(),
            });
        }
        self.close_aad_phase();
        self.ct_bytes += ciphertext.len() as u64;

        for (p, &c) in plaintext.iter_mut().zip(ciphertext.iter()) {
            if self.keystream.available() == 0 {
                self.keystream_generate(1)?;
            }
            // The authenticator always absorbs ciphertext.
            self.absorb_cipher_byte(c);
            *p = c ^ self.keystream.next_byte();
        }
        Ok(())
    }

    fn absorb_cipher_byte(&mut self, byte: u8) {
        self.auth_buf[self.auth_len] = byte;
        self.auth_len += 1;
        if self.auth_len == GCM_BLOCK_SIZE {
            self.ghash_pending();
        }
    }

    // Hash the trailing partial block and the 64-bit bit-length pair, then
    // mask the accumulator with E(J0).
    fn compute_tag(&mut self) -> Result<[u8; 16], CryptoError> {
        self.ghash_pending();

        let mut len_block = [0u8; 16];
        len_block[..8].copy_from_slice(&(self.aad_bytes * 8).to_be_bytes());
        len_block[8..].copy_from_slice(&(self.ct_bytes * 8).to_be_bytes());
        self.ghash_block(&len_block);

        let mut mask = self.j0;
        self.cipher.encrypt_block(&mut mask)?;
        let mut tag = self.tag_acc;
        for (t, m) in tag.iter_mut().zip(mask.iter()) {
            *t ^= m;
        }
        Ok(tag)
    }

    /// Complete an encryption stream, writing the tag (1..=16 bytes).
    pub fn finish(mut self, tag: &mut [u8]) -> Result<(), CryptoError> {
        if tag.is_empty() || tag.len() > GCM_TAG_SIZE {
            return Err(CryptoError::InvalidTagLength);
        }
        let full = self.compute_tag()?;
        tag.copy_from_slice(&full[..tag.len()]);
        Ok(())
    }

    /// Complete a decryption stream, verifying the caller's tag in
    /// constant time.
    ///
    /// On [`CryptoError::InvalidAuthentication`] every byte this context
    /// produced must be discarded.
    pub fn finish_verify(mut self, tag: &[u8]) -> Result<(), CryptoError> {
        if tag.is_empty() || tag.len() > GCM_TAG_SIZE {
            return Err(CryptoError::InvalidTagLength);
        }
        let full = self.compute_tag()?;
        if full[..tag.len()].ct_eq(tag).unwrap_u8() != 1 {
            return Err(CryptoError::InvalidAuthentication);
        }
        Ok(())
    }
}
