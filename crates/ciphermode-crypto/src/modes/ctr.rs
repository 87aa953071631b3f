//! CTR (Counter) mode of operation.
//!
//! The keystream is produced by encrypting successive counter values. A
//! caller-selected low-order span of the counter (32, 64, or all bits)
//! increments big-endian per block while the high-order nonce portion
//! stays fixed. Counter reuse under one key is unsafe, so exhaustion of
//! the counter space is detected and reported: once the counter returns
//! to its initial value the context refuses to generate more keystream.
//!
//! Note that the equality check recognizes exhaustion only when the full
//! span has wrapped back to its starting value, not proactively; callers
//! that need a hard ceiling below 2^N blocks must count blocks themselves.

use ciphermode_types::{CounterWidth, CryptoError};
use zeroize::Zeroize;

use crate::modes::keystream::KeyStream;
use crate::provider::{BlockCipher, MAX_BLOCK_SIZE};

/// Streaming CTR context.
pub struct Ctr<'c, C: BlockCipher> {
    cipher: &'c C,
    /// Initial nonce-plus-counter value; the exhaustion sentinel.
    nonce: [u8; MAX_BLOCK_SIZE],
    /// Current counter value.
    counter: [u8; MAX_BLOCK_SIZE],
    width: CounterWidth,
    keystream: KeyStream,
    /// False until the first block is generated; suppresses the
    /// exhaustion check while counter still equals the nonce.
    primed: bool,
}

impl<C: BlockCipher> Drop for Ctr<'_, C> {
    fn drop(&mut self) {
        self.nonce.zeroize();
        self.counter.zeroize();
    }
}

impl<'c, C: BlockCipher> Ctr<'c, C> {
    /// Create a context from an initial nonce-plus-counter block.
    pub fn new(
        cipher: &'c C,
        nonce_counter: &[u8],
        width: CounterWidth,
        keystream_capacity: usize,
    ) -> Result<Self, CryptoError> {
        let bs = cipher.block_size();
        if bs == 0 || bs > MAX_BLOCK_SIZE {
            return Err(CryptoError::UnsupportedBlockSize);
        }
        if nonce_counter.len() != bs {
            return Err(CryptoError::InvalidIvLength);
        }
        let mut nonce = [0u8; MAX_BLOCK_SIZE];
        nonce[..bs].copy_from_slice(nonce_counter);
        Ok(Self {
            cipher,
            nonce,
            counter: nonce,
            width,
            keystream: KeyStream::new(keystream_capacity),
            primed: false,
        })
    }

    /// Restart the context with a fresh nonce-plus-counter, discarding any
    /// buffered keystream.
    pub fn reset(&mut self, nonce_counter: &[u8]) -> Result<(), CryptoError> {
        let bs = self.cipher.block_size();
        if nonce_counter.len() != bs {
            return Err(CryptoError::InvalidIvLength);
        }
        self.nonce.zeroize();
        self.nonce[..bs].copy_from_slice(nonce_counter);
        self.counter = self.nonce;
        self.keystream.clear();
        self.primed = false;
        Ok(())
    }

    /// Unconsumed keystream bytes buffered in the ring.
    pub fn keystream_available(&self) -> usize {
        self.keystream.available()
    }

    /// Generate `num_blocks` keystream blocks ahead of use.
    ///
    /// Fails with [`CryptoError::CounterExpired`] when the counter has
    /// cycled back to its initial value (the key/nonce pair is spent) and
    /// with [`CryptoError::KeyStreamOutOfSpace`] when the ring cannot hold
    /// another block. Previously generated blocks stay buffered either way.
    pub fn keystream_generate(&mut self, num_blocks: usize) -> Result<(), CryptoError> {
        let bs = self.cipher.block_size();
        for _ in 0..num_blocks {
            if self.primed && self.counter[..bs] == self.nonce[..bs] {
                return Err(CryptoError::CounterExpired);
            }
            if self.keystream.capacity() - self.keystream.available() < bs {
                return Err(CryptoError::KeyStreamOutOfSpace);
            }
            let mut block = [0u8; MAX_BLOCK_SIZE];
            block[..bs].copy_from_slice(&self.counter[..bs]);
            self.cipher.encrypt_block(&mut block[..bs])?;
            self.keystream.push_block(&block[..bs])?;
            self.increment_counter(bs);
            self.primed = true;
        }
        Ok(())
    }

    // Big-endian increment confined to the selected low-order span.
    fn increment_counter(&mut self, bs: usize) {
        let span = self.width.span_bytes(bs);
        for i in (bs - span..bs).rev() {
            self.counter[i] = self.counter[i].wrapping_add(1);
            if self.counter[i] != 0 {
                break;
            }
        }
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

#[cfg(all(test, feature = "aes"))]
mod tests {
    use super::*;
    use crate::aes::AesKey;

    fn hex_to_bytes(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn nist_key() -> AesKey {
        AesKey::new(&hex_to_bytes("2b7e151628aed2a6abf7158809cf4f3c")).unwrap()
    }

    // NIST SP 800-38A F.5.1: CTR-AES128.Encrypt, all four blocks.
    #[test]
    fn ctr_aes128_nist_vector() {
        let key = nist_key();
        let nonce = hex_to_bytes("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
        let pt = hex_to_bytes(
            "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51\
             30c81c46a35ce411e5fbc1191a0a52eff69f2445df4f9b17ad2b417be66c3710",
        );
        let expected = "874d6191b620e3261bef6864990db6ce9806f66b7970fdff8617187bb9fffdff\
                        5ae4df3edbd5d35e5b4f09020db03eab1e031dda2fbe03d1792170a0f3009cee";

        let mut ctr = Ctr::new(&key, &nonce, CounterWidth::Full, 64).unwrap();
        let mut ct = vec![0u8; pt.len()];
        ctr.encrypt(&mut ct, &pt).unwrap();
        assert_eq!(hex(&ct), expected);

        let mut ctr = Ctr::new(&key, &nonce, CounterWidth::Full, 64).unwrap();
        let mut decrypted = vec![0u8; ct.len()];
        ctr.decrypt(&mut decrypted, &ct).unwrap();
        assert_eq!(decrypted, pt);
    }

    #[test]
    fn ctr_chunked_equals_one_shot() {
        let key = nist_key();
        let nonce = hex_to_bytes("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
        let pt: Vec<u8> = (0u8..70).collect();

        let mut one_shot = vec![0u8; 70];
        let mut ctr = Ctr::new(&key, &nonce, CounterWidth::Full, 32).unwrap();
        ctr.encrypt(&mut one_shot, &pt).unwrap();

        let mut streamed = Vec::new();
        let mut ctr = Ctr::new(&key, &nonce, CounterWidth::Full, 32).unwrap();
        for chunk in pt.chunks(11) {
            let mut out = vec![0u8; chunk.len()];
            ctr.encrypt(&mut out, chunk).unwrap();
            streamed.extend_from_slice(&out);
        }
        assert_eq!(streamed, one_shot);
    }

    // A 32-bit counter wraps its span without disturbing the nonce bytes.
    #[test]
    fn ctr_32bit_span_carry_stops_at_the_nonce() {
        let key = nist_key();
        let mut nonce = [0u8; 16];
        nonce[11] = 0x0b;
        nonce[12..].copy_from_slice(&[0xff, 0xff, 0xff, 0xff]);

        let mut ctr = Ctr::new(&key, &nonce, CounterWidth::Bits32, 32).unwrap();
        ctr.keystream_generate(2).unwrap();

        // Block 2 must come from the wrapped counter: nonce bytes intact,
        // low span zero.
        let mut wrapped = nonce;
        wrapped[12..].copy_from_slice(&[0, 0, 0, 0]);
        let mut expected = wrapped;
        key.encrypt_block(&mut expected).unwrap();

        let mut out = [0u8; 32];
        ctr.encrypt(&mut out, &[0u8; 32]).unwrap();
        assert_eq!(&out[16..], &expected[..]);
    }

    #[test]
    fn ctr_64bit_span_carries_across_bytes() {
        let key = nist_key();
        let mut nonce = [0u8; 16];
        // Low 64-bit span = 0x00000000_000000ff.
        nonce[15] = 0xff;

        let mut ctr = Ctr::new(&key, &nonce, CounterWidth::Bits64, 32).unwrap();
        ctr.keystream_generate(2).unwrap();

        let mut second = nonce;
        second[14] = 0x01;
        second[15] = 0x00;
        let mut expected = second;
        key.encrypt_block(&mut expected).unwrap();

        let mut out = [0u8; 32];
        ctr.encrypt(&mut out, &[0u8; 32]).unwrap();
        assert_eq!(&out[16..], &expected[..]);
    }

    // Exhaustion fires exactly when the counter returns to its start value.
    #[test]
    fn ctr_counter_expiry_on_wraparound() {
        let key = nist_key();
        let nonce = [0x5au8; 16];
        let mut ctr = Ctr::new(&key, &nonce, CounterWidth::Bits32, 32).unwrap();
        ctr.keystream_generate(1).unwrap();

        // Fast-forward to the last counter value before the span returns
        // to its initial state.
        ctr.counter = ctr.nonce;
        ctr.counter[15] = ctr.counter[15].wrapping_sub(1);

        ctr.keystream_generate(1).unwrap();
        assert!(matches!(
            ctr.keystream_generate(1),
            Err(CryptoError::CounterExpired)
        ));
        // The error is sticky until the context is reset.
        assert!(ctr.keystream_generate(1).is_err());
        ctr.reset(&nonce).unwrap();
        ctr.keystream_generate(1).unwrap();
    }

    #[test]
    fn ctr_keystream_out_of_space_is_recoverable() {
        let key = nist_key();
        let nonce = [0u8; 16];
        let mut ctr = Ctr::new(&key, &nonce, CounterWidth::Full, 16).unwrap();
        ctr.keystream_generate(1).unwrap();
        assert!(matches!(
            ctr.keystream_generate(1),
            Err(CryptoError::KeyStreamOutOfSpace)
        ));
        let mut out = [0u8; 16];
        ctr.encrypt(&mut out, &[0u8; 16]).unwrap();
        ctr.keystream_generate(1).unwrap();
    }

    #[test]
    fn ctr_rejects_bad_nonce_length() {
        let key = nist_key();
        for len in [0, 12, 15, 17] {
            assert!(matches!(
                Ctr::new(&key, &vec![0u8; len], CounterWidth::Full, 32),
                Err(CryptoError::InvalidIvLength)
            ));
        }
    }
}
