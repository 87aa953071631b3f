//! CBC (Cipher Block Chaining) mode of operation.
//!
//! Each plaintext block is XORed with the previous ciphertext block (the
//! initialization vector for the first) before encryption, chaining every
//! block to everything before it.

use ciphermode_types::{CryptoError, Padding};
use zeroize::Zeroize;

use crate::modes::padding::insert_padding;
use crate::provider::{BlockCipher, MAX_BLOCK_SIZE};

/// Streaming CBC context.
///
/// Holds the chaining value and up to one block of buffered input between
/// calls. A context drives one direction of one stream; use [`Cbc::reset`]
/// with a fresh IV before reusing it.
pub struct Cbc<'c, C: BlockCipher> {
    cipher: &'c C,
    /// IV at stream start, then the most recent ciphertext block.
    chain: [u8; MAX_BLOCK_SIZE],
    pending: [u8; MAX_BLOCK_SIZE],
    pending_len: usize,
}

impl<C: BlockCipher> Drop for Cbc<'_, C> {
    fn drop(&mut self) {
        self.chain.zeroize();
        self.pending.zeroize();
    }
}

impl<'c, C: BlockCipher> Cbc<'c, C> {
    /// Create a context with the stream's initialization vector.
    pub fn new(cipher: &'c C, iv: &[u8]) -> Result<Self, CryptoError> {
        let bs = cipher.block_size();
        if bs == 0 || bs > MAX_BLOCK_SIZE {
            return Err(CryptoError::UnsupportedBlockSize);
        }
        if iv.len() != bs {
            return Err(CryptoError::InvalidIvLength);
        }
        let mut chain = [0u8; MAX_BLOCK_SIZE];
        chain[..bs].copy_from_slice(iv);
        Ok(Self {
            cipher,
            chain,
            pending: [0u8; MAX_BLOCK_SIZE],
            pending_len: 0,
        })
    }

    /// Restart the context for a new stream under a fresh IV.
    pub fn reset(&mut self, iv: &[u8]) -> Result<(), CryptoError> {
        let bs = self.cipher.block_size();
        if iv.len() != bs {
            return Err(CryptoError::InvalidIvLength);
        }
        self.chain.zeroize();
        self.chain[..bs].copy_from_slice(iv);
        self.pending.zeroize();
        self.pending_len = 0;
        Ok(())
    }

    /// Bytes currently buffered awaiting a complete block.
    pub fn pending_len(&self) -> usize {
        self.pending_len
    }

    /// Encrypt a chunk of plaintext, returning the bytes written.
    pub fn encrypt(&mut self, ciphertext: &mut [u8], plaintext: &[u8]) -> Result<usize, CryptoError> {
        self.process(ciphertext, plaintext, true)
    }

    /// Decrypt a chunk of ciphertext, returning the bytes written.
    pub fn decrypt(&mut self, plaintext: &mut [u8], ciphertext: &[u8]) -> Result<usize, CryptoError> {
        self.process(plaintext, ciphertext, false)
    }

    /// Encrypt the final chunk, padding a non-empty remainder to a full
    /// block. Identical padding semantics to
    /// [`Ecb::encrypt_final`](crate::modes::ecb::Ecb::encrypt_final).
    pub fn encrypt_final(
        &mut self,
        ciphertext: &mut [u8],
        plaintext: &[u8],
        padding: Padding,
    ) -> Result<usize, CryptoError> {
        let bs = self.cipher.block_size();
        let total = self.pending_len + plaintext.len();
        let mut need = total / bs * bs;
        if total % bs != 0 && padding != Padding::None {
            need += bs;
        }
        if ciphertext.len() < need {
            return Err(CryptoError::BufferTooSmall {
                need,
                got: ciphertext.len(),
            });
        }

        let mut written = self.process(ciphertext, plaintext, true)?;

        if self.pending_len > 0 && padding != Padding::None {
            let mut block = [0u8; MAX_BLOCK_SIZE];
            block[..self.pending_len].copy_from_slice(&self.pending[..self.pending_len]);
            insert_padding(&mut block[..bs], bs - self.pending_len, padding);
            self.encrypt_chained(&mut block, bs)?;
            ciphertext[written..written + bs].copy_from_slice(&block[..bs]);
            self.pending_len = 0;
            written += bs;
        }
        Ok(written)
    }

    // XOR with the chain, encrypt in place, ciphertext becomes the chain.
    fn encrypt_chained(&mut self, block: &mut [u8; MAX_BLOCK_SIZE], bs: usize) -> Result<(), CryptoError> {
        for (b, c) in block[..bs].iter_mut().zip(self.chain.iter()) {
            *b ^= c;
        }
        self.cipher.encrypt_block(&mut block[..bs])?;
        self.chain[..bs].copy_from_slice(&block[..bs]);
        Ok(())
    }

    fn process(
        &mut self,
        output: &mut [u8],
        input: &[u8],
        encrypting: bool,
    ) -> Result<usize, CryptoError> {
        let bs = self.cipher.block_size();
        let need = (self.pending_len + input.len()) / bs * bs;
        if output.len() < need {
            return Err(CryptoError::BufferTooSmall {
                need,
                got: output.len(),
            });
        }

        let mut block = [0u8; MAX_BLOCK_SIZE];
        let mut in_pos = 0;
        let mut written = 0;

        while self.pending_len + (input.len() - in_pos) >= bs {
            let take = bs - self.pending_len;
            block[..self.pending_len].copy_from_slice(&self.pending[..self.pending_len]);
            block[self.pending_len..bs].copy_from_slice(&input[in_pos..in_pos + take]);
            self.pending_len = 0;
            in_pos += take;

            if encrypting {
                self.encrypt_chained(&mut block, bs)?;
            } else {
                // Keep the ciphertext block: it is the next chaining value.
                let mut ct_block = [0u8; MAX_BLOCK_SIZE];
                ct_block[..bs].copy_from_slice(&block[..bs]);
                self.cipher.decrypt_block(&mut block[..bs])?;
                for (b, c) in block[..bs].iter_mut().zip(self.chain.iter()) {
                    *b ^= c;
                }
                self.chain[..bs].copy_from_slice(&ct_block[..bs]);
            }
            output[written..written + bs].copy_from_slice(&block[..bs]);
            written += bs;
        }

        let rem = input.len() - in_pos;
        self.pending[self.pending_len..self.pending_len + rem]
            .copy_from_slice(&input[in_pos..]);
        self.pending_len += rem;

        Ok(written)
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

    // NIST SP 800-38A F.2.1: CBC-AES128.Encrypt, all four blocks.
    #[test]
    fn cbc_aes128_nist_vector() {
        let key = AesKey::new(&hex_to_bytes("2b7e151628aed2a6abf7158809cf4f3c")).unwrap();
        let iv = hex_to_bytes("000102030405060708090a0b0c0d0e0f");
        let pt = hex_to_bytes(
            "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51\
             30c81c46a35ce411e5fbc1191a0a52eff69f2445df4f9b17ad2b417be66c3710",
        );
        let expected = "7649abac8119b246cee98e9b12e9197d5086cb9b507219ee95db113a917678b2\
                        73bed6b8e3c1743b7116e69e222295163ff1caa1681fac09120eca307586e1a7";

        let mut cbc = Cbc::new(&key, &iv).unwrap();
        let mut ct = vec![0u8; pt.len()];
        assert_eq!(cbc.encrypt(&mut ct, &pt).unwrap(), pt.len());
        assert_eq!(hex(&ct), expected);

        let mut cbc = Cbc::new(&key, &iv).unwrap();
        let mut decrypted = vec![0u8; ct.len()];
        assert_eq!(cbc.decrypt(&mut decrypted, &ct).unwrap(), ct.len());
        assert_eq!(decrypted, pt);
    }

    #[test]
    fn cbc_chunked_equals_one_shot() {
        let key = AesKey::new(&[0x37u8; 16]).unwrap();
        let iv = [0x11u8; 16];
        let pt: Vec<u8> = (0u8..64).collect();

        let mut one_shot = vec![0u8; 64];
        let mut cbc = Cbc::new(&key, &iv).unwrap();
        cbc.encrypt(&mut one_shot, &pt).unwrap();

        let mut streamed = Vec::new();
        let mut cbc = Cbc::new(&key, &iv).unwrap();
        let mut out = [0u8; 16];
        for chunk in pt.chunks(7) {
            let n = cbc.encrypt(&mut out, chunk).unwrap();
            streamed.extend_from_slice(&out[..n]);
        }
        assert_eq!(streamed, one_shot);
    }

    #[test]
    fn cbc_chunked_decrypt_roundtrip() {
        let key = AesKey::new(&[0x99u8; 16]).unwrap();
        let iv = [0x01u8; 16];
        let pt: Vec<u8> = (0u8..48).rev().collect();

        let mut ct = vec![0u8; 48];
        let mut cbc = Cbc::new(&key, &iv).unwrap();
        cbc.encrypt(&mut ct, &pt).unwrap();

        let mut recovered = Vec::new();
        let mut cbc = Cbc::new(&key, &iv).unwrap();
        let mut out = [0u8; 16];
        for chunk in ct.chunks(5) {
            let n = cbc.decrypt(&mut out, chunk).unwrap();
            recovered.extend_from_slice(&out[..n]);
        }
        assert_eq!(recovered, pt);
    }

    #[test]
    fn cbc_padding_number_roundtrip() {
        let key = AesKey::new(&[0x21u8; 16]).unwrap();
        let iv = [0xfeu8; 16];
        let msg = b"attack at dawn";

        let mut ct = [0u8; 16];
        let mut cbc = Cbc::new(&key, &iv).unwrap();
        let n = cbc.encrypt_final(&mut ct, msg, Padding::Number).unwrap();
        assert_eq!(n, 16);

        let mut pt = [0u8; 16];
        let mut cbc = Cbc::new(&key, &iv).unwrap();
        cbc.decrypt(&mut pt, &ct).unwrap();
        assert_eq!(&pt[..14], msg);
        assert_eq!(&pt[14..], &[2, 2]);
    }

    #[test]
    fn cbc_rejects_bad_iv() {
        let key = AesKey::new(&[0u8; 16]).unwrap();
        assert!(matches!(
            Cbc::new(&key, &[0u8; 12]),
            Err(CryptoError::InvalidIvLength)
        ));
    }

    #[test]
    fn reset_restarts_the_chain() {
        let key = AesKey::new(&[0x10u8; 16]).unwrap();
        let iv = [0x20u8; 16];
        let pt = [0x30u8; 16];

        let mut first = [0u8; 16];
        let mut cbc = Cbc::new(&key, &iv).unwrap();
        cbc.encrypt(&mut first, &pt).unwrap();

        let mut second = [0u8; 16];
        cbc.reset(&iv).unwrap();
        cbc.encrypt(&mut second, &pt).unwrap();
        assert_eq!(first, second);
    }
}
