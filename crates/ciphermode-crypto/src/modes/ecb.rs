//! ECB (Electronic Codebook) mode of operation.
//!
//! **Security warning**: ECB mode does not provide semantic security and
//! should generally not be used. It is provided for completeness and
//! specific low-level use cases only.

use ciphermode_types::{CryptoError, Padding};
use zeroize::Zeroize;

use crate::modes::padding::insert_padding;
use crate::provider::{BlockCipher, MAX_BLOCK_SIZE};

/// Streaming ECB context.
///
/// Input of any length is accepted; complete blocks are processed
/// immediately and a partial tail (always shorter than one block) is cached
/// until the next call. Output is produced in whole blocks only; each call
/// returns the number of bytes it wrote.
pub struct Ecb<'c, C: BlockCipher> {
    cipher: &'c C,
    pending: [u8; MAX_BLOCK_SIZE],
    pending_len: usize,
}

impl<C: BlockCipher> Drop for Ecb<'_, C> {
    fn drop(&mut self) {
        self.pending.zeroize();
    }
}

impl<'c, C: BlockCipher> Ecb<'c, C> {
    /// Create a context for a new stream.
    pub fn new(cipher: &'c C) -> Result<Self, CryptoError> {
        if cipher.block_size() == 0 || cipher.block_size() > MAX_BLOCK_SIZE {
            return Err(CryptoError::UnsupportedBlockSize);
        }
        Ok(Self {
            cipher,
            pending: [0u8; MAX_BLOCK_SIZE],
            pending_len: 0,
        })
    }

    /// Discard buffered input and start a fresh stream.
    pub fn reset(&mut self) {
        self.pending.zeroize();
        self.pending_len = 0;
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

    /// Encrypt the final chunk of a stream.
    ///
    /// After consuming `plaintext`, a non-empty cached remainder is padded
    /// out to a full block with `padding` and emitted. With
    /// [`Padding::None`] (or an empty remainder) no padding block is
    /// produced and any remainder stays buffered.
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
            self.cipher.encrypt_block(&mut block[..bs])?;
            ciphertext[written..written + bs].copy_from_slice(&block[..bs]);
            self.pending_len = 0;
            written += bs;
        }
        Ok(written)
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
                self.cipher.encrypt_block(&mut block[..bs])?;
            } else {
                self.cipher.decrypt_block(&mut block[..bs])?;
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

    // NIST SP 800-38A F.1.1: ECB-AES128.Encrypt, all four blocks.
    #[test]
    fn ecb_aes128_nist_vector() {
        let key = AesKey::new(&hex_to_bytes("2b7e151628aed2a6abf7158809cf4f3c")).unwrap();
        let pt = hex_to_bytes(
            "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51\
             30c81c46a35ce411e5fbc1191a0a52eff69f2445df4f9b17ad2b417be66c3710",
        );
        let expected = "3ad77bb40d7a3660a89ecaf32466ef97f5d3d58503b9699de785895a96fdbaaf\
                        43b1cd7f598ece23881b00e3ed0306887b0c785e27e8ad3f8223207104725dd4";

        let mut ecb = Ecb::new(&key).unwrap();
        let mut ct = vec![0u8; pt.len()];
        let n = ecb.encrypt(&mut ct, &pt).unwrap();
        assert_eq!(n, pt.len());
        assert_eq!(hex(&ct), expected);

        let mut ecb = Ecb::new(&key).unwrap();
        let mut decrypted = vec![0u8; ct.len()];
        let n = ecb.decrypt(&mut decrypted, &ct).unwrap();
        assert_eq!(n, ct.len());
        assert_eq!(decrypted, pt);
    }

    // Byte-at-a-time streaming must equal the one-shot result.
    #[test]
    fn ecb_chunked_equals_one_shot() {
        let key = AesKey::new(&[0x42u8; 16]).unwrap();
        let pt: Vec<u8> = (0u8..48).collect();

        let mut one_shot = vec![0u8; 48];
        let mut ecb = Ecb::new(&key).unwrap();
        ecb.encrypt(&mut one_shot, &pt).unwrap();

        let mut streamed = Vec::new();
        let mut ecb = Ecb::new(&key).unwrap();
        let mut out = [0u8; 16];
        for &b in &pt {
            let n = ecb.encrypt(&mut out, &[b]).unwrap();
            streamed.extend_from_slice(&out[..n]);
        }
        assert_eq!(streamed, one_shot);
    }

    #[test]
    fn short_input_is_buffered_without_output() {
        let key = AesKey::new(&[0u8; 16]).unwrap();
        let mut ecb = Ecb::new(&key).unwrap();
        let mut out = [0u8; 16];
        assert_eq!(ecb.encrypt(&mut out, &[1, 2, 3]).unwrap(), 0);
        assert_eq!(ecb.pending_len(), 3);
        // 13 more bytes complete the block.
        assert_eq!(ecb.encrypt(&mut out, &[0u8; 13]).unwrap(), 16);
        assert_eq!(ecb.pending_len(), 0);
    }

    #[test]
    fn final_call_pads_the_remainder() {
        let key = AesKey::new(&[0u8; 16]).unwrap();
        let mut ecb = Ecb::new(&key).unwrap();
        let mut ct = [0u8; 32];
        let n = ecb
            .encrypt_final(&mut ct, &[0xaa; 20], Padding::Number)
            .unwrap();
        assert_eq!(n, 32);

        // The second block decrypts to the 4 data bytes plus 12 bytes of 12.
        let mut dec = Ecb::new(&key).unwrap();
        let mut pt = [0u8; 32];
        dec.decrypt(&mut pt, &ct).unwrap();
        assert_eq!(&pt[..20], &[0xaa; 20]);
        assert!(pt[20..].iter().all(|&b| b == 12));
    }

    #[test]
    fn aligned_final_call_emits_no_padding_block() {
        let key = AesKey::new(&[0u8; 16]).unwrap();
        let mut ecb = Ecb::new(&key).unwrap();
        let mut ct = [0u8; 32];
        let n = ecb
            .encrypt_final(&mut ct, &[0x55; 16], Padding::Number)
            .unwrap();
        assert_eq!(n, 16);
    }

    #[test]
    fn pad_none_keeps_the_remainder_buffered() {
        let key = AesKey::new(&[0u8; 16]).unwrap();
        let mut ecb = Ecb::new(&key).unwrap();
        let mut ct = [0u8; 16];
        let n = ecb.encrypt_final(&mut ct, &[1, 2, 3], Padding::None).unwrap();
        assert_eq!(n, 0);
        assert_eq!(ecb.pending_len(), 3);
    }

    #[test]
    fn reset_starts_a_new_stream() {
        let key = AesKey::new(&[0u8; 16]).unwrap();
        let mut ecb = Ecb::new(&key).unwrap();
        let mut out = [0u8; 16];
        ecb.encrypt(&mut out, &[9, 9, 9]).unwrap();
        ecb.reset();
        assert_eq!(ecb.pending_len(), 0);
    }

    #[test]
    fn undersized_output_is_rejected() {
        let key = AesKey::new(&[0u8; 16]).unwrap();
        let mut ecb = Ecb::new(&key).unwrap();
        let mut out = [0u8; 8];
        assert!(matches!(
            ecb.encrypt(&mut out, &[0u8; 16]),
            Err(CryptoError::BufferTooSmall { need: 16, got: 8 })
        ));
    }
}
