//! CFB (Cipher Feedback) mode of operation.
//!
//! Three segment sizes are supported, selected at construction: 1 bit
//! (CFB-1), 8 bits (CFB-8), and the cipher's full block size (the usual
//! variant). All three turn the block cipher into a self-synchronizing
//! stream cipher; the feedback register always advances with ciphertext,
//! so encryption and decryption differ only in which side of the XOR is
//! fed back.

use ciphermode_types::{CfbSegment, CryptoError};
use zeroize::Zeroize;

use crate::provider::{BlockCipher, MAX_BLOCK_SIZE};

/// Streaming CFB context.
pub struct Cfb<'c, C: BlockCipher> {
    cipher: &'c C,
    segment: CfbSegment,
    /// Feedback register. For the block-size segment it is encrypted in
    /// place and doubles as the keystream buffer.
    register: [u8; MAX_BLOCK_SIZE],
    /// Block-size segment only: keystream bytes consumed from the
    /// register; `block_size` means the register must be re-encrypted.
    used: usize,
}

impl<C: BlockCipher> Drop for Cfb<'_, C> {
    fn drop(&mut self) {
        self.register.zeroize();
    }
}

// Read bit `idx` of a bit string packed MSB-first, where a partial final
// byte keeps its bits right-aligned (in the low positions).
fn get_bit(data: &[u8], idx: usize, total_bits: usize) -> bool {
    let byte = idx / 8;
    let in_byte = (total_bits - byte * 8).min(8);
    let shift = in_byte - 1 - idx % 8;
    data[byte] >> shift & 1 != 0
}

fn put_bit(data: &mut [u8], idx: usize, total_bits: usize, bit: bool) {
    let byte = idx / 8;
    let in_byte = (total_bits - byte * 8).min(8);
    let shift = in_byte - 1 - idx % 8;
    if bit {
        data[byte] |= 1 << shift;
    } else {
        data[byte] &= !(1 << shift);
    }
}

impl<'c, C: BlockCipher> Cfb<'c, C> {
    /// Create a context with the stream's IV and feedback segment size.
    pub fn new(cipher: &'c C, iv: &[u8], segment: CfbSegment) -> Result<Self, CryptoError> {
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
            segment,
            register,
            used: bs,
        })
    }

    /// Restart the context for a new stream under a fresh IV.
    pub fn reset(&mut self, iv: &[u8]) -> Result<(), CryptoError> {
        let bs = self.cipher.block_size();
        if iv.len() != bs {
            return Err(CryptoError::InvalidIvLength);
        }
        self.register.zeroize();
        self.register[..bs].copy_from_slice(iv);
        self.used = bs;
        Ok(())
    }

    /// Encrypt a chunk of plaintext. Output length equals input length.
    pub fn encrypt(&mut self, ciphertext: &mut [u8], plaintext: &[u8]) -> Result<(), CryptoError> {
        match self.segment {
            CfbSegment::Bit => self.crypt_bits(ciphertext, plaintext, plaintext.len() * 8, true),
            CfbSegment::Byte => self.crypt_bytes(ciphertext, plaintext, true),
            CfbSegment::Block => self.crypt_block_segment(ciphertext, plaintext, true),
        }
    }

    /// Decrypt a chunk of ciphertext. Output length equals input length.
    pub fn decrypt(&mut self, plaintext: &mut [u8], ciphertext: &[u8]) -> Result<(), CryptoError> {
        match self.segment {
            CfbSegment::Bit => self.crypt_bits(plaintext, ciphertext, ciphertext.len() * 8, false),
            CfbSegment::Byte => self.crypt_bytes(plaintext, ciphertext, false),
            CfbSegment::Block => self.crypt_block_segment(plaintext, ciphertext, false),
        }
    }

    /// CFB-1 only: encrypt a bit string.
    ///
    /// Bits are taken MSB-first; a final byte holding fewer than eight
    /// bits keeps them right-aligned, in both input and output.
    pub fn encrypt_bits(
        &mut self,
        ciphertext: &mut [u8],
        plaintext: &[u8],
        num_bits: usize,
    ) -> Result<(), CryptoError> {
        if self.segment != CfbSegment::Bit {
            return Err(CryptoError::InvalidArg);
        }
        self.crypt_bits(ciphertext, plaintext, num_bits, true)
    }

    /// CFB-1 only: decrypt a bit string. See [`Cfb::encrypt_bits`].
    pub fn decrypt_bits(
        &mut self,
        plaintext: &mut [u8],
        ciphertext: &[u8],
        num_bits: usize,
    ) -> Result<(), CryptoError> {
        if self.segment != CfbSegment::Bit {
            return Err(CryptoError::InvalidArg);
        }
        self.crypt_bits(plaintext, ciphertext, num_bits, false)
    }

    fn crypt_bits(
        &mut self,
        output: &mut [u8],
        input: &[u8],
        num_bits: usize,
        encrypting: bool,
    ) -> Result<(), CryptoError> {
        let bs = self.cipher.block_size();
        let num_bytes = num_bits.div_ceil(8);
        if input.len() < num_bytes {
            return Err(CryptoError::InvalidArg);
        }
        if output.len() < num_bytes {
            return Err(CryptoError::BufferTooSmall {
                need: num_bytes,
                got: output.len(),
            });
        }
        output[..num_bytes].fill(0);

        let mut keystream = [0u8; MAX_BLOCK_SIZE];
        for idx in 0..num_bits {
            keystream[..bs].copy_from_slice(&self.register[..bs]);
            self.cipher.encrypt_block(&mut keystream[..bs])?;

            let in_bit = get_bit(input, idx, num_bits);
            let out_bit = in_bit ^ (keystream[0] & 0x80 != 0);
            put_bit(output, idx, num_bits, out_bit);

            // Shift the register left one bit; the ciphertext bit enters
            // at the low end.
            let cipher_bit = if encrypting { out_bit } else { in_bit };
            for i in 0..bs - 1 {
                self.register[i] = self.register[i] << 1 | self.register[i + 1] >> 7;
            }
            self.register[bs - 1] = self.register[bs - 1] << 1 | cipher_bit as u8;
        }
        Ok(())
    }

    fn crypt_bytes(
        &mut self,
        output: &mut [u8],
        input: &[u8],
        encrypting: bool,
    ) -> Result<(), CryptoError> {
        let bs = self.cipher.block_size();
        if output.len() < input.len() {
            return Err(CryptoError::BufferTooSmall {
                need: input.len(),
                got: output.len(),
            });
        }

        let mut keystream = [0u8; MAX_BLOCK_SIZE];
        for (o, &b) in output.iter_mut().zip(input.iter()) {
            keystream[..bs].copy_from_slice(&self.register[..bs]);
            self.cipher.encrypt_block(&mut keystream[..bs])?;

            *o = b ^ keystream[0];
            let cipher_byte = if encrypting { *o } else { b };

            self.register.copy_within(1..bs, 0);
            self.register[bs - 1] = cipher_byte;
        }
        Ok(())
    }

    fn crypt_block_segment(
        &mut self,
        output: &mut [u8],
        input: &[u8],
        encrypting: bool,
    ) -> Result<(), CryptoError> {
        let bs = self.cipher.block_size();
        if output.len() < input.len() {
            return Err(CryptoError::BufferTooSmall {
                need: input.len(),
                got: output.len(),
            });
        }

        for (o, &b) in output.iter_mut().zip(input.iter()) {
            if self.used == bs {
                self.cipher.encrypt_block(&mut self.register[..bs])?;
                self.used = 0;
            }
            *o = b ^ self.register[self.used];
            // Replace the consumed keystream byte with the ciphertext byte;
            // once the register holds a full ciphertext block it is
            // re-encrypted.
            self.register[self.used] = if encrypting { *o } else { b };
            self.used += 1;
        }
        Ok(())
    }
}
