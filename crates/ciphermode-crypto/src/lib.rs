#![forbid(unsafe_code)]
#![doc = "Block cipher mode-of-operation engine for ciphermode."]
//!
//! This crate layers streaming modes of operation (ECB, CBC, CFB, OFB, CTR,
//! GCM) on top of any block cipher that implements the
//! [`BlockCipher`](provider::BlockCipher) trait. Each mode is a resumable
//! context: data may be fed in arbitrarily sized chunks across multiple
//! calls and the concatenated output is byte-identical to a single-call
//! invocation.
//!
//! Two primitives are bundled behind cargo features so the engine is usable
//! out of the box: software AES (`aes`) and XTEA (`xtea`).

// Core trait
pub mod provider;

// Symmetric cipher primitives
#[cfg(feature = "aes")]
pub mod aes;
#[cfg(feature = "xtea")]
pub mod xtea;

// Modes of operation
pub mod modes;

pub mod cipher {
    //! Unified cipher interface.
    pub use super::provider::BlockCipher;
}
