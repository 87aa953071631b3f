//! Block cipher modes of operation.
//!
//! Streaming implementations of ECB, CBC, CFB (1-bit/8-bit/block-size),
//! OFB, CTR, and GCM on top of any primitive implementing the
//! [`BlockCipher`](crate::provider::BlockCipher) trait. Every mode is a
//! resumable context: input may arrive in arbitrarily sized chunks across
//! calls, and the concatenated output matches a single-call invocation
//! byte for byte.

pub mod cbc;
pub mod cfb;
pub mod ctr;
pub mod ecb;
pub mod gcm;
pub mod ofb;
pub mod padding;

mod keystream;

pub use keystream::KeyStream;
