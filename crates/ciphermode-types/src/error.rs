/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    // General errors
    #[error("invalid argument")]
    InvalidArg,
    #[error("invalid key")]
    InvalidKey,
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid iv length")]
    InvalidIvLength,
    #[error("invalid tag length")]
    InvalidTagLength,
    #[error("block size not supported by this mode")]
    UnsupportedBlockSize,

    // Buffer errors
    #[error("buffer length not enough: need {need}, got {got}")]
    BufferTooSmall { need: usize, got: usize },

    // Keystream errors
    #[error("key stream buffer has no space for another block")]
    KeyStreamOutOfSpace,

    // Counter errors
    #[error("counter has cycled back to its initial value")]
    CounterExpired,

    // Authentication errors
    #[error("authentication tag verification failed")]
    InvalidAuthentication,
}
