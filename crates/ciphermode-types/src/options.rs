//! Per-stream mode options.
//!
//! These enums replace the flat options bitmask of older mode-of-operation
//! APIs. Stream lifecycle is expressed through the call surface instead:
//! constructing or resetting a context starts a stream, `encrypt`/`decrypt`
//! continue it, and the `*_final`/`finish` methods complete it.

/// Padding applied to a final partial block in ECB and CBC modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// No padding; a partial final block stays buffered in the context.
    #[default]
    None,
    /// Fill the tail with 0x00 bytes.
    Nulls,
    /// A single 0x80 byte followed by 0x00 bytes (a 1 bit then 0 bits).
    OneAndZeros,
    /// Every padding byte holds the padding length (PKCS#7 style).
    Number,
}

/// Width of the wrapping low-order span of a CTR-mode counter.
///
/// The span is treated as a big-endian integer occupying the trailing bytes
/// of the counter block; the remaining high-order bytes are the fixed nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterWidth {
    /// Increment only the low 32 bits.
    Bits32,
    /// Increment only the low 64 bits.
    Bits64,
    /// Increment the whole counter block.
    #[default]
    Full,
}

impl CounterWidth {
    /// Number of counter bytes that participate in the increment, for a
    /// cipher with the given block size.
    pub fn span_bytes(self, block_size: usize) -> usize {
        match self {
            CounterWidth::Bits32 => 4.min(block_size),
            CounterWidth::Bits64 => 8.min(block_size),
            CounterWidth::Full => block_size,
        }
    }
}

/// Feedback segment size for CFB mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CfbSegment {
    /// CFB-1: one bit per cipher invocation.
    Bit,
    /// CFB-8: one byte per cipher invocation.
    Byte,
    /// CFB with a segment the full block size (the usual variant).
    #[default]
    Block,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_span_bytes() {
        assert_eq!(CounterWidth::Bits32.span_bytes(16), 4);
        assert_eq!(CounterWidth::Bits64.span_bytes(16), 8);
        assert_eq!(CounterWidth::Full.span_bytes(16), 16);
        // An 8-byte-block cipher clamps the wider spans.
        assert_eq!(CounterWidth::Bits64.span_bytes(8), 8);
        assert_eq!(CounterWidth::Full.span_bytes(8), 8);
    }

    #[test]
    fn defaults_match_the_common_case() {
        assert_eq!(Padding::default(), Padding::None);
        assert_eq!(CounterWidth::default(), CounterWidth::Full);
        assert_eq!(CfbSegment::default(), CfbSegment::Block);
    }
}
