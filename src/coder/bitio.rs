//! Bit-level buffers for the coding loops.
//!
//! `BitSink` is the encoder's append-only accumulator and owns the
//! pending-bit counter used to resolve deferred straddle decisions.
//! `BitSource` is the decoder's positional reader; past the end of the
//! stream it yields zeros, which is how the decoder tracks the encoder's
//! bit consumption without a separate exhaustion flag.

use bitvec::prelude::*;

/// Append-only bit accumulator with carry (pending-bit) propagation.
#[derive(Debug, Default)]
pub struct BitSink {
    bits: BitVec<u8, Msb0>,
    pending: u32,
}

impl BitSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bit`, then `pending` copies of its complement, and resets
    /// the pending counter. The complemented copies are the deferred
    /// straddle decisions, which always resolve opposite to the next
    /// definite bit.
    pub fn emit(&mut self, bit: bool) {
        self.bits.push(bit);
        for _ in 0..self.pending {
            self.bits.push(!bit);
        }
        self.pending = 0;
    }

    /// Defers one bit decision until the next `emit`.
    pub fn defer(&mut self) {
        self.pending += 1;
    }

    /// Number of deferred bits not yet resolved.
    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// Number of bits emitted so far.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Consumes the sink, returning the accumulated bit sequence.
    pub fn into_bits(self) -> BitVec<u8, Msb0> {
        self.bits
    }
}

/// Positional reader over an encoded bit sequence.
#[derive(Debug)]
pub struct BitSource<'a> {
    bits: &'a BitSlice<u8, Msb0>,
    position: usize,
}

impl<'a> BitSource<'a> {
    pub fn new(bits: &'a BitSlice<u8, Msb0>) -> Self {
        Self { bits, position: 0 }
    }

    /// Returns the next input bit, or `false` once the stream is
    /// exhausted. The position keeps advancing either way so the decoder
    /// stays aligned with the encoder's bit count.
    pub fn next_bit(&mut self) -> bool {
        let bit = self.bits.get(self.position).map(|b| *b).unwrap_or(false);
        self.position += 1;
        bit
    }

    /// Bits consumed so far, including zero-fill past the end.
    pub fn position(&self) -> usize {
        self.position
    }
}
