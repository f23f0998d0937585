//! The arithmetic encoder: interval narrowing plus the three-case
//! renormalization loop.
//!
//! All range arithmetic is exact integer math. Products of the form
//! `range * cumulative` need more than 32 bits, so narrowing works in
//! `u64` and the bounds come back down to `u32` afterwards; the model's
//! `total <= 2^28` bound guarantees the products fit.

use crate::coder::bitio::BitSink;
use crate::coder::{HALF, MAX_CODE, QUARTER, THREE_QUARTERS};
use crate::model::frequency::{FrequencyModel, Symbol};
use crate::utils::error::{CoderError, Result};
use bitvec::prelude::*;

/// Streaming encoder state: the interval bounds and the bit sink.
///
/// One instance per encode pass. Feed every symbol's interval through
/// [`encode_symbol`](Self::encode_symbol), then call
/// [`finish`](Self::finish) exactly once with the EOF interval.
pub struct ArithmeticEncoder {
    low: u32,
    high: u32,
    sink: BitSink,
}

impl ArithmeticEncoder {
    pub fn new() -> Self {
        Self {
            low: 0,
            high: MAX_CODE,
            sink: BitSink::new(),
        }
    }

    /// Narrows the interval to the symbol's sub-range and renormalizes.
    pub fn encode_symbol(&mut self, cumulative: u32, frequency: u32, total: u32) {
        self.narrow(cumulative, frequency, total);
        self.renormalize();
    }

    /// Performs the terminating EOF narrowing and emits the final
    /// disambiguating bit, returning the accumulated bit sequence.
    pub fn finish(mut self, eof_cumulative: u32, eof_frequency: u32, total: u32) -> BitVec<u8, Msb0> {
        self.narrow(eof_cumulative, eof_frequency, total);
        self.renormalize();

        // One more deferred bit so any outstanding straddles flush with
        // the correct polarity.
        self.sink.defer();
        self.sink.emit(self.low >= QUARTER);
        self.sink.into_bits()
    }

    fn narrow(&mut self, cumulative: u32, frequency: u32, total: u32) {
        let low = self.low as u64;
        // range is 2^32 at initialization, hence u64 throughout
        let range = self.high as u64 - low + 1;
        let total = total as u64;
        self.high = (low + range * (cumulative as u64 + frequency as u64) / total - 1) as u32;
        self.low = (low + range * cumulative as u64 / total) as u32;
    }

    fn renormalize(&mut self) {
        loop {
            if self.high < HALF {
                // Top bit settled at 0
                self.sink.emit(false);
                self.low <<= 1;
                self.high = (self.high << 1) | 1;
            } else if self.low >= HALF {
                // Top bit settled at 1
                self.sink.emit(true);
                self.low = (self.low - HALF) << 1;
                self.high = ((self.high - HALF) << 1) | 1;
            } else if self.low >= QUARTER && self.high < THREE_QUARTERS {
                // Straddle: the decision is deferred until a future shift
                self.sink.defer();
                self.low = (self.low - QUARTER) << 1;
                self.high = ((self.high - QUARTER) << 1) | 1;
            } else {
                break;
            }
        }
    }
}

impl Default for ArithmeticEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a frequency model from `text` and encodes the whole sequence,
/// including the terminating EOF step.
pub fn encode(text: &str) -> Result<(FrequencyModel, BitVec<u8, Msb0>)> {
    let model = FrequencyModel::build(text)?;
    let total = model.total();

    let mut encoder = ArithmeticEncoder::new();
    for ch in text.chars() {
        let record = model.lookup(Symbol::Char(ch)).ok_or_else(|| {
            CoderError::corrupt(format!("symbol {ch:?} missing from the model"))
        })?;
        encoder.encode_symbol(record.cumulative, record.frequency, total);
    }

    let eof = *model.eof();
    let bits = encoder.finish(eof.cumulative, eof.frequency, total);
    Ok((model, bits))
}
