//! The arithmetic decoder.
//!
//! The renormalization conditions and bound transformations here must be
//! bit-identical to the encoder's; the decoder additionally shifts a
//! `value` register through the same window, pulling one input bit per
//! shift. Any divergence desynchronizes the bounds and every symbol
//! after it decodes as garbage.

use crate::coder::bitio::BitSource;
use crate::coder::{CODE_VALUE_BITS, HALF, MAX_CODE, QUARTER, THREE_QUARTERS};
use crate::model::frequency::{FrequencyModel, Symbol};
use crate::utils::error::{CoderError, Result};
use bitvec::prelude::*;

/// Decoder state: interval bounds, the value register, and the bit source.
pub struct ArithmeticDecoder<'a> {
    low: u32,
    high: u32,
    value: u32,
    source: BitSource<'a>,
}

impl<'a> ArithmeticDecoder<'a> {
    /// Loads the value register with the first 32 input bits,
    /// zero-extended when the stream is shorter.
    pub fn new(bits: &'a BitSlice<u8, Msb0>) -> Self {
        let mut source = BitSource::new(bits);
        let mut value = 0u32;
        for _ in 0..CODE_VALUE_BITS {
            value = (value << 1) | source.next_bit() as u32;
        }
        Self {
            low: 0,
            high: MAX_CODE,
            value,
            source,
        }
    }

    /// Decodes up to `count` symbols from the stream.
    ///
    /// Hitting the EOF symbol ends decoding immediately, even before
    /// `count` symbols were produced; the caller decides whether a short
    /// result matters. A scaled value no record claims means the stream
    /// (or the model) is corrupt.
    pub fn decode_all(&mut self, model: &FrequencyModel, count: usize) -> Result<String> {
        let total = model.total() as u64;
        let mut output = String::new();
        let mut produced = 0usize;

        while produced < count {
            let range = self.high as u64 - self.low as u64 + 1;
            let scaled = ((self.value as u64 - self.low as u64 + 1) * total - 1) / range;

            let record = *model.locate(scaled).ok_or_else(|| {
                CoderError::corrupt(format!(
                    "no symbol covers scaled value {scaled} (total {total})"
                ))
            })?;

            match record.symbol {
                Symbol::Eof => break,
                Symbol::Char(ch) => output.push(ch),
            }
            produced += 1;

            self.narrow(record.cumulative, record.frequency, model.total());
            self.renormalize();
        }

        Ok(output)
    }

    // Identical to the encoder's narrowing step.
    fn narrow(&mut self, cumulative: u32, frequency: u32, total: u32) {
        let low = self.low as u64;
        let range = self.high as u64 - low + 1;
        let total = total as u64;
        self.high = (low + range * (cumulative as u64 + frequency as u64) / total - 1) as u32;
        self.low = (low + range * cumulative as u64 / total) as u32;
    }

    // The encoder's three renormalization cases, shifting `value` in
    // lockstep instead of emitting bits.
    fn renormalize(&mut self) {
        loop {
            if self.high < HALF {
                // no offset to remove
            } else if self.low >= HALF {
                self.low -= HALF;
                self.high -= HALF;
                self.value -= HALF;
            } else if self.low >= QUARTER && self.high < THREE_QUARTERS {
                self.low -= QUARTER;
                self.high -= QUARTER;
                self.value -= QUARTER;
            } else {
                break;
            }
            self.low <<= 1;
            self.high = (self.high << 1) | 1;
            self.value = (self.value << 1) | self.source.next_bit() as u32;
        }
    }
}

/// Decodes `count` symbols from `bits` using a previously built or
/// restored model.
pub fn decode(bits: &BitSlice<u8, Msb0>, model: &FrequencyModel, count: usize) -> Result<String> {
    if bits.is_empty() || count == 0 {
        return Ok(String::new());
    }
    ArithmeticDecoder::new(bits).decode_all(model, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::encoder::encode;

    #[test]
    fn test_round_trip_aaab() {
        let (model, bits) = encode("AAAB").unwrap();
        assert_eq!(decode(&bits, &model, 4).unwrap(), "AAAB");
    }

    #[test]
    fn test_round_trip_single_symbol() {
        let (model, bits) = encode("A").unwrap();
        assert_eq!(decode(&bits, &model, 1).unwrap(), "A");
    }

    #[test]
    fn test_round_trip_mixed_text() {
        let text = "the rain in spain\nfalls mainly on the plain\n";
        let (model, bits) = encode(text).unwrap();
        assert_eq!(decode(&bits, &model, text.chars().count()).unwrap(), text);
    }

    #[test]
    fn test_round_trip_non_ascii() {
        let text = "привет, мир! ёжик 🦔";
        let (model, bits) = encode(text).unwrap();
        assert_eq!(decode(&bits, &model, text.chars().count()).unwrap(), text);
    }

    #[test]
    fn test_zero_count_returns_empty() {
        let (model, bits) = encode("AAAB").unwrap();
        assert_eq!(decode(&bits, &model, 0).unwrap(), "");
    }

    #[test]
    fn test_overlong_count_stops_at_eof() {
        let (model, bits) = encode("AAAB").unwrap();
        // Asking for more symbols than were encoded ends at EOF with the
        // original four.
        assert_eq!(decode(&bits, &model, 100).unwrap(), "AAAB");
    }

    #[test]
    fn test_mismatched_model_does_not_panic() {
        let (_, bits) = encode("AAAB").unwrap();
        let other = FrequencyModel::build("zzzz").unwrap();
        // Decoding against the wrong model may produce wrong symbols or
        // an error, but must stay in bounds.
        let _ = decode(&bits, &other, 4);
    }
}
