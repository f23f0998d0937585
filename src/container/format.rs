// src/container/format.rs

//! The self-describing container format.
//!
//! A container holds, in order: the original symbol count (u32 BE), the
//! encoded bit count (u32 BE), the padding bit count (u8), the
//! length-prefixed frequency table, the length-prefixed cumulative table,
//! the frequency total (u32 BE), and the packed payload bytes. Every
//! integer field is fixed-width big-endian; decoding needs nothing but
//! the container itself.

use crate::model::frequency::{FrequencyModel, Symbol};
use crate::utils::error::{CoderError, Result};
use bitvec::prelude::*;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

const TAG_EOF: u8 = 0;
const TAG_CHAR: u8 = 1;

/// A parsed container: header fields, the restored model, and the packed
/// payload still in byte form.
#[derive(Debug)]
pub struct Container {
    pub symbol_count: u32,
    pub bit_count: u32,
    pub padding: u8,
    pub model: FrequencyModel,
    pub payload: Vec<u8>,
}

impl Container {
    /// Expands the payload back into the encoded bit sequence.
    pub fn bits(&self) -> Result<BitVec<u8, Msb0>> {
        unpack(&self.payload, self.bit_count as usize)
    }
}

/// Right-pads `bits` with zeros to a byte boundary and packs them
/// MSB-first. The padding length (0-7) is returned separately because it
/// cannot be recovered from the bytes alone.
pub fn pack(bits: &BitSlice<u8, Msb0>) -> (Vec<u8>, u8) {
    let padding = ((8 - bits.len() % 8) % 8) as u8;
    let mut padded = bits.to_bitvec();
    padded.resize(bits.len() + padding as usize, false);
    padded.set_uninitialized(false);
    (padded.into_vec(), padding)
}

/// Expands `bytes` MSB-first and truncates to `bit_count`, discarding the
/// encoder's zero padding.
pub fn unpack(bytes: &[u8], bit_count: usize) -> Result<BitVec<u8, Msb0>> {
    let mut bits = BitVec::<u8, Msb0>::from_slice(bytes);
    if bit_count > bits.len() {
        return Err(CoderError::corrupt(format!(
            "declared bit count {} exceeds the {}-bit payload",
            bit_count,
            bits.len()
        )));
    }
    bits.truncate(bit_count);
    Ok(bits)
}

/// Serializes a symbol-to-count table deterministically: entry count
/// (u32 BE), then per entry a tag byte (0 = EOF, 1 = char), the char's
/// code point (u32 BE, char entries only), and the count (u32 BE).
pub fn serialize_table(entries: &[(Symbol, u32)]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + entries.len() * 9);
    out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for &(symbol, count) in entries {
        match symbol {
            Symbol::Eof => out.push(TAG_EOF),
            Symbol::Char(ch) => {
                out.push(TAG_CHAR);
                out.extend_from_slice(&(ch as u32).to_be_bytes());
            }
        }
        out.extend_from_slice(&count.to_be_bytes());
    }
    out
}

/// Parses a table produced by [`serialize_table`].
pub fn deserialize_table(bytes: &[u8]) -> Result<Vec<(Symbol, u32)>> {
    let mut cursor = io::Cursor::new(bytes);
    let entry_count = field(cursor.read_u32::<BigEndian>(), "table entry count")?;

    let mut entries = Vec::with_capacity(entry_count as usize);
    for index in 0..entry_count {
        let tag = field(cursor.read_u8(), "table entry tag")?;
        let symbol = match tag {
            TAG_EOF => Symbol::Eof,
            TAG_CHAR => {
                let code = field(cursor.read_u32::<BigEndian>(), "table code point")?;
                let ch = char::from_u32(code).ok_or_else(|| {
                    CoderError::corrupt(format!("invalid code point {code:#x} in table"))
                })?;
                Symbol::Char(ch)
            }
            other => {
                return Err(CoderError::corrupt(format!(
                    "unknown symbol tag {other} at table entry {index}"
                )));
            }
        };
        let count = field(cursor.read_u32::<BigEndian>(), "table count")?;
        entries.push((symbol, count));
    }

    if cursor.position() != bytes.len() as u64 {
        return Err(CoderError::corrupt(format!(
            "{} trailing bytes after table entries",
            bytes.len() as u64 - cursor.position()
        )));
    }
    Ok(entries)
}

/// Assembles a complete container onto `writer`.
pub fn write_container<W: Write>(
    writer: &mut W,
    symbol_count: u32,
    bits: &BitSlice<u8, Msb0>,
    model: &FrequencyModel,
) -> Result<()> {
    let bit_count = u32::try_from(bits.len()).map_err(|_| {
        CoderError::corrupt(format!(
            "encoded stream of {} bits does not fit the 32-bit length field",
            bits.len()
        ))
    })?;
    let (payload, padding) = pack(bits);

    writer.write_u32::<BigEndian>(symbol_count)?;
    writer.write_u32::<BigEndian>(bit_count)?;
    writer.write_u8(padding)?;

    let freq_table = serialize_table(&model.frequencies().collect::<Vec<_>>());
    writer.write_u32::<BigEndian>(freq_table.len() as u32)?;
    writer.write_all(&freq_table)?;

    let cum_table = serialize_table(&model.cumulatives().collect::<Vec<_>>());
    writer.write_u32::<BigEndian>(cum_table.len() as u32)?;
    writer.write_all(&cum_table)?;

    writer.write_u32::<BigEndian>(model.total())?;
    writer.write_all(&payload)?;
    Ok(())
}

/// Disassembles a container from `reader`, restoring the model from its
/// serialized tables and validating every declared length.
pub fn read_container<R: Read>(reader: &mut R) -> Result<Container> {
    let symbol_count = field(reader.read_u32::<BigEndian>(), "symbol count")?;
    let bit_count = field(reader.read_u32::<BigEndian>(), "bit count")?;
    let padding = field(reader.read_u8(), "padding count")?;
    if padding >= 8 {
        return Err(CoderError::corrupt(format!(
            "padding count {padding} out of range"
        )));
    }
    if (bit_count as u64 + padding as u64) % 8 != 0 {
        return Err(CoderError::corrupt(format!(
            "padding count {padding} does not complete bit count {bit_count} to a byte boundary"
        )));
    }

    let freq_table = read_length_prefixed(reader, "frequency table")?;
    let frequencies = deserialize_table(&freq_table)?;

    let cum_table = read_length_prefixed(reader, "cumulative table")?;
    let cumulatives = deserialize_table(&cum_table)?;

    let total = field(reader.read_u32::<BigEndian>(), "frequency total")?;
    let model = FrequencyModel::from_tables(&frequencies, &cumulatives, total)?;

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    if payload.len() as u64 * 8 != bit_count as u64 + padding as u64 {
        return Err(CoderError::corrupt(format!(
            "payload is {} bytes but header declares {} bits plus {} padding",
            payload.len(),
            bit_count,
            padding
        )));
    }

    Ok(Container {
        symbol_count,
        bit_count,
        padding,
        model,
        payload,
    })
}

fn read_length_prefixed<R: Read>(reader: &mut R, name: &str) -> Result<Vec<u8>> {
    let len = field(reader.read_u32::<BigEndian>(), name)? as usize;
    let mut buf = vec![0u8; len];
    field(reader.read_exact(&mut buf), name)?;
    Ok(buf)
}

// Maps a truncated read to CorruptStream naming the field; other I/O
// failures propagate as-is.
fn field<T>(result: io::Result<T>, name: &str) -> Result<T> {
    result.map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            CoderError::corrupt(format!("truncated {name}"))
        } else {
            CoderError::Io(err)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coder::encoder::encode;

    fn bitvec_of_len(len: usize) -> BitVec<u8, Msb0> {
        // Alternating pattern so packing mistakes show up
        (0..len).map(|i| i % 3 == 0).collect()
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        for len in [0usize, 1, 7, 8, 9, 64] {
            let bits = bitvec_of_len(len);
            let (bytes, padding) = pack(&bits);
            assert_eq!((bits.len() + padding as usize) % 8, 0);
            assert!(padding < 8);
            assert_eq!(unpack(&bytes, len).unwrap(), bits, "length {len}");
        }
    }

    #[test]
    fn test_pack_is_msb_first() {
        let bits = bits![u8, Msb0; 1, 0, 1].to_bitvec();
        let (bytes, padding) = pack(&bits);
        assert_eq!(bytes, vec![0b1010_0000]);
        assert_eq!(padding, 5);
    }

    #[test]
    fn test_unpack_rejects_overlong_bit_count() {
        assert!(matches!(
            unpack(&[0xFF], 9),
            Err(CoderError::CorruptStream { .. })
        ));
    }

    #[test]
    fn test_table_round_trip() {
        let model = FrequencyModel::build("hello, world! ёж").unwrap();
        let bytes = serialize_table(&model.frequencies().collect::<Vec<_>>());
        let entries = deserialize_table(&bytes).unwrap();
        assert_eq!(entries, model.frequencies().collect::<Vec<_>>());
    }

    #[test]
    fn test_table_rejects_unknown_tag() {
        let mut bytes = 1u32.to_be_bytes().to_vec();
        bytes.push(7); // no such tag
        bytes.extend_from_slice(&1u32.to_be_bytes());
        assert!(matches!(
            deserialize_table(&bytes),
            Err(CoderError::CorruptStream { .. })
        ));
    }

    #[test]
    fn test_table_rejects_trailing_garbage() {
        let model = FrequencyModel::build("abc").unwrap();
        let mut bytes = serialize_table(&model.frequencies().collect::<Vec<_>>());
        bytes.push(0);
        assert!(matches!(
            deserialize_table(&bytes),
            Err(CoderError::CorruptStream { .. })
        ));
    }

    #[test]
    fn test_container_round_trip() {
        let text = "to be or not to be\n";
        let (model, bits) = encode(text).unwrap();
        let mut buf = Vec::new();
        write_container(&mut buf, text.chars().count() as u32, &bits, &model).unwrap();

        let container = read_container(&mut buf.as_slice()).unwrap();
        assert_eq!(container.symbol_count as usize, text.chars().count());
        assert_eq!(container.bit_count as usize, bits.len());
        assert_eq!(container.model, model);
        assert_eq!(container.bits().unwrap(), bits);
    }

    #[test]
    fn test_truncated_container_names_the_field() {
        let (model, bits) = encode("AAAB").unwrap();
        let mut buf = Vec::new();
        write_container(&mut buf, 4, &bits, &model).unwrap();

        let err = read_container(&mut buf[..6].as_ref()).unwrap_err();
        match err {
            CoderError::CorruptStream { detail } => {
                assert!(detail.contains("bit count"), "unexpected detail: {detail}")
            }
            other => panic!("expected CorruptStream, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_size_mismatch_is_rejected() {
        let (model, bits) = encode("AAAB").unwrap();
        let mut buf = Vec::new();
        write_container(&mut buf, 4, &bits, &model).unwrap();
        buf.push(0); // extra payload byte

        assert!(matches!(
            read_container(&mut buf.as_slice()),
            Err(CoderError::CorruptStream { .. })
        ));
    }
}
