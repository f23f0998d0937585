//! File-level compress/decompress pipeline.
//!
//! I/O happens only here, at the container boundary; the coding passes
//! themselves run over in-memory buffers. Text files are read and
//! written as UTF-8.

use crate::coder::{decode, encode};
use crate::container::format::{read_container, write_container};
use crate::utils::error::{CoderError, Result};
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Size accounting for one compression pass.
#[derive(Debug, Clone, Copy)]
pub struct CompressionStats {
    /// Input size in bytes.
    pub original_bytes: u64,
    /// Container size in bytes, headers and tables included.
    pub compressed_bytes: u64,
    /// Symbols encoded.
    pub symbol_count: u32,
    /// Payload length in bits, before padding.
    pub bit_count: u32,
}

impl CompressionStats {
    /// Fraction of the original size saved, in percent. Negative when the
    /// container overhead outweighs the coding gain.
    pub fn saved_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_bytes as f64 / self.original_bytes as f64) * 100.0
    }

    /// Average payload bits spent per input symbol.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.symbol_count == 0 {
            return 0.0;
        }
        self.bit_count as f64 / self.symbol_count as f64
    }
}

/// Compresses the UTF-8 text at `input` into a container at `output`.
pub fn compress_file(input: &Path, output: &Path) -> Result<CompressionStats> {
    let text = read_text(input)?;
    let symbol_count = text.chars().count();
    info!("encoding {} symbols from {}", symbol_count, input.display());

    let (model, bits) = encode(&text)?;
    debug!(
        "model has {} symbols, total {}; encoded {} bits",
        model.records().len(),
        model.total(),
        bits.len()
    );

    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    write_container(&mut writer, symbol_count as u32, &bits, &model)?;
    writer.into_inner().map_err(|e| e.into_error())?;

    let stats = CompressionStats {
        original_bytes: fs::metadata(input)?.len(),
        compressed_bytes: fs::metadata(output)?.len(),
        symbol_count: symbol_count as u32,
        bit_count: bits.len() as u32,
    };
    info!(
        "{} -> {}: {} bytes -> {} bytes ({:.2}% saved, {:.3} bits/symbol)",
        input.display(),
        output.display(),
        stats.original_bytes,
        stats.compressed_bytes,
        stats.saved_percent(),
        stats.bits_per_symbol()
    );
    Ok(stats)
}

/// Restores the original text from the container at `input` into `output`.
pub fn decompress_file(input: &Path, output: &Path) -> Result<()> {
    let file = File::open(input).map_err(|err| missing_or_io(err, input))?;
    let mut reader = BufReader::new(file);
    let container = read_container(&mut reader)?;
    info!(
        "decoding {} symbols from {}",
        container.symbol_count,
        input.display()
    );

    let bits = container.bits()?;
    let text = decode(&bits, &container.model, container.symbol_count as usize)?;

    let produced = text.chars().count();
    if produced < container.symbol_count as usize {
        warn!(
            "stream ended after {} of {} declared symbols",
            produced, container.symbol_count
        );
    }

    fs::write(output, text)?;
    info!("wrote {}", output.display());
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| missing_or_io(err, path))
}

fn missing_or_io(err: std::io::Error, path: &Path) -> CoderError {
    if err.kind() == std::io::ErrorKind::NotFound {
        CoderError::MissingFile(path.display().to_string())
    } else {
        CoderError::Io(err)
    }
}
