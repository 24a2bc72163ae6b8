//! Binary packing of array and band-index payloads.
//!
//! Array payload (before zlib), all little-endian:
//!
//! ```text
//! u64 rows | u64 cols | u8 step count | u8 axis * steps
//! per step: u64 seed length | i64 * length
//! u64 residual rows | u64 residual cols | i64 * rows * cols
//! ```
//!
//! Band payload (before zlib): `u64` reference row, width, then the lower
//! and upper brackets (`width` values each).

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::delta::{DeltaEncoded, Grid, COLUMN_AXIS, ROW_AXIS};
use super::CodecError;
use crate::index::ExtractionIndex;

pub fn compress(raw: &[u8], level: u32) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::new(level));
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

pub fn decompress(compressed: &[u8], section: &str) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| CodecError::Malformed(format!("{section} payload: corrupt zlib stream: {e}")))?;
    Ok(raw)
}

pub fn pack_array(encoded: &DeltaEncoded, level: u32) -> Result<Vec<u8>, CodecError> {
    let mut raw = Vec::with_capacity(32 + encoded.residual.data.len() * 8);
    raw.write_u64::<LittleEndian>(encoded.rows as u64)?;
    raw.write_u64::<LittleEndian>(encoded.cols as u64)?;
    raw.write_u8(encoded.axes.len() as u8)?;
    raw.extend_from_slice(&encoded.axes);
    for seed in &encoded.seeds {
        raw.write_u64::<LittleEndian>(seed.len() as u64)?;
        for v in seed {
            raw.write_i64::<LittleEndian>(*v)?;
        }
    }
    raw.write_u64::<LittleEndian>(encoded.residual.rows as u64)?;
    raw.write_u64::<LittleEndian>(encoded.residual.cols as u64)?;
    for v in &encoded.residual.data {
        raw.write_i64::<LittleEndian>(*v)?;
    }
    compress(&raw, level)
}

pub fn unpack_array(compressed: &[u8], section: &'static str) -> Result<DeltaEncoded, CodecError> {
    let raw = decompress(compressed, section)?;
    let mut cursor = Cursor::new(&raw, section);

    let rows = cursor.read_len()?;
    let cols = cursor.read_len()?;
    let steps = cursor.read_u8()? as usize;
    let axes = cursor.take(steps)?.to_vec();
    if let Some(bad) = axes.iter().find(|a| **a != ROW_AXIS && **a != COLUMN_AXIS) {
        return Err(CodecError::Malformed(format!("{section} payload: unknown delta axis {bad}")));
    }
    let mut seeds = Vec::with_capacity(steps);
    for _ in 0..steps {
        let len = cursor.read_len()?;
        seeds.push(cursor.read_i64s(len)?);
    }
    let residual_rows = cursor.read_len()?;
    let residual_cols = cursor.read_len()?;
    let cells = residual_rows.checked_mul(residual_cols).ok_or_else(|| {
        CodecError::Malformed(format!("{section} payload: residual shape overflows"))
    })?;
    let data = cursor.read_i64s(cells)?;
    cursor.finish()?;

    Ok(DeltaEncoded {
        rows,
        cols,
        axes,
        seeds,
        residual: Grid::new(residual_rows, residual_cols, data),
    })
}

pub fn pack_band(index: &ExtractionIndex, level: u32) -> Result<Vec<u8>, CodecError> {
    let mut raw = Vec::with_capacity(16 + index.width() * 16);
    raw.write_u64::<LittleEndian>(index.reference_row() as u64)?;
    raw.write_u64::<LittleEndian>(index.width() as u64)?;
    for v in index.lower().iter().chain(index.upper()) {
        raw.write_u64::<LittleEndian>(*v as u64)?;
    }
    compress(&raw, level)
}

pub fn unpack_band(compressed: &[u8]) -> Result<ExtractionIndex, CodecError> {
    const SECTION: &str = "band index";
    let raw = decompress(compressed, SECTION)?;
    let mut cursor = Cursor::new(&raw, SECTION);
    let reference_row = cursor.read_len()?;
    let width = cursor.read_len()?;
    let lower = cursor.read_lens(width)?;
    let upper = cursor.read_lens(width)?;
    cursor.finish()?;
    Ok(ExtractionIndex::from_parts(reference_row, lower, upper))
}

/// Bounds-checked reader; every length is checked against the bytes left
/// before anything is allocated.
struct Cursor<'a> {
    bytes: &'a [u8],
    section: &'static str,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8], section: &'static str) -> Self {
        Self { bytes, section }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.bytes.len() {
            return Err(CodecError::Truncated {
                section: self.section,
                needed: n,
                available: self.bytes.len(),
            });
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn read_len(&mut self) -> Result<usize, CodecError> {
        let value = self.take(8)?.read_u64::<LittleEndian>()?;
        usize::try_from(value)
            .map_err(|_| CodecError::Malformed(format!("{} payload: length {value} too large", self.section)))
    }

    fn read_i64s(&mut self, n: usize) -> Result<Vec<i64>, CodecError> {
        let mut bytes = self.take_words(n)?;
        let mut out = vec![0i64; n];
        bytes.read_i64_into::<LittleEndian>(&mut out)?;
        Ok(out)
    }

    fn read_lens(&mut self, n: usize) -> Result<Vec<usize>, CodecError> {
        let mut bytes = self.take_words(n)?;
        let mut raw = vec![0u64; n];
        bytes.read_u64_into::<LittleEndian>(&mut raw)?;
        raw.into_iter()
            .map(|v| {
                usize::try_from(v)
                    .map_err(|_| CodecError::Malformed(format!("{} payload: value {v} too large", self.section)))
            })
            .collect()
    }

    fn take_words(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let needed = n.checked_mul(8).ok_or_else(|| {
            CodecError::Malformed(format!("{} payload: element count {n} overflows", self.section))
        })?;
        self.take(needed)
    }

    fn finish(self) -> Result<(), CodecError> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(CodecError::Malformed(format!(
                "{} payload: {} trailing bytes",
                self.section,
                self.bytes.len()
            )))
        }
    }
}
