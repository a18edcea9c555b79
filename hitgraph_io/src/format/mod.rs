//! Binary file formats for raw samples and processed graphs.
//!
//! Both formats share a 32-byte [`HitHeader`] followed by little-endian
//! payload arrays, so files are portable across platforms.
//!
//! # Example
//!
//! ```
//! use hitgraph_core::RawSample;
//! use hitgraph_io::format::{read_raw_sample, write_raw_sample};
//!
//! let sample = RawSample::new(vec![0.0, 1.0, 2.0, 3.0], 2, vec![1, 1]).unwrap();
//! let mut buffer = Vec::new();
//! write_raw_sample(&sample, &mut buffer).unwrap();
//!
//! let loaded = read_raw_sample(&mut buffer.as_slice()).unwrap();
//! assert_eq!(loaded, sample);
//! ```

pub mod graph;
pub mod header;
pub mod raw;

use std::io::{Read, Write};

pub use graph::{read_graph, write_graph, GRAPH_EXTENSION};
pub use header::{HitHeader, FORMAT_VERSION, GRAPH_MAGIC, HEADER_SIZE, RAW_MAGIC};
pub use raw::{load_raw_sample, read_raw_sample, save_raw_sample, write_raw_sample, RAW_EXTENSION};

use crate::error::{HitIoError, Result};

/// Largest buffer reserved up front; the rest grows only as data arrives.
const READ_CHUNK: usize = 1 << 16;

/// Read `count` values of `width` bytes.
///
/// The buffer grows with the data actually read, so a header claiming more
/// than the file holds fails at end of input without a large allocation.
fn read_exact_bytes<R: Read>(reader: &mut R, count: usize, width: usize) -> Result<Vec<u8>> {
    let len = count
        .checked_mul(width)
        .ok_or_else(|| HitIoError::invalid_input(format!("element count {} overflows", count)))?;

    let mut bytes = Vec::with_capacity(len.min(READ_CHUNK));
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(HitIoError::invalid_input(format!(
            "unexpected end of file: {} of {} bytes",
            bytes.len(),
            len
        )));
    }
    Ok(bytes)
}

/// Product of two header counts.
pub(crate) fn element_count(a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b)
        .ok_or_else(|| HitIoError::invalid_input(format!("{} x {} elements overflows", a, b)))
}

pub(crate) fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| HitIoError::invalid_input(format!("{} {} exceeds u32 range", what, value)))
}

pub(crate) fn read_f32s<R: Read>(reader: &mut R, count: usize) -> Result<Vec<f32>> {
    let bytes = read_exact_bytes(reader, count, 4)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub(crate) fn read_u32s<R: Read>(reader: &mut R, count: usize) -> Result<Vec<usize>> {
    let bytes = read_exact_bytes(reader, count, 4)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as usize)
        .collect())
}

pub(crate) fn read_i64s<R: Read>(reader: &mut R, count: usize) -> Result<Vec<i64>> {
    let bytes = read_exact_bytes(reader, count, 8)?;
    Ok(bytes
        .chunks_exact(8)
        .map(|c| i64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
        .collect())
}

pub(crate) fn write_f32s<W: Write>(writer: &mut W, values: &[f32]) -> Result<()> {
    for &v in values {
        writer.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

pub(crate) fn write_i64s<W: Write>(writer: &mut W, values: &[i64]) -> Result<()> {
    for &v in values {
        writer.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}
