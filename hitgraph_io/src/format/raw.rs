//! Raw sample (`.hit`) read/write implementation.
//!
//! # Format Specification
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ HEADER (32 bytes), magic "HITR", num_edges = 0                     │
//! ├────────────────────────────────────────────────────────────────────┤
//! │ FEATURES (column-major)                                            │
//! │  For each feature (0..F): for each point (0..N): f32 LE            │
//! ├────────────────────────────────────────────────────────────────────┤
//! │ LABELS: for each point: i64 LE                                     │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::{Read, Write};
use std::path::Path;

use hitgraph_core::RawSample;

use super::header::{HitHeader, HEADER_SIZE, RAW_MAGIC};
use super::{element_count, read_f32s, read_i64s, to_u32, write_f32s, write_i64s};
use crate::error::{HitIoError, Result};

/// File extension for raw samples.
pub const RAW_EXTENSION: &str = "hit";

/// Write a raw sample.
pub fn write_raw_sample<W: Write>(sample: &RawSample, writer: &mut W) -> Result<()> {
    let num_points = to_u32(sample.num_points(), "point count")?;
    let num_features = to_u32(sample.num_features(), "feature count")?;
    let header = HitHeader::new(RAW_MAGIC, num_points, num_features, 0);
    writer.write_all(&header.to_bytes())?;
    write_f32s(writer, &sample.to_columns())?;
    write_i64s(writer, sample.labels())?;
    Ok(())
}

/// Read a raw sample.
///
/// # Errors
/// `InvalidInput` on bad magic, truncated data or inconsistent counts.
pub fn read_raw_sample<R: Read>(reader: &mut R) -> Result<RawSample> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header_bytes)
        .map_err(|_| HitIoError::invalid_input("truncated header"))?;
    let header = HitHeader::from_bytes(&header_bytes);

    if !header.is_valid(RAW_MAGIC) {
        return Err(HitIoError::invalid_input(
            "invalid magic bytes or version (expected HITR v1)",
        ));
    }

    let num_points = header.num_points as usize;
    let num_features = header.num_features as usize;

    let columns = read_f32s(reader, element_count(num_points, num_features)?)?;
    let labels = read_i64s(reader, num_points)?;

    RawSample::from_columns(&columns, num_features, num_points, labels)
        .map_err(|e| HitIoError::invalid_input(e.to_string()))
}

/// Save a raw sample to a file path.
pub fn save_raw_sample<P: AsRef<Path>>(sample: &RawSample, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| HitIoError::storage(path, e))?;
    let mut writer = std::io::BufWriter::new(file);
    write_raw_sample(sample, &mut writer)?;
    writer.flush().map_err(|e| HitIoError::storage(path, e))
}

/// Load a raw sample from a file path.
pub fn load_raw_sample<P: AsRef<Path>>(path: P) -> Result<RawSample> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| HitIoError::storage(path, e))?;
    let mut reader = std::io::BufReader::new(file);
    read_raw_sample(&mut reader).map_err(|e| match e {
        HitIoError::InvalidInput { message } => {
            HitIoError::invalid_input(format!("{}: {}", path.display(), message))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> RawSample {
        RawSample::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 3, vec![7, -1]).unwrap()
    }

    #[test]
    fn test_raw_roundtrip() {
        let mut buffer = Vec::new();
        write_raw_sample(&sample(), &mut buffer).unwrap();
        assert_eq!(buffer.len(), HEADER_SIZE + 6 * 4 + 2 * 8);

        let restored = read_raw_sample(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(restored, sample());
    }

    #[test]
    fn test_bad_magic() {
        let mut buffer = Vec::new();
        write_raw_sample(&sample(), &mut buffer).unwrap();
        buffer[0] = b'X';

        let err = read_raw_sample(&mut Cursor::new(buffer)).unwrap_err();
        assert!(matches!(err, HitIoError::InvalidInput { .. }));
    }

    #[test]
    fn test_truncated_labels() {
        let mut buffer = Vec::new();
        write_raw_sample(&sample(), &mut buffer).unwrap();
        buffer.truncate(buffer.len() - 4);

        let err = read_raw_sample(&mut Cursor::new(buffer)).unwrap_err();
        assert!(matches!(err, HitIoError::InvalidInput { .. }));
    }

    #[test]
    fn test_oversized_header_counts() {
        // counts whose byte size overflows
        let header = HitHeader::new(RAW_MAGIC, u32::MAX, u32::MAX, 0);
        let err = read_raw_sample(&mut Cursor::new(header.to_bytes().to_vec())).unwrap_err();
        assert!(matches!(err, HitIoError::InvalidInput { .. }));

        // counts far beyond the payload that follows
        let mut buffer = HitHeader::new(RAW_MAGIC, 1 << 30, 3, 0).to_bytes().to_vec();
        buffer.extend_from_slice(&[0u8; 64]);
        let err = read_raw_sample(&mut Cursor::new(buffer)).unwrap_err();
        assert!(matches!(err, HitIoError::InvalidInput { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_raw_sample(dir.path().join("nope.hit")).unwrap_err();
        assert!(matches!(err, HitIoError::Storage { .. }));
    }
}
