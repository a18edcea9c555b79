//! Processed graph (`.hgr`) read/write implementation.
//!
//! # Format Specification
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ HEADER (32 bytes), magic "HITG"                                    │
//! ├────────────────────────────────────────────────────────────────────┤
//! │ NODE FEATURES: N * F f32 LE, row-major                             │
//! │ EDGE SOURCES:  E u32 LE                                            │
//! │ EDGE TARGETS:  E u32 LE                                            │
//! │ EDGE LABELS:   E i64 LE                                            │
//! │ NODE LABELS:   N i64 LE                                            │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use std::io::{Read, Write};

use hitgraph_core::GraphRecord;

use super::header::{HitHeader, GRAPH_MAGIC, HEADER_SIZE};
use super::{element_count, read_f32s, read_i64s, read_u32s, to_u32, write_f32s, write_i64s};
use crate::error::{HitIoError, Result};

/// File extension for processed graphs.
pub const GRAPH_EXTENSION: &str = "hgr";

/// Write a graph record.
pub fn write_graph<W: Write>(record: &GraphRecord, writer: &mut W) -> Result<()> {
    let num_nodes = to_u32(record.num_nodes(), "node count")?;
    let num_edges = to_u32(record.num_edges(), "edge count")?;
    let num_features = to_u32(record.num_features, "feature count")?;

    let header = HitHeader::new(GRAPH_MAGIC, num_nodes, num_features, num_edges);
    writer.write_all(&header.to_bytes())?;

    write_f32s(writer, &record.x)?;
    for &s in &record.edge_sources {
        writer.write_all(&(s as u32).to_le_bytes())?;
    }
    for &t in &record.edge_targets {
        writer.write_all(&(t as u32).to_le_bytes())?;
    }
    write_i64s(writer, &record.edge_labels)?;
    write_i64s(writer, &record.node_labels)?;

    Ok(())
}

/// Read a graph record, validating edge bounds.
pub fn read_graph<R: Read>(reader: &mut R) -> Result<GraphRecord> {
    let mut header_bytes = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header_bytes)
        .map_err(|_| HitIoError::invalid_input("truncated header"))?;
    let header = HitHeader::from_bytes(&header_bytes);

    if !header.is_valid(GRAPH_MAGIC) {
        return Err(HitIoError::invalid_input(
            "invalid magic bytes or version (expected HITG v1)",
        ));
    }

    let num_nodes = header.num_points as usize;
    let num_features = header.num_features as usize;
    let num_edges = header.num_edges as usize;

    let x = read_f32s(reader, element_count(num_nodes, num_features)?)?;
    let edge_sources = read_u32s(reader, num_edges)?;
    let edge_targets = read_u32s(reader, num_edges)?;
    let edge_labels = read_i64s(reader, num_edges)?;
    let node_labels = read_i64s(reader, num_nodes)?;

    GraphRecord::new(
        x,
        num_features,
        edge_sources,
        edge_targets,
        edge_labels,
        node_labels,
    )
    .map_err(|e| HitIoError::invalid_input(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record() -> GraphRecord {
        GraphRecord::new(
            vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5],
            2,
            vec![0, 1, 2],
            vec![1, 0, 1],
            vec![4, 4, 0],
            vec![4, 4, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_graph_roundtrip_is_bit_identical() {
        let mut first = Vec::new();
        write_graph(&record(), &mut first).unwrap();

        let restored = read_graph(&mut Cursor::new(first.clone())).unwrap();
        assert_eq!(restored, record());

        let mut second = Vec::new();
        write_graph(&restored, &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_bounds_edge_rejected() {
        let mut buffer = Vec::new();
        write_graph(&record(), &mut buffer).unwrap();

        // First edge target lives after header, features and three sources
        let offset = HEADER_SIZE + 6 * 4 + 3 * 4;
        buffer[offset..offset + 4].copy_from_slice(&9u32.to_le_bytes());

        let err = read_graph(&mut Cursor::new(buffer)).unwrap_err();
        assert!(matches!(err, HitIoError::InvalidInput { .. }));
    }

    #[test]
    fn test_oversized_header_counts() {
        let header = HitHeader::new(GRAPH_MAGIC, u32::MAX, u32::MAX, u32::MAX);
        let err = read_graph(&mut Cursor::new(header.to_bytes().to_vec())).unwrap_err();
        assert!(matches!(err, HitIoError::InvalidInput { .. }));

        let mut buffer = Vec::new();
        write_graph(&record(), &mut buffer).unwrap();
        let inflated = HitHeader::new(GRAPH_MAGIC, 3, 2, 1 << 28);
        buffer[..HEADER_SIZE].copy_from_slice(&inflated.to_bytes());
        let err = read_graph(&mut Cursor::new(buffer)).unwrap_err();
        assert!(matches!(err, HitIoError::InvalidInput { .. }));
    }
}
