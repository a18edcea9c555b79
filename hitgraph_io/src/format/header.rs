//! Shared 32-byte header for hitgraph binary files.

/// Magic bytes for raw sample files.
pub const RAW_MAGIC: [u8; 4] = *b"HITR";

/// Magic bytes for processed graph files.
pub const GRAPH_MAGIC: [u8; 4] = *b"HITG";

/// Current format version.
pub const FORMAT_VERSION: u16 = 1;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 32;

/// File header.
///
/// Layout (32 bytes total):
/// - Bytes 0-3: Magic ("HITR" or "HITG")
/// - Bytes 4-5: version (u16 LE)
/// - Bytes 6-7: flags (u16 LE)
/// - Bytes 8-11: num_points (u32 LE)
/// - Bytes 12-15: num_features (u32 LE)
/// - Bytes 16-19: num_edges (u32 LE, 0 for raw files)
/// - Bytes 20-31: reserved (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitHeader {
    /// Magic bytes identifying the file kind.
    pub magic: [u8; 4],
    /// Format version.
    pub version: u16,
    /// Flags (reserved for future use).
    pub flags: u16,
    /// Number of points (graph nodes).
    pub num_points: u32,
    /// Number of features per point.
    pub num_features: u32,
    /// Number of directed edges.
    pub num_edges: u32,
    /// Reserved bytes for future expansion.
    pub reserved: [u8; 12],
}

impl HitHeader {
    /// Create a header for the current version.
    pub fn new(magic: [u8; 4], num_points: u32, num_features: u32, num_edges: u32) -> Self {
        Self {
            magic,
            version: FORMAT_VERSION,
            flags: 0,
            num_points,
            num_features,
            num_edges,
            reserved: [0; 12],
        }
    }

    /// Check the magic bytes and version.
    pub fn is_valid(&self, magic: [u8; 4]) -> bool {
        self.magic == magic && self.version == FORMAT_VERSION
    }

    /// Serialize the header to a byte array.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];

        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.flags.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.num_points.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.num_features.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.num_edges.to_le_bytes());
        bytes[20..32].copy_from_slice(&self.reserved);

        bytes
    }

    /// Deserialize a header from a byte array.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        let flags = u16::from_le_bytes([bytes[6], bytes[7]]);
        let num_points = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let num_features = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        let num_edges = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);

        let mut reserved = [0u8; 12];
        reserved.copy_from_slice(&bytes[20..32]);

        Self {
            magic,
            version,
            flags,
            num_points,
            num_features,
            num_edges,
            reserved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = HitHeader::new(GRAPH_MAGIC, 100, 3, 300);
        let restored = HitHeader::from_bytes(&header.to_bytes());
        assert_eq!(header, restored);
    }

    #[test]
    fn test_header_validation() {
        let header = HitHeader::new(RAW_MAGIC, 10, 2, 0);
        assert!(header.is_valid(RAW_MAGIC));
        assert!(!header.is_valid(GRAPH_MAGIC));

        let mut future = header;
        future.version = FORMAT_VERSION + 1;
        assert!(!future.is_valid(RAW_MAGIC));
    }
}
