//! Binary snapshot format.
//!
//! ## Format Layout
//!
//! ```text
//! +------------------+
//! | Header (6 bytes) |
//! +------------------+
//! | Body (bincode)   |
//! | (variable)       |
//! +------------------+
//! ```
//!
//! ### Header
//! - Magic number (4 bytes): "SGTB"
//! - Version (2 bytes, little endian)
//!
//! ### Body
//! - Strings as `(id, content)` pairs, sorted by id
//! - Segmentations in the order they were saved: label, annotations and
//!   segments `(string_id, start, end, annotations)`

use crate::error::{Error, Result};
use crate::segment::{Annotations, Segment};
use serde::{Deserialize, Serialize};

/// Magic number for snapshot files.
pub(crate) const MAGIC: &[u8; 4] = b"SGTB";

/// Current format version.
pub(crate) const VERSION: u16 = 1;

/// Header size in bytes.
pub(crate) const HEADER_SIZE: usize = 6;

/// Snapshot file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Format version.
    pub version: u16,
}

impl SnapshotHeader {
    /// Creates a header for the current version.
    pub fn new() -> Self {
        Self { version: VERSION }
    }

    /// Writes the header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(MAGIC);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes
    }

    /// Reads a header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::InvalidFormat("Header too short".to_string()));
        }

        if &bytes[0..4] != MAGIC {
            return Err(Error::InvalidFormat("Invalid magic number".to_string()));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(Error::InvalidFormat(format!(
                "Unsupported version {} (expected {})",
                version, VERSION
            )));
        }

        Ok(Self { version })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// One segmentation as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredSegmentation {
    pub(crate) label: String,
    pub(crate) annotations: Annotations,
    pub(crate) segments: Vec<Segment>,
}

/// Everything following the header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SnapshotBody {
    pub(crate) strings: Vec<(u64, String)>,
    pub(crate) segmentations: Vec<StoredSegmentation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = SnapshotHeader::new();
        let bytes = header.to_bytes();
        assert_eq!(&bytes[0..4], b"SGTB");
        assert_eq!(SnapshotHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_rejects_bad_input() {
        assert!(matches!(
            SnapshotHeader::from_bytes(b"SG"),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            SnapshotHeader::from_bytes(b"PRET\x01\x00"),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            SnapshotHeader::from_bytes(b"SGTB\x09\x00"),
            Err(Error::InvalidFormat(_))
        ));
    }
}
