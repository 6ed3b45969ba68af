//! Persistence of string stores together with their segmentations.
//!
//! A snapshot round-trips string ids, offsets and annotations losslessly.
//! Loading registers every string under its saved id, so segments keep
//! pointing at the same text.

mod format;

pub use format::SnapshotHeader;

use crate::error::{Error, Result};
use crate::segmentation::Segmentation;
use crate::store::{StringId, StringStore};
use format::{SnapshotBody, StoredSegmentation, HEADER_SIZE};
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// A restored store and the segmentations saved with it.
#[derive(Debug)]
pub struct Snapshot {
    /// Store holding every saved string under its original id.
    pub store: StringStore,
    /// Segmentations, in the order they were saved.
    pub segmentations: Vec<Segmentation>,
}

/// Serializes a store and segmentations built against it.
pub fn to_bytes(store: &StringStore, segmentations: &[&Segmentation]) -> Result<Vec<u8>> {
    for segmentation in segmentations {
        segmentation.check_store(store)?;
    }

    let body = SnapshotBody {
        strings: store
            .iter()
            .map(|(id, content)| (id.as_u64(), content.to_string()))
            .collect(),
        segmentations: segmentations
            .iter()
            .map(|s| StoredSegmentation {
                label: s.label().to_string(),
                annotations: s.annotations().clone(),
                segments: s.segments().to_vec(),
            })
            .collect(),
    };

    let mut bytes = SnapshotHeader::new().to_bytes().to_vec();
    bincode::serialize_into(&mut bytes, &body)?;
    Ok(bytes)
}

/// Restores a snapshot produced by [`to_bytes`].
pub fn from_bytes(bytes: &[u8]) -> Result<Snapshot> {
    SnapshotHeader::from_bytes(bytes)?;
    let body: SnapshotBody = bincode::deserialize(&bytes[HEADER_SIZE..])?;

    let mut store = StringStore::new();
    for (id, content) in body.strings {
        store
            .register_as(StringId::from_raw(id), content)
            .map_err(|e| match e {
                Error::InvalidArgument(msg) => Error::InvalidFormat(msg),
                other => other,
            })?;
    }

    let segmentations = body
        .segmentations
        .into_iter()
        .map(|stored| {
            Ok(Segmentation::new(&store, stored.segments)?
                .with_label(stored.label)
                .with_annotations(stored.annotations))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Snapshot {
        store,
        segmentations,
    })
}

/// Writes a snapshot file.
pub fn save<P: AsRef<Path>>(path: P, store: &StringStore, segmentations: &[&Segmentation]) -> Result<()> {
    let bytes = to_bytes(store, segmentations)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    writer.write_all(&bytes)?;
    writer.flush()?;

    info!(
        "Saved {} strings and {} segmentations to {:?}",
        store.len(),
        segmentations.len(),
        path.as_ref()
    );
    Ok(())
}

/// Reads a snapshot file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    let mut bytes = Vec::new();
    BufReader::new(File::open(path.as_ref())?).read_to_end(&mut bytes)?;
    let snapshot = from_bytes(&bytes)?;

    info!(
        "Loaded {} strings and {} segmentations from {:?}",
        snapshot.store.len(),
        snapshot.segmentations.len(),
        path.as_ref()
    );
    Ok(snapshot)
}
