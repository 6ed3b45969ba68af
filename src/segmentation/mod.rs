//! Segmentations: ordered, immutable collections of segments.
//!
//! A [`Segmentation`] records which store it was built against, but it does
//! not own any text. Every operation takes the store as an argument and
//! checks that it covers the segmentation before reading content.
//!
//! Segments are kept in a shared slice, so cloning a segmentation is cheap
//! and the same segmentation can feed any number of derivations running on
//! different threads.

mod index;

pub use index::ContainmentIndex;

use crate::error::{Error, Result};
use crate::segment::{Annotations, Segment};
use crate::store::{StoreId, StringId, StringStore};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Label given to segmentations when the caller does not choose one.
pub const DEFAULT_LABEL: &str = "segmented_data";

/// An ordered sequence of segments plus segmentation-level annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    store: StoreId,
    label: String,
    annotations: Annotations,
    segments: Arc<[Segment]>,
}

impl Segmentation {
    /// Creates a segmentation, validating every segment against the store.
    pub fn new(store: &StringStore, segments: Vec<Segment>) -> Result<Self> {
        for segment in &segments {
            segment.validate(store)?;
        }
        Ok(Self::from_trusted(store.id(), DEFAULT_LABEL, segments))
    }

    /// Creates a segmentation without segments.
    pub fn empty(store: &StringStore) -> Self {
        Self::from_trusted(store.id(), DEFAULT_LABEL, Vec::new())
    }

    /// Wraps a bare string as a one-segment segmentation.
    pub fn from_string(store: &StringStore, string_id: StringId) -> Result<Self> {
        Self::from_strings(store, [string_id])
    }

    /// Wraps several strings, one segment each, in the given order.
    pub fn from_strings<I>(store: &StringStore, string_ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = StringId>,
    {
        let segments = string_ids
            .into_iter()
            .map(|id| Segment::whole(store, id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_trusted(store.id(), DEFAULT_LABEL, segments))
    }

    /// Builds a segmentation from segments derived from already valid ones.
    pub(crate) fn from_trusted(store: StoreId, label: impl Into<String>, segments: Vec<Segment>) -> Self {
        Self {
            store,
            label: label.into(),
            annotations: Annotations::new(),
            segments: segments.into(),
        }
    }

    /// Returns a copy with a different label.
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with different segmentation-level annotations.
    pub fn with_annotations(&self, annotations: Annotations) -> Self {
        Self {
            annotations,
            ..self.clone()
        }
    }

    /// Returns the store this segmentation was built against.
    pub fn store_id(&self) -> StoreId {
        self.store
    }

    /// Fails with [`Error::IncompatibleStore`] unless `store` covers this
    /// segmentation.
    pub fn check_store(&self, store: &StringStore) -> Result<()> {
        if store.covers(self.store) {
            Ok(())
        } else {
            Err(Error::IncompatibleStore {
                expected: store.id(),
                found: self.store,
            })
        }
    }

    /// Returns the label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the segmentation-level annotations.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if there are no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the segment at `index`.
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Returns the segments as a slice.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Iterates over segments in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Returns the content of every segment, in order.
    pub fn contents<'s>(&self, store: &'s StringStore) -> Result<Vec<&'s str>> {
        self.check_store(store)?;
        self.segments.iter().map(|s| s.content(store)).collect()
    }

    /// Returns the ids of the strings referenced, in order of first use.
    pub fn string_ids(&self) -> Vec<StringId> {
        let mut seen = BTreeSet::new();
        self.segments
            .iter()
            .map(Segment::string_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Returns the sorted union of all segment annotation keys.
    pub fn annotation_keys(&self) -> Vec<String> {
        let keys: BTreeSet<&str> = self
            .segments
            .iter()
            .flat_map(|s| s.annotations().keys())
            .collect();
        keys.into_iter().map(str::to_string).collect()
    }

    /// Checks that no two segments share a byte of the same string.
    ///
    /// Empty segments never overlap anything.
    pub fn is_non_overlapping(&self) -> bool {
        let mut by_string: HashMap<StringId, Vec<(usize, usize)>> = HashMap::new();
        for segment in self.segments.iter().filter(|s| !s.is_empty()) {
            by_string
                .entry(segment.string_id())
                .or_default()
                .push((segment.start(), segment.end()));
        }

        by_string.values_mut().all(|spans| {
            spans.sort_unstable();
            spans.windows(2).all(|w| w[0].1 <= w[1].0)
        })
    }
}

impl<'a> IntoIterator for &'a Segmentation {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
