//! Segments: annotated spans over registered strings.

mod annotation;

pub use annotation::{AnnotationValue, Annotations};

use crate::error::{Error, Result};
use crate::store::{StringId, StringStore};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A delineated span of a registered string, with annotations.
///
/// Offsets are byte offsets into the string and always fall on character
/// boundaries. A segment with `start == end` is a legal boundary marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    string_id: StringId,
    start: usize,
    end: usize,
    annotations: Annotations,
}

impl Segment {
    /// Creates a segment, checking its offsets against the store.
    ///
    /// Fails with [`Error::NotFound`] if the string is unknown, with
    /// [`Error::Range`] unless `start <= end <= len`, and with
    /// [`Error::NotCharBoundary`] if an offset splits a character.
    pub fn new(
        store: &StringStore,
        string_id: StringId,
        start: usize,
        end: usize,
        annotations: Annotations,
    ) -> Result<Self> {
        let content = store.get(string_id)?;
        check_span(content, start, end)?;
        Ok(Self::from_parts(string_id, start, end, annotations))
    }

    /// Creates a segment spanning a whole string.
    pub fn whole(store: &StringStore, string_id: StringId) -> Result<Self> {
        let len = store.get(string_id)?.len();
        Ok(Self::from_parts(string_id, 0, len, Annotations::new()))
    }

    /// Builds a segment whose span is already known to be valid.
    pub(crate) fn from_parts(
        string_id: StringId,
        start: usize,
        end: usize,
        annotations: Annotations,
    ) -> Self {
        Self {
            string_id,
            start,
            end,
            annotations,
        }
    }

    /// Checks this segment against a store.
    pub fn validate(&self, store: &StringStore) -> Result<()> {
        let content = store.get(self.string_id)?;
        check_span(content, self.start, self.end)
    }

    /// Returns the id of the string this segment refers to.
    pub fn string_id(&self) -> StringId {
        self.string_id
    }

    /// Returns the start offset.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the end offset (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the byte range of the span.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns the span length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true for boundary markers.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the annotations.
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Returns the value of one annotation.
    pub fn annotation(&self, key: &str) -> Option<&AnnotationValue> {
        self.annotations.get(key)
    }

    /// Returns the text covered by this segment.
    pub fn content<'s>(&self, store: &'s StringStore) -> Result<&'s str> {
        let text = store.get(self.string_id)?;
        text.get(self.start..self.end).ok_or(Error::Range {
            start: self.start,
            end: self.end,
            len: text.len(),
        })
    }

    /// Returns a copy with the annotations replaced.
    pub fn with_annotations(&self, annotations: Annotations) -> Segment {
        Segment::from_parts(self.string_id, self.start, self.end, annotations)
    }

    /// Returns a copy with `overrides` merged into the annotations.
    pub fn annotated(&self, overrides: &Annotations) -> Segment {
        self.with_annotations(self.annotations.merged(overrides))
    }

    /// Returns `(string_id, start, end)`, the address used for sorting.
    pub fn address(&self) -> (StringId, usize, usize) {
        (self.string_id, self.start, self.end)
    }

    /// Checks whether both segments cover the same span.
    pub fn same_span(&self, other: &Segment) -> bool {
        self.address() == other.address()
    }

    /// Checks whether `other` lies within this segment.
    pub fn contains(&self, other: &Segment) -> bool {
        self.string_id == other.string_id && self.start <= other.start && other.end <= self.end
    }

    /// Checks whether the two spans share at least one byte.
    pub fn overlaps(&self, other: &Segment) -> bool {
        self.string_id == other.string_id && self.start < other.end && other.start < self.end
    }
}

fn check_span(content: &str, start: usize, end: usize) -> Result<()> {
    if start > end || end > content.len() {
        return Err(Error::Range {
            start,
            end,
            len: content.len(),
        });
    }
    if !content.is_char_boundary(start) {
        return Err(Error::NotCharBoundary(start));
    }
    if !content.is_char_boundary(end) {
        return Err(Error::NotCharBoundary(end));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_segment_content() {
        let mut store = StringStore::new();
        let id = store.register("hello world");
        let seg = Segment::new(&store, id, 6, 11, Annotations::new()).unwrap();
        assert_eq!(seg.content(&store).unwrap(), "world");
        assert_eq!(seg.len(), 5);
    }

    #[test]
    fn test_empty_span_is_legal() {
        let mut store = StringStore::new();
        let id = store.register("abc");
        let seg = Segment::new(&store, id, 3, 3, Annotations::new()).unwrap();
        assert!(seg.is_empty());
        assert_eq!(seg.content(&store).unwrap(), "");
    }

    #[test]
    fn test_char_boundary() {
        let mut store = StringStore::new();
        let id = store.register("né");
        let err = Segment::new(&store, id, 0, 2, Annotations::new()).unwrap_err();
        assert!(matches!(err, Error::NotCharBoundary(2)));
    }

    #[test]
    fn test_unknown_string() {
        let store = StringStore::new();
        let err = Segment::new(&store, StringId::from_raw(u64::MAX), 0, 0, Annotations::new())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_contains_and_overlaps() {
        let mut store = StringStore::new();
        let id = store.register("abcdefgh");
        let outer = Segment::new(&store, id, 0, 6, Annotations::new()).unwrap();
        let inner = Segment::new(&store, id, 2, 4, Annotations::new()).unwrap();
        let tail = Segment::new(&store, id, 5, 8, Annotations::new()).unwrap();

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&tail));
        assert!(!inner.overlaps(&tail));
    }

    #[test]
    fn test_structural_equality() {
        let mut store = StringStore::new();
        let id = store.register("abc");
        let a = Segment::new(&store, id, 0, 1, Annotations::new().with("k", "v")).unwrap();
        let b = Segment::new(&store, id, 0, 1, Annotations::new().with("k", "v")).unwrap();
        let c = a.with_annotations(Annotations::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.same_span(&c));
    }

    proptest! {
        #[test]
        fn test_construction_fails_iff_out_of_range(
            text in "[a-z ]{0,20}",
            start in 0usize..30,
            end in 0usize..30,
        ) {
            let mut store = StringStore::new();
            let id = store.register(text.as_str());
            let result = Segment::new(&store, id, start, end, Annotations::new());
            let valid = start <= end && end <= text.len();
            prop_assert_eq!(result.is_ok(), valid);
        }
    }
}
