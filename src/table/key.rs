//! Grouping keys: how segments are turned into table headers.

use crate::ops::SegmentView;
use crate::segment::Segment;
use rayon::prelude::*;

/// Key given to segments lacking the requested annotation.
pub const MISSING_KEY: &str = "__none__";

/// Where the key of a segment comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeySource {
    /// The segment's content.
    #[default]
    Content,
    /// The text of one annotation.
    Annotation(String),
    /// The 1-based position of the segment in its segmentation.
    Position,
}

impl KeySource {
    /// Keys segments on an annotation.
    pub fn annotation(key: impl Into<String>) -> Self {
        KeySource::Annotation(key.into())
    }

    pub(crate) fn extract(&self, segment: &Segment, content: &str, position: usize, missing: &str) -> String {
        match self {
            KeySource::Content => content.to_string(),
            KeySource::Annotation(key) => segment
                .annotation(key)
                .map_or_else(|| missing.to_string(), |v| v.to_string()),
            KeySource::Position => (position + 1).to_string(),
        }
    }
}

/// Computes the grouping key of a segment.
///
/// Implemented for [`KeySource`] and for any
/// `Fn(&Segment, &str) -> String + Sync` closure receiving the segment and
/// its content.
pub trait GroupingKey: Sync {
    /// Returns the key of `segment`, found at `position` in its segmentation.
    fn key(&self, segment: &Segment, content: &str, position: usize) -> String;
}

impl GroupingKey for KeySource {
    fn key(&self, segment: &Segment, content: &str, position: usize) -> String {
        self.extract(segment, content, position, MISSING_KEY)
    }
}

impl<F> GroupingKey for F
where
    F: Fn(&Segment, &str) -> String + Sync,
{
    fn key(&self, segment: &Segment, content: &str, _position: usize) -> String {
        self(segment, content)
    }
}

/// A [`KeySource`] with a custom key for missing annotations.
pub(crate) struct WithMissing<'a> {
    pub(crate) source: &'a KeySource,
    pub(crate) missing: &'a str,
}

impl GroupingKey for WithMissing<'_> {
    fn key(&self, segment: &Segment, content: &str, position: usize) -> String {
        self.source.extract(segment, content, position, self.missing)
    }
}

/// Computes the key of every viewed segment, in order.
pub(crate) fn keys_of<K>(views: &[SegmentView<'_>], key: &K, min_len: usize) -> Vec<String>
where
    K: GroupingKey + ?Sized,
{
    views
        .par_iter()
        .with_min_len(min_len.max(1))
        .map(|view| key.key(view.segment(), view.content(), view.position()))
        .collect()
}
